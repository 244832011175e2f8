//! Gemini `generateContent` client

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::backend::traits::{ImageModel, ModelFile, ModelRequest, ModelResponse, OutputKind};
use crate::config::ModelConfig;
use crate::error::{AppError, Result};
use crate::media::essence;

/// HTTP client for Gemini image models
pub struct GeminiModel {
    client: Client,
    provider: String,
    model_id: String,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest {
    contents: Vec<ApiContent>,
    generation_config: ApiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ApiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, alias = "inline_data", skip_serializing_if = "Option::is_none")]
    inline_data: Option<ApiInlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiInlineData {
    #[serde(alias = "mime_type")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiGenerationConfig {
    response_modalities: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
}

#[derive(Debug, Deserialize)]
struct ApiCandidate {
    #[serde(default)]
    content: Option<ApiContent>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl GeminiModel {
    /// Create a new client from configuration
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            provider: config.provider.clone(),
            model_id: config.id.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model_id)
    }

    fn provider_error(&self, status: Option<u16>, code: Option<String>, message: String) -> AppError {
        AppError::Provider {
            provider: self.provider.clone(),
            status,
            code,
            message,
        }
    }

    fn build_request(request: ModelRequest) -> ApiRequest {
        let mut parts: Vec<ApiPart> = request
            .images
            .into_iter()
            .map(|image| ApiPart {
                text: None,
                inline_data: Some(ApiInlineData {
                    data: STANDARD.encode(&image.bytes),
                    mime_type: essence(&image.media_type).to_string(),
                }),
            })
            .collect();
        parts.push(ApiPart {
            text: Some(request.prompt),
            inline_data: None,
        });

        let response_modalities = match request.output {
            OutputKind::Image => vec!["IMAGE"],
            OutputKind::ImageAndText => vec!["IMAGE", "TEXT"],
        };

        ApiRequest {
            contents: vec![ApiContent {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: ApiGenerationConfig { response_modalities },
        }
    }

    fn into_model_response(api: ApiResponse) -> ModelResponse {
        let mut files = Vec::new();
        let mut texts = Vec::new();

        for part in api
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
        {
            if let Some(inline) = part.inline_data {
                files.push(ModelFile {
                    media_type: inline.mime_type,
                    base64: Some(inline.data),
                    bytes: None,
                });
            }
            if let Some(text) = part.text {
                texts.push(text);
            }
        }

        let text = if texts.is_empty() {
            None
        } else {
            Some(serde_json::Value::String(texts.join("")))
        };

        ModelResponse { files, text }
    }
}

#[async_trait]
impl ImageModel for GeminiModel {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse> {
        let endpoint = self.endpoint();
        let image_count = request.images.len();
        let body = Self::build_request(request);

        debug!(model = %self.model_id, images = image_count, "Sending generate request");

        let mut builder = self.client.post(&endpoint).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.header("x-goog-api-key", key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(format!("model {}", self.model_id))
            } else {
                self.provider_error(None, None, format!("Connection failed: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let (code, message) = match serde_json::from_str::<ApiErrorBody>(&text) {
                Ok(body) => (body.error.status, body.error.message),
                Err(_) => (None, text),
            };
            warn!(model = %self.model_id, status = %status, "Model call failed");
            return Err(self.provider_error(Some(status.as_u16()), code, message));
        }

        let api_response = response.json::<ApiResponse>().await.map_err(|e| {
            self.provider_error(
                Some(status.as_u16()),
                None,
                format!("Failed to parse response: {}", e),
            )
        })?;

        Ok(Self::into_model_response(api_response))
    }
}
