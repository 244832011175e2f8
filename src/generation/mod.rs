//! Generation module - Orchestrates image loading, prompting and the model call

pub mod extract;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::backend::traits::{ImageModel, ModelRequest};
use crate::config::Settings;
use crate::error::{AppError, Result};
use crate::media::{data_url, fetcher::RemoteImageFetcher, ImagePayload};
use crate::prompt;
use extract::ImageExtraction;

/// Body of `POST /api/generate`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// Successful body of `POST /api/generate`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub ok: bool,
    pub data_url: String,
}

/// Where the user photo comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserImageSource<'a> {
    DataUrl(&'a str),
    Remote(&'a str),
    Absent,
}

impl<'a> UserImageSource<'a> {
    /// Anything that is neither a data URL nor http(s) counts as absent.
    pub fn classify(image_url: Option<&'a str>) -> Self {
        match image_url.map(str::trim) {
            Some(url) if data_url::is_data_url(url) => Self::DataUrl(url),
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
                Self::Remote(url)
            }
            Some(url) if !url.is_empty() => {
                debug!("Ignoring user image with unsupported scheme");
                Self::Absent
            }
            _ => Self::Absent,
        }
    }
}

/// Runs one generation request end to end
pub struct GenerationService {
    settings: Arc<Settings>,
    fetcher: RemoteImageFetcher,
    model: Arc<dyn ImageModel>,
}

impl GenerationService {
    pub fn new(
        settings: Arc<Settings>,
        fetcher: RemoteImageFetcher,
        model: Arc<dyn ImageModel>,
    ) -> Self {
        Self {
            settings,
            fetcher,
            model,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Produce a data URL for the request, bounded by the configured deadline
    pub async fn generate(&self, request: GenerateRequest) -> Result<String> {
        let deadline = Duration::from_millis(self.settings.generation.deadline_ms);
        tokio::time::timeout(deadline, self.run(request))
            .await
            .map_err(|_| AppError::Timeout("generation deadline exceeded".to_string()))?
    }

    async fn run(&self, request: GenerateRequest) -> Result<String> {
        let user_prompt = request.prompt.as_deref().map(str::trim).unwrap_or("");
        if self.settings.generation.require_prompt && user_prompt.is_empty() {
            return Err(AppError::PromptRequired);
        }

        let source = UserImageSource::classify(request.image_url.as_deref());
        let (base, user) = futures::try_join!(
            self.fetcher.fetch(&self.settings.scene.base_image_url),
            self.load_user_image(&source),
        )?;

        let instruction = prompt::compose(user_prompt, user.is_some());

        let mut images = vec![base];
        images.extend(user);

        info!(
            provider = %self.model.provider(),
            model = %self.model.model_id(),
            images = images.len(),
            prompt_len = instruction.len(),
            "Invoking image model"
        );

        let response = self
            .model
            .generate(ModelRequest {
                prompt: instruction,
                images,
                output: self.settings.generation.output,
            })
            .await?;

        match extract::extract(&response) {
            ImageExtraction::NotFound => Err(AppError::ExtractionEmpty),
            found => found.into_data_url().ok_or(AppError::ExtractionEmpty),
        }
    }

    async fn load_user_image(&self, source: &UserImageSource<'_>) -> Result<Option<ImagePayload>> {
        match source {
            UserImageSource::DataUrl(url) => data_url::decode(url).map(Some),
            UserImageSource::Remote(url) => self.fetcher.fetch(url).await.map(Some),
            UserImageSource::Absent => Ok(None),
        }
    }
}
