//! Generator client - Calls the generation endpoint with the current upload

use parking_lot::{Mutex, RwLock};
use reqwest::Client;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::generation::GenerateRequest;
use crate::prompt;
use crate::upload::pipeline::BusyGuard;
use crate::upload::{Subscription, UploadSlot};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("A generation is already running")]
    Busy,

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Server {
        status: u16,
        message: String,
        error_id: Option<String>,
    },

    #[error("The server returned no image")]
    NoImage,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    #[serde(default)]
    data_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_id: Option<String>,
}

/// Keeps the prompt and the uploaded photo, and submits them for generation
pub struct GeneratorClient {
    http: Client,
    endpoint: String,
    prompt: Mutex<String>,
    user_photo: Arc<RwLock<Option<String>>>,
    busy: AtomicBool,
    _subscription: Subscription,
}

impl GeneratorClient {
    /// `endpoint` is the full URL of `POST /api/generate`
    pub fn new(endpoint: impl Into<String>, slot: &UploadSlot) -> Self {
        let user_photo = Arc::new(RwLock::new(slot.get()));
        let photo = user_photo.clone();
        let subscription = slot.subscribe(move |value| {
            *photo.write() = value.map(str::to_string);
        });

        Self {
            http: Client::new(),
            endpoint: endpoint.into(),
            prompt: Mutex::new(prompt::default_user_prompt()),
            user_photo,
            busy: AtomicBool::new(false),
            _subscription: subscription,
        }
    }

    pub fn prompt(&self) -> String {
        self.prompt.lock().clone()
    }

    pub fn set_prompt(&self, prompt: impl Into<String>) {
        *self.prompt.lock() = prompt.into();
    }

    pub fn user_photo(&self) -> Option<String> {
        self.user_photo.read().clone()
    }

    pub fn has_user_photo(&self) -> bool {
        self.user_photo.read().is_some()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Submit the current prompt and photo, returning the generated data URL.
    ///
    /// Dropping the returned future releases the busy flag.
    pub async fn generate(&self) -> Result<String, ClientError> {
        let _guard = BusyGuard::acquire(&self.busy).ok_or(ClientError::Busy)?;
        self.submit().await
    }

    async fn submit(&self) -> Result<String, ClientError> {
        let request = GenerateRequest {
            prompt: Some(self.prompt()),
            image_url: self.user_photo().filter(|p| !p.is_empty()),
        };
        debug!(endpoint = %self.endpoint, with_photo = request.image_url.is_some(), "Requesting generation");

        let response = self.http.post(&self.endpoint).json(&request).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        // Proxies may answer with HTML; fall back to the generic message
        let envelope: Envelope = serde_json::from_slice(&body).unwrap_or_default();

        if !status.is_success() {
            return Err(ClientError::Server {
                status: status.as_u16(),
                message: envelope.error.unwrap_or_else(|| "Failed to generate".to_string()),
                error_id: envelope.error_id,
            });
        }

        match envelope.data_url {
            Some(url) if !url.is_empty() => Ok(url),
            _ => Err(ClientError::NoImage),
        }
    }
}
