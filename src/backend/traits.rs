//! Common traits and types for image generation models

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::media::ImagePayload;

/// Requested output modality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    Image,
    ImageAndText,
}

/// Request sent to a model
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// Instruction text
    pub prompt: String,

    /// Input images, base scene first, then the optional user photo
    pub images: Vec<ImagePayload>,

    pub output: OutputKind,
}

/// Binary part returned by a model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelFile {
    pub media_type: String,

    /// Base64 encoded body
    pub base64: Option<String>,

    /// Raw body
    pub bytes: Option<Vec<u8>>,
}

/// Response from a model call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    #[serde(default)]
    pub files: Vec<ModelFile>,

    /// Free-form textual output; its shape is provider dependent
    #[serde(default)]
    pub text: Option<serde_json::Value>,
}

/// Trait for remote image generation models
#[async_trait]
pub trait ImageModel: Send + Sync {
    /// Provider name, reported in error details
    fn provider(&self) -> &str;

    /// Model identifier
    fn model_id(&self) -> &str;

    /// Run one generation
    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse>;
}
