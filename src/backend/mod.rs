//! Backend module - Model trait and the Gemini client

pub mod gemini;
pub mod traits;

use std::sync::Arc;

use crate::config::ModelConfig;
use crate::error::{AppError, Result};
use traits::ImageModel;

/// Build the model client named by `model.provider`
pub fn from_config(config: &ModelConfig) -> Result<Arc<dyn ImageModel>> {
    match config.provider.as_str() {
        "google" | "gemini" => Ok(Arc::new(gemini::GeminiModel::new(config)?)),
        other => Err(AppError::Config(config::ConfigError::Message(format!(
            "Unknown model provider '{}'",
            other
        )))),
    }
}
