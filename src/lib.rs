//! Yacht Shot
//!
//! Turns a visitor's selfie into a photo on a yacht: the HTTP endpoint
//! composes a prompt, gathers the base scene and the user photo, asks a
//! multimodal model for a composite and returns it as a data URL. The
//! `upload` and `client` modules cover the visitor side of that exchange.

pub mod api;
pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod generation;
pub mod media;
pub mod prompt;
pub mod upload;

pub use error::{AppError, Result};

use std::sync::Arc;

use backend::traits::ImageModel;
use generation::GenerationService;
use media::fetcher::RemoteImageFetcher;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Arc<crate::config::Settings>,
    pub generator: Arc<GenerationService>,
}

impl AppState {
    /// Wire the generation service around the given model
    pub fn new(settings: crate::config::Settings, model: Arc<dyn ImageModel>) -> Result<Self> {
        let settings = Arc::new(settings);
        let fetcher = RemoteImageFetcher::new(&settings.fetch)?;
        let generator = Arc::new(GenerationService::new(settings.clone(), fetcher, model));
        Ok(Self {
            settings,
            generator,
        })
    }
}
