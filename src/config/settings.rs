//! Application settings and configuration management

use crate::backend::traits::OutputKind;
use crate::error::{AppError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Model used when no identifier is configured
pub const DEFAULT_MODEL_ID: &str = "gemini-2.5-flash-image-preview";

/// Background scene every generation is composited onto
pub const DEFAULT_BASE_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1567899378494-47b22a2ae96a?w=2048&q=85";

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    /// `production` hides error details from responses
    #[serde(default = "default_environment")]
    pub environment: String,
    pub model: ModelConfig,
    pub scene: SceneConfig,
    pub fetch: FetchConfig,
    pub generation: GenerationConfig,
    pub upload: UploadConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_environment() -> String {
    "development".to_string()
}

/// Remote image model configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model_id")]
    pub id: String,
    #[serde(default = "default_model_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model_timeout")]
    pub timeout_ms: u64,
}

fn default_provider() -> String {
    "google".to_string()
}

fn default_model_id() -> String {
    DEFAULT_MODEL_ID.to_string()
}

fn default_model_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_model_timeout() -> u64 {
    90_000
}

/// Base scene configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SceneConfig {
    #[serde(default = "default_base_image_url")]
    pub base_image_url: String,
}

fn default_base_image_url() -> String {
    DEFAULT_BASE_IMAGE_URL.to_string()
}

/// Remote image fetch configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    #[serde(default = "default_fetch_timeout")]
    pub timeout_ms: u64,
}

fn default_fetch_timeout() -> u64 {
    15_000
}

/// Generation endpoint behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub require_prompt: bool,
    /// Upper bound for a whole request, fetches and model call included
    #[serde(default = "default_deadline")]
    pub deadline_ms: u64,
    /// Modalities requested from the model
    #[serde(default = "default_output")]
    pub output: OutputKind,
}

fn default_deadline() -> u64 {
    120_000
}

fn default_output() -> OutputKind {
    OutputKind::ImageAndText
}

/// Client upload pipeline limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
    #[serde(default = "default_heic_quality")]
    pub heic_quality: u8,
    #[serde(default = "default_downscale_quality")]
    pub downscale_quality: u8,
    #[serde(default = "default_heic_command")]
    pub heic_command: String,
    #[serde(default)]
    pub storage_capacity_bytes: Option<usize>,
}

fn default_max_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_max_dimension() -> u32 {
    2048
}

fn default_heic_quality() -> u8 {
    90
}

fn default_downscale_quality() -> u8 {
    85
}

fn default_heic_command() -> String {
    "heif-convert".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/default.toml")
    }

    /// Load settings from a specific configuration file path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("environment", default_environment())?
            .set_default("model.provider", default_provider())?
            .set_default("model.id", default_model_id())?
            .set_default("model.base_url", default_model_base_url())?
            .set_default("model.timeout_ms", default_model_timeout() as i64)?
            .set_default("scene.base_image_url", default_base_image_url())?
            .set_default("fetch.timeout_ms", default_fetch_timeout() as i64)?
            .set_default("generation.require_prompt", false)?
            .set_default("generation.deadline_ms", default_deadline() as i64)?
            .set_default("generation.output", "image_and_text")?
            .set_default("upload.max_bytes", default_max_bytes() as i64)?
            .set_default("upload.max_dimension", default_max_dimension() as i64)?
            .set_default("upload.heic_quality", default_heic_quality() as i64)?
            .set_default("upload.downscale_quality", default_downscale_quality() as i64)?
            .set_default("upload.heic_command", default_heic_command())?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.format", default_log_format())?
            .add_source(
                File::with_name(path.as_ref().to_str().unwrap_or("config/default"))
                    .required(false),
            )
            // Override with environment variables (prefixed with YACHT_SHOT_)
            .add_source(
                Environment::with_prefix("YACHT_SHOT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut settings: Settings = config.try_deserialize()?;
        if settings.model.api_key.is_none() {
            settings.model.api_key = std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty());
        }
        Ok(settings)
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(invalid("Server port cannot be 0"));
        }
        if self.model.id.trim().is_empty() {
            return Err(invalid("Model id cannot be empty"));
        }
        if self.scene.base_image_url.trim().is_empty() {
            return Err(invalid("Base image URL cannot be empty"));
        }
        if self.upload.max_bytes == 0 || self.upload.max_dimension == 0 {
            return Err(invalid("Upload limits must be greater than 0"));
        }
        for (name, quality) in [
            ("heic_quality", self.upload.heic_quality),
            ("downscale_quality", self.upload.downscale_quality),
        ] {
            if quality == 0 || quality > 100 {
                return Err(invalid(&format!(
                    "Upload {} must be between 1 and 100, got {}",
                    name, quality
                )));
            }
        }
        Ok(())
    }
}

fn invalid(message: &str) -> AppError {
    AppError::Config(config::ConfigError::Message(message.to_string()))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
            },
            environment: default_environment(),
            model: ModelConfig {
                provider: default_provider(),
                id: default_model_id(),
                base_url: default_model_base_url(),
                api_key: None,
                timeout_ms: default_model_timeout(),
            },
            scene: SceneConfig {
                base_image_url: default_base_image_url(),
            },
            fetch: FetchConfig {
                timeout_ms: default_fetch_timeout(),
            },
            generation: GenerationConfig {
                require_prompt: false,
                deadline_ms: default_deadline(),
                output: default_output(),
            },
            upload: UploadConfig::default(),
            logging: LoggingConfig {
                level: default_log_level(),
                format: default_log_format(),
            },
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            max_dimension: default_max_dimension(),
            heic_quality: default_heic_quality(),
            downscale_quality: default_downscale_quality(),
            heic_command: default_heic_command(),
            storage_capacity_bytes: None,
        }
    }
}
