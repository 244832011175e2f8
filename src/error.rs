//! Common error types for the yacht shot service

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid JSON")]
    InvalidJson,

    #[error("Prompt is required")]
    PromptRequired,

    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),

    #[error("Failed to fetch image {url}: {message}")]
    UpstreamFetch {
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("{provider} provider error: {message}")]
    Provider {
        provider: String,
        status: Option<u16>,
        code: Option<String>,
        message: String,
    },

    #[error("Model response contained no decodable image")]
    ExtractionEmpty,

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn upstream_fetch(url: &str, status: Option<u16>, message: impl Into<String>) -> Self {
        AppError::UpstreamFetch {
            url: url.to_string(),
            status,
            message: message.into(),
        }
    }

    /// Stable variant name, reported as `details.name`
    pub fn name(&self) -> &'static str {
        match self {
            AppError::InvalidJson | AppError::PromptRequired => "RequestMalformed",
            AppError::InvalidDataUrl(_) => "InvalidFormat",
            AppError::UpstreamFetch { .. } => "UpstreamFetchError",
            AppError::Provider { .. } => "ProviderError",
            AppError::ExtractionEmpty => "ExtractionEmpty",
            AppError::Timeout(_) => "Timeout",
            AppError::Config(_) => "ConfigError",
            AppError::Io(_) => "IoError",
            AppError::Internal(_) => "InternalError",
        }
    }

    /// Coarse error category, reported as `details.type`
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidJson | AppError::PromptRequired | AppError::InvalidDataUrl(_) => {
                "invalid_request_error"
            }
            AppError::UpstreamFetch { .. } => "upstream_error",
            AppError::Provider { .. } if self.is_auth_failure() => "authentication_error",
            AppError::Provider { .. } => "provider_error",
            AppError::ExtractionEmpty => "extraction_error",
            AppError::Timeout(_) => "timeout_error",
            AppError::Config(_) | AppError::Io(_) | AppError::Internal(_) => "server_error",
        }
    }

    /// Provider errors count as auth failures when the upstream says so,
    /// either through its status or through the wording of its message.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            AppError::Provider {
                status, message, ..
            } => {
                if matches!(status, Some(401) | Some(403)) {
                    return true;
                }
                let message = message.to_lowercase();
                [
                    "permission",
                    "unauthorized",
                    "unauthenticated",
                    "forbidden",
                    "api key",
                    "api_key",
                    "authentication",
                ]
                .iter()
                .any(|needle| message.contains(needle))
            }
            _ => false,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidJson | AppError::PromptRequired | AppError::InvalidDataUrl(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::UpstreamFetch { .. } => StatusCode::BAD_GATEWAY,
            AppError::Provider { .. } if self.is_auth_failure() => StatusCode::UNAUTHORIZED,
            AppError::Provider { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ExtractionEmpty => StatusCode::BAD_GATEWAY,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Config(_) | AppError::Io(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Malformed requests get a fixed body without a correlation id.
    pub fn is_request_malformed(&self) -> bool {
        matches!(self, AppError::InvalidJson | AppError::PromptRequired)
    }

    fn upstream_status(&self) -> Option<u16> {
        match self {
            AppError::UpstreamFetch { status, .. } | AppError::Provider { status, .. } => *status,
            _ => None,
        }
    }

    fn upstream_code(&self) -> Option<String> {
        match self {
            AppError::Provider { code, .. } => code.clone(),
            _ => None,
        }
    }

    fn provider(&self) -> Option<String> {
        match self {
            AppError::Provider { provider, .. } => Some(provider.clone()),
            _ => None,
        }
    }

    fn cause(&self) -> Option<String> {
        match self {
            AppError::Config(e) => std::error::Error::source(e).map(|s| s.to_string()),
            AppError::Io(e) => e.get_ref().map(|s| s.to_string()),
            _ => None,
        }
    }

    pub fn details(&self) -> ErrorDetails {
        ErrorDetails {
            name: self.name().to_string(),
            message: self.to_string(),
            code: self.upstream_code(),
            status: self.upstream_status(),
            provider: self.provider(),
            r#type: self.kind().to_string(),
            cause: self.cause(),
        }
    }
}

/// Fixed body for malformed requests
#[derive(Serialize)]
pub struct MalformedResponse {
    pub error: String,
}

/// Failure envelope returned with a correlation id
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureResponse {
    pub error: String,
    pub error_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

/// Normalized, serializable error shape
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetails {
    pub name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    pub r#type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

/// An error bound to its correlation id, ready to be sent to the caller
pub struct ErrorReport {
    pub error: AppError,
    pub error_id: Uuid,
    pub expose_details: bool,
}

impl ErrorReport {
    pub fn new(error: AppError, expose_details: bool) -> Self {
        Self {
            error,
            error_id: Uuid::new_v4(),
            expose_details,
        }
    }
}

impl IntoResponse for ErrorReport {
    fn into_response(self) -> Response {
        let status = self.error.status_code();

        if self.error.is_request_malformed() {
            let body = Json(MalformedResponse {
                error: self.error.to_string(),
            });
            return (status, body).into_response();
        }

        let details = self.error.details();
        error!(
            error_id = %self.error_id,
            name = %details.name,
            status = status.as_u16(),
            upstream_status = ?details.status,
            provider = ?details.provider,
            code = ?details.code,
            at = %chrono::Utc::now().to_rfc3339(),
            "Request failed: {}",
            details.message
        );

        let error_id = self.error_id.to_string();
        let body = Json(FailureResponse {
            error: self.error.to_string(),
            error_id: error_id.clone(),
            details: self.expose_details.then_some(details),
        });

        let mut response = (status, body).into_response();
        let headers = response.headers_mut();
        if let Ok(value) = HeaderValue::from_str(&error_id) {
            headers.insert("x-error-id", value);
        }
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        response
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        ErrorReport::new(self, false).into_response()
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
