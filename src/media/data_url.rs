//! Data URL encoding and decoding

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::{AppError, Result};
use crate::media::ImagePayload;

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64";
const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Decode a `data:<mediaType>[;base64],<payload>` string
pub fn decode(data_url: &str) -> Result<ImagePayload> {
    let rest = data_url
        .strip_prefix(SCHEME)
        .ok_or_else(|| AppError::InvalidDataUrl("missing data: scheme".to_string()))?;
    let (header, body) = rest
        .split_once(',')
        .ok_or_else(|| AppError::InvalidDataUrl("missing header separator".to_string()))?;

    let (header, is_base64) = match header.strip_suffix(BASE64_MARKER) {
        Some(params) => (params, true),
        None => (header, false),
    };
    // Parameters such as `charset` are kept; only the base64 marker is dropped
    let media_type = if header.split(';').next().map_or(true, |mt| mt.trim().is_empty()) {
        FALLBACK_MEDIA_TYPE.to_string()
    } else {
        header.trim().to_string()
    };

    let bytes = if is_base64 {
        STANDARD
            .decode(body.trim())
            .map_err(|e| AppError::InvalidDataUrl(format!("invalid base64 payload: {}", e)))?
    } else {
        urlencoding::decode_binary(body.as_bytes()).into_owned()
    };

    Ok(ImagePayload { bytes, media_type })
}

/// Encode bytes as a base64 data URL
pub fn encode(bytes: &[u8], media_type: &str) -> String {
    format!("{}{}{},{}", SCHEME, media_type, BASE64_MARKER, STANDARD.encode(bytes))
}

pub fn is_data_url(value: &str) -> bool {
    value.starts_with(SCHEME)
}
