//! Image extraction from model responses
//!
//! Providers answer in different shapes: binary file parts, base64 text, byte
//! arrays or plain prose. Each strategy below looks at one shape; they are
//! tried in order and the first hit wins.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::Value;

use crate::backend::traits::{ModelFile, ModelResponse};
use crate::media::{data_url, sniff, ImagePayload, DEFAULT_IMAGE_TYPE};

/// Outcome of looking for an image in a model response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageExtraction {
    Found(ImagePayload),
    /// Text that already was a data URL, returned as-is
    Verbatim(String),
    NotFound,
}

impl ImageExtraction {
    pub fn into_data_url(self) -> Option<String> {
        match self {
            Self::Found(payload) => Some(payload.to_data_url()),
            Self::Verbatim(url) => Some(url),
            Self::NotFound => None,
        }
    }
}

type Strategy = fn(&ModelResponse) -> Option<ImageExtraction>;

/// Strategies in the order they are tried
pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("file_base64", file_base64),
    ("file_bytes", file_bytes),
    ("text_data_url", text_data_url),
    ("text_base64", text_base64),
    ("text_byte_array", text_byte_array),
    ("text_opaque", text_opaque),
];

/// Run every strategy in order until one produces an image
pub fn extract(response: &ModelResponse) -> ImageExtraction {
    for (name, strategy) in STRATEGIES {
        if let Some(found) = strategy(response) {
            tracing::debug!(strategy = %name, "Extracted image from model response");
            return found;
        }
    }
    ImageExtraction::NotFound
}

fn image_files(response: &ModelResponse) -> impl Iterator<Item = &ModelFile> {
    response
        .files
        .iter()
        .filter(|f| f.media_type.starts_with("image/"))
}

fn file_base64(response: &ModelResponse) -> Option<ImageExtraction> {
    let file = image_files(response).next()?;
    let encoded = file.base64.as_deref()?;
    let bytes = STANDARD.decode(encoded.trim()).ok().filter(|b| !b.is_empty())?;
    Some(ImageExtraction::Found(ImagePayload::new(bytes, file.media_type.clone())))
}

fn file_bytes(response: &ModelResponse) -> Option<ImageExtraction> {
    let file = image_files(response).next()?;
    let bytes = file.bytes.clone().filter(|b| !b.is_empty())?;
    Some(ImageExtraction::Found(ImagePayload::new(bytes, file.media_type.clone())))
}

fn text_str(response: &ModelResponse) -> Option<&str> {
    match response.text.as_ref()? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim()),
        _ => None,
    }
}

fn sniffed(bytes: Vec<u8>) -> ImageExtraction {
    let media_type = sniff(&bytes).unwrap_or(DEFAULT_IMAGE_TYPE);
    ImageExtraction::Found(ImagePayload::new(bytes, media_type))
}

/// Leading whitespace is dropped; the rest of the text is kept as-is
fn text_data_url(response: &ModelResponse) -> Option<ImageExtraction> {
    let text = match response.text.as_ref()? {
        Value::String(s) => s.trim_start(),
        _ => return None,
    };
    data_url::is_data_url(text).then(|| ImageExtraction::Verbatim(text.to_string()))
}

fn text_base64(response: &ModelResponse) -> Option<ImageExtraction> {
    let text = text_str(response)?;
    let bytes = STANDARD.decode(text).ok().filter(|b| !b.is_empty())?;
    Some(sniffed(bytes))
}

fn text_byte_array(response: &ModelResponse) -> Option<ImageExtraction> {
    let items = match response.text.as_ref()? {
        Value::Array(items) if !items.is_empty() => items,
        _ => return None,
    };
    let bytes = items
        .iter()
        .map(|v| v.as_u64().and_then(|n| u8::try_from(n).ok()))
        .collect::<Option<Vec<u8>>>()?;
    Some(sniffed(bytes))
}

fn text_opaque(response: &ModelResponse) -> Option<ImageExtraction> {
    let bytes = match response.text.as_ref()? {
        Value::Null => return None,
        Value::String(s) if s.trim().is_empty() => return None,
        Value::String(s) => s.trim().as_bytes().to_vec(),
        other => other.to_string().into_bytes(),
    };
    Some(ImageExtraction::Found(ImagePayload::new(bytes, DEFAULT_IMAGE_TYPE)))
}
