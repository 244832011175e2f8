//! Pre-processing checks on a selected file

use crate::upload::{SelectedFile, UploadError};

/// Media types the picker accepts
pub const ALLOWED_TYPES: [&str; 6] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "image/heic",
    "image/heif",
];

/// `accept` attribute for the file input
pub fn accept_attribute() -> String {
    ALLOWED_TYPES.join(",")
}

pub fn is_allowed(media_type: &str) -> bool {
    let media_type = media_type.to_ascii_lowercase();
    ALLOWED_TYPES.contains(&media_type.as_str())
}

pub fn is_heic(media_type: &str) -> bool {
    matches!(media_type.to_ascii_lowercase().as_str(), "image/heic" | "image/heif")
}

/// Reject files of the wrong type or above `max_bytes`
pub fn validate(file: &SelectedFile, max_bytes: usize) -> Result<(), UploadError> {
    if !is_allowed(&file.media_type) {
        return Err(UploadError::UnsupportedType {
            media_type: file.media_type.clone(),
            limit: max_bytes,
        });
    }
    if file.size() > max_bytes {
        return Err(UploadError::FileTooLarge {
            size: file.size(),
            limit: max_bytes,
        });
    }
    Ok(())
}
