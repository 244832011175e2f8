//! Upload module - Photo selection, conversion and hand-off to the generator
//!
//! A selected photo goes through validation, optional HEIC transcoding and
//! optional downscaling, is encoded as a data URL and lands in the shared
//! [`slot::UploadSlot`], where the generator picks it up.

pub mod downscale;
pub mod pipeline;
pub mod slot;
pub mod transcode;
pub mod validate;

use thiserror::Error;

pub use pipeline::{GeneratorFocus, UploadOutcome, UploadPipeline, UploadState};
pub use slot::{Subscription, UploadSlot};

const MIB: usize = 1024 * 1024;

/// A file picked by the visitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    /// Declared media type, as reported by the picker
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Upload failures; `Display` is the message shown to the visitor
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("Please select a valid image (JPG, PNG, WebP, HEIC/HEIF) up to {}MB.", .limit / MIB)]
    UnsupportedType { media_type: String, limit: usize },

    #[error("Please select a valid image (JPG, PNG, WebP, HEIC/HEIF) up to {}MB.", .limit / MIB)]
    FileTooLarge { size: usize, limit: usize },

    #[error("Processed image exceeds {}MB. Please choose a smaller photo or crop it.", .limit / MIB)]
    ProcessedTooLarge { size: usize, limit: usize },

    #[error("Failed to process the image. Please try again.")]
    Processing(String),

    #[error("Unable to store image. Please try again or check if private browsing is enabled.")]
    Storage(String),

    #[error("An upload is already in progress.")]
    Busy,
}
