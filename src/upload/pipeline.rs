//! Upload state machine

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::UploadConfig;
use crate::media::{data_url, ImagePayload};
use crate::upload::downscale::Downscaler;
use crate::upload::slot::UploadSlot;
use crate::upload::transcode::{CommandTranscoder, HeicTranscoder};
use crate::upload::validate;
use crate::upload::{SelectedFile, UploadError};

/// Element id of the generator section
pub const GENERATOR_ANCHOR: &str = "make-shot";

/// Where the pipeline currently is for the last selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    Validating,
    Busy,
    Transcoding,
    Downscaling,
    Encoding,
    Published,
    Failed,
}

/// Brings the generator into view after the first upload
pub trait GeneratorFocus: Send + Sync {
    /// Returns `false` when the anchor is not on the page
    fn scroll_into_view(&self, anchor: &str) -> bool;

    fn set_location_hash(&self, anchor: &str);
}

/// Focus handler for headless use
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFocus;

impl GeneratorFocus for NoFocus {
    fn scroll_into_view(&self, _anchor: &str) -> bool {
        false
    }

    fn set_location_hash(&self, _anchor: &str) {}
}

/// Result of a successful selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub data_url: String,
    pub media_type: String,
    pub size: usize,
    pub transcoded: bool,
}

pub struct UploadPipeline {
    config: UploadConfig,
    slot: UploadSlot,
    transcoder: Arc<dyn HeicTranscoder>,
    downscaler: Downscaler,
    focus: Arc<dyn GeneratorFocus>,
    state: Mutex<UploadState>,
    busy: AtomicBool,
    focused: AtomicBool,
}

/// Clears the busy flag when processing ends, however it ends
pub(crate) struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    /// Raise `flag`, or return `None` if it is already raised
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl UploadPipeline {
    /// Pipeline with its own slot, sized by the configured storage capacity
    pub fn from_config(config: UploadConfig) -> Self {
        let slot = UploadSlot::from_config(&config);
        Self::new(config, slot)
    }

    /// Pipeline using the configured external HEIC converter
    pub fn new(config: UploadConfig, slot: UploadSlot) -> Self {
        let transcoder = Arc::new(CommandTranscoder::new(config.heic_command.clone()));
        Self::with_parts(config, slot, transcoder, Arc::new(NoFocus))
    }

    pub fn with_parts(
        config: UploadConfig,
        slot: UploadSlot,
        transcoder: Arc<dyn HeicTranscoder>,
        focus: Arc<dyn GeneratorFocus>,
    ) -> Self {
        let downscaler = Downscaler::new(config.max_dimension, config.downscale_quality);
        Self {
            config,
            slot,
            transcoder,
            downscaler,
            focus,
            state: Mutex::new(UploadState::Idle),
            busy: AtomicBool::new(false),
            focused: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> UploadState {
        *self.state.lock()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn slot(&self) -> &UploadSlot {
        &self.slot
    }

    fn set_state(&self, state: UploadState) {
        debug!(?state, "Upload state");
        *self.state.lock() = state;
    }

    /// Process a selected file and publish it to the slot.
    ///
    /// Rejections and failures leave the slot as it was.
    pub async fn select(&self, file: SelectedFile) -> Result<UploadOutcome, UploadError> {
        let _guard = BusyGuard::acquire(&self.busy).ok_or(UploadError::Busy)?;

        let result = self.process(file).await;
        match &result {
            Ok(outcome) => {
                self.set_state(UploadState::Published);
                info!(media_type = %outcome.media_type, size = outcome.size, "Upload published");
                self.focus_generator();
            }
            Err(error) => {
                self.set_state(UploadState::Failed);
                warn!(error = ?error, "Upload rejected: {}", error);
            }
        }
        result
    }

    async fn process(&self, file: SelectedFile) -> Result<UploadOutcome, UploadError> {
        self.set_state(UploadState::Validating);
        validate::validate(&file, self.config.max_bytes)?;

        self.set_state(UploadState::Busy);
        let transcoded = validate::is_heic(&file.media_type);
        let mut payload = ImagePayload::new(file.bytes, file.media_type.to_ascii_lowercase());

        if transcoded {
            self.set_state(UploadState::Transcoding);
            let jpeg = self
                .transcoder
                .to_jpeg(&payload.bytes, self.config.heic_quality)
                .await?;
            payload = ImagePayload::new(jpeg, "image/jpeg");
        }

        self.set_state(UploadState::Downscaling);
        let downscaler = self.downscaler;
        let target_type = payload.media_type.clone();
        let payload = tokio::task::spawn_blocking(move || downscaler.downscale(payload, &target_type))
            .await
            .map_err(|e| UploadError::Processing(format!("downscale task failed: {}", e)))??;

        if payload.len() > self.config.max_bytes {
            return Err(UploadError::ProcessedTooLarge {
                size: payload.len(),
                limit: self.config.max_bytes,
            });
        }

        self.set_state(UploadState::Encoding);
        let data_url = data_url::encode(&payload.bytes, &payload.media_type);
        self.slot.store(data_url.clone())?;

        Ok(UploadOutcome {
            data_url,
            size: payload.len(),
            media_type: payload.media_type,
            transcoded,
        })
    }

    fn focus_generator(&self) {
        if self.focused.swap(true, Ordering::AcqRel) {
            return;
        }
        if !self.focus.scroll_into_view(GENERATOR_ANCHOR) {
            self.focus.set_location_hash(GENERATOR_ANCHOR);
        }
    }

    /// Forget the current upload
    pub fn reset(&self) {
        self.slot.clear();
        self.set_state(UploadState::Idle);
    }
}
