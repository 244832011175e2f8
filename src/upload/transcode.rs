//! HEIC/HEIF to JPEG transcoding

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::upload::UploadError;

/// Converts HEIC/HEIF bytes into JPEG bytes
#[async_trait]
pub trait HeicTranscoder: Send + Sync {
    async fn to_jpeg(&self, heic: &[u8], quality: u8) -> Result<Vec<u8>, UploadError>;
}

/// Runs an external converter with the `heif-convert -q <quality> <in> <out>`
/// calling convention.
#[derive(Debug, Clone)]
pub struct CommandTranscoder {
    program: String,
}

impl CommandTranscoder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

fn processing(context: &str, e: impl std::fmt::Display) -> UploadError {
    UploadError::Processing(format!("{}: {}", context, e))
}

#[async_trait]
impl HeicTranscoder for CommandTranscoder {
    async fn to_jpeg(&self, heic: &[u8], quality: u8) -> Result<Vec<u8>, UploadError> {
        let dir = tempfile::tempdir().map_err(|e| processing("staging directory", e))?;
        let input = dir.path().join("input.heic");
        let output = dir.path().join("output.jpg");

        tokio::fs::write(&input, heic)
            .await
            .map_err(|e| processing("staging input", e))?;

        let result = Command::new(&self.program)
            .arg("-q")
            .arg(quality.to_string())
            .arg(&input)
            .arg(&output)
            .output()
            .await
            .map_err(|e| processing(&format!("spawning {}", self.program), e))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            warn!(program = %self.program, status = %result.status, "HEIC conversion failed");
            return Err(processing("heic conversion", stderr.trim()));
        }

        let jpeg = tokio::fs::read(&output)
            .await
            .map_err(|e| processing("reading converted image", e))?;
        debug!(input = heic.len(), output = jpeg.len(), "Transcoded HEIC to JPEG");
        Ok(jpeg)
    }
}
