//! Client-side downscaling of oversized photos

use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, ImageFormat};
use std::io::Cursor;

use crate::media::ImagePayload;
use crate::upload::UploadError;

/// Scale factor that fits the longer side within `max_dimension`, never upscaling
pub fn scale_for(width: u32, height: u32, max_dimension: u32) -> f64 {
    let max_side = width.max(height) as f64;
    (max_dimension as f64 / max_side).min(1.0)
}

/// Target size for a downscale, or `None` when the image already fits
pub fn target_dimensions(width: u32, height: u32, max_dimension: u32) -> Option<(u32, u32)> {
    if width == 0 || height == 0 {
        return None;
    }
    let scale = scale_for(width, height, max_dimension);
    if scale >= 1.0 {
        return None;
    }
    let w = ((width as f64 * scale).round() as u32).max(1);
    let h = ((height as f64 * scale).round() as u32).max(1);
    Some((w, h))
}

#[derive(Debug, Clone, Copy)]
pub struct Downscaler {
    pub max_dimension: u32,
    /// JPEG quality, 1..=100
    pub quality: u8,
}

impl Downscaler {
    pub fn new(max_dimension: u32, quality: u8) -> Self {
        Self {
            max_dimension,
            quality,
        }
    }

    /// Shrink `input` so it fits `max_dimension`, re-encoding as `target_type`.
    ///
    /// Images that already fit come back untouched, bytes and media type.
    pub fn downscale(&self, input: ImagePayload, target_type: &str) -> Result<ImagePayload, UploadError> {
        let image = image::load_from_memory(&input.bytes)
            .map_err(|e| UploadError::Processing(format!("failed to load image: {}", e)))?;

        let Some((width, height)) =
            target_dimensions(image.width(), image.height(), self.max_dimension)
        else {
            return Ok(input);
        };

        let resized = image.resize_exact(width, height, FilterType::Lanczos3);
        self.encode(&resized, target_type)
    }

    fn encode(&self, image: &DynamicImage, target_type: &str) -> Result<ImagePayload, UploadError> {
        let mut buf = Vec::new();
        let media_type = match target_type.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => {
                let rgb = image.to_rgb8();
                JpegEncoder::new_with_quality(&mut buf, self.quality)
                    .encode_image(&rgb)
                    .map_err(|e| UploadError::Processing(format!("jpeg encode failed: {}", e)))?;
                "image/jpeg"
            }
            "image/webp" => {
                let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
                rgba.write_to(&mut Cursor::new(&mut buf), ImageFormat::WebP)
                    .map_err(|e| UploadError::Processing(format!("webp encode failed: {}", e)))?;
                "image/webp"
            }
            // Anything else is exported as PNG
            _ => {
                image
                    .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
                    .map_err(|e| UploadError::Processing(format!("png encode failed: {}", e)))?;
                "image/png"
            }
        };
        Ok(ImagePayload::new(buf, media_type))
    }
}
