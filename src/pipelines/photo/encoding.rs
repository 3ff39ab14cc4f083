// SPDX-License-Identifier: GPL-3.0-only

//! Photo encoding and saving
//!
//! This module handles encoding processed images to:
//! - JPEG (with quality control)
//! - PNG (lossless)
//!
//! and writing them to timestamped files in the photo library directory.

use crate::errors::PhotoError;
use image::{ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Supported encoding formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingFormat {
    /// JPEG format (lossy compression)
    #[default]
    Jpeg,
    /// PNG format (lossless compression)
    Png,
}

impl EncodingFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            EncodingFormat::Jpeg => "jpg",
            EncodingFormat::Png => "png",
        }
    }
}

/// Encoding quality settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingQuality {
    /// Low quality (high compression)
    Low,
    /// Medium quality (balanced)
    Medium,
    /// High quality (low compression)
    #[default]
    High,
    /// Maximum quality (minimal compression)
    Maximum,
}

impl EncodingQuality {
    /// Get JPEG quality value (0-100)
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            EncodingQuality::Low => 60,
            EncodingQuality::Medium => 80,
            EncodingQuality::High => 92,
            EncodingQuality::Maximum => 98,
        }
    }
}

/// Encoded image data ready for saving
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub format: EncodingFormat,
    pub width: u32,
    pub height: u32,
}

/// Encode an RGB image as JPEG
pub fn encode_jpeg(image: &RgbImage, quality: EncodingQuality) -> Result<Vec<u8>, PhotoError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);

    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality.jpeg_quality());

    encoder
        .encode(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| PhotoError::EncodingFailed(format!("JPEG: {}", e)))?;

    Ok(buffer)
}

/// Encode an RGB image as PNG
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, PhotoError> {
    let mut buffer = Vec::new();

    image
        .write_to(&mut std::io::Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| PhotoError::EncodingFailed(format!("PNG: {}", e)))?;

    Ok(buffer)
}

/// Photo encoder
#[derive(Debug, Clone, Copy, Default)]
pub struct PhotoEncoder {
    format: EncodingFormat,
    quality: EncodingQuality,
}

impl PhotoEncoder {
    /// Create a new encoder with JPEG format and high quality
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, format: EncodingFormat) -> Self {
        self.format = format;
        self
    }

    /// Set encoding quality (only affects JPEG)
    pub fn with_quality(mut self, quality: EncodingQuality) -> Self {
        self.quality = quality;
        self
    }

    pub fn format(&self) -> EncodingFormat {
        self.format
    }

    /// Encode an image in the configured format
    pub fn encode(&self, image: &RgbImage) -> Result<EncodedImage, PhotoError> {
        let data = match self.format {
            EncodingFormat::Jpeg => encode_jpeg(image, self.quality)?,
            EncodingFormat::Png => encode_png(image)?,
        };

        debug!(size = data.len(), format = ?self.format, "Encoding complete");

        Ok(EncodedImage {
            data,
            format: self.format,
            width: image.width(),
            height: image.height(),
        })
    }

    /// Encode and save in a background task
    ///
    /// # Returns
    /// * `Ok(PathBuf)` - Path to saved file
    /// * `Err(PhotoError)` - Encoding or I/O failure
    pub async fn encode_and_save(
        &self,
        image: RgbImage,
        output_dir: PathBuf,
    ) -> Result<PathBuf, PhotoError> {
        let encoder = *self;
        tokio::task::spawn_blocking(move || {
            let encoded = encoder.encode(&image)?;
            save(&encoded, &output_dir)
        })
        .await
        .map_err(|e| PhotoError::SaveFailed(format!("save task error: {}", e)))?
    }
}

/// Write an encoded image to a new timestamped file in `output_dir`
///
/// Names follow `IMG_<YYYYmmdd_HHMMSS>.<ext>`; captures within the same
/// second get a `_<n>` suffix. Existing files are never overwritten.
pub fn save(encoded: &EncodedImage, output_dir: &Path) -> Result<PathBuf, PhotoError> {
    std::fs::create_dir_all(output_dir)?;

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let extension = encoded.format.extension();

    for n in 0u32.. {
        let filename = if n == 0 {
            format!("IMG_{}.{}", timestamp, extension)
        } else {
            format!("IMG_{}_{}.{}", timestamp, n, extension)
        };
        let filepath = output_dir.join(&filename);

        let mut file = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&filepath)
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        };

        file.write_all(&encoded.data)?;
        info!(
            path = %filepath.display(),
            width = encoded.width,
            height = encoded.height,
            "Photo saved"
        );
        return Ok(filepath);
    }

    Err(PhotoError::SaveFailed("no free file name".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_image() -> RgbImage {
        RgbImage::from_pixel(16, 8, image::Rgb([10, 120, 240]))
    }

    #[test]
    fn test_format_extensions() {
        assert_eq!(EncodingFormat::Jpeg.extension(), "jpg");
        assert_eq!(EncodingFormat::Png.extension(), "png");
    }

    #[test]
    fn test_jpeg_quality_values() {
        assert_eq!(EncodingQuality::Low.jpeg_quality(), 60);
        assert_eq!(EncodingQuality::Medium.jpeg_quality(), 80);
        assert_eq!(EncodingQuality::High.jpeg_quality(), 92);
        assert_eq!(EncodingQuality::Maximum.jpeg_quality(), 98);
    }

    #[test]
    fn test_jpeg_decodes_back() {
        let data = encode_jpeg(&test_image(), EncodingQuality::High).unwrap();
        let decoded = image::load_from_memory(&data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
    }

    #[test]
    fn test_save_never_overwrites() {
        let dir = std::env::temp_dir().join(format!("shuttercam-save-{}", uuid::Uuid::new_v4()));
        let encoded = PhotoEncoder::new()
            .with_format(EncodingFormat::Png)
            .encode(&test_image())
            .unwrap();

        let first = save(&encoded, &dir).unwrap();
        let second = save(&encoded, &dir).unwrap();

        assert_ne!(first, second);
        assert!(first.exists() && second.exists());
        assert_eq!(second.extension().unwrap(), "png");
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
