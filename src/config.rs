// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Read from an optional JSON file. Every field has a default, so a partial
//! file (or no file at all) yields a usable configuration.

use crate::backends::camera::synthetic::SyntheticBackend;
use crate::backends::camera::{
    BackendResult, CameraBackend, CameraBackendType, get_backend_for_type,
};
use crate::constants::{DEFAULT_SAVE_FOLDER, pipeline};
use crate::errors::{AppError, AppResult};
use crate::pipelines::photo::{EncodingFormat, EncodingQuality, PhotoEncoder};
use crate::storage::get_photo_directory;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Folder under the Pictures directory that receives saved photos
    pub save_folder: String,
    /// File format of saved photos
    pub photo_format: EncodingFormat,
    /// JPEG quality preset
    pub photo_quality: EncodingQuality,
    /// Camera backend to use
    pub backend: CameraBackendType,
    /// Image used as the sensor by the file backend
    pub source_path: Option<PathBuf>,
    /// Preview framerate of the synthetic backend
    pub preview_fps: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            save_folder: DEFAULT_SAVE_FOLDER.to_string(),
            photo_format: EncodingFormat::default(),
            photo_quality: EncodingQuality::default(),
            backend: CameraBackendType::default(),
            source_path: None,
            preview_fps: pipeline::DEFAULT_PREVIEW_FPS,
        }
    }
}

impl Config {
    /// Load the configuration file at `path`
    ///
    /// No path, or a path that does not exist, gives the defaults. A file
    /// that exists but cannot be read or parsed is an error.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let Some(path) = path else {
            debug!("No config file given, using defaults");
            return Ok(Self::default());
        };
        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_json(&contents)?;
        info!(path = %path.display(), backend = %config.backend, "Loaded config");
        Ok(config)
    }

    /// Parse a JSON document
    pub fn from_json(contents: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Directory saved photos are written to
    pub fn photo_directory(&self) -> PathBuf {
        get_photo_directory(&self.save_folder)
    }

    /// Encoder configured with the photo format and quality
    pub fn encoder(&self) -> PhotoEncoder {
        PhotoEncoder::new()
            .with_format(self.photo_format)
            .with_quality(self.photo_quality)
    }

    /// Construct the configured camera backend
    pub fn create_backend(&self) -> BackendResult<Box<dyn CameraBackend>> {
        match self.backend {
            CameraBackendType::Synthetic => {
                Ok(Box::new(SyntheticBackend::new().with_fps(self.preview_fps)))
            }
            other => get_backend_for_type(other, self.source_path.as_deref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = Config::from_json(r#"{ "photo_format": "png" }"#).unwrap();
        assert_eq!(config.photo_format, EncodingFormat::Png);
        assert_eq!(config.save_folder, "ShutterCam");
        assert_eq!(config.encoder().format(), EncodingFormat::Png);
    }

    #[test]
    fn test_synthetic_backend_from_default_config() {
        let backend = Config::default().create_backend().unwrap();
        assert_eq!(backend.backend_type(), CameraBackendType::Synthetic);
    }
}
