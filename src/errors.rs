// SPDX-License-Identifier: MPL-2.0

//! Error types for the camera application

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera-related errors
    Camera(CameraError),
    /// Photo capture errors
    Photo(PhotoError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Camera-specific errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// No video-capable camera device found (unrecoverable)
    NoCameraFound,
    /// Constructing the device input failed (device busy, permission denied)
    InputFailed(String),
}

/// Photo capture errors
///
/// Every variant is developer-facing: the failed capture is logged and the
/// save is skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoError {
    /// The capture completion reported an error
    CaptureFailed(String),
    /// The capture completed without primary image data
    MissingImageData,
    /// The delivered bytes could not be decoded into an image
    DecodeFailed(String),
    /// The filter produced no output image
    FilterFailed(String),
    /// The filtered image could not be rendered to a displayable image
    RenderFailed(String),
    /// Encoding failed
    EncodingFailed(String),
    /// Save failed
    SaveFailed(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Photo(e) => write!(f, "Photo error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::NoCameraFound => write!(f, "No video device found"),
            CameraError::InputFailed(msg) => write!(f, "Failed to open device input: {}", msg),
        }
    }
}

impl fmt::Display for PhotoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhotoError::CaptureFailed(msg) => write!(f, "Capture failed: {}", msg),
            PhotoError::MissingImageData => write!(f, "Capture delivered no image data"),
            PhotoError::DecodeFailed(msg) => write!(f, "Decoding failed: {}", msg),
            PhotoError::FilterFailed(name) => write!(f, "Filter '{}' produced no output", name),
            PhotoError::RenderFailed(msg) => write!(f, "Rendering failed: {}", msg),
            PhotoError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
            PhotoError::SaveFailed(msg) => write!(f, "Save failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for PhotoError {}

impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<PhotoError> for AppError {
    fn from(err: PhotoError) -> Self {
        AppError::Photo(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for PhotoError {
    fn from(err: std::io::Error) -> Self {
        PhotoError::SaveFailed(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_error_wraps_into_app_error() {
        let err: AppError = PhotoError::MissingImageData.into();
        assert_eq!(
            err.to_string(),
            "Photo error: Capture delivered no image data"
        );
    }

    #[test]
    fn test_input_failure_message() {
        let err = CameraError::InputFailed("Device is busy".to_string());
        assert_eq!(err.to_string(), "Failed to open device input: Device is busy");
    }

    #[test]
    fn test_io_error_is_storage_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(AppError::from(io), AppError::Storage(_)));
    }
}
