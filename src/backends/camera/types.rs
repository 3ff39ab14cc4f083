// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use crate::constants::flash::AUTO_FLASH_LUMINANCE_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Camera backend type
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum CameraBackendType {
    /// Animated test pattern, always available
    #[default]
    Synthetic,
    /// A still image file acting as the sensor
    File,
    /// Real camera through GStreamer (requires the `gstreamer` feature)
    #[value(name = "gstreamer")]
    GStreamer,
}

impl std::fmt::Display for CameraBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraBackendType::Synthetic => write!(f, "synthetic"),
            CameraBackendType::File => write!(f, "file"),
            CameraBackendType::GStreamer => write!(f, "GStreamer"),
        }
    }
}

/// Physical position of a camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DevicePosition {
    Front,
    Back,
    External,
    #[default]
    Unspecified,
}

/// Represents a camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub name: String,
    pub path: String, // Backend-specific identifier (file path, GStreamer device name)
    pub position: DevicePosition,
    /// Largest still resolution the device can deliver
    pub max_width: u32,
    pub max_height: u32,
}

/// Pixel format for camera frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    RGBA,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            PixelFormat::RGBA => 4,
        }
    }
}

/// A single preview frame
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
    pub format: PixelFormat,
    pub stride: u32,
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Build an RGBA frame from tightly packed pixel data
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
            format: PixelFormat::RGBA,
            stride: width * PixelFormat::RGBA.bytes_per_pixel(),
            captured_at: Instant::now(),
        }
    }

    /// Mean luminance of the frame in the range 0.0-1.0 (BT.601 weights)
    ///
    /// Samples every 16th pixel, which is plenty for an exposure decision.
    pub fn mean_luminance(&self) -> f32 {
        let mut sum = 0.0f64;
        let mut count = 0u64;
        for px in self.data.chunks_exact(4).step_by(16) {
            sum += 0.299 * px[0] as f64 + 0.587 * px[1] as f64 + 0.114 * px[2] as f64;
            count += 1;
        }
        if count == 0 {
            return 0.0;
        }
        (sum / count as f64 / 255.0) as f32
    }
}

/// Frame sender type for preview delivery
pub type FrameSender = futures::channel::mpsc::Sender<CameraFrame>;

/// Frame receiver type for preview delivery
pub type FrameReceiver = futures::channel::mpsc::Receiver<CameraFrame>;

/// Flash mode for a still capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashMode {
    Off,
    On,
    /// Fire only when the scene is dark
    #[default]
    Auto,
}

impl FlashMode {
    /// Decide whether the flash fires for a scene of the given mean luminance
    pub fn fires(&self, scene_luminance: f32) -> bool {
        match self {
            FlashMode::Off => false,
            FlashMode::On => true,
            FlashMode::Auto => scene_luminance < AUTO_FLASH_LUMINANCE_THRESHOLD,
        }
    }
}

/// One-shot capture configuration, built fresh for every shutter press
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoSettings {
    /// Unique id of the capture request
    pub id: Uuid,
    pub auto_still_image_stabilization: bool,
    pub high_resolution: bool,
    pub flash_mode: FlashMode,
}

impl PhotoSettings {
    /// Plain settings: no stabilization, preview resolution, flash off
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            auto_still_image_stabilization: false,
            high_resolution: false,
            flash_mode: FlashMode::Off,
        }
    }

    /// Settings used by the shutter: stabilization on, highest resolution, auto flash
    pub fn for_shutter() -> Self {
        Self {
            auto_still_image_stabilization: true,
            high_resolution: true,
            flash_mode: FlashMode::Auto,
            ..Self::new()
        }
    }
}

impl Default for PhotoSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings actually applied by the device for a capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPhotoSettings {
    pub id: Uuid,
    pub width: u32,
    pub height: u32,
    pub flash_fired: bool,
    pub stabilized: bool,
}

/// Result of a successful still capture
#[derive(Debug, Clone)]
pub struct CapturedPhoto {
    /// Encoded image bytes (JPEG); `None` when the device produced no primary image
    pub data: Option<Vec<u8>>,
    pub resolved: ResolvedPhotoSettings,
}

impl CapturedPhoto {
    /// Encoded bytes of the primary image, if any
    pub fn file_data_representation(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }
}

/// Value delivered to the completion callback of a capture request
pub type PhotoCaptureResult = Result<CapturedPhoto, BackendError>;

/// Backend errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Device not found
    DeviceNotFound(String),
    /// Device is already in use
    DeviceBusy,
    /// Access to the device was denied
    PermissionDenied,
    /// Failed to initialize
    InitializationFailed(String),
    /// The device is not delivering frames
    NotRunning,
    /// Still capture failed
    CaptureFailed(String),
    /// Other error
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::DeviceBusy => write!(f, "Device is busy"),
            BackendError::PermissionDenied => write!(f, "Permission denied"),
            BackendError::InitializationFailed(msg) => {
                write!(f, "Initialization failed: {}", msg)
            }
            BackendError::NotRunning => write!(f, "Device is not running"),
            BackendError::CaptureFailed(msg) => write!(f, "Capture failed: {}", msg),
            BackendError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutter_settings() {
        let settings = PhotoSettings::for_shutter();
        assert!(settings.auto_still_image_stabilization);
        assert!(settings.high_resolution);
        assert_eq!(settings.flash_mode, FlashMode::Auto);
    }

    #[test]
    fn test_settings_ids_are_unique() {
        assert_ne!(PhotoSettings::for_shutter().id, PhotoSettings::for_shutter().id);
    }

    #[test]
    fn test_auto_flash_fires_only_in_the_dark() {
        assert!(FlashMode::Auto.fires(0.05));
        assert!(!FlashMode::Auto.fires(0.8));
        assert!(FlashMode::On.fires(0.8));
        assert!(!FlashMode::Off.fires(0.0));
    }

    #[test]
    fn test_mean_luminance() {
        let white = CameraFrame::from_rgba(8, 8, vec![255; 8 * 8 * 4]);
        assert!((white.mean_luminance() - 1.0).abs() < 0.01);

        let black = CameraFrame::from_rgba(8, 8, vec![0; 8 * 8 * 4]);
        assert_eq!(black.mean_luminance(), 0.0);
    }
}
