// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! ```text
//! ┌─────────────────────┐
//! │  CameraController   │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │   CaptureSession    │  ← input + photo output + metadata output
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CameraBackend Trait │  ← device discovery, input construction
//! └──────────┬──────────┘
//!            │
//!      ┌─────┴─────┬───────────┐
//!      ▼           ▼           ▼
//! ┌─────────┐ ┌────────┐ ┌───────────┐
//! │Synthetic│ │  File  │ │ GStreamer │
//! └─────────┘ └────────┘ └───────────┘
//! ```

pub mod file_source;
#[cfg(feature = "gstreamer")]
pub mod gst_source;
pub mod session;
pub mod synthetic;
pub mod types;

pub use session::{CaptureSession, MetadataOutput, PhotoOutput};
pub use types::*;

use std::path::Path;

/// Camera hardware collaborator
///
/// Backends discover devices and construct device inputs. Everything after
/// input construction goes through [`DeviceInput`].
pub trait CameraBackend: Send + Sync {
    /// Get the backend type identifier
    fn backend_type(&self) -> CameraBackendType;

    /// Enumerate available cameras on this backend
    fn enumerate_cameras(&self) -> Vec<CameraDevice>;

    /// The default video-capable device, if any
    fn default_device(&self) -> Option<CameraDevice> {
        self.enumerate_cameras().into_iter().next()
    }

    /// Construct an input for the given device
    ///
    /// Fails when the device is busy, access is denied or it vanished.
    fn open_input(&self, device: &CameraDevice) -> BackendResult<Box<dyn DeviceInput>>;
}

/// An opened camera device feeding a capture session
pub trait DeviceInput: Send {
    /// The device this input was constructed from
    fn device(&self) -> &CameraDevice;

    /// Start continuous frame delivery to the preview sender
    ///
    /// Must return promptly; frame production happens on the backend's own thread.
    fn start(&mut self, preview: FrameSender) -> BackendResult<()>;

    /// Stop frame delivery and release the hardware
    fn stop(&mut self);

    /// Check if frames are currently being delivered
    fn is_running(&self) -> bool;

    /// Whether the preview connection accepts orientation changes
    fn supports_video_orientation(&self) -> bool {
        true
    }

    /// Capture a single still image (blocking)
    ///
    /// The returned photo carries JPEG bytes and the settings actually applied.
    fn capture_still(&mut self, settings: &PhotoSettings) -> BackendResult<CapturedPhoto>;
}

/// Create a backend instance for the given type
///
/// `source` is the image file used by the file backend.
pub fn get_backend_for_type(
    backend_type: CameraBackendType,
    source: Option<&Path>,
) -> BackendResult<Box<dyn CameraBackend>> {
    match backend_type {
        CameraBackendType::Synthetic => Ok(Box::new(synthetic::SyntheticBackend::new())),
        CameraBackendType::File => {
            let path = source.ok_or_else(|| {
                BackendError::InitializationFailed(
                    "the file backend needs a source image".to_string(),
                )
            })?;
            Ok(Box::new(file_source::FileBackend::new(path)))
        }
        #[cfg(feature = "gstreamer")]
        CameraBackendType::GStreamer => Ok(Box::new(gst_source::GStreamerBackend::new()?)),
        #[cfg(not(feature = "gstreamer"))]
        CameraBackendType::GStreamer => Err(BackendError::InitializationFailed(
            "built without GStreamer support (enable the `gstreamer` feature)".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_backend_always_available() {
        let backend = get_backend_for_type(CameraBackendType::Synthetic, None).unwrap();
        assert_eq!(backend.backend_type(), CameraBackendType::Synthetic);
        assert!(backend.default_device().is_some());
    }

    #[test]
    fn test_file_backend_requires_source() {
        assert!(get_backend_for_type(CameraBackendType::File, None).is_err());
    }
}
