// SPDX-License-Identifier: GPL-3.0-only

//! Image file acting as a camera sensor
//!
//! The file is decoded once when the input is opened. The preview stream
//! repeats a downscaled copy; stills use the full image.

use super::types::*;
use super::{CameraBackend, DeviceInput};
use crate::constants::{file_formats, pipeline, synthetic};
use crate::pipelines::photo::encoding::{EncodingQuality, encode_jpeg};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Brightness boost applied when the (simulated) flash fires
const FLASH_BOOST: i32 = 60;

/// Backend exposing one image file as a camera
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    fn is_supported(path: &Path) -> bool {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        file_formats::is_image_extension(&extension)
    }
}

impl CameraBackend for FileBackend {
    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::File
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        if !self.path.is_file() || !Self::is_supported(&self.path) {
            debug!(path = %self.path.display(), "Source file missing or unsupported");
            return Vec::new();
        }

        let (max_width, max_height) = image::image_dimensions(&self.path).unwrap_or((0, 0));
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "Image".to_string());

        vec![CameraDevice {
            name,
            path: self.path.display().to_string(),
            position: DevicePosition::External,
            max_width,
            max_height,
        }]
    }

    fn open_input(&self, device: &CameraDevice) -> BackendResult<Box<dyn DeviceInput>> {
        let image = image::open(&device.path).map_err(|e| {
            BackendError::InitializationFailed(format!("{}: {}", device.path, e))
        })?;

        info!(
            path = %device.path,
            width = image.width(),
            height = image.height(),
            "Opened image file as camera"
        );

        let preview = image.thumbnail(synthetic::PREVIEW_WIDTH, synthetic::PREVIEW_HEIGHT);
        Ok(Box::new(FileInput {
            device: device.clone(),
            image,
            preview: CameraFrame::from_rgba(
                preview.width(),
                preview.height(),
                preview.to_rgba8().into_raw(),
            ),
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }))
    }
}

/// Opened image-file camera
pub struct FileInput {
    device: CameraDevice,
    image: DynamicImage,
    preview: CameraFrame,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl DeviceInput for FileInput {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn start(&mut self, mut preview: FrameSender) -> BackendResult<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let running = Arc::clone(&self.running);
        let frame = self.preview.clone();
        let frame_interval = Duration::from_secs_f64(1.0 / pipeline::DEFAULT_PREVIEW_FPS as f64);

        let worker = std::thread::Builder::new()
            .name("file-camera".to_string())
            .spawn(move || {
                while running.load(Ordering::SeqCst) {
                    // Frames share the pixel buffer, only the Arc is cloned
                    if let Err(e) = preview.try_send(frame.clone())
                        && e.is_disconnected()
                    {
                        break;
                    }
                    std::thread::sleep(frame_interval);
                }
                running.store(false, Ordering::SeqCst);
            })
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?;

        self.worker = Some(worker);
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            warn!("File camera thread panicked");
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn supports_video_orientation(&self) -> bool {
        false
    }

    fn capture_still(&mut self, settings: &PhotoSettings) -> BackendResult<CapturedPhoto> {
        if !self.is_running() {
            return Err(BackendError::NotRunning);
        }

        let source = if settings.high_resolution {
            self.image.clone()
        } else {
            DynamicImage::ImageRgba8(
                image::RgbaImage::from_raw(
                    self.preview.width,
                    self.preview.height,
                    self.preview.data.to_vec(),
                )
                .ok_or_else(|| BackendError::CaptureFailed("preview size mismatch".into()))?,
            )
        };

        let flash_fired = settings.flash_mode.fires(self.preview.mean_luminance());
        let still = if flash_fired {
            source.brighten(FLASH_BOOST)
        } else {
            source
        };

        let rgb = still.to_rgb8();
        let data = encode_jpeg(&rgb, EncodingQuality::High)
            .map_err(|e| BackendError::CaptureFailed(e.to_string()))?;

        Ok(CapturedPhoto {
            data: Some(data),
            resolved: ResolvedPhotoSettings {
                id: settings.id,
                width: rgb.width(),
                height: rgb.height(),
                flash_fired,
                stabilized: settings.auto_still_image_stabilization,
            },
        })
    }
}

impl Drop for FileInput {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_source(name: &str, width: u32, height: u32) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("shuttercam-file-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        image::RgbImage::from_pixel(width, height, image::Rgb([200, 180, 160]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_missing_file_has_no_device() {
        let backend = FileBackend::new(Path::new("/nonexistent/shuttercam.png"));
        assert!(backend.default_device().is_none());
    }

    #[test]
    fn test_unsupported_extension_has_no_device() {
        let path = write_source("source.png", 4, 4);
        let text = path.with_extension("txt");
        std::fs::copy(&path, &text).unwrap();
        assert!(FileBackend::new(&text).default_device().is_none());
    }

    #[test]
    fn test_still_uses_full_image() {
        let path = write_source("source.png", 800, 600);
        let backend = FileBackend::new(&path);
        let device = backend.default_device().unwrap();
        assert_eq!((device.max_width, device.max_height), (800, 600));

        let mut input = backend.open_input(&device).unwrap();
        assert!(!input.supports_video_orientation());
        let (tx, _rx) = futures::channel::mpsc::channel(1);
        input.start(tx).unwrap();

        let photo = input.capture_still(&PhotoSettings::for_shutter()).unwrap();
        input.stop();

        assert_eq!((photo.resolved.width, photo.resolved.height), (800, 600));
        assert!(!photo.resolved.flash_fired);
    }
}
