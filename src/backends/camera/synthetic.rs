// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic test-pattern camera
//!
//! Produces animated color bars with a moving luminance ramp. Always
//! available, which makes it the default backend on machines without a
//! camera and the device used by the unit tests.

use super::types::*;
use super::{CameraBackend, DeviceInput};
use crate::constants::{pipeline, synthetic};
use crate::pipelines::photo::encoding::{EncodingQuality, encode_jpeg};
use image::RgbImage;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// 75% color bars: white, yellow, cyan, green, magenta, red, blue
const BARS: [[u8; 3]; 7] = [
    [191, 191, 191],
    [191, 191, 0],
    [0, 191, 191],
    [0, 191, 0],
    [191, 0, 191],
    [191, 0, 0],
    [0, 0, 191],
];

/// Backend exposing a single test-pattern camera
#[derive(Debug, Clone)]
pub struct SyntheticBackend {
    /// Scene brightness multiplier (1.0 = normal exposure)
    brightness: f32,
    fps: u32,
}

impl SyntheticBackend {
    pub fn new() -> Self {
        Self {
            brightness: 1.0,
            fps: pipeline::DEFAULT_PREVIEW_FPS,
        }
    }

    /// Simulate a darker or brighter scene
    pub fn with_brightness(mut self, brightness: f32) -> Self {
        self.brightness = brightness.max(0.0);
        self
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps.max(1);
        self
    }

    fn device() -> CameraDevice {
        CameraDevice {
            name: "Test Pattern Camera".to_string(),
            path: "synthetic:0".to_string(),
            position: DevicePosition::Back,
            max_width: synthetic::SENSOR_WIDTH,
            max_height: synthetic::SENSOR_HEIGHT,
        }
    }
}

impl Default for SyntheticBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraBackend for SyntheticBackend {
    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::Synthetic
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        vec![Self::device()]
    }

    fn open_input(&self, device: &CameraDevice) -> BackendResult<Box<dyn DeviceInput>> {
        if device.path != Self::device().path {
            return Err(BackendError::DeviceNotFound(device.path.clone()));
        }
        Ok(Box::new(SyntheticInput {
            device: device.clone(),
            brightness: self.brightness,
            fps: self.fps,
            epoch: Instant::now(),
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }))
    }
}

/// Opened test-pattern camera
pub struct SyntheticInput {
    device: CameraDevice,
    brightness: f32,
    fps: u32,
    epoch: Instant,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl DeviceInput for SyntheticInput {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn start(&mut self, mut preview: FrameSender) -> BackendResult<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let running = Arc::clone(&self.running);
        let brightness = self.brightness;
        let epoch = self.epoch;
        let frame_interval = Duration::from_secs_f64(1.0 / self.fps as f64);

        let worker = std::thread::Builder::new()
            .name("synthetic-camera".to_string())
            .spawn(move || {
                info!("Synthetic camera streaming");
                while running.load(Ordering::SeqCst) {
                    let t = epoch.elapsed().as_secs_f32();
                    let data = render_pattern(
                        synthetic::PREVIEW_WIDTH,
                        synthetic::PREVIEW_HEIGHT,
                        t,
                        brightness,
                    );
                    let frame = CameraFrame::from_rgba(
                        synthetic::PREVIEW_WIDTH,
                        synthetic::PREVIEW_HEIGHT,
                        data,
                    );

                    if let Err(e) = preview.try_send(frame)
                        && e.is_disconnected()
                    {
                        debug!("Preview receiver dropped, stopping synthetic stream");
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
            warn!("Synthetic camera thread panicked");
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn capture_still(&mut self, settings: &PhotoSettings) -> BackendResult<CapturedPhoto> {
        if !self.is_running() {
            return Err(BackendError::NotRunning);
        }

        let (width, height) = if settings.high_resolution {
            (self.device.max_width, self.device.max_height)
        } else {
            (synthetic::PREVIEW_WIDTH, synthetic::PREVIEW_HEIGHT)
        };

        let t = self.epoch.elapsed().as_secs_f32();
        let mut frame = CameraFrame::from_rgba(
            width,
            height,
            render_pattern(width, height, t, self.brightness),
        );

        let flash_fired = settings.flash_mode.fires(frame.mean_luminance());
        if flash_fired {
            // Flash lights the scene as if at normal exposure
            frame = CameraFrame::from_rgba(
                width,
                height,
                render_pattern(width, height, t, self.brightness.max(1.0)),
            );
        }

        let rgb = rgba_to_rgb(&frame)?;
        let data = encode_jpeg(&rgb, EncodingQuality::High)
            .map_err(|e| BackendError::CaptureFailed(e.to_string()))?;

        Ok(CapturedPhoto {
            data: Some(data),
            resolved: ResolvedPhotoSettings {
                id: settings.id,
                width,
                height,
                flash_fired,
                stabilized: settings.auto_still_image_stabilization,
            },
        })
    }
}

impl Drop for SyntheticInput {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Render one RGBA pattern frame at time `t` (seconds)
///
/// Top two thirds: color bars. Bottom third: a gray ramp scrolling left.
pub fn render_pattern(width: u32, height: u32, t: f32, brightness: f32) -> Vec<u8> {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    let bars_height = height * 2 / 3;
    let shift = (t * 60.0) as u32;

    for y in 0..height {
        for x in 0..width {
            let rgb = if y < bars_height {
                let bar = (x as usize * BARS.len()) / width.max(1) as usize;
                BARS[bar.min(BARS.len() - 1)]
            } else {
                let v = (((x + shift) % width.max(1)) * 255 / width.max(1)) as u8;
                [v, v, v]
            };
            for c in rgb {
                data.push((c as f32 * brightness).clamp(0.0, 255.0) as u8);
            }
            data.push(255);
        }
    }

    data
}

fn rgba_to_rgb(frame: &CameraFrame) -> BackendResult<RgbImage> {
    let rgb: Vec<u8> = frame
        .data
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    RgbImage::from_raw(frame.width, frame.height, rgb)
        .ok_or_else(|| BackendError::CaptureFailed("frame size mismatch".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(backend: &SyntheticBackend) -> Box<dyn DeviceInput> {
        let device = backend.default_device().unwrap();
        backend.open_input(&device).unwrap()
    }

    #[test]
    fn test_pattern_size() {
        let data = render_pattern(64, 48, 0.0, 1.0);
        assert_eq!(data.len(), 64 * 48 * 4);
    }

    #[test]
    fn test_capture_requires_running_input() {
        let mut input = open(&SyntheticBackend::new());
        let err = input
            .capture_still(&PhotoSettings::for_shutter())
            .unwrap_err();
        assert_eq!(err, BackendError::NotRunning);
    }

    #[test]
    fn test_high_resolution_capture() {
        let mut input = open(&SyntheticBackend::new());
        let (tx, _rx) = futures::channel::mpsc::channel(1);
        input.start(tx).unwrap();

        let settings = PhotoSettings::for_shutter();
        let photo = input.capture_still(&settings).unwrap();
        input.stop();

        assert_eq!(photo.resolved.id, settings.id);
        assert_eq!(photo.resolved.width, synthetic::SENSOR_WIDTH);
        assert_eq!(photo.resolved.height, synthetic::SENSOR_HEIGHT);
        assert!(!photo.resolved.flash_fired);

        let decoded = image::load_from_memory(photo.file_data_representation().unwrap()).unwrap();
        assert_eq!(decoded.width(), synthetic::SENSOR_WIDTH);
    }

    #[test]
    fn test_auto_flash_fires_in_dark_scene() {
        let mut input = open(&SyntheticBackend::new().with_brightness(0.05));
        let (tx, _rx) = futures::channel::mpsc::channel(1);
        input.start(tx).unwrap();

        let mut settings = PhotoSettings::for_shutter();
        settings.high_resolution = false;
        let photo = input.capture_still(&settings).unwrap();
        input.stop();

        assert!(photo.resolved.flash_fired);
        assert_eq!(photo.resolved.width, synthetic::PREVIEW_WIDTH);
    }

    #[test]
    fn test_unknown_device_rejected() {
        let backend = SyntheticBackend::new();
        let mut device = backend.default_device().unwrap();
        device.path = "synthetic:7".to_string();
        assert!(backend.open_input(&device).is_err());
    }
}
