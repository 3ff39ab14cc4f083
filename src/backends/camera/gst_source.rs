// SPDX-License-Identifier: MPL-2.0

//! GStreamer camera backend
//!
//! Devices are discovered with a `Video/Source` device monitor. Each input
//! runs `source ! videoconvert ! appsink(RGBA)`; the newest frame is kept
//! for still capture and forwarded to the preview channel.

use super::types::*;
use super::{CameraBackend, DeviceInput};
use crate::pipelines::photo::encoding::{EncodingQuality, encode_jpeg};
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::{VideoCapsBuilder, VideoFormat, VideoInfo};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// Newest decoded frame, shared with the appsink callback
type LatestFrame = Arc<Mutex<Option<CameraFrame>>>;

/// Preview channel, swapped in by `start`
type SharedSender = Arc<Mutex<Option<FrameSender>>>;

pub struct GStreamerBackend;

impl GStreamerBackend {
    pub fn new() -> BackendResult<Self> {
        gstreamer::init().map_err(|e| BackendError::InitializationFailed(e.to_string()))?;
        Ok(Self)
    }

    fn monitor_devices() -> Vec<gstreamer::Device> {
        let monitor = gstreamer::DeviceMonitor::new();
        monitor.add_filter(Some("Video/Source"), None);
        if let Err(e) = monitor.start() {
            warn!(error = %e, "Failed to start GStreamer device monitor");
            return Vec::new();
        }
        let devices = monitor.devices().into_iter().collect();
        monitor.stop();
        devices
    }
}

impl CameraBackend for GStreamerBackend {
    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::GStreamer
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        Self::monitor_devices()
            .iter()
            .map(|device| {
                let name = device.display_name().to_string();
                let (max_width, max_height) = device
                    .caps()
                    .map(|caps| largest_resolution(&caps))
                    .unwrap_or((0, 0));
                CameraDevice {
                    path: name.clone(),
                    name,
                    position: DevicePosition::Unspecified,
                    max_width,
                    max_height,
                }
            })
            .collect()
    }

    fn open_input(&self, device: &CameraDevice) -> BackendResult<Box<dyn DeviceInput>> {
        let gst_device = Self::monitor_devices()
            .into_iter()
            .find(|d| d.display_name().as_str() == device.path)
            .ok_or_else(|| BackendError::DeviceNotFound(device.path.clone()))?;

        let source = gst_device
            .create_element(None)
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?;
        let convert = gstreamer::ElementFactory::make("videoconvert")
            .build()
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?;
        let appsink = AppSink::builder()
            .caps(&VideoCapsBuilder::new().format(VideoFormat::Rgba).build())
            .max_buffers(2)
            .drop(true)
            .sync(false)
            .build();

        let pipeline = gstreamer::Pipeline::new();
        pipeline
            .add_many([&source, &convert, appsink.upcast_ref()])
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?;
        gstreamer::Element::link_many([&source, &convert, appsink.upcast_ref()])
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?;

        let latest: LatestFrame = Arc::new(Mutex::new(None));
        let sender: SharedSender = Arc::new(Mutex::new(None));
        install_frame_callback(&appsink, Arc::clone(&latest), Arc::clone(&sender));

        // Pausing the pipeline claims the device, which surfaces busy/denied errors here
        pipeline.set_state(gstreamer::State::Paused).map_err(|_| {
            let _ = pipeline.set_state(gstreamer::State::Null);
            BackendError::DeviceBusy
        })?;

        info!(device = %device.name, "GStreamer input opened");
        Ok(Box::new(GStreamerInput {
            device: device.clone(),
            pipeline,
            latest,
            sender,
            running: false,
        }))
    }
}

fn install_frame_callback(appsink: &AppSink, latest: LatestFrame, sender: SharedSender) {
    appsink.set_callbacks(
        gstreamer_app::AppSinkCallbacks::builder()
            .new_sample(move |appsink| {
                let sample = appsink
                    .pull_sample()
                    .map_err(|_| gstreamer::FlowError::Eos)?;
                let Some(frame) = frame_from_sample(&sample) else {
                    return Err(gstreamer::FlowError::Error);
                };

                if let Ok(mut sender) = sender.lock()
                    && let Some(tx) = sender.as_mut()
                    && let Err(e) = tx.try_send(frame.clone())
                    && e.is_disconnected()
                {
                    *sender = None;
                }
                if let Ok(mut latest) = latest.lock() {
                    *latest = Some(frame);
                }
                Ok(gstreamer::FlowSuccess::Ok)
            })
            .build(),
    );
}

/// Copy a mapped RGBA sample into a tightly packed frame
fn frame_from_sample(sample: &gstreamer::Sample) -> Option<CameraFrame> {
    let caps = sample.caps()?;
    let info = VideoInfo::from_caps(caps).ok()?;
    let buffer = sample.buffer()?;
    let map = buffer.map_readable().ok()?;

    let width = info.width();
    let height = info.height();
    let stride = info.stride()[0] as usize;
    let row_bytes = width as usize * 4;
    let data = map.as_slice();

    let mut packed = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        packed.extend_from_slice(data.get(start..start + row_bytes)?);
    }

    Some(CameraFrame::from_rgba(width, height, packed))
}

fn largest_resolution(caps: &gstreamer::Caps) -> (u32, u32) {
    caps.iter()
        .filter_map(|s| {
            let width = s.get::<i32>("width").ok()?;
            let height = s.get::<i32>("height").ok()?;
            Some((width.max(0) as u32, height.max(0) as u32))
        })
        .max_by_key(|(w, h)| w * h)
        .unwrap_or((0, 0))
}

/// Opened GStreamer camera
pub struct GStreamerInput {
    device: CameraDevice,
    pipeline: gstreamer::Pipeline,
    latest: LatestFrame,
    sender: SharedSender,
    running: bool,
}

impl DeviceInput for GStreamerInput {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn start(&mut self, preview: FrameSender) -> BackendResult<()> {
        if let Ok(mut sender) = self.sender.lock() {
            *sender = Some(preview);
        }
        self.pipeline
            .set_state(gstreamer::State::Playing)
            .map_err(|e| BackendError::InitializationFailed(format!("{:?}", e)))?;
        self.running = true;
        debug!(device = %self.device.name, "GStreamer pipeline playing");
        Ok(())
    }

    fn stop(&mut self) {
        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            error!(error = ?e, "Failed to stop GStreamer pipeline");
        }
        if let Ok(mut sender) = self.sender.lock() {
            *sender = None;
        }
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn capture_still(&mut self, settings: &PhotoSettings) -> BackendResult<CapturedPhoto> {
        if !self.running {
            return Err(BackendError::NotRunning);
        }

        let frame = self
            .latest
            .lock()
            .map_err(|_| BackendError::Other("frame lock poisoned".to_string()))?
            .clone()
            .ok_or_else(|| BackendError::CaptureFailed("no frame received yet".to_string()))?;

        if settings.flash_mode.fires(frame.mean_luminance()) {
            debug!("Scene is dark but this device has no flash control");
        }

        let rgb: Vec<u8> = frame
            .data
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect();
        let image = image::RgbImage::from_raw(frame.width, frame.height, rgb)
            .ok_or_else(|| BackendError::CaptureFailed("frame size mismatch".to_string()))?;
        let data = encode_jpeg(&image, EncodingQuality::High)
            .map_err(|e| BackendError::CaptureFailed(e.to_string()))?;

        Ok(CapturedPhoto {
            data: Some(data),
            resolved: ResolvedPhotoSettings {
                id: settings.id,
                width: frame.width,
                height: frame.height,
                flash_fired: false,
                stabilized: false,
            },
        })
    }
}

impl Drop for GStreamerInput {
    fn drop(&mut self) {
        self.stop();
    }
}
