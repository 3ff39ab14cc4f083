// SPDX-License-Identifier: MPL-2.0

//! Camera screen controller
//!
//! The controller owns everything the single camera screen needs: the
//! capture session, the preview layer, the shutter animation and the effect
//! toggle. A UI surface (terminal or headless CLI) drives it from one thread
//! and drains [`ControllerEvent`]s between redraws.
//!
//! # Architecture
//!
//! - `preview`: preview layer, bounds and orientation mapping
//! - `shutter`: shutter fade animation
//! - `effect`: effect flag and indicator opacity
//!
//! # Capture flow
//!
//! ```text
//! shutter_pressed() ──► PhotoOutput::capture_photo ──► (worker) completion
//!                                                           │
//!        poll()/next_event() ◄── PhotoCaptured ◄────────────┘
//!              │ snapshot effect flag
//!              ▼
//!   (worker) CaptureResultHandler::handle ──► PhotoLibrary::write
//!                                                   │
//!        poll()/next_event() ◄── PhotoSaved ◄───────┘
//! ```

pub mod effect;
pub mod preview;
pub mod shutter;

pub use effect::EffectToggle;
pub use preview::{
    Bounds, InterfaceOrientation, PreviewConnection, PreviewLayer, VideoGravity, VideoOrientation,
};
pub use shutter::ShutterButton;

use crate::backends::camera::{
    CameraBackend, CameraDevice, CaptureSession, FrameReceiver, MetadataOutput,
    PhotoCaptureResult, PhotoOutput, PhotoSettings,
};
use crate::constants::pipeline::PREVIEW_CHANNEL_CAPACITY;
use crate::errors::{CameraError, PhotoError};
use crate::pipelines::photo::{CaptureResultHandler, ImageFilter};
use crate::storage::PhotoLibrary;
use futures::StreamExt;
use futures::channel::mpsc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Notifications surfaced to the UI loop
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// A capture request completed with image data; processing has started
    PhotoCaptured { request: Uuid },
    /// The photo library finished (or failed) a write
    PhotoSaved(Result<PathBuf, PhotoError>),
    /// A capture completion was dropped without a library write
    CaptureFailed(PhotoError),
}

/// Messages sent from worker threads back to the UI loop
enum Completion {
    Captured(PhotoCaptureResult),
    Skipped(PhotoError),
    Saved(Result<PathBuf, PhotoError>),
}

/// State and behavior of the camera screen
pub struct CameraController {
    backend: Box<dyn CameraBackend>,
    handler: CaptureResultHandler,
    runtime: Handle,
    loaded: bool,
    device: Option<CameraDevice>,
    setup_error: Option<CameraError>,
    session: Option<CaptureSession>,
    photo_output: Option<PhotoOutput>,
    preview: PreviewLayer,
    frames: Option<FrameReceiver>,
    effect: EffectToggle,
    shutter: ShutterButton,
    captures_submitted: u64,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
}

impl CameraController {
    /// Create a controller; nothing touches the camera until [`load`](Self::load)
    pub fn new(
        backend: Box<dyn CameraBackend>,
        library: Arc<dyn PhotoLibrary>,
        runtime: Handle,
    ) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded();

        let saved_tx = completion_tx.clone();
        let handler = CaptureResultHandler::new(library).with_save_observer(Arc::new(
            move |result: Result<PathBuf, PhotoError>| {
                if saved_tx.unbounded_send(Completion::Saved(result)).is_err() {
                    debug!("Controller gone, dropping save notification");
                }
            },
        ));

        Self {
            backend,
            handler,
            runtime,
            loaded: false,
            device: None,
            setup_error: None,
            session: None,
            photo_output: None,
            preview: PreviewLayer::new(),
            frames: None,
            effect: EffectToggle::new(),
            shutter: ShutterButton::new(),
            captures_submitted: 0,
            completion_tx,
            completion_rx,
        }
    }

    /// Use a different effect filter
    pub fn with_filter(mut self, filter: Arc<dyn ImageFilter>) -> Self {
        self.handler = self.handler.with_filter(filter);
        self
    }

    /// Screen load: build and start the capture session
    ///
    /// Returns [`CameraError::NoCameraFound`] when the backend has no video
    /// device. A device that cannot be opened is logged and leaves the
    /// screen without a session; later shutter presses do nothing.
    /// Calling this again after the first load has no effect.
    pub fn load(&mut self, bounds: Bounds) -> Result<(), CameraError> {
        if self.loaded {
            warn!("Capture session already configured, ignoring repeated load");
            return Ok(());
        }
        self.loaded = true;

        let device = self.backend.default_device().ok_or_else(|| {
            error!(backend = %self.backend.backend_type(), "No video device available");
            CameraError::NoCameraFound
        })?;
        info!(
            device = %device.name,
            backend = %self.backend.backend_type(),
            "Using default camera"
        );

        let input = match self.backend.open_input(&device) {
            Ok(input) => input,
            Err(e) => {
                let err = CameraError::InputFailed(e.to_string());
                error!(device = %device.name, error = %err, "Camera setup aborted");
                self.device = Some(device);
                self.setup_error = Some(err);
                return Ok(());
            }
        };

        let mut session = CaptureSession::new(self.runtime.clone());
        if let Err(e) = session.add_input(input) {
            error!(error = %e, "Failed to add camera input to session");
            return Ok(());
        }

        let mut output = PhotoOutput::new();
        output.set_high_resolution_capture_enabled(true);
        let output = match session.add_photo_output(output) {
            Ok(output) => output,
            Err(e) => {
                error!(error = %e, "Failed to add photo output to session");
                return Ok(());
            }
        };

        if let Err(e) = session.add_metadata_output(MetadataOutput::new()) {
            warn!(error = %e, "Failed to add metadata output to session");
        }

        self.preview.attach(
            PreviewConnection::new(session.supports_video_orientation()),
            bounds,
        );

        let (frame_tx, frame_rx) = mpsc::channel(PREVIEW_CHANNEL_CAPACITY);
        if let Err(e) = session.start_running(frame_tx) {
            error!(error = %e, "Failed to start capture session");
        }

        self.device = Some(device);
        self.frames = Some(frame_rx);
        self.photo_output = Some(output);
        self.session = Some(session);
        Ok(())
    }

    /// Layout pass from the UI surface
    pub fn layout(&mut self, bounds: Bounds, orientation: InterfaceOrientation) {
        self.preview.layout(bounds, orientation);
    }

    /// Shutter trigger
    ///
    /// Submits exactly one capture request and starts the shutter fade.
    /// Returns `false` without doing anything when there is no photo output.
    pub fn shutter_pressed(&mut self) -> bool {
        let Some(output) = &self.photo_output else {
            warn!("Shutter pressed without a photo output, ignoring");
            return false;
        };

        self.shutter.press(Instant::now());

        let settings = PhotoSettings::for_shutter();
        debug!(request = %settings.id, "Shutter pressed");

        let completion_tx = self.completion_tx.clone();
        output.capture_photo(settings, move |result| {
            if completion_tx
                .unbounded_send(Completion::Captured(result))
                .is_err()
            {
                debug!("Controller gone, dropping capture result");
            }
        });
        self.captures_submitted += 1;
        true
    }

    /// Flip the effect flag used by subsequent capture completions
    pub fn toggle_effect(&mut self) {
        self.effect.toggle();
    }

    /// Pull the newest preview frame and every pending event without blocking
    pub fn poll(&mut self) -> Vec<ControllerEvent> {
        if let Some(frames) = self.frames.as_mut() {
            while let Ok(frame) = frames.try_recv() {
                self.preview.push_frame(frame);
            }
        }

        let mut events = Vec::new();
        while let Ok(completion) = self.completion_rx.try_recv() {
            if let Some(event) = self.process(completion) {
                events.push(event);
            }
        }
        events
    }

    /// Wait for the next event
    ///
    /// Preview frames are not consumed here; use [`poll`](Self::poll) for that.
    pub async fn next_event(&mut self) -> Option<ControllerEvent> {
        loop {
            let completion = self.completion_rx.next().await?;
            if let Some(event) = self.process(completion) {
                return Some(event);
            }
        }
    }

    fn process(&mut self, completion: Completion) -> Option<ControllerEvent> {
        match completion {
            Completion::Captured(result) => {
                let request = result.as_ref().ok().map(|photo| photo.resolved.id);
                let effect_enabled = self.effect.is_enabled();
                self.handle_capture_result(result, effect_enabled);
                request.map(|request| ControllerEvent::PhotoCaptured { request })
            }
            Completion::Skipped(e) => Some(ControllerEvent::CaptureFailed(e)),
            Completion::Saved(result) => Some(ControllerEvent::PhotoSaved(result)),
        }
    }

    /// Run the result handler off the UI thread with the snapshotted effect flag
    fn handle_capture_result(&self, result: PhotoCaptureResult, effect_enabled: bool) {
        let handler = self.handler.clone();
        let completion_tx = self.completion_tx.clone();
        self.runtime.spawn_blocking(move || {
            if let Err(e) = handler.handle(result, effect_enabled) {
                let _ = completion_tx.unbounded_send(Completion::Skipped(e));
            }
        });
    }

    pub fn preview(&self) -> &PreviewLayer {
        &self.preview
    }

    pub fn effect(&self) -> &EffectToggle {
        &self.effect
    }

    pub fn shutter(&self) -> &ShutterButton {
        &self.shutter
    }

    /// The camera chosen at load, even when its input failed to open
    pub fn device(&self) -> Option<&CameraDevice> {
        self.device.as_ref()
    }

    /// Why setup stopped short of a session, when the device input failed
    pub fn setup_error(&self) -> Option<&CameraError> {
        self.setup_error.as_ref()
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn has_photo_output(&self) -> bool {
        self.photo_output.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_running())
    }

    /// Number of capture requests submitted so far
    pub fn captures_submitted(&self) -> u64 {
        self.captures_submitted
    }
}
