// SPDX-License-Identifier: GPL-3.0-only

//! Capture session wiring
//!
//! A session connects one device input to a photo output and a metadata
//! output. The device input is shared between the preview stream and the
//! photo output, so it lives behind `Arc<Mutex<..>>`.

use super::DeviceInput;
use super::types::*;
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Device input shared between the session and its outputs
pub type SharedInput = Arc<Mutex<Box<dyn DeviceInput>>>;

/// Connection from an output back to the session's input
#[derive(Clone)]
struct OutputConnection {
    input: SharedInput,
    runtime: Handle,
}

/// Still photo endpoint of a capture session
///
/// Cloning is cheap; clones share the same connection.
#[derive(Clone, Default)]
pub struct PhotoOutput {
    high_resolution_capture_enabled: bool,
    connection: Option<OutputConnection>,
}

impl PhotoOutput {
    /// Create an unconnected photo output
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow captures at the device's full resolution
    pub fn set_high_resolution_capture_enabled(&mut self, enabled: bool) {
        self.high_resolution_capture_enabled = enabled;
    }

    pub fn is_high_resolution_capture_enabled(&self) -> bool {
        self.high_resolution_capture_enabled
    }

    /// Check if this output has been added to a session
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Submit one capture request
    ///
    /// Returns immediately. `on_complete` is invoked exactly once with either
    /// the captured photo or the error: on a runtime worker thread, or right
    /// away on the caller's thread when the output is not connected.
    pub fn capture_photo<F>(&self, settings: PhotoSettings, on_complete: F)
    where
        F: FnOnce(PhotoCaptureResult) + Send + 'static,
    {
        let Some(connection) = &self.connection else {
            warn!(request = %settings.id, "Photo output is not connected to a session");
            on_complete(Err(BackendError::NotRunning));
            return;
        };

        let mut settings = settings;
        if settings.high_resolution && !self.high_resolution_capture_enabled {
            warn!(
                request = %settings.id,
                "High resolution requested but not enabled on the output, using preview resolution"
            );
            settings.high_resolution = false;
        }

        info!(
            request = %settings.id,
            stabilization = settings.auto_still_image_stabilization,
            high_resolution = settings.high_resolution,
            flash = ?settings.flash_mode,
            "Submitting capture request"
        );

        let input = Arc::clone(&connection.input);
        connection.runtime.spawn_blocking(move || {
            let result = match input.lock() {
                Ok(mut input) => input.capture_still(&settings),
                Err(_) => Err(BackendError::Other("device input lock poisoned".to_string())),
            };

            match &result {
                Ok(photo) => debug!(
                    request = %settings.id,
                    width = photo.resolved.width,
                    height = photo.resolved.height,
                    flash_fired = photo.resolved.flash_fired,
                    "Capture finished"
                ),
                Err(e) => debug!(request = %settings.id, error = %e, "Capture failed"),
            }

            on_complete(result);
        });
    }
}

impl std::fmt::Debug for PhotoOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoOutput")
            .field(
                "high_resolution_capture_enabled",
                &self.high_resolution_capture_enabled,
            )
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Metadata endpoint of a capture session
///
/// Attached to the session but nothing consumes detected objects yet.
#[derive(Debug, Clone, Default)]
pub struct MetadataOutput {
    connected: bool,
}

impl MetadataOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Live pipeline: device input → photo output → metadata output
pub struct CaptureSession {
    input: Option<SharedInput>,
    photo_output: Option<PhotoOutput>,
    metadata_output: Option<MetadataOutput>,
    running: bool,
    runtime: Handle,
}

impl CaptureSession {
    /// Create an empty session whose blocking work runs on `runtime`
    pub fn new(runtime: Handle) -> Self {
        Self {
            input: None,
            photo_output: None,
            metadata_output: None,
            running: false,
            runtime,
        }
    }

    /// Attach the device input
    ///
    /// A session holds a single input; a second one is rejected.
    pub fn add_input(&mut self, input: Box<dyn DeviceInput>) -> BackendResult<()> {
        if self.input.is_some() {
            return Err(BackendError::Other("session already has an input".to_string()));
        }
        debug!(device = %input.device().name, "Adding input to session");
        self.input = Some(Arc::new(Mutex::new(input)));
        Ok(())
    }

    /// Attach a photo output, returning the connected output
    pub fn add_photo_output(&mut self, mut output: PhotoOutput) -> BackendResult<PhotoOutput> {
        let input = self.input.as_ref().ok_or_else(|| {
            BackendError::Other("cannot add a photo output before an input".to_string())
        })?;
        if self.photo_output.is_some() {
            return Err(BackendError::Other(
                "session already has a photo output".to_string(),
            ));
        }

        output.connection = Some(OutputConnection {
            input: Arc::clone(input),
            runtime: self.runtime.clone(),
        });
        self.photo_output = Some(output.clone());
        debug!(?output, "Photo output added to session");
        Ok(output)
    }

    /// Attach a metadata output
    pub fn add_metadata_output(&mut self, mut output: MetadataOutput) -> BackendResult<()> {
        if self.input.is_none() {
            return Err(BackendError::Other(
                "cannot add a metadata output before an input".to_string(),
            ));
        }
        output.connected = true;
        self.metadata_output = Some(output);
        debug!("Metadata output added to session");
        Ok(())
    }

    pub fn photo_output(&self) -> Option<&PhotoOutput> {
        self.photo_output.as_ref()
    }

    pub fn metadata_output(&self) -> Option<&MetadataOutput> {
        self.metadata_output.as_ref()
    }

    /// Whether the preview connection accepts orientation changes
    pub fn supports_video_orientation(&self) -> bool {
        self.input
            .as_ref()
            .and_then(|input| input.lock().ok().map(|i| i.supports_video_orientation()))
            .unwrap_or(false)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start frame delivery without blocking the caller
    ///
    /// The returned handle resolves once the device has started (or failed to).
    pub fn start_running(&mut self, preview: FrameSender) -> BackendResult<JoinHandle<()>> {
        let input = Arc::clone(
            self.input
                .as_ref()
                .ok_or_else(|| BackendError::Other("session has no input".to_string()))?,
        );

        self.running = true;
        let handle = self.runtime.spawn_blocking(move || {
            let result = match input.lock() {
                Ok(mut input) => input.start(preview),
                Err(_) => Err(BackendError::Other("device input lock poisoned".to_string())),
            };
            match result {
                Ok(()) => info!("Capture session running"),
                Err(e) => error!(error = %e, "Failed to start capture session"),
            }
        });
        Ok(handle)
    }

    /// Stop frame delivery
    pub fn stop_running(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        if let Some(input) = &self.input
            && let Ok(mut input) = input.lock()
        {
            input.stop();
            info!("Capture session stopped");
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop_running();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::CameraBackend;
    use crate::backends::camera::synthetic::SyntheticBackend;
    use std::sync::mpsc;

    fn synthetic_input() -> Box<dyn DeviceInput> {
        let backend = SyntheticBackend::new();
        let device = backend.default_device().unwrap();
        backend.open_input(&device).unwrap()
    }

    #[tokio::test]
    async fn test_outputs_require_input() {
        let mut session = CaptureSession::new(Handle::current());
        assert!(session.add_photo_output(PhotoOutput::new()).is_err());
        assert!(session.add_metadata_output(MetadataOutput::new()).is_err());
    }

    #[tokio::test]
    async fn test_single_input_per_session() {
        let mut session = CaptureSession::new(Handle::current());
        session.add_input(synthetic_input()).unwrap();
        assert!(session.add_input(synthetic_input()).is_err());
    }

    #[tokio::test]
    async fn test_unconnected_output_reports_error_once() {
        let output = PhotoOutput::new();
        let (tx, rx) = mpsc::channel();
        output.capture_photo(PhotoSettings::for_shutter(), move |result| {
            tx.send(result.unwrap_err()).unwrap();
        });
        // Delivered before capture_photo returned
        assert_eq!(rx.try_recv().unwrap(), BackendError::NotRunning);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_capture_through_session() {
        let mut session = CaptureSession::new(Handle::current());
        session.add_input(synthetic_input()).unwrap();
        let mut output = PhotoOutput::new();
        output.set_high_resolution_capture_enabled(true);
        let output = session.add_photo_output(output).unwrap();
        session.add_metadata_output(MetadataOutput::new()).unwrap();
        assert!(session.metadata_output().unwrap().is_connected());

        let (preview_tx, _preview_rx) = futures::channel::mpsc::channel(4);
        session.start_running(preview_tx).unwrap().await.unwrap();
        assert!(session.is_running());

        let (tx, rx) = tokio::sync::oneshot::channel();
        output.capture_photo(PhotoSettings::for_shutter(), move |result| {
            let _ = tx.send(result);
        });
        let photo = rx.await.unwrap().unwrap();
        assert!(photo.file_data_representation().is_some());
        assert!(photo.resolved.stabilized);

        session.stop_running();
        assert!(!session.is_running());
    }
}
