// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Taking a photo without the interactive screen

use shuttercam::backends::camera::{CameraBackend, DevicePosition};
use shuttercam::storage::PicturesLibrary;
use shuttercam::{Bounds, CameraController, Config, ControllerEvent};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::{Handle, Runtime};

/// Time to wait for the first preview frame before giving up
const WARMUP_TIMEOUT: Duration = Duration::from_secs(5);

/// List all available cameras
pub fn list_cameras(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let backend = config.create_backend()?;
    let cameras = backend.enumerate_cameras();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras ({}):", backend.backend_type());
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        let default = if index == 0 { " (default)" } else { "" };
        println!("  [{}] {}{}", index, camera.name, default);
        if camera.position != DevicePosition::Unspecified {
            println!("      Position: {:?}", camera.position);
        }
        if camera.max_width > 0 && camera.max_height > 0 {
            println!("      Max resolution: {}x{}", camera.max_width, camera.max_height);
        }
        println!();
    }

    Ok(())
}

/// Take a single photo with the default camera and wait until it is saved
pub fn take_photo(
    config: &Config,
    runtime: &Runtime,
    effect: bool,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let backend = config.create_backend()?;
    let output_dir = output.unwrap_or_else(|| config.photo_directory());

    runtime.block_on(capture_once(config, backend, effect, output_dir))
}

async fn capture_once(
    config: &Config,
    backend: Box<dyn CameraBackend>,
    effect: bool,
    output_dir: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let library = Arc::new(PicturesLibrary::new(
        output_dir,
        config.encoder(),
        Handle::current(),
    ));
    let mut controller = CameraController::new(backend, library, Handle::current());
    controller.load(Bounds::default())?;

    if let Some(device) = controller.device() {
        println!("Using camera: {}", device.name);
    }
    if effect {
        controller.toggle_effect();
    }

    // Wait for the device to deliver frames (camera warm-up)
    let start = Instant::now();
    while controller.preview().latest_frame().is_none() {
        if !controller.has_photo_output() || start.elapsed() > WARMUP_TIMEOUT {
            return Err("Camera did not start".into());
        }
        controller.poll();
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    println!("Capturing...");
    if !controller.shutter_pressed() {
        return Err("Camera input unavailable".into());
    }

    while let Some(event) = controller.next_event().await {
        match event {
            ControllerEvent::PhotoCaptured { request } => {
                println!("Captured {}, processing...", request);
            }
            ControllerEvent::PhotoSaved(Ok(path)) => {
                println!("Photo saved: {}", path.display());
                return Ok(());
            }
            ControllerEvent::PhotoSaved(Err(e)) | ControllerEvent::CaptureFailed(e) => {
                return Err(e.into());
            }
        }
    }
    Err("Capture was abandoned".into())
}
