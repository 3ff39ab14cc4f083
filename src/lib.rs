// SPDX-License-Identifier: MPL-2.0

//! ShutterCam - a single-screen camera application
//!
//! Previews a live camera feed, captures a still photo on the shutter,
//! optionally runs a crystallize filter over it and saves the result to the
//! user's photo library.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Camera screen controller (session bootstrap, preview, shutter, effect)
//! - [`backends`]: Camera backend abstraction and capture session
//! - [`pipelines`]: Capture result handling, filtering and encoding
//! - [`storage`]: Photo library
//! - [`config`]: User configuration handling
//! - [`terminal`]: Terminal user interface

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use app::{Bounds, CameraController, ControllerEvent, InterfaceOrientation};
pub use config::Config;
pub use errors::{AppError, AppResult, CameraError, PhotoError};
