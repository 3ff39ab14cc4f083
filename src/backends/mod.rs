// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for camera capture
//!
//! # Architecture
//!
//! The backend layer abstracts hardware access, providing a consistent API
//! regardless of the underlying capture method:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                  App Layer                   │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │  ┌───────────┐ ┌──────────┐ ┌────────────┐  │
//! │  │ Synthetic │ │   File   │ │ GStreamer  │  │
//! │  └───────────┘ └──────────┘ └────────────┘  │
//! └─────────────────────────────────────────────┘
//! ```

pub mod camera;
