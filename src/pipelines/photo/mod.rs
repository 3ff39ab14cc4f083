// SPDX-License-Identifier: MPL-2.0

//! Photo capture post-processing pipeline
//!
//! ```text
//! Capture completion → Decode → (Crystallize → Render) → Photo library
//!         ↓
//! Preview continues uninterrupted
//! ```
//!
//! # Pipeline Stages
//!
//! 1. **Validate**: drop errored captures and captures without image data
//! 2. **Decode**: JPEG bytes to a displayable image
//! 3. **Filter** (effect enabled only): one crystallize pass, radius 30
//! 4. **Write**: fire-and-forget handoff to the photo library

pub mod capture;
pub mod encoding;
pub mod processing;

pub use capture::{CaptureResultHandler, SaveObserver};
pub use encoding::{EncodingFormat, EncodingQuality, PhotoEncoder};
pub use processing::{CrystallizeFilter, ImageFilter, RenderContext};
