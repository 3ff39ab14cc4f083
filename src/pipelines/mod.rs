// SPDX-License-Identifier: MPL-2.0

//! Processing pipelines for captured media
//!
//! All heavy operations (decoding, filtering, encoding, disk I/O) run on
//! blocking worker threads so the preview and the UI loop never stall.
//!
//! # Modules
//!
//! - [`photo`]: capture result handling, crystallize filter and encoding

pub mod photo;
