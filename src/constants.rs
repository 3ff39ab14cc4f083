// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Default folder name (under the user's Pictures directory) for saved photos
pub const DEFAULT_SAVE_FOLDER: &str = "ShutterCam";

/// Effect toggle and shutter indicator constants
pub mod ui {
    use super::Duration;

    /// Effect indicator opacity while the effect is disabled
    pub const EFFECT_OFF_OPACITY: f32 = 0.3;
    /// Effect indicator opacity while the effect is enabled
    pub const EFFECT_ON_OPACITY: f32 = 1.0;

    /// Opacity the shutter control fades to when pressed
    pub const SHUTTER_FADED_OPACITY: f32 = 0.2;
    /// Resting opacity of the shutter control
    pub const SHUTTER_RESTING_OPACITY: f32 = 1.0;
    /// Duration of each half of the shutter fade (out, then in)
    pub const SHUTTER_FADE_DURATION: Duration = Duration::from_millis(400);

    /// Poll interval of the terminal event loop (~60 redraws per second)
    pub const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(16);
}

/// Crystallize filter constants
pub mod crystallize {
    /// Filter name used in logs and errors
    pub const NAME: &str = "crystallize";
    /// Cell radius used for every effect capture
    pub const RADIUS: f32 = 30.0;
}

/// Camera pipeline constants
pub mod pipeline {
    /// Preview frame channel capacity; frames are dropped when it is full
    pub const PREVIEW_CHANNEL_CAPACITY: usize = 4;
    /// Default preview framerate for backends that generate frames themselves
    pub const DEFAULT_PREVIEW_FPS: u32 = 30;
}

/// Synthetic camera constants
pub mod synthetic {
    /// Full sensor resolution used for high-resolution stills
    pub const SENSOR_WIDTH: u32 = 1920;
    pub const SENSOR_HEIGHT: u32 = 1080;
    /// Preview stream resolution
    pub const PREVIEW_WIDTH: u32 = 640;
    pub const PREVIEW_HEIGHT: u32 = 360;
}

/// Automatic flash decision
pub mod flash {
    /// Mean scene luminance (0.0-1.0) below which auto flash fires
    pub const AUTO_FLASH_LUMINANCE_THRESHOLD: f32 = 0.25;
}

/// Image file extensions accepted by the file-backed camera
pub mod file_formats {
    pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "webp", "tiff"];

    /// Check whether a lowercase extension names a supported image file
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext)
    }
}

/// Application version string, resolved at build time
pub fn app_version() -> &'static str {
    env!("SHUTTERCAM_VERSION")
}
