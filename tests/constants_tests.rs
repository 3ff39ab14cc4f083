// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use shuttercam::constants::{DEFAULT_SAVE_FOLDER, crystallize, file_formats, ui};
use std::time::Duration;

#[test]
fn test_effect_indicator_opacities() {
    assert_eq!(ui::EFFECT_OFF_OPACITY, 0.3);
    assert_eq!(ui::EFFECT_ON_OPACITY, 1.0);
}

#[test]
fn test_shutter_fade() {
    assert_eq!(ui::SHUTTER_FADED_OPACITY, 0.2);
    assert_eq!(ui::SHUTTER_RESTING_OPACITY, 1.0);
    assert_eq!(ui::SHUTTER_FADE_DURATION, Duration::from_millis(400));
}

#[test]
fn test_crystallize_radius() {
    assert_eq!(crystallize::RADIUS, 30.0);
    assert_eq!(crystallize::NAME, "crystallize");
}

#[test]
fn test_save_folder_name() {
    assert_eq!(DEFAULT_SAVE_FOLDER, "ShutterCam");
}

#[test]
fn test_image_extensions() {
    assert!(file_formats::is_image_extension("png"));
    assert!(file_formats::is_image_extension("jpg"));
    assert!(!file_formats::is_image_extension("mp4"));
}
