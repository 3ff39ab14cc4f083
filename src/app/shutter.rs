// SPDX-License-Identifier: MPL-2.0

//! Shutter button fade animation
//!
//! Pressing the shutter fades the control to a faint opacity and back.
//! The animation is sampled by the UI on every redraw and never blocks.

use crate::constants::ui::{
    SHUTTER_FADE_DURATION, SHUTTER_FADED_OPACITY, SHUTTER_RESTING_OPACITY,
};
use std::time::Instant;

#[derive(Debug, Clone, Copy, Default)]
pub struct ShutterButton {
    pressed_at: Option<Instant>,
}

impl ShutterButton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart the fade animation at `now`
    pub fn press(&mut self, now: Instant) {
        self.pressed_at = Some(now);
    }

    /// Whether the fade is still running at `now`
    pub fn is_animating(&self, now: Instant) -> bool {
        self.pressed_at
            .is_some_and(|start| now.saturating_duration_since(start) < SHUTTER_FADE_DURATION * 2)
    }

    /// Opacity of the control at `now`
    ///
    /// Fades linearly from resting to faded over one fade duration, then
    /// back over another.
    pub fn opacity_at(&self, now: Instant) -> f32 {
        let Some(start) = self.pressed_at else {
            return SHUTTER_RESTING_OPACITY;
        };

        let fade = SHUTTER_FADE_DURATION.as_secs_f32();
        let elapsed = now.saturating_duration_since(start).as_secs_f32();
        let span = SHUTTER_RESTING_OPACITY - SHUTTER_FADED_OPACITY;

        if elapsed < fade {
            SHUTTER_RESTING_OPACITY - span * (elapsed / fade)
        } else if elapsed < fade * 2.0 {
            SHUTTER_FADED_OPACITY + span * ((elapsed - fade) / fade)
        } else {
            SHUTTER_RESTING_OPACITY
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_resting_before_press() {
        assert_eq!(ShutterButton::new().opacity_at(Instant::now()), 1.0);
    }

    #[test]
    fn test_fade_out_and_back() {
        let start = Instant::now();
        let mut button = ShutterButton::new();
        button.press(start);

        assert!((button.opacity_at(start) - 1.0).abs() < 1e-4);
        assert!((button.opacity_at(start + Duration::from_millis(400)) - 0.2).abs() < 1e-4);
        assert!((button.opacity_at(start + Duration::from_millis(200)) - 0.6).abs() < 1e-4);
        assert!((button.opacity_at(start + Duration::from_millis(600)) - 0.6).abs() < 1e-4);
        assert_eq!(button.opacity_at(start + Duration::from_millis(900)), 1.0);
        assert!(button.is_animating(start + Duration::from_millis(500)));
        assert!(!button.is_animating(start + Duration::from_millis(900)));
    }
}
