// SPDX-License-Identifier: MPL-2.0

//! Effect toggle

use crate::constants::ui::{EFFECT_OFF_OPACITY, EFFECT_ON_OPACITY};
use tracing::info;

/// Whether captured photos get the crystallize filter, plus the opacity of
/// the on-screen indicator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectToggle {
    enabled: bool,
    opacity: f32,
}

impl EffectToggle {
    /// Disabled, with a dimmed indicator
    pub fn new() -> Self {
        Self {
            enabled: false,
            opacity: EFFECT_OFF_OPACITY,
        }
    }

    /// Flip the effect and update the indicator
    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
        self.opacity = if self.enabled {
            EFFECT_ON_OPACITY
        } else {
            EFFECT_OFF_OPACITY
        };
        info!(enabled = self.enabled, "Effect toggled");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }
}

impl Default for EffectToggle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let effect = EffectToggle::new();
        assert!(!effect.is_enabled());
        assert_eq!(effect.opacity(), 0.3);
    }

    #[test]
    fn test_toggle_sets_opacity() {
        let mut effect = EffectToggle::new();
        effect.toggle();
        assert!(effect.is_enabled());
        assert_eq!(effect.opacity(), 1.0);
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let mut effect = EffectToggle::new();
        let before = effect;
        effect.toggle();
        effect.toggle();
        assert_eq!(effect, before);
    }
}
