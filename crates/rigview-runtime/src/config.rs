//! Navigation configuration
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! stock viewer behaviour. Angles are written in degrees.
//!
//! ```toml
//! movement_speed = 0.1
//! floor_clearance = 0.2
//!
//! [bindings]
//! move_forward = "Up"
//! enter_orbit = "O"
//! ```

use crate::input::{Button, KeyButton, MouseButton};
use rigview_core::{Result, RigviewError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// Distance per tick for each held movement key
    #[serde(default = "default_movement_speed")]
    pub movement_speed: f64,
    /// Distance per wheel notch
    #[serde(default = "default_zoom_speed")]
    pub zoom_speed: f64,
    /// Radians per pixel of pointer drag
    #[serde(default = "default_angular_speed")]
    pub angular_speed: f64,
    #[serde(default = "default_min_tilt")]
    pub min_tilt_deg: f64,
    #[serde(default = "default_max_tilt")]
    pub max_tilt_deg: f64,
    /// Lowest camera height above the ground plane
    #[serde(default = "default_floor_clearance")]
    pub floor_clearance: f64,
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Initial factor applied by the speed modifier keys
    #[serde(default = "default_speed_step")]
    pub speed_step: f64,
    #[serde(default)]
    pub bindings: KeyBindings,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            movement_speed: default_movement_speed(),
            zoom_speed: default_zoom_speed(),
            angular_speed: default_angular_speed(),
            min_tilt_deg: default_min_tilt(),
            max_tilt_deg: default_max_tilt(),
            floor_clearance: default_floor_clearance(),
            tick_interval_ms: default_tick_interval(),
            speed_step: default_speed_step(),
            bindings: KeyBindings::default(),
        }
    }
}

fn default_movement_speed() -> f64 {
    0.07
}
fn default_zoom_speed() -> f64 {
    0.25
}
fn default_angular_speed() -> f64 {
    0.003
}
fn default_min_tilt() -> f64 {
    -89.0
}
fn default_max_tilt() -> f64 {
    89.0
}
fn default_floor_clearance() -> f64 {
    0.12
}
fn default_tick_interval() -> u64 {
    20
}
fn default_speed_step() -> f64 {
    2.0
}

impl NavigationConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: NavigationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("movement_speed", self.movement_speed),
            ("zoom_speed", self.zoom_speed),
            ("angular_speed", self.angular_speed),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(RigviewError::ConfigError(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if !(-90.0..=90.0).contains(&self.min_tilt_deg)
            || !(-90.0..=90.0).contains(&self.max_tilt_deg)
            || self.min_tilt_deg >= self.max_tilt_deg
        {
            return Err(RigviewError::ConfigError(format!(
                "tilt range [{}, {}] must be increasing and within +-90 degrees",
                self.min_tilt_deg, self.max_tilt_deg
            )));
        }
        if !self.floor_clearance.is_finite() {
            return Err(RigviewError::ConfigError(
                "floor_clearance must be finite".into(),
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(RigviewError::ConfigError(
                "tick_interval_ms must be at least 1".into(),
            ));
        }
        if !(self.speed_step >= 1.0) {
            return Err(RigviewError::ConfigError(format!(
                "speed_step must be at least 1, got {}",
                self.speed_step
            )));
        }
        Ok(())
    }

    pub fn min_tilt(&self) -> f64 {
        self.min_tilt_deg.to_radians()
    }

    pub fn max_tilt(&self) -> f64 {
        self.max_tilt_deg.to_radians()
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Button assignments for every navigation action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub move_up: Button,
    pub move_down: Button,
    pub move_left: Button,
    pub move_right: Button,
    pub move_forward: Button,
    pub move_backward: Button,
    /// Drag to turn the camera in place
    pub rotate_look: Button,
    /// Drag to orbit around the point under the cursor
    pub rotate_orbit: Button,
    pub pan: Button,
    pub select: Button,
    pub enter_orbit: Button,
    pub leave_orbit: Button,
    pub speed_up: Button,
    pub slow_down: Button,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            move_up: KeyButton::Q.into(),
            move_down: KeyButton::E.into(),
            move_left: KeyButton::A.into(),
            move_right: KeyButton::D.into(),
            move_forward: KeyButton::W.into(),
            move_backward: KeyButton::S.into(),
            rotate_look: MouseButton::Primary.into(),
            rotate_orbit: MouseButton::Secondary.into(),
            pan: MouseButton::Middle.into(),
            select: MouseButton::Middle.into(),
            enter_orbit: KeyButton::Space.into(),
            leave_orbit: KeyButton::Escape.into(),
            speed_up: KeyButton::Control.into(),
            slow_down: KeyButton::Shift.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = NavigationConfig::from_toml_str("").unwrap();
        assert!((config.movement_speed - 0.07).abs() < 1e-12);
        assert!((config.zoom_speed - 0.25).abs() < 1e-12);
        assert!((config.floor_clearance - 0.12).abs() < 1e-12);
        assert_eq!(config.tick_interval(), Duration::from_millis(20));
        assert!((config.max_tilt() - 89f64.to_radians()).abs() < 1e-12);
        assert_eq!(config.bindings, KeyBindings::default());
    }

    #[test]
    fn test_partial_overrides() {
        let config = NavigationConfig::from_toml_str(
            r#"
            movement_speed = 0.5
            min_tilt_deg = -45

            [bindings]
            move_forward = "Up"
            rotate_look = "Secondary"
            "#,
        )
        .unwrap();
        assert!((config.movement_speed - 0.5).abs() < 1e-12);
        assert!((config.min_tilt_deg + 45.0).abs() < 1e-12);
        assert_eq!(config.bindings.move_forward, Button::Key(KeyButton::Up));
        assert_eq!(config.bindings.rotate_look, Button::Mouse(MouseButton::Secondary));
        assert_eq!(config.bindings.move_backward, Button::Key(KeyButton::S));
    }

    #[test]
    fn test_unknown_button_is_a_parse_error() {
        let err = NavigationConfig::from_toml_str("[bindings]\nmove_up = \"Hyper\"").unwrap_err();
        assert!(matches!(err, RigviewError::TomlParseError(_)));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        for doc in [
            "movement_speed = -1.0",
            "min_tilt_deg = 10\nmax_tilt_deg = 5",
            "max_tilt_deg = 120",
            "tick_interval_ms = 0",
            "speed_step = 0.5",
        ] {
            let err = NavigationConfig::from_toml_str(doc).unwrap_err();
            assert!(matches!(err, RigviewError::ConfigError(_)), "{doc}");
        }
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("rigview-nav-{}.toml", std::process::id()));
        std::fs::write(&path, "zoom_speed = 1.5\n").unwrap();
        let config = NavigationConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!((config.zoom_speed - 1.5).abs() < 1e-12);

        assert!(matches!(
            NavigationConfig::load_from_file(&path),
            Err(RigviewError::IoError(_))
        ));
    }

    #[test]
    fn test_serializes_back_to_toml() {
        let text = toml::to_string(&NavigationConfig::default()).unwrap();
        assert!(text.contains("enter_orbit = \"Space\""));
        let back = NavigationConfig::from_toml_str(&text).unwrap();
        assert_eq!(back.bindings, KeyBindings::default());
    }
}
