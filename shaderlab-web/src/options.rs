//! Viewer options with TOML preset support.
//!
//! Every struct uses `#[serde(default)]`, so a preset only needs the fields it
//! overrides:
//!
//! ```toml
//! move_speed = 4.0
//!
//! [keys]
//! forward = "ArrowUp"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::OptionsError;

/// Camera, motion and key-binding settings for one viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerOptions {
    /// Vertical field of view in degrees.
    pub field_of_view_y: f32,
    pub clip_near: f32,
    pub clip_far: f32,
    /// Translation speed in world units per second.
    pub move_speed: f32,
    /// Roll speed in degrees per second.
    pub roll_speed: f32,
    /// Look sensitivity in degrees per pixel of mouse movement.
    pub look_sensitivity: f32,
    /// Start with simulation time paused.
    pub start_paused: bool,
    pub keys: KeyBindings,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            field_of_view_y: 60.0,
            clip_near: 0.01,
            clip_far: 1000.0,
            move_speed: 2.0,
            roll_speed: 90.0,
            look_sensitivity: 0.25,
            start_paused: false,
            keys: KeyBindings::default(),
        }
    }
}

impl ViewerOptions {
    pub fn from_toml(content: &str) -> Result<Self, OptionsError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, OptionsError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self, OptionsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn save(&self, path: &Path) -> Result<(), OptionsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }
}

/// Movement and roll keys that can be bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionKey {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
    RollLeft,
    RollRight,
}

/// Which component of motion a key drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionAxis {
    X,
    Y,
    Z,
    Roll,
}

impl MotionKey {
    /// Axis and direction in camera-local space. The camera looks down -Z.
    pub fn axis(self) -> (MotionAxis, f32) {
        match self {
            Self::Forward => (MotionAxis::Z, -1.0),
            Self::Back => (MotionAxis::Z, 1.0),
            Self::Left => (MotionAxis::X, -1.0),
            Self::Right => (MotionAxis::X, 1.0),
            Self::Up => (MotionAxis::Y, 1.0),
            Self::Down => (MotionAxis::Y, -1.0),
            Self::RollLeft => (MotionAxis::Roll, 1.0),
            Self::RollRight => (MotionAxis::Roll, -1.0),
        }
    }
}

/// Physical key codes (`KeyboardEvent.code`) for each motion key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub forward: String,
    pub back: String,
    pub left: String,
    pub right: String,
    pub up: String,
    pub down: String,
    pub roll_left: String,
    pub roll_right: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: "KeyW".into(),
            back: "KeyS".into(),
            left: "KeyA".into(),
            right: "KeyD".into(),
            up: "Space".into(),
            down: "ShiftLeft".into(),
            roll_left: "KeyQ".into(),
            roll_right: "KeyE".into(),
        }
    }
}

impl KeyBindings {
    /// Motion key bound to `code`, if any. The first binding wins on duplicates.
    pub fn lookup(&self, code: &str) -> Option<MotionKey> {
        [
            (&self.forward, MotionKey::Forward),
            (&self.back, MotionKey::Back),
            (&self.left, MotionKey::Left),
            (&self.right, MotionKey::Right),
            (&self.up, MotionKey::Up),
            (&self.down, MotionKey::Down),
            (&self.roll_left, MotionKey::RollLeft),
            (&self.roll_right, MotionKey::RollRight),
        ]
        .into_iter()
        .find_map(|(bound, key)| (bound == code).then_some(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trips_through_toml() {
        let opts = ViewerOptions::default();
        let toml_str = opts.to_toml().unwrap();
        let parsed = ViewerOptions::from_toml(&toml_str).unwrap();
        assert_eq!(opts, parsed);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let opts = ViewerOptions::from_toml("move_speed = 4.0\n[keys]\nforward = \"ArrowUp\"\n").unwrap();
        assert_eq!(opts.move_speed, 4.0);
        assert_eq!(opts.look_sensitivity, 0.25);
        assert_eq!(opts.keys.forward, "ArrowUp");
        assert_eq!(opts.keys.back, "KeyS");
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        assert!(matches!(
            ViewerOptions::from_toml("move_speed = \"fast\""),
            Err(OptionsError::Parse(_))
        ));
    }

    #[test]
    fn test_lookup() {
        let keys = KeyBindings::default();
        assert_eq!(keys.lookup("KeyW"), Some(MotionKey::Forward));
        assert_eq!(keys.lookup("KeyE"), Some(MotionKey::RollRight));
        assert_eq!(keys.lookup("KeyZ"), None);
    }

    #[test]
    fn test_opposite_keys_share_an_axis() {
        assert_eq!(MotionKey::Forward.axis().0, MotionKey::Back.axis().0);
        assert_eq!(MotionKey::Forward.axis().1, -MotionKey::Back.axis().1);
        assert_eq!(MotionKey::RollLeft.axis().0, MotionAxis::Roll);
    }
}
