//! Input-to-motion mapping as a pure reducer.
//!
//! The browser adapter converts DOM events into [`InputEvent`]s and folds them
//! into a [`MotionState`]; the render tick reads the result once per frame.

use glam::{Vec2, Vec3};

use crate::options::{KeyBindings, MotionAxis, MotionKey};

/// Platform-agnostic input events.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed on the canvas; exclusive capture was acquired.
    PointerDown,
    PointerUp,
    /// Capture ended without a pointer-up (focus loss, Escape, lock revoked).
    CaptureLost,
    /// Relative mouse motion in pixels, +y downward.
    MouseMove { dx: f32, dy: f32 },
    /// `KeyboardEvent.code` of a pressed key.
    KeyDown { code: String },
    KeyUp { code: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Released,
    Captured {
        /// The first move after locking carries the cursor jump; drop it.
        awaiting_first_move: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MotionState {
    pub capture: CaptureState,
    /// Camera-local direction, each axis in {-1, 0, 1}.
    pub movement_direction: Vec3,
    /// In {-1, 0, 1}.
    pub roll_direction: f32,
    /// Held motion keys, most recently pressed last.
    held: Vec<MotionKey>,
    /// Look deltas accumulated since the last tick.
    pending_look: Vec2,
}

impl MotionState {
    pub fn is_captured(&self) -> bool {
        matches!(self.capture, CaptureState::Captured { .. })
    }

    /// Fold one event into the state.
    pub fn reduce(mut self, event: &InputEvent, keys: &KeyBindings) -> Self {
        match (event, self.capture) {
            (InputEvent::PointerDown, CaptureState::Released) => {
                self.capture = CaptureState::Captured {
                    awaiting_first_move: true,
                };
            }
            (InputEvent::PointerUp | InputEvent::CaptureLost, _) => return Self::default(),

            (InputEvent::MouseMove { .. }, CaptureState::Captured { awaiting_first_move: true }) => {
                self.capture = CaptureState::Captured {
                    awaiting_first_move: false,
                };
            }
            (InputEvent::MouseMove { dx, dy }, CaptureState::Captured { .. }) => {
                self.pending_look += Vec2::new(*dx, *dy);
            }

            (InputEvent::KeyDown { code }, CaptureState::Captured { .. }) => {
                if let Some(key) = keys.lookup(code) {
                    if !self.held.contains(&key) {
                        self.held.push(key);
                        self.refresh_axes();
                    }
                }
            }
            (InputEvent::KeyUp { code }, CaptureState::Captured { .. }) => {
                if let Some(key) = keys.lookup(code) {
                    self.held.retain(|k| *k != key);
                    self.refresh_axes();
                }
            }

            // Everything else is ignored while released, and a second
            // pointer-down while captured changes nothing.
            _ => {}
        }
        self
    }

    /// Drain the look deltas accumulated since the previous call.
    pub fn take_look(&mut self) -> Vec2 {
        std::mem::take(&mut self.pending_look)
    }

    fn refresh_axes(&mut self) {
        self.movement_direction = Vec3::new(
            self.axis_value(MotionAxis::X),
            self.axis_value(MotionAxis::Y),
            self.axis_value(MotionAxis::Z),
        );
        self.roll_direction = self.axis_value(MotionAxis::Roll);
    }

    /// Sign of the most recently pressed key still held on `axis`, else 0.
    fn axis_value(&self, axis: MotionAxis) -> f32 {
        self.held
            .iter()
            .rev()
            .map(|k| k.axis())
            .find(|(a, _)| *a == axis)
            .map_or(0.0, |(_, sign)| sign)
    }
}
