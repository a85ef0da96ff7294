use cubefield_common::Movement;
use glam::Vec3;

/// A logical camera command produced by the input layer.
///
/// The camera consumes actions, never raw key codes or pixel events, so any
/// front end (desktop window, scripted CLI run, tests) drives it the same way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// A movement input was pressed.
    Move(Movement),
    /// A movement input was released.
    Stop(Movement),
    /// Look input as `[pixel_dy, pixel_dx, 0]`: x drives pitch, y drives yaw.
    Turn(Vec3),
}

/// Turn axis for a raw mouse delta in pixels: vertical motion pitches,
/// horizontal motion yaws.
pub fn mouse_turn_axis(dx: f32, dy: f32) -> Vec3 {
    Vec3::new(dy, dx, 0.0)
}

impl Action {
    /// Build a turn from a raw mouse delta in pixels.
    pub fn turn_from_mouse(dx: f32, dy: f32) -> Self {
        Action::Turn(mouse_turn_axis(dx, dy))
    }

    /// Movement carried by a press or release, if any.
    pub fn movement(&self) -> Option<Movement> {
        match self {
            Action::Move(m) | Action::Stop(m) => Some(*m),
            Action::Turn(_) => None,
        }
    }
}
