//! First-person camera core.
//!
//! Integrates discrete move/turn input into a quaternion pose once per frame
//! and exposes the view-projection matrix consumed by the renderer.
//!
//! # Invariants
//! - Travel direction is always zero or unit length.
//! - Orientation stays a unit quaternion after every update.
//! - Turn impulses are consumed by exactly one update.

mod camera;
mod error;

pub use camera::Camera;
pub use cubefield_common::config::{MOVE_DEAD_ZONE, TURN_TUNING};
pub use error::CameraError;

pub fn crate_info() -> &'static str {
    "cubefield-camera v0.1.0"
}
