use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};

/// Spatial transform: position and orientation.
///
/// The camera stores the scene offset seen from the eye, so the view matrix
/// is built straight from these fields without inverting them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    /// Unit quaternion. Renormalized by its owner after every mutation.
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

/// Integration state accumulated between frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Velocity {
    /// Direction of travel. Always zero or unit length, never a rate.
    pub positional: Vec3,
    /// Single-frame rotation impulse. Identity when nothing is pending.
    pub angular: Quat,
}

impl Default for Velocity {
    fn default() -> Self {
        Self {
            positional: Vec3::ZERO,
            angular: Quat::IDENTITY,
        }
    }
}

impl Velocity {
    /// True when the positional direction satisfies the zero-or-unit invariant.
    pub fn is_direction_valid(&self) -> bool {
        self.positional == Vec3::ZERO || self.positional.is_normalized()
    }
}

/// A logical movement input, independent of the physical key that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Movement {
    Forward,
    Backward,
    Left,
    Right,
}

impl Movement {
    pub const ALL: [Movement; 4] = [
        Movement::Forward,
        Movement::Backward,
        Movement::Left,
        Movement::Right,
    ];

    /// Rotation around the local up axis that takes the canonical forward
    /// axis (+Z) to this movement's axis.
    pub fn yaw_offset(self) -> f32 {
        match self {
            Movement::Forward => 0.0,
            Movement::Backward => PI,
            Movement::Left => -FRAC_PI_2,
            Movement::Right => FRAC_PI_2,
        }
    }

    /// Short lowercase name used in logs and overlays.
    pub fn label(self) -> &'static str {
        match self {
            Movement::Forward => "forward",
            Movement::Backward => "backward",
            Movement::Left => "left",
            Movement::Right => "right",
        }
    }
}

impl std::fmt::Display for Movement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
    }

    #[test]
    fn velocity_default_is_at_rest() {
        let v = Velocity::default();
        assert_eq!(v.positional, Vec3::ZERO);
        assert_eq!(v.angular, Quat::IDENTITY);
        assert!(v.is_direction_valid());
    }

    #[test]
    fn velocity_rejects_non_unit_direction() {
        let v = Velocity {
            positional: Vec3::new(1.0, 0.0, 1.0),
            ..Velocity::default()
        };
        assert!(!v.is_direction_valid());
    }

    #[test]
    fn movement_offsets_map_forward_axis() {
        let right = Quat::from_rotation_y(Movement::Right.yaw_offset()) * Vec3::Z;
        assert!(right.abs_diff_eq(Vec3::X, 1e-6));
        let left = Quat::from_rotation_y(Movement::Left.yaw_offset()) * Vec3::Z;
        assert!(left.abs_diff_eq(Vec3::NEG_X, 1e-6));
        let back = Quat::from_rotation_y(Movement::Backward.yaw_offset()) * Vec3::Z;
        assert!(back.abs_diff_eq(Vec3::NEG_Z, 1e-6));
    }

    #[test]
    fn movement_labels_are_distinct() {
        let labels: std::collections::BTreeSet<_> =
            Movement::ALL.iter().map(|m| m.label()).collect();
        assert_eq!(labels.len(), 4);
        assert_eq!(Movement::Left.to_string(), "left");
    }
}
