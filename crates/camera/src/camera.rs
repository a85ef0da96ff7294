use crate::error::CameraError;
use cubefield_common::{CameraConfig, CameraSettings, Movement, Transform, Velocity};
use cubefield_input::Action;
use glam::{BVec3, EulerRot, Mat4, Quat, Vec3};
use std::collections::BTreeSet;

/// Direction components at or below this magnitude count as zero when a
/// release decides which axes to clear. Rotated unit axes carry ~1e-8 noise.
const AXIS_EPSILON: f32 = 1e-6;

/// First-person camera integrating discrete input into a quaternion pose.
///
/// Input arrives as presses, releases and turn impulses; [`Camera::update`]
/// folds them into the transform once per frame and refreshes the
/// view-projection matrix handed to the renderer.
#[derive(Debug, Clone)]
pub struct Camera {
    transform: Transform,
    velocity: Velocity,
    settings: CameraSettings,
    aspect_ratio: f32,
    /// Zero while stationary, `settings.move_speed` while any move is active.
    effective_move_speed: f32,
    /// Pending turn impulse, consumed by the next update.
    turn_axis: Vec3,
    active_inputs: BTreeSet<Movement>,
    projection: Mat4,
    view_projection: Mat4,
}

impl Camera {
    /// Build a camera for the given viewport aspect ratio. Unset config
    /// fields take their defaults individually.
    pub fn new(aspect_ratio: f32, config: &CameraConfig) -> Result<Self, CameraError> {
        Self::with_settings(aspect_ratio, config.resolve())
    }

    /// Build a camera from fully resolved settings.
    pub fn with_settings(aspect_ratio: f32, settings: CameraSettings) -> Result<Self, CameraError> {
        validate_tuning("turn_sensitivity", settings.turn_sensitivity)?;
        validate_tuning("move_speed", settings.move_speed)?;
        validate_tuning("move_dead_zone", settings.move_dead_zone)?;
        validate_tuning("turn_tuning", settings.turn_tuning)?;
        let projection = perspective(aspect_ratio, &settings)?;

        tracing::info!(
            "camera created: aspect={aspect_ratio:.3} fov={:.1}deg near={} far={}",
            settings.field_of_view.to_degrees(),
            settings.z_near,
            settings.z_far
        );

        Ok(Self {
            transform: Transform::default(),
            velocity: Velocity::default(),
            settings,
            aspect_ratio,
            effective_move_speed: 0.0,
            turn_axis: Vec3::ZERO,
            active_inputs: BTreeSet::new(),
            projection,
            view_projection: projection,
        })
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn velocity(&self) -> &Velocity {
        &self.velocity
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn effective_move_speed(&self) -> f32 {
        self.effective_move_speed
    }

    pub fn turn_axis(&self) -> Vec3 {
        self.turn_axis
    }

    pub fn active_inputs(&self) -> impl Iterator<Item = Movement> + '_ {
        self.active_inputs.iter().copied()
    }

    pub fn is_moving(&self) -> bool {
        self.effective_move_speed.abs() > self.settings.move_dead_zone
            && self.velocity.positional != Vec3::ZERO
    }

    /// Static perspective projection.
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// Projection composed with the current pose, as of the last update.
    pub fn view_projection(&self) -> Mat4 {
        self.view_projection
    }

    /// Pose matrix: rotation applied first, then translation.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_quat(self.transform.rotation) * Mat4::from_translation(self.transform.position)
    }

    /// Rebuild the projection for a new viewport shape, keeping the pose.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) -> Result<(), CameraError> {
        self.projection = perspective(aspect_ratio, &self.settings)?;
        self.aspect_ratio = aspect_ratio;
        self.view_projection = self.projection * self.view_matrix();
        tracing::debug!("camera aspect ratio set to {aspect_ratio:.3}");
        Ok(())
    }

    pub fn forward(&self) -> Vec3 {
        self.direction(Movement::Forward)
    }

    pub fn backward(&self) -> Vec3 {
        self.direction(Movement::Backward)
    }

    pub fn left(&self) -> Vec3 {
        self.direction(Movement::Left)
    }

    pub fn right(&self) -> Vec3 {
        self.direction(Movement::Right)
    }

    /// Unit vector for `movement` under the current orientation.
    ///
    /// Expressed in the frame of the stored scene offset: the view applies
    /// `rotation` to the scene, so travel axes take its inverse.
    pub fn direction(&self, movement: Movement) -> Vec3 {
        let local = Quat::from_rotation_y(movement.yaw_offset()) * Vec3::Z;
        (self.transform.rotation.inverse() * local).normalize_or_zero()
    }

    /// Blend `direction` into the travel direction. Simultaneous inputs add
    /// up to a unit diagonal, never a faster one.
    pub fn start_moving(&mut self, direction: Vec3) {
        self.effective_move_speed = self.settings.move_speed;
        self.velocity.positional = (self.velocity.positional + direction).normalize_or_zero();
    }

    /// Clear every axis `direction` touches and renormalize what remains.
    /// Stops the camera when nothing remains.
    pub fn stop_moving(&mut self, direction: Vec3) {
        let touched: BVec3 = direction.abs().cmpgt(Vec3::splat(AXIS_EPSILON));
        let remaining = Vec3::select(touched, Vec3::ZERO, self.velocity.positional);
        self.velocity.positional = remaining.normalize_or_zero();
        if self.velocity.positional == Vec3::ZERO {
            self.effective_move_speed = 0.0;
        }
    }

    /// Begin moving along `movement`. A press that is already active does
    /// nothing. Returns true when the press took effect.
    pub fn press(&mut self, movement: Movement) -> bool {
        if !self.active_inputs.insert(movement) {
            return false;
        }
        let direction = self.direction(movement);
        self.start_moving(direction);
        tracing::debug!("move {movement} -> {:?}", self.velocity.positional);
        true
    }

    /// Stop moving along `movement`. Releasing an inactive input does nothing.
    pub fn release(&mut self, movement: Movement) -> bool {
        if !self.active_inputs.remove(&movement) {
            return false;
        }
        let direction = self.direction(movement);
        self.stop_moving(direction);
        if self.active_inputs.is_empty() {
            self.velocity.positional = Vec3::ZERO;
            self.effective_move_speed = 0.0;
        }
        tracing::debug!("stop {movement} -> {:?}", self.velocity.positional);
        true
    }

    /// Queue a look impulse from `[pitch, yaw, _]` mouse input.
    ///
    /// The yaw component is re-expressed through the current orientation
    /// before it is stored. Only the latest impulse before an update counts.
    pub fn turn(&mut self, axis: Vec3) {
        if axis.x.abs() + axis.y.abs() == 0.0 {
            return;
        }
        let axis = axis.normalize_or_zero();
        let yaw = self.transform.rotation * Vec3::new(0.0, axis.y, 0.0);
        self.turn_axis = Vec3::new(axis.x, 0.0, axis.z) + yaw;
    }

    /// Apply one routed input action.
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Move(movement) => {
                let _ = self.press(movement);
            }
            Action::Stop(movement) => {
                let _ = self.release(movement);
            }
            Action::Turn(axis) => self.turn(axis),
        }
    }

    /// Advance one frame: integrate movement, consume the turn impulse and
    /// recompute the view-projection matrix.
    pub fn update(&mut self, delta_time: f32) {
        let dt = if delta_time.is_finite() && delta_time >= 0.0 {
            delta_time
        } else {
            tracing::warn!("ignoring invalid frame delta {delta_time}");
            0.0
        };

        if self.effective_move_speed.abs() > self.settings.move_dead_zone {
            self.transform.position += self.velocity.positional * dt * self.effective_move_speed;
        }

        if self.turn_axis != Vec3::ZERO {
            let angles =
                self.turn_axis * (self.settings.turn_sensitivity * self.settings.turn_tuning * dt);
            self.velocity.angular = Quat::from_euler(EulerRot::XYZ, angles.x, angles.y, angles.z);
            self.transform.rotation = (self.velocity.angular * self.transform.rotation).normalize();
            self.turn_axis = Vec3::ZERO;
        }

        self.view_projection = self.projection * self.view_matrix();
        self.velocity.angular = Quat::IDENTITY;

        tracing::trace!(
            "camera update dt={dt:.4} pos={:?} rot={:?}",
            self.transform.position,
            self.transform.rotation
        );
    }
}

fn validate_tuning(name: &'static str, value: f32) -> Result<(), CameraError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CameraError::InvalidTuning { name, value })
    }
}

fn perspective(aspect_ratio: f32, settings: &CameraSettings) -> Result<Mat4, CameraError> {
    if !(aspect_ratio.is_finite() && aspect_ratio > 0.0) {
        return Err(CameraError::InvalidAspectRatio(aspect_ratio));
    }
    let fov = settings.field_of_view;
    if !(fov.is_finite() && fov > 0.0 && fov < std::f32::consts::PI) {
        return Err(CameraError::InvalidFieldOfView(fov));
    }
    let (near, far) = (settings.z_near, settings.z_far);
    if !(near.is_finite() && far.is_finite() && near > 0.0 && far > near) {
        return Err(CameraError::InvalidClipPlanes { near, far });
    }
    Ok(Mat4::perspective_rh(fov, aspect_ratio, near, far))
}
