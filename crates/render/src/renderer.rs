use crate::field::CubeField;
use cubefield_camera::Camera;
use glam::{Mat4, Quat, Vec3, Vec4};
use std::fmt::Write;

/// Per-frame view state handed to a renderer.
#[derive(Debug, Clone, Copy)]
pub struct RenderView {
    /// Camera view-projection as of the last camera update.
    pub view_projection: Mat4,
    /// Camera transform position (scene offset from the eye).
    pub position: Vec3,
    pub rotation: Quat,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            view_projection: Mat4::IDENTITY,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            fov_degrees: 45.0,
        }
    }
}

impl RenderView {
    pub fn from_camera(camera: &Camera) -> Self {
        let transform = camera.transform();
        Self {
            view_projection: camera.view_projection(),
            position: transform.position,
            rotation: transform.rotation,
            fov_degrees: camera.settings().field_of_view.to_degrees(),
        }
    }

    /// Whether a world-space point lands inside the clip volume.
    pub fn contains(&self, point: Vec3) -> bool {
        let clip: Vec4 = self.view_projection * point.extend(1.0);
        if clip.w <= 0.0 {
            return false;
        }
        clip.x.abs() <= clip.w && clip.y.abs() <= clip.w && clip.z >= 0.0 && clip.z <= clip.w
    }

    /// Number of cube centres inside the clip volume.
    pub fn visible_count(&self, field: &CubeField) -> usize {
        field
            .translations()
            .iter()
            .filter(|p| self.contains(**p))
            .count()
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer reads the cube field and the camera's view; it never mutates
/// camera state.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame of the field as seen through `view`.
    fn render(&self, field: &CubeField, view: &RenderView) -> Self::Output;
}

/// Text renderer for headless runs and tests.
///
/// Produces a human-readable summary of the view and the part of the field it
/// can see.
#[derive(Debug)]
pub struct DebugTextRenderer {
    /// How many visible instances to list individually.
    pub max_listed: usize,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self { max_listed: 8 }
    }
}

impl Default for DebugTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, field: &CubeField, view: &RenderView) -> String {
        let mut out = String::new();
        let (axis, angle) = view.rotation.to_axis_angle();
        let _ = writeln!(out, "=== Cube Field ({} instances) ===", field.len());
        let _ = writeln!(
            out,
            "Camera: pos=({:.2}, {:.2}, {:.2}) rot={:.1}deg about ({:.2}, {:.2}, {:.2}) fov={:.0}",
            view.position.x,
            view.position.y,
            view.position.z,
            angle.to_degrees(),
            axis.x,
            axis.y,
            axis.z,
            view.fov_degrees
        );
        let _ = writeln!(out, "Visible: {}", view.visible_count(field));

        for p in field
            .translations()
            .iter()
            .filter(|p| view.contains(**p))
            .take(self.max_listed)
        {
            let _ = writeln!(out, "  cube at ({:.1}, {:.1}, {:.1})", p.x, p.y, p.z);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubefield_common::{CameraConfig, FieldConfig, Movement};

    fn camera() -> Camera {
        Camera::new(1.0, &CameraConfig::default()).unwrap()
    }

    #[test]
    fn field_is_visible_from_start() {
        let field = CubeField::grid(&FieldConfig::default());
        let view = RenderView::from_camera(&camera());
        assert!(view.visible_count(&field) > 0);
    }

    #[test]
    fn point_behind_is_not_visible() {
        let view = RenderView::from_camera(&camera());
        assert!(view.contains(Vec3::new(0.0, 0.0, -10.0)));
        assert!(!view.contains(Vec3::new(0.0, 0.0, 10.0)));
        assert!(!view.contains(Vec3::new(0.0, 0.0, -500.0)));
    }

    #[test]
    fn moving_forward_brings_field_closer() {
        let field = CubeField::grid(&FieldConfig::default());
        let mut cam = camera();
        cam.press(Movement::Forward);
        cam.update(2.0);
        let view = RenderView::from_camera(&cam);
        assert!(view.contains(Vec3::new(0.0, 0.0, -79.0)));
        assert!(view.visible_count(&field) > 0);
    }

    #[test]
    fn debug_renderer_summary() {
        let field = CubeField::grid(&FieldConfig::default());
        let view = RenderView::from_camera(&camera());
        let output = DebugTextRenderer::new().render(&field, &view);
        assert!(output.contains("1000 instances"));
        assert!(output.contains("pos=(0.00, 0.00, 0.00)"));
        assert!(output.contains("Visible:"));
        assert!(output.contains("cube at"));
    }

    #[test]
    fn render_view_default() {
        let view = RenderView::default();
        assert_eq!(view.fov_degrees, 45.0);
        assert_eq!(view.position, Vec3::ZERO);
    }
}
