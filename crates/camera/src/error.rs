/// Construction-time precondition violations.
///
/// Every variant describes a configuration that would yield a degenerate or
/// NaN-producing projection; the camera refuses to build rather than render
/// garbage.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CameraError {
    #[error("aspect ratio must be positive and finite, got {0}")]
    InvalidAspectRatio(f32),
    #[error("field of view must lie strictly between 0 and pi radians, got {0}")]
    InvalidFieldOfView(f32),
    #[error("clip planes must satisfy 0 < near < far, got near={near} far={far}")]
    InvalidClipPlanes { near: f32, far: f32 },
    #[error("{name} must be non-negative and finite, got {value}")]
    InvalidTuning { name: &'static str, value: f32 },
}
