//! Shared types and configuration for the cubefield workspace.

pub mod config;
pub mod types;

pub use config::{AppConfig, CameraConfig, CameraSettings, ConfigError, FieldConfig, WindowConfig};
pub use types::{Movement, Transform, Velocity};
