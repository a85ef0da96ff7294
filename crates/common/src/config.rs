//! Demo configuration: camera tuning, window and cube-field layout.
//!
//! Every camera field is optional and defaulted on its own, so a config file
//! that only sets `move_speed` keeps the stock field of view and clip planes.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default vertical field of view, in degrees.
pub const DEFAULT_FIELD_OF_VIEW_DEGREES: f32 = 45.0;
pub const DEFAULT_Z_NEAR: f32 = 0.1;
pub const DEFAULT_Z_FAR: f32 = 100.0;
/// Default turn sensitivity, in degrees per second.
pub const DEFAULT_TURN_SENSITIVITY_DEGREES: f32 = 90.0;
/// Default movement speed, in world units per second.
pub const DEFAULT_MOVE_SPEED: f32 = 10.0;
/// Effective move speeds at or below this magnitude do not integrate.
pub const MOVE_DEAD_ZONE: f32 = 0.1;
/// Multiplier applied on top of the turn sensitivity when integrating a turn.
pub const TURN_TUNING: f32 = 70.0;
/// Largest accepted `field.per_axis` (about two million cubes).
pub const MAX_FIELD_PER_AXIS: u32 = 128;

/// Errors from loading configuration files.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("field.per_axis {per_axis} exceeds the maximum of {max}")]
    FieldTooLarge { per_axis: u32, max: u32 },
}

/// Partial camera configuration as supplied by a caller or a config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    /// Vertical field of view in radians.
    pub field_of_view: Option<f32>,
    pub z_near: Option<f32>,
    pub z_far: Option<f32>,
    /// Turn sensitivity in degrees per second.
    pub turn_sensitivity: Option<f32>,
    /// Movement speed in world units per second.
    pub move_speed: Option<f32>,
    pub move_dead_zone: Option<f32>,
    pub turn_tuning: Option<f32>,
}

/// Camera configuration with every field resolved and in camera units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraSettings {
    /// Radians.
    pub field_of_view: f32,
    pub z_near: f32,
    pub z_far: f32,
    /// Radians per second.
    pub turn_sensitivity: f32,
    pub move_speed: f32,
    pub move_dead_zone: f32,
    pub turn_tuning: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        CameraConfig::default().resolve()
    }
}

impl CameraConfig {
    /// Fill every unset field with its default. Turn sensitivity is converted
    /// from degrees to radians here and nowhere else.
    pub fn resolve(&self) -> CameraSettings {
        CameraSettings {
            field_of_view: self
                .field_of_view
                .unwrap_or(DEFAULT_FIELD_OF_VIEW_DEGREES.to_radians()),
            z_near: self.z_near.unwrap_or(DEFAULT_Z_NEAR),
            z_far: self.z_far.unwrap_or(DEFAULT_Z_FAR),
            turn_sensitivity: self
                .turn_sensitivity
                .unwrap_or(DEFAULT_TURN_SENSITIVITY_DEGREES)
                .to_radians(),
            move_speed: self.move_speed.unwrap_or(DEFAULT_MOVE_SPEED),
            move_dead_zone: self.move_dead_zone.unwrap_or(MOVE_DEAD_ZONE),
            turn_tuning: self.turn_tuning.unwrap_or(TURN_TUNING),
        }
    }
}

/// Window configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Initial inner width in physical pixels.
    pub width: u32,
    /// Initial inner height in physical pixels.
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "Cubefield".into(),
        }
    }
}

/// Layout of the instanced cube grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Cubes along each axis; the field holds `per_axis³` instances.
    pub per_axis: u32,
    /// Distance between neighbouring cube centres.
    pub spacing: f32,
    /// Centre of the first cube.
    pub origin: Vec3,
    /// RGBA colour shared by every cube.
    pub color: [f32; 4],
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            per_axis: 10,
            spacing: 2.0,
            origin: Vec3::new(-10.0, -10.0, -60.0),
            color: [1.0, 0.0, 0.0, 1.0],
        }
    }
}

impl FieldConfig {
    pub fn instance_count(&self) -> u32 {
        self.per_axis.saturating_pow(3)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.per_axis > MAX_FIELD_PER_AXIS {
            return Err(ConfigError::FieldTooLarge {
                per_axis: self.per_axis,
                max: MAX_FIELD_PER_AXIS,
            });
        }
        Ok(())
    }
}

/// Top-level demo configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub field: FieldConfig,
}

impl AppConfig {
    /// Parse a YAML document.
    pub fn from_yaml(source: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(source)
    }

    /// Load a YAML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Reject values that parse but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.field.validate()
    }

    /// Load `path` when given, otherwise fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_config_resolves_to_defaults() {
        let s = CameraConfig::default().resolve();
        assert!((s.field_of_view - 45.0_f32.to_radians()).abs() < 1e-6);
        assert_eq!(s.z_near, 0.1);
        assert_eq!(s.z_far, 100.0);
        assert!((s.turn_sensitivity - 90.0_f32.to_radians()).abs() < 1e-6);
        assert_eq!(s.move_speed, 10.0);
        assert_eq!(s.move_dead_zone, MOVE_DEAD_ZONE);
        assert_eq!(s.turn_tuning, TURN_TUNING);
    }

    #[test]
    fn partial_config_defaults_each_field() {
        let config = CameraConfig {
            move_speed: Some(4.0),
            turn_sensitivity: Some(180.0),
            ..CameraConfig::default()
        };
        let s = config.resolve();
        assert_eq!(s.move_speed, 4.0);
        assert!((s.turn_sensitivity - std::f32::consts::PI).abs() < 1e-6);
        assert_eq!(s.z_far, DEFAULT_Z_FAR);
        assert!((s.field_of_view - 45.0_f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn yaml_partial_camera_section() {
        let config = AppConfig::from_yaml("camera:\n  z_far: 250.0\n").unwrap();
        assert_eq!(config.camera.z_far, Some(250.0));
        assert_eq!(config.camera.z_near, None);
        assert_eq!(config.window, WindowConfig::default());
        assert_eq!(config.field, FieldConfig::default());
    }

    #[test]
    fn yaml_rejects_unknown_camera_field() {
        assert!(AppConfig::from_yaml("camera:\n  zoom: 2.0\n").is_err());
    }

    #[test]
    fn default_field_holds_a_thousand_cubes() {
        assert_eq!(FieldConfig::default().instance_count(), 1000);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "window:\n  width: 640\nfield:\n  per_axis: 4").unwrap();
        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.window.width, 640);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.field.instance_count(), 64);
    }

    #[test]
    fn load_rejects_oversized_field() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "field:\n  per_axis: 2000").unwrap();
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::FieldTooLarge {
                per_axis: 2000,
                max: MAX_FIELD_PER_AXIS
            }
        ));

        let largest = FieldConfig {
            per_axis: MAX_FIELD_PER_AXIS,
            ..FieldConfig::default()
        };
        assert!(largest.validate().is_ok());
    }

    #[test]
    fn load_missing_file_reports_path() {
        let err = AppConfig::load(Path::new("/nonexistent/cubefield.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("cubefield.yaml"));
    }

    #[test]
    fn load_or_default_without_path() {
        assert_eq!(AppConfig::load_or_default(None).unwrap(), AppConfig::default());
    }
}
