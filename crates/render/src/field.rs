use cubefield_common::FieldConfig;
use cubefield_common::config::MAX_FIELD_PER_AXIS;
use glam::Vec3;

/// Instance translations for the cube field.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeField {
    translations: Vec<Vec3>,
    color: [f32; 4],
}

impl CubeField {
    /// Regular `per_axis³` grid starting at `origin`, x varying fastest.
    /// `per_axis` is clamped to [`MAX_FIELD_PER_AXIS`].
    pub fn grid(config: &FieldConfig) -> Self {
        let n = config.per_axis.min(MAX_FIELD_PER_AXIS);
        if n < config.per_axis {
            tracing::warn!(
                "field.per_axis {} clamped to {MAX_FIELD_PER_AXIS}",
                config.per_axis
            );
        }
        let mut translations = Vec::with_capacity((n as usize).pow(3));
        for z in 0..n {
            for y in 0..n {
                for x in 0..n {
                    let step = Vec3::new(x as f32, y as f32, z as f32) * config.spacing;
                    translations.push(config.origin + step);
                }
            }
        }
        tracing::debug!("cube field built with {} instances", translations.len());
        Self {
            translations,
            color: config.color,
        }
    }

    pub fn translations(&self) -> &[Vec3] {
        &self.translations
    }

    pub fn color(&self) -> [f32; 4] {
        self.color
    }

    pub fn len(&self) -> usize {
        self.translations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }

    /// Axis-aligned bounds of the cube centres, or `None` for an empty field.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.translations.first()?;
        Some(
            self.translations
                .iter()
                .fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grid_layout() {
        let field = CubeField::grid(&FieldConfig::default());
        assert_eq!(field.len(), 1000);
        assert_eq!(field.translations()[0], Vec3::new(-10.0, -10.0, -60.0));
        assert_eq!(field.translations()[1], Vec3::new(-8.0, -10.0, -60.0));
        assert_eq!(field.translations()[10], Vec3::new(-10.0, -8.0, -60.0));
        let (lo, hi) = field.bounds().unwrap();
        assert_eq!(lo, Vec3::new(-10.0, -10.0, -60.0));
        assert_eq!(hi, Vec3::new(8.0, 8.0, -42.0));
        assert_eq!(field.color(), [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn oversized_grid_is_clamped() {
        let field = CubeField::grid(&FieldConfig {
            per_axis: 5000,
            spacing: 1.0,
            ..FieldConfig::default()
        });
        assert_eq!(field.len(), (MAX_FIELD_PER_AXIS as usize).pow(3));
    }

    #[test]
    fn empty_grid() {
        let field = CubeField::grid(&FieldConfig {
            per_axis: 0,
            ..FieldConfig::default()
        });
        assert!(field.is_empty());
        assert_eq!(field.bounds(), None);
    }
}
