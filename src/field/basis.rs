//! Per-building basis fields and the type → strategy registry.

use super::config::FieldConfig;
use super::tensor::Tensor;
use crate::model::{Building, BuildingType, Point};
use std::collections::BTreeMap;
use std::f64::consts::{FRAC_PI_2, TAU};

/// How a building shapes the road field around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BasisField {
    /// Major direction points at the building: roads converge on it.
    Radial,
    /// Two perpendicular directions aligned with the site grid, one dominant.
    Grid,
    /// Ring-like flow whose heading wobbles with distance.
    Organic,
    /// Isotropic: adds magnitude, no preferred direction.
    Neutral,
}

impl BasisField {
    /// Unweighted tensor at `p` for a building centered at `center`.
    pub fn tensor(self, center: Point, p: Point, config: &FieldConfig) -> Tensor {
        match self {
            BasisField::Radial => Tensor::from_direction(center - p, 1.0, config.radial_minor_ratio),
            BasisField::Grid => Tensor::from_angle(config.background_angle, 1.0, config.grid_minor_ratio),
            BasisField::Organic => {
                let offset = p - center;
                let r = offset.length();
                if r <= f64::EPSILON {
                    return Tensor::isotropic(config.grid_minor_ratio);
                }
                let heading = offset.y.atan2(offset.x)
                    + FRAC_PI_2
                    + config.organic_amplitude * (TAU * r / config.organic_wavelength).sin();
                Tensor::from_angle(heading, 1.0, config.grid_minor_ratio)
            }
            BasisField::Neutral => Tensor::isotropic(0.5),
        }
    }
}

/// Maps building types to basis fields. Unregistered types are neutral.
///
/// ```
/// use u_siteplan::field::{BasisField, FieldRegistry};
/// use u_siteplan::model::BuildingType;
///
/// let registry = FieldRegistry::default().with(BuildingType::Sports, BasisField::Radial);
/// assert_eq!(registry.strategy(BuildingType::Sports), BasisField::Radial);
/// assert_eq!(registry.strategy(BuildingType::Residential), BasisField::Grid);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldRegistry {
    strategies: BTreeMap<BuildingType, BasisField>,
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::empty()
            .with(BuildingType::Commercial, BasisField::Radial)
            .with(BuildingType::Health, BasisField::Radial)
            .with(BuildingType::Residential, BasisField::Grid)
            .with(BuildingType::Educational, BasisField::Organic)
    }
}

impl FieldRegistry {
    pub fn empty() -> Self {
        Self {
            strategies: BTreeMap::new(),
        }
    }

    pub fn with(mut self, kind: BuildingType, field: BasisField) -> Self {
        self.register(kind, field);
        self
    }

    pub fn register(&mut self, kind: BuildingType, field: BasisField) {
        self.strategies.insert(kind, field);
    }

    pub fn strategy(&self, kind: BuildingType) -> BasisField {
        self.strategies.get(&kind).copied().unwrap_or(BasisField::Neutral)
    }
}

/// Type importance scaled by footprint relative to the type's typical size.
pub fn importance_factor(building: &Building) -> f64 {
    let base = building.kind().base_footprint() / 2.0;
    let size = (building.footprint_area() / base).sqrt().clamp(0.5, 2.0);
    building.importance() * size
}

/// Decay length of a building's influence.
pub fn influence_radius(building: &Building, config: &FieldConfig) -> f64 {
    let factor = if building.kind() == BuildingType::Health {
        config.health_influence_factor
    } else {
        1.0
    };
    config.influence_radius * factor
}

/// Gaussian falloff outside the footprint; 1 inside it.
pub fn falloff(building: &Building, center: Point, p: Point, config: &FieldConfig) -> f64 {
    let outside = (center.distance(p) - building.radius()).max(0.0);
    let x = outside / influence_radius(building, config);
    (-x * x).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_mapping() {
        let r = FieldRegistry::default();
        assert_eq!(r.strategy(BuildingType::Commercial), BasisField::Radial);
        assert_eq!(r.strategy(BuildingType::Health), BasisField::Radial);
        assert_eq!(r.strategy(BuildingType::Residential), BasisField::Grid);
        assert_eq!(r.strategy(BuildingType::Educational), BasisField::Organic);
        assert_eq!(r.strategy(BuildingType::Library), BasisField::Neutral);
    }

    #[test]
    fn test_radial_points_at_center() {
        let config = FieldConfig::default();
        let center = Point::new(0.0, 0.0);
        let e = BasisField::Radial.tensor(center, Point::new(30.0, 40.0), &config).eigen();
        let toward = Point::new(-0.6, -0.8);
        assert!(e.major_dir.dot(toward).abs() > 0.999);
    }

    #[test]
    fn test_grid_follows_background_angle() {
        let config = FieldConfig::default().with_background(0.1, 0.5);
        let e = BasisField::Grid.tensor(Point::default(), Point::new(3.0, 9.0), &config).eigen();
        assert!((e.major_dir.y.atan2(e.major_dir.x) - 0.5).abs() < 1e-9);
        assert!((e.minor - 0.3).abs() < 1e-9, "one dominant direction");
    }

    #[test]
    fn test_organic_wobbles_with_distance() {
        let config = FieldConfig::default();
        let c = Point::default();
        let near = BasisField::Organic.tensor(c, Point::new(20.0, 0.0), &config).eigen();
        let far = BasisField::Organic.tensor(c, Point::new(40.0, 0.0), &config).eigen();
        // Same bearing, different distance: headings differ.
        assert!(near.major_dir.dot(far.major_dir).abs() < 0.999);
    }

    #[test]
    fn test_neutral_has_no_direction() {
        let e = BasisField::Neutral
            .tensor(Point::default(), Point::new(5.0, 5.0), &FieldConfig::default())
            .eigen();
        assert!(e.anisotropy().abs() < 1e-12);
    }

    #[test]
    fn test_health_reaches_further() {
        let config = FieldConfig::default();
        let clinic = Building::of_type("c", BuildingType::Health).unwrap();
        let shop = Building::new("s", BuildingType::Commercial, clinic.area(), clinic.floors()).unwrap();
        assert!((influence_radius(&clinic, &config) / influence_radius(&shop, &config) - 1.5).abs() < 1e-12);

        let c = Point::default();
        let p = Point::new(150.0, 0.0);
        assert!(falloff(&clinic, c, p, &config) > falloff(&shop, c, p, &config));
        assert_eq!(falloff(&clinic, c, c, &config), 1.0);
    }

    #[test]
    fn test_importance_scales_with_size() {
        let small = Building::new("a", BuildingType::Library, 1000.0, 2).unwrap();
        let large = Building::new("b", BuildingType::Library, 4000.0, 2).unwrap();
        assert!(importance_factor(&large) > importance_factor(&small));
    }
}
