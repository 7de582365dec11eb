//! Regulatory parameters for constraint checking.

use crate::error::{LayoutError, LayoutResult};

/// Regulatory and penalty parameters.
///
/// # Defaults
///
/// ```
/// use u_siteplan::constraints::ConstraintConfig;
///
/// let config = ConstraintConfig::default();
/// assert_eq!(config.required_setback(4), 5.0);
/// assert_eq!(config.required_setback(6), 6.0);
/// assert_eq!(config.required_setback(20), 13.0);
/// assert_eq!(config.required_setback(40), 15.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstraintConfig {
    /// Setback from the site boundary for low-rise buildings, in meters.
    pub setback_base: f64,

    /// Floors up to which only the base setback applies.
    pub setback_floor_threshold: u32,

    /// Extra setback per floor above the threshold, in meters.
    pub setback_increment: f64,

    /// Setback never exceeds this value, in meters.
    pub setback_max: f64,

    /// Minimum edge-to-edge gap between any two buildings, in meters.
    pub fire_min_separation: f64,

    /// Gap as a fraction of the taller building's height.
    pub fire_height_factor: f64,

    /// Maximum admissible terrain grade under a building, in percent.
    pub max_slope_percent: f64,

    /// Optional cap on total footprint / site area.
    pub max_coverage: Option<f64>,

    /// Optional cap on total floor area / site area.
    pub max_far: Option<f64>,

    /// Upper bound of the constraint penalty.
    pub penalty_cap: f64,

    /// Weighted violation magnitude at which the penalty reaches ~63 % of the cap.
    pub penalty_scale: f64,
}

impl Default for ConstraintConfig {
    fn default() -> Self {
        Self {
            setback_base: 5.0,
            setback_floor_threshold: 4,
            setback_increment: 0.5,
            setback_max: 15.0,
            fire_min_separation: 6.0,
            fire_height_factor: 0.5,
            max_slope_percent: 15.0,
            max_coverage: None,
            max_far: None,
            penalty_cap: 0.5,
            penalty_scale: 50.0,
        }
    }
}

impl ConstraintConfig {
    pub fn with_setback(mut self, base: f64, floor_threshold: u32, increment: f64, max: f64) -> Self {
        self.setback_base = base;
        self.setback_floor_threshold = floor_threshold;
        self.setback_increment = increment;
        self.setback_max = max;
        self
    }

    pub fn with_fire_separation(mut self, min_separation: f64, height_factor: f64) -> Self {
        self.fire_min_separation = min_separation;
        self.fire_height_factor = height_factor;
        self
    }

    pub fn with_max_slope_percent(mut self, slope: f64) -> Self {
        self.max_slope_percent = slope;
        self
    }

    pub fn with_max_coverage(mut self, ratio: f64) -> Self {
        self.max_coverage = Some(ratio);
        self
    }

    pub fn with_max_far(mut self, far: f64) -> Self {
        self.max_far = Some(far);
        self
    }

    pub fn with_penalty(mut self, cap: f64, scale: f64) -> Self {
        self.penalty_cap = cap;
        self.penalty_scale = scale;
        self
    }

    /// Progressive setback: base up to the floor threshold, then a fixed
    /// increment per extra floor, capped at `setback_max`.
    pub fn required_setback(&self, floors: u32) -> f64 {
        let extra_floors = floors.saturating_sub(self.setback_floor_threshold) as f64;
        (self.setback_base + extra_floors * self.setback_increment).min(self.setback_max)
    }

    /// Required edge-to-edge gap for two buildings of the given heights.
    pub fn required_fire_separation(&self, height_a: f64, height_b: f64) -> f64 {
        self.fire_min_separation
            .max(self.fire_height_factor * height_a.max(height_b))
    }

    /// Validates the configuration.
    pub fn validate(&self) -> LayoutResult<()> {
        let non_negative = [
            ("setback_base", self.setback_base),
            ("setback_increment", self.setback_increment),
            ("fire_min_separation", self.fire_min_separation),
            ("fire_height_factor", self.fire_height_factor),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(LayoutError::InvalidConfig(format!("{name} must be non-negative, got {value}")));
            }
        }
        if self.setback_max < self.setback_base {
            return Err(LayoutError::InvalidConfig(format!(
                "setback_max ({}) must be at least setback_base ({})",
                self.setback_max, self.setback_base
            )));
        }
        if !(self.max_slope_percent > 0.0) {
            return Err(LayoutError::InvalidConfig("max_slope_percent must be positive".into()));
        }
        if let Some(c) = self.max_coverage {
            if !(c > 0.0 && c <= 1.0) {
                return Err(LayoutError::InvalidConfig(format!("max_coverage must be in (0, 1], got {c}")));
            }
        }
        if let Some(far) = self.max_far {
            if !(far > 0.0 && far.is_finite()) {
                return Err(LayoutError::InvalidConfig(format!("max_far must be positive, got {far}")));
            }
        }
        if !(self.penalty_cap > 0.0 && self.penalty_cap <= 1.0) {
            return Err(LayoutError::InvalidConfig(format!(
                "penalty_cap must be in (0, 1], got {}",
                self.penalty_cap
            )));
        }
        if !(self.penalty_scale > 0.0 && self.penalty_scale.is_finite()) {
            return Err(LayoutError::InvalidConfig("penalty_scale must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_setback_examples() {
        let c = ConstraintConfig::default();
        assert_eq!(c.required_setback(1), 5.0);
        assert_eq!(c.required_setback(4), 5.0);
        assert_eq!(c.required_setback(6), 6.0);
        assert_eq!(c.required_setback(20), 13.0);
        assert_eq!(c.required_setback(24), 15.0);
        assert_eq!(c.required_setback(100), 15.0);
    }

    #[test]
    fn test_fire_separation_scales_with_taller() {
        let c = ConstraintConfig::default();
        assert_eq!(c.required_fire_separation(7.0, 3.5), 6.0);
        assert_eq!(c.required_fire_separation(3.5, 35.0), 17.5);
    }

    #[test]
    fn test_validate() {
        assert!(ConstraintConfig::default().validate().is_ok());
        assert!(ConstraintConfig::default().with_setback(10.0, 4, 0.5, 5.0).validate().is_err());
        assert!(ConstraintConfig::default().with_penalty(0.0, 50.0).validate().is_err());
        assert!(ConstraintConfig::default().with_max_coverage(1.5).validate().is_err());
    }

    proptest! {
        #[test]
        fn prop_setback_monotone_and_capped(floors in 0u32..200) {
            let c = ConstraintConfig::default();
            let here = c.required_setback(floors);
            let next = c.required_setback(floors + 1);
            prop_assert!(next >= here);
            prop_assert!(here <= c.setback_max);
            prop_assert!(here >= c.setback_base);
        }
    }
}
