//! Objective weights and scoring parameters.

use crate::error::{LayoutError, LayoutResult};
use crate::model::{BuildingType, Point};
use std::collections::BTreeMap;

/// Tolerance on the weight sum.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Weights of the normalized objectives. Must sum to 1.
///
/// `extra` holds weights for pluggable score providers, keyed by
/// [`ScoreProvider::name`](super::ScoreProvider::name).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectiveWeights {
    pub cost: f64,
    pub walkability: f64,
    pub adjacency: f64,
    pub extra: BTreeMap<String, f64>,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            cost: 0.3,
            walkability: 0.35,
            adjacency: 0.35,
            extra: BTreeMap::new(),
        }
    }
}

impl ObjectiveWeights {
    pub fn new(cost: f64, walkability: f64, adjacency: f64) -> Self {
        Self {
            cost,
            walkability,
            adjacency,
            extra: BTreeMap::new(),
        }
    }

    /// Adds a weight for a named score provider.
    pub fn with_extra(mut self, name: impl Into<String>, weight: f64) -> Self {
        self.extra.insert(name.into(), weight);
        self
    }

    pub fn sum(&self) -> f64 {
        self.cost + self.walkability + self.adjacency + self.extra.values().sum::<f64>()
    }

    pub fn validate(&self) -> LayoutResult<()> {
        let named = [("cost", self.cost), ("walkability", self.walkability), ("adjacency", self.adjacency)];
        for (name, w) in named.into_iter().chain(self.extra.iter().map(|(k, v)| (k.as_str(), *v))) {
            if !(w >= 0.0 && w.is_finite()) {
                return Err(LayoutError::InvalidConfig(format!("weight {name} must be non-negative, got {w}")));
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(LayoutError::InvalidWeights { sum });
        }
        Ok(())
    }
}

/// Symmetric type-compatibility table with values in `[-1, 1]`.
///
/// Positive entries reward proximity, negative entries penalize it.
/// Missing pairs are neutral (0).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompatibilityMatrix {
    entries: BTreeMap<(BuildingType, BuildingType), f64>,
}

impl CompatibilityMatrix {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    fn key(a: BuildingType, b: BuildingType) -> (BuildingType, BuildingType) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Sets a pair's compatibility, clamped to `[-1, 1]`.
    pub fn with(mut self, a: BuildingType, b: BuildingType, value: f64) -> Self {
        self.set(a, b, value);
        self
    }

    pub fn set(&mut self, a: BuildingType, b: BuildingType, value: f64) {
        self.entries.insert(Self::key(a, b), value.clamp(-1.0, 1.0));
    }

    pub fn get(&self, a: BuildingType, b: BuildingType) -> f64 {
        self.entries.get(&Self::key(a, b)).copied().unwrap_or(0.0)
    }
}

impl Default for CompatibilityMatrix {
    fn default() -> Self {
        use BuildingType::*;
        Self::empty()
            .with(Residential, Dining, 0.8)
            .with(Residential, Social, 0.6)
            .with(Residential, Sports, 0.5)
            .with(Residential, Health, 0.4)
            .with(Residential, Commercial, 0.5)
            .with(Residential, Residential, 0.3)
            .with(Educational, Library, 0.9)
            .with(Educational, Research, 0.7)
            .with(Educational, Administrative, 0.5)
            .with(Educational, Dining, 0.4)
            .with(Educational, Educational, 0.4)
            .with(Research, Library, 0.7)
            .with(Commercial, Dining, 0.6)
            .with(Dining, Social, 0.6)
            .with(Administrative, Commercial, 0.3)
            .with(Sports, Library, -0.5)
            .with(Sports, Health, -0.4)
            .with(Sports, Research, -0.3)
            .with(Health, Commercial, -0.2)
    }
}

/// Parameters of the fitness evaluator.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FitnessConfig {
    pub weights: ObjectiveWeights,

    /// Lower edge of the ideal walking-distance band, in meters.
    pub walk_ideal_min: f64,

    /// Upper edge of the ideal walking-distance band, in meters.
    pub walk_ideal_max: f64,

    /// Exponential falloff length outside the band, in meters.
    pub walk_falloff: f64,

    /// Distance decay length for type compatibility, in meters.
    pub adjacency_decay: f64,

    /// Pairs farther apart than this contribute nothing to adjacency.
    pub adjacency_cutoff: f64,

    pub compatibility: CompatibilityMatrix,

    /// Relative cost increase at half the site diagonal from the access point.
    pub access_cost_factor: f64,

    /// Relative cost increase per percent of terrain grade.
    pub slope_cost_factor: f64,

    /// Utility/access entry point. Defaults to the site's interior anchor.
    pub access_point: Option<Point>,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self {
            weights: ObjectiveWeights::default(),
            walk_ideal_min: 50.0,
            walk_ideal_max: 200.0,
            walk_falloff: 100.0,
            adjacency_decay: 150.0,
            adjacency_cutoff: 400.0,
            compatibility: CompatibilityMatrix::default(),
            access_cost_factor: 0.5,
            slope_cost_factor: 0.02,
            access_point: None,
        }
    }
}

impl FitnessConfig {
    pub fn with_weights(mut self, weights: ObjectiveWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_walk_band(mut self, min: f64, max: f64, falloff: f64) -> Self {
        self.walk_ideal_min = min;
        self.walk_ideal_max = max;
        self.walk_falloff = falloff;
        self
    }

    pub fn with_adjacency(mut self, decay: f64, cutoff: f64) -> Self {
        self.adjacency_decay = decay;
        self.adjacency_cutoff = cutoff;
        self
    }

    pub fn with_compatibility(mut self, matrix: CompatibilityMatrix) -> Self {
        self.compatibility = matrix;
        self
    }

    pub fn with_access_point(mut self, p: Point) -> Self {
        self.access_point = Some(p);
        self
    }

    pub fn validate(&self) -> LayoutResult<()> {
        self.weights.validate()?;
        if !(self.walk_ideal_min >= 0.0 && self.walk_ideal_max >= self.walk_ideal_min) {
            return Err(LayoutError::InvalidConfig(format!(
                "walk band [{}, {}] is invalid",
                self.walk_ideal_min, self.walk_ideal_max
            )));
        }
        let positive = [
            ("walk_falloff", self.walk_falloff),
            ("adjacency_decay", self.adjacency_decay),
            ("adjacency_cutoff", self.adjacency_cutoff),
        ];
        for (name, v) in positive {
            if !(v > 0.0 && v.is_finite()) {
                return Err(LayoutError::InvalidConfig(format!("{name} must be positive, got {v}")));
            }
        }
        if !(self.access_cost_factor >= 0.0 && self.slope_cost_factor >= 0.0) {
            return Err(LayoutError::InvalidConfig("cost factors must be non-negative".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_valid() {
        assert!(ObjectiveWeights::default().validate().is_ok());
        assert!(FitnessConfig::default().validate().is_ok());
    }

    #[test]
    fn test_weight_sum_checked() {
        let err = ObjectiveWeights::new(0.5, 0.5, 0.5).validate().unwrap_err();
        assert!(matches!(err, LayoutError::InvalidWeights { .. }));

        let with_extra = ObjectiveWeights::new(0.3, 0.3, 0.2).with_extra("solar", 0.2);
        assert!(with_extra.validate().is_ok());
    }

    #[test]
    fn test_negative_weight_rejected() {
        assert!(ObjectiveWeights::new(1.2, -0.2, 0.0).validate().is_err());
    }

    #[test]
    fn test_compatibility_is_symmetric() {
        let m = CompatibilityMatrix::default();
        assert_eq!(
            m.get(BuildingType::Library, BuildingType::Educational),
            m.get(BuildingType::Educational, BuildingType::Library)
        );
        assert_eq!(m.get(BuildingType::Health, BuildingType::Research), 0.0);
        let clamped = CompatibilityMatrix::empty().with(BuildingType::Health, BuildingType::Sports, -3.0);
        assert_eq!(clamped.get(BuildingType::Sports, BuildingType::Health), -1.0);
    }
}
