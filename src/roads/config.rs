//! Streamline tracing and network assembly settings.

use super::tier::TierThresholds;
use crate::error::{LayoutError, LayoutResult};

/// Streamline integration parameters. Lengths are in meters.
///
/// # Examples
///
/// ```
/// use u_siteplan::roads::TracerConfig;
///
/// let config = TracerConfig::default().with_step_bounds(0.5, 8.0).with_min_length(25.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TracerConfig {
    /// First trial step of each trace.
    pub initial_step: f64,
    pub h_min: f64,
    pub h_max: f64,

    /// Local error tolerance (m) of the embedded 4th/5th-order pair.
    pub tolerance: f64,

    /// Accepted steps per direction.
    pub max_steps: usize,

    /// Shorter traces are discarded.
    pub min_length: f64,

    /// Major eigenvalue below which the field counts as vanished.
    pub min_magnitude: f64,

    /// Eigenvalue gap below which the direction is undefined.
    pub degeneracy_epsilon: f64,

    /// A trace joins an existing streamline once it comes this close.
    pub separation: f64,

    /// Spacing of boundary seeds.
    pub seed_spacing: f64,

    /// Seeds around each building footprint.
    pub seeds_per_building: usize,

    /// Seeds start this far outside footprints and inside the boundary.
    pub seed_offset: f64,

    pub tiers: TierThresholds,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            initial_step: 2.0,
            h_min: 0.25,
            h_max: 10.0,
            tolerance: 0.05,
            max_steps: 400,
            min_length: 30.0,
            min_magnitude: 0.05,
            degeneracy_epsilon: 1e-3,
            separation: 8.0,
            seed_spacing: 60.0,
            seeds_per_building: 4,
            seed_offset: 3.0,
            tiers: TierThresholds::default(),
        }
    }
}

impl TracerConfig {
    pub fn with_step_bounds(mut self, h_min: f64, h_max: f64) -> Self {
        self.h_min = h_min;
        self.h_max = h_max;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_steps(mut self, n: usize) -> Self {
        self.max_steps = n;
        self
    }

    pub fn with_min_length(mut self, length: f64) -> Self {
        self.min_length = length;
        self
    }

    pub fn with_separation(mut self, distance: f64) -> Self {
        self.separation = distance;
        self
    }

    pub fn with_seeding(mut self, spacing: f64, per_building: usize) -> Self {
        self.seed_spacing = spacing;
        self.seeds_per_building = per_building;
        self
    }

    pub fn with_tiers(mut self, tiers: TierThresholds) -> Self {
        self.tiers = tiers;
        self
    }

    pub fn validate(&self) -> LayoutResult<()> {
        let invalid = |msg: String| Err(LayoutError::InvalidConfig(msg));
        for (name, v) in [
            ("h_min", self.h_min),
            ("tolerance", self.tolerance),
            ("separation", self.separation),
            ("seed_spacing", self.seed_spacing),
        ] {
            if !(v > 0.0 && v.is_finite()) {
                return invalid(format!("{name} must be positive and finite, got {v}"));
            }
        }
        if !(self.h_max >= self.h_min && self.h_max.is_finite()) {
            return invalid(format!("h_max ({}) must be >= h_min ({})", self.h_max, self.h_min));
        }
        // A longer step can cross a neighbouring streamline between two samples.
        if self.h_max > 2.0 * self.separation {
            return invalid(format!(
                "h_max ({}) must not exceed twice the separation ({})",
                self.h_max, self.separation
            ));
        }
        if !(self.initial_step >= self.h_min && self.initial_step <= self.h_max) {
            return invalid("initial_step must lie within [h_min, h_max]".into());
        }
        if self.max_steps == 0 {
            return invalid("max_steps must be at least 1".into());
        }
        if !(self.min_length >= 0.0 && self.min_magnitude >= 0.0 && self.degeneracy_epsilon >= 0.0 && self.seed_offset >= 0.0)
        {
            return invalid("lengths and thresholds must be non-negative".into());
        }
        if !self.tiers.is_ordered() {
            return invalid("tier thresholds must satisfy primary >= secondary >= bicycle >= 0".into());
        }
        Ok(())
    }
}

/// Graph assembly parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NetworkConfig {
    /// Endpoints and junctions closer than this become one node.
    pub merge_radius: f64,

    /// Disconnected fragments shorter than this (total length) are dropped.
    pub min_fragment_length: f64,

    /// Longer fragments are joined to the main network by a connector no
    /// longer than this; otherwise they stay disconnected.
    pub max_connector_length: f64,

    pub connect_fragments: bool,

    /// Drop roads that run alongside a higher-priority road.
    pub prune_parallel: bool,
    pub parallel_distance: f64,
    /// Radians.
    pub parallel_angle_tolerance: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            merge_radius: 6.0,
            min_fragment_length: 40.0,
            max_connector_length: 80.0,
            connect_fragments: true,
            prune_parallel: false,
            parallel_distance: 10.0,
            parallel_angle_tolerance: 10f64.to_radians(),
        }
    }
}

impl NetworkConfig {
    pub fn with_merge_radius(mut self, radius: f64) -> Self {
        self.merge_radius = radius;
        self
    }

    pub fn with_fragment_repair(mut self, min_length: f64, max_connector: f64, connect: bool) -> Self {
        self.min_fragment_length = min_length;
        self.max_connector_length = max_connector;
        self.connect_fragments = connect;
        self
    }

    pub fn with_parallel_pruning(mut self, distance: f64, angle_tolerance: f64) -> Self {
        self.prune_parallel = true;
        self.parallel_distance = distance;
        self.parallel_angle_tolerance = angle_tolerance;
        self
    }

    pub fn validate(&self) -> LayoutResult<()> {
        let invalid = |msg: String| Err(LayoutError::InvalidConfig(msg));
        if !(self.merge_radius > 0.0 && self.merge_radius.is_finite()) {
            return invalid(format!("merge_radius must be positive, got {}", self.merge_radius));
        }
        if !(self.min_fragment_length >= 0.0 && self.max_connector_length >= 0.0) {
            return invalid("fragment thresholds must be non-negative".into());
        }
        if self.prune_parallel
            && !(self.parallel_distance > 0.0
                && (0.0..std::f64::consts::FRAC_PI_2).contains(&self.parallel_angle_tolerance))
        {
            return invalid("parallel pruning needs a positive distance and an angle in [0, pi/2)".into());
        }
        Ok(())
    }
}
