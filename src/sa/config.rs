//! SA configuration and cooling schedules.

use crate::error::{LayoutError, LayoutResult};

/// Cooling schedule for temperature reduction.
///
/// # References
///
/// - Geometric: standard textbook approach
/// - Linear: fixed-duration cooling
/// - LundyMees: Lundy & Mees (1986), with convergence proof
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CoolingSchedule {
    /// Geometric (exponential) cooling: `T_{k+1} = alpha * T_k`.
    ///
    /// Most widely used. Typical `alpha`: 0.90–0.99.
    Geometric {
        /// Cooling factor in (0, 1). Higher = slower cooling.
        alpha: f64,
    },

    /// Linear cooling: `T_k = T_0 - k * (T_0 - T_min) / max_iterations`.
    Linear,

    /// Lundy-Mees cooling: `T_{k+1} = T_k / (1 + beta * T_k)`.
    ///
    /// Cools fast at high T, slow at low T.
    LundyMees {
        /// Cooling parameter. Typically `(T_0 - T_min) / (max_iter * T_0 * T_min)`.
        beta: f64,
    },
}

impl Default for CoolingSchedule {
    fn default() -> Self {
        CoolingSchedule::Geometric { alpha: 0.95 }
    }
}

/// Configuration for the annealing exploration phase.
///
/// Temperatures are in fitness units: fitness lies in `(-0.5, 1]`, so a
/// starting temperature of 1.0 accepts almost any move at first.
///
/// # Examples
///
/// ```
/// use u_siteplan::sa::{SaConfig, CoolingSchedule};
///
/// let config = SaConfig::default()
///     .with_initial_temperature(0.5)
///     .with_min_temperature(0.001)
///     .with_cooling(CoolingSchedule::Geometric { alpha: 0.9 })
///     .with_num_chains(8);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SaConfig {
    /// Initial temperature. Higher values allow more exploration.
    pub initial_temperature: f64,

    /// Temperature floor. A chain stops as soon as T drops below it.
    pub min_temperature: f64,

    /// Cooling schedule.
    pub cooling: CoolingSchedule,

    /// Perturbations tried at each temperature level.
    pub iterations_per_temperature: usize,

    /// Upper bound on temperature steps. Usually the floor is hit first.
    pub max_iterations: usize,

    /// Number of independent chains.
    pub num_chains: usize,

    /// Jitter standard deviation at `T_0`, as a fraction of the site extent.
    /// Scales linearly with `T / T_0`.
    pub jitter_scale: f64,

    /// Lower bound on the jitter fraction so late moves stay non-trivial.
    pub min_jitter: f64,

    /// Probability of a full random reset while the temperature is high.
    pub reset_probability: f64,

    /// `T / T_0` above which resets are allowed.
    pub high_temperature_ratio: f64,

    /// Whether chains run on the rayon pool (requires the `parallel` feature).
    pub parallel: bool,
}

impl Default for SaConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 1.0,
            min_temperature: 1e-3,
            cooling: CoolingSchedule::default(),
            iterations_per_temperature: 10,
            max_iterations: 1000,
            num_chains: 4,
            jitter_scale: 0.15,
            min_jitter: 0.005,
            reset_probability: 0.1,
            high_temperature_ratio: 0.5,
            parallel: true,
        }
    }
}

impl SaConfig {
    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = t;
        self
    }

    pub fn with_min_temperature(mut self, t: f64) -> Self {
        self.min_temperature = t;
        self
    }

    pub fn with_cooling(mut self, cooling: CoolingSchedule) -> Self {
        self.cooling = cooling;
        self
    }

    pub fn with_iterations_per_temperature(mut self, n: usize) -> Self {
        self.iterations_per_temperature = n;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_num_chains(mut self, n: usize) -> Self {
        self.num_chains = n;
        self
    }

    pub fn with_jitter(mut self, scale: f64, min: f64) -> Self {
        self.jitter_scale = scale;
        self.min_jitter = min;
        self
    }

    pub fn with_reset_probability(mut self, p: f64) -> Self {
        self.reset_probability = p.clamp(0.0, 1.0);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> LayoutResult<()> {
        let invalid = |msg: String| Err(LayoutError::InvalidConfig(msg));
        if !(self.initial_temperature > 0.0 && self.initial_temperature.is_finite()) {
            return invalid(format!("initial_temperature must be positive and finite, got {}", self.initial_temperature));
        }
        if !(self.min_temperature > 0.0 && self.min_temperature.is_finite()) {
            return invalid(format!("min_temperature must be positive and finite, got {}", self.min_temperature));
        }
        if self.min_temperature >= self.initial_temperature {
            return invalid("min_temperature must be less than initial_temperature".into());
        }
        match self.cooling {
            CoolingSchedule::Geometric { alpha } => {
                if !(alpha > 0.0 && alpha < 1.0) {
                    return invalid(format!("geometric alpha must be in (0, 1), got {alpha}"));
                }
            }
            CoolingSchedule::LundyMees { beta } => {
                if !(beta > 0.0 && beta.is_finite()) {
                    return invalid(format!("lundy-mees beta must be positive, got {beta}"));
                }
            }
            CoolingSchedule::Linear => {}
        }
        if self.iterations_per_temperature == 0 {
            return invalid("iterations_per_temperature must be at least 1".into());
        }
        if self.max_iterations == 0 {
            return invalid("max_iterations must be at least 1".into());
        }
        if self.num_chains == 0 {
            return invalid("num_chains must be at least 1".into());
        }
        if !(self.jitter_scale > 0.0 && self.min_jitter >= 0.0 && self.min_jitter <= self.jitter_scale) {
            return invalid(format!(
                "jitter must satisfy 0 <= min_jitter <= jitter_scale, 0 < jitter_scale (got {}, {})",
                self.min_jitter, self.jitter_scale
            ));
        }
        if !(0.0..=1.0).contains(&self.high_temperature_ratio) {
            return invalid("high_temperature_ratio must be in [0, 1]".into());
        }
        if !(0.0..=1.0).contains(&self.reset_probability) {
            return invalid("reset_probability must be in [0, 1]".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SaConfig::default();
        assert!((config.initial_temperature - 1.0).abs() < 1e-10);
        assert!((config.min_temperature - 1e-3).abs() < 1e-15);
        assert_eq!(config.num_chains, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_temperature() {
        let config = SaConfig::default().with_initial_temperature(-1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_nan_temperature() {
        assert!(SaConfig::default().with_initial_temperature(f64::NAN).validate().is_err());
        assert!(SaConfig::default().with_min_temperature(f64::NAN).validate().is_err());
        assert!(SaConfig::default().with_initial_temperature(f64::INFINITY).validate().is_err());
        let nan_alpha = SaConfig::default().with_cooling(CoolingSchedule::Geometric { alpha: f64::NAN });
        assert!(nan_alpha.validate().is_err());
    }

    #[test]
    fn test_validate_min_ge_initial() {
        let config = SaConfig::default()
            .with_initial_temperature(10.0)
            .with_min_temperature(20.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_alpha() {
        let config = SaConfig::default().with_cooling(CoolingSchedule::Geometric { alpha: 1.5 });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_beta() {
        let config = SaConfig::default().with_cooling(CoolingSchedule::LundyMees { beta: -1.0 });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_chains() {
        assert!(SaConfig::default().with_num_chains(0).validate().is_err());
    }

    #[test]
    fn test_validate_bad_jitter() {
        assert!(SaConfig::default().with_jitter(0.0, 0.0).validate().is_err());
        assert!(SaConfig::default().with_jitter(0.1, 0.2).validate().is_err());
    }
}
