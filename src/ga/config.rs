//! GA configuration.
//!
//! [`GaConfig`] holds all parameters that control the refinement loop.

use crate::error::{LayoutError, LayoutResult};

/// How the initial GA population is composed from the SA phase output.
///
/// Fractions of `population_size`; the remainder after `annealed` and
/// `perturbed` is filled with uniformly random layouts.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PopulationMix {
    /// Copies of SA chain bests (exploitation).
    pub annealed: f64,

    /// SA bests re-perturbed at moderate temperature.
    pub perturbed: f64,

    /// Spread of the re-perturbation, as a fraction of the site extent.
    pub perturbation_scale: f64,
}

impl Default for PopulationMix {
    fn default() -> Self {
        Self {
            annealed: 0.5,
            perturbed: 0.3,
            perturbation_scale: 0.05,
        }
    }
}

impl PopulationMix {
    pub fn random(&self) -> f64 {
        (1.0 - self.annealed - self.perturbed).max(0.0)
    }
}

/// Probabilities of the three mutation operators. Must sum to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MutationSplit {
    /// Gaussian jitter of one building.
    pub local: f64,

    /// Exchange the positions of two buildings.
    pub swap: f64,

    /// Move one building to a uniformly random position.
    pub reset: f64,
}

impl Default for MutationSplit {
    fn default() -> Self {
        Self {
            local: 0.7,
            swap: 0.2,
            reset: 0.1,
        }
    }
}

/// Configuration for the Genetic Algorithm refinement phase.
///
/// # Defaults
///
/// ```
/// use u_siteplan::ga::GaConfig;
///
/// let config = GaConfig::default();
/// assert_eq!(config.population_size, 50);
/// assert_eq!(config.max_generations, 100);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_siteplan::ga::GaConfig;
///
/// let config = GaConfig::default()
///     .with_population_size(80)
///     .with_tournament_size(4)
///     .with_elite_ratio(0.1)
///     .with_mutation_rate(0.2);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GaConfig {
    /// Number of individuals in the population.
    pub population_size: usize,

    /// Generations to run. There is no adaptive stopping.
    pub max_generations: usize,

    /// Tournament size (≥ 2, ≤ population size).
    pub tournament_size: usize,

    /// Fraction of the population that survives unconditionally.
    ///
    /// Each generation breeds `population_size - elite_count` offspring.
    pub elite_ratio: f64,

    /// Probability of applying uniform crossover to a parent pair.
    pub crossover_rate: f64,

    /// Probability of mutating an offspring.
    pub mutation_rate: f64,

    /// Mutation operator probabilities.
    pub mutation_split: MutationSplit,

    /// Local-jitter spread, as a fraction of the site extent.
    pub mutation_sigma: f64,

    /// Initial population composition.
    pub mix: PopulationMix,

    /// Whether to evaluate offspring in parallel (requires the `parallel` feature).
    pub parallel: bool,

    /// Optional wall-clock limit in milliseconds, checked between generations.
    pub time_limit_ms: Option<u64>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            max_generations: 100,
            tournament_size: 3,
            elite_ratio: 0.1,
            crossover_rate: 0.8,
            mutation_rate: 0.15,
            mutation_split: MutationSplit::default(),
            mutation_sigma: 0.03,
            mix: PopulationMix::default(),
            parallel: true,
            time_limit_ms: None,
        }
    }
}

impl GaConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the number of generations.
    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    /// Sets the tournament size.
    pub fn with_tournament_size(mut self, k: usize) -> Self {
        self.tournament_size = k;
        self
    }

    /// Sets the elite ratio.
    pub fn with_elite_ratio(mut self, ratio: f64) -> Self {
        self.elite_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Sets the crossover rate.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_mutation_split(mut self, split: MutationSplit) -> Self {
        self.mutation_split = split;
        self
    }

    pub fn with_population_mix(mut self, mix: PopulationMix) -> Self {
        self.mix = mix;
        self
    }

    /// Enables or disables parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the wall-clock time limit in milliseconds.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Number of individuals carried over unchanged each generation.
    pub fn elite_count(&self) -> usize {
        (self.population_size as f64 * self.elite_ratio) as usize
    }

    /// Preset for quick feasibility checks.
    ///
    /// - Population: 30, Generations: 40, Time limit: 10s
    pub fn fast() -> Self {
        Self {
            population_size: 30,
            max_generations: 40,
            time_limit_ms: Some(10_000),
            ..Self::default()
        }
    }

    /// Preset balancing quality and run time.
    ///
    /// - Population: 50, Generations: 100, Time limit: 30s
    pub fn balanced() -> Self {
        Self {
            time_limit_ms: Some(30_000),
            ..Self::default()
        }
    }

    /// Preset for final planning runs.
    ///
    /// - Population: 100, Generations: 250, Time limit: 120s
    pub fn quality() -> Self {
        Self {
            population_size: 100,
            max_generations: 250,
            tournament_size: 4,
            time_limit_ms: Some(120_000),
            ..Self::default()
        }
    }

    /// Validates the configuration.
    ///
    /// Returns [`LayoutError::InvalidConfig`] describing the first invalid parameter.
    pub fn validate(&self) -> LayoutResult<()> {
        let invalid = |msg: String| Err(LayoutError::InvalidConfig(msg));
        if self.population_size < 2 {
            return invalid("population_size must be at least 2".into());
        }
        if self.max_generations == 0 {
            return invalid("max_generations must be at least 1".into());
        }
        if self.tournament_size < 2 {
            return invalid(format!("tournament_size must be at least 2, got {}", self.tournament_size));
        }
        if self.tournament_size > self.population_size {
            return invalid(format!(
                "tournament_size ({}) exceeds population_size ({})",
                self.tournament_size, self.population_size
            ));
        }
        if self.elite_count() >= self.population_size {
            return invalid("elite_ratio too high: elites fill entire population".into());
        }
        for (name, rate) in [
            ("elite_ratio", self.elite_ratio),
            ("crossover_rate", self.crossover_rate),
            ("mutation_rate", self.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return invalid(format!("{name} must be in [0, 1], got {rate}"));
            }
        }
        let split = self.mutation_split;
        if split.local < 0.0 || split.swap < 0.0 || split.reset < 0.0 {
            return invalid("mutation split entries must be non-negative".into());
        }
        let split_sum = split.local + split.swap + split.reset;
        if (split_sum - 1.0).abs() > 1e-6 {
            return invalid(format!("mutation split must sum to 1, got {split_sum}"));
        }
        if !(self.mutation_sigma > 0.0) {
            return invalid("mutation_sigma must be positive".into());
        }
        let mix = self.mix;
        if mix.annealed < 0.0 || mix.perturbed < 0.0 || mix.annealed + mix.perturbed > 1.0 + 1e-9 {
            return invalid(format!(
                "population mix fractions must be non-negative and sum to at most 1 (annealed {}, perturbed {})",
                mix.annealed, mix.perturbed
            ));
        }
        if !(mix.perturbation_scale > 0.0) {
            return invalid("perturbation_scale must be positive".into());
        }
        if self.time_limit_ms == Some(0) {
            return invalid("time_limit_ms must be positive or None".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GaConfig::default();
        assert_eq!(config.population_size, 50);
        assert_eq!(config.max_generations, 100);
        assert_eq!(config.tournament_size, 3);
        assert!((config.elite_ratio - 0.1).abs() < 1e-10);
        assert_eq!(config.elite_count(), 5);
        assert!((config.mix.random() - 0.2).abs() < 1e-10);
        assert!(config.parallel);
        assert!(config.time_limit_ms.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = GaConfig::default()
            .with_population_size(200)
            .with_max_generations(1000)
            .with_tournament_size(5)
            .with_elite_ratio(0.2)
            .with_crossover_rate(0.7)
            .with_mutation_rate(0.05)
            .with_parallel(false);

        assert_eq!(config.population_size, 200);
        assert_eq!(config.max_generations, 1000);
        assert_eq!(config.tournament_size, 5);
        assert_eq!(config.elite_count(), 40);
        assert!((config.crossover_rate - 0.7).abs() < 1e-10);
        assert!((config.mutation_rate - 0.05).abs() < 1e-10);
        assert!(!config.parallel);
    }

    #[test]
    fn test_validate_population_too_small() {
        let config = GaConfig::default().with_population_size(1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_generations() {
        let config = GaConfig::default().with_max_generations(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_tournament_bounds() {
        assert!(GaConfig::default().with_tournament_size(1).validate().is_err());
        let too_big = GaConfig::default().with_population_size(10).with_tournament_size(11);
        assert!(too_big.validate().is_err());
        let equal = GaConfig::default().with_population_size(10).with_tournament_size(10);
        assert!(equal.validate().is_ok());
    }

    #[test]
    fn test_validate_elite_too_high() {
        let config = GaConfig::default()
            .with_population_size(10)
            .with_elite_ratio(1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_clamp_rates() {
        let config = GaConfig::default()
            .with_elite_ratio(1.5)
            .with_crossover_rate(-0.5)
            .with_mutation_rate(2.0);

        assert!((config.elite_ratio - 1.0).abs() < 1e-10);
        assert!((config.crossover_rate - 0.0).abs() < 1e-10);
        assert!((config.mutation_rate - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_validate_mutation_split() {
        let bad = GaConfig::default().with_mutation_split(MutationSplit {
            local: 0.5,
            swap: 0.2,
            reset: 0.1,
        });
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_validate_population_mix() {
        let bad = GaConfig::default().with_population_mix(PopulationMix {
            annealed: 0.8,
            perturbed: 0.4,
            perturbation_scale: 0.05,
        });
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_validate_zero_time_limit() {
        let config = GaConfig::default().with_time_limit_ms(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_presets_valid() {
        for config in [GaConfig::fast(), GaConfig::balanced(), GaConfig::quality()] {
            assert!(config.validate().is_ok(), "{config:?}");
        }
        assert_eq!(GaConfig::quality().population_size, 100);
    }
}
