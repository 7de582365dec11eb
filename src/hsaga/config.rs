//! Combined configuration of both optimizer phases.

use crate::error::LayoutResult;
use crate::ga::GaConfig;
use crate::sa::SaConfig;

/// Configuration of both optimizer phases plus the master seed.
///
/// # Examples
///
/// ```
/// use u_siteplan::hsaga::HsagaConfig;
/// use u_siteplan::ga::GaConfig;
///
/// let config = HsagaConfig::default()
///     .with_ga(GaConfig::fast())
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HsagaConfig {
    pub sa: SaConfig,
    pub ga: GaConfig,

    /// Master seed. Chain and GA seeds are derived from it; `None` draws one
    /// from the OS and records it in the result.
    pub seed: Option<u64>,
}

impl HsagaConfig {
    pub fn with_sa(mut self, sa: SaConfig) -> Self {
        self.sa = sa;
        self
    }

    pub fn with_ga(mut self, ga: GaConfig) -> Self {
        self.ga = ga;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets `parallel` on both phases.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.sa.parallel = parallel;
        self.ga.parallel = parallel;
        self
    }

    /// Quick settings for small sites and tests.
    pub fn fast() -> Self {
        Self {
            sa: SaConfig::default().with_num_chains(2).with_min_temperature(0.01),
            ga: GaConfig::fast(),
            seed: None,
        }
    }

    pub fn validate(&self) -> LayoutResult<()> {
        self.sa.validate()?;
        self.ga.validate()
    }
}
