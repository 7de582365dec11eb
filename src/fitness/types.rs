//! Score provider trait and the per-objective score vector.

use crate::model::{Building, Point, SiteBounds};
use std::collections::BTreeMap;

/// A pluggable objective (solar access, wind comfort, ...).
///
/// Providers compute a score in `[0, 1]`, higher is better. Values outside
/// that range are clamped; a non-finite value is a numerical error and fails
/// the evaluation.
///
/// # Thread Safety
///
/// Providers must be `Send + Sync`: annealing chains and GA evaluation call
/// them concurrently on the shared, read-only problem.
///
/// # Examples
///
/// ```
/// use u_siteplan::fitness::ScoreProvider;
/// use u_siteplan::model::{Building, Point, SiteBounds};
///
/// /// Rewards layouts that keep buildings away from the southern edge.
/// struct NorthBias;
///
/// impl ScoreProvider for NorthBias {
///     fn name(&self) -> &str {
///         "north_bias"
///     }
///
///     fn score(&self, placed: &[(&Building, Point)], bounds: &SiteBounds) -> f64 {
///         let bbox = bounds.bbox();
///         let mean_y = placed.iter().map(|(_, p)| p.y).sum::<f64>() / placed.len().max(1) as f64;
///         (mean_y - bbox.min.y) / bbox.height()
///     }
/// }
/// ```
pub trait ScoreProvider: Send + Sync {
    /// Name under which the provider's weight appears in
    /// [`ObjectiveWeights::extra`](super::ObjectiveWeights::extra).
    fn name(&self) -> &str;

    /// Scores the placed buildings.
    fn score(&self, placed: &[(&Building, Point)], bounds: &SiteBounds) -> f64;
}

/// Per-objective breakdown of one evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectiveScores {
    pub cost: f64,
    pub walkability: f64,
    pub adjacency: f64,
    /// Scores of pluggable providers, by name.
    pub extra: BTreeMap<String, f64>,
    /// Weighted sum of the objectives before the penalty.
    pub weighted_sum: f64,
    /// Constraint penalty subtracted from the weighted sum.
    pub penalty: f64,
}

impl ObjectiveScores {
    /// Final fitness: weighted sum minus penalty.
    pub fn fitness(&self) -> f64 {
        self.weighted_sum - self.penalty
    }
}
