//! Result types of the annealing phase.

use crate::error::LayoutError;
use crate::model::Solution;
use std::time::Duration;

/// Result of one annealing chain.
#[derive(Debug, Clone)]
pub struct ChainResult {
    /// Chain index (also selects the chain's seed).
    pub chain: usize,

    /// Best-ever solution of the chain, evaluated.
    pub best: Solution,

    /// Fitness of `best`.
    pub best_fitness: f64,

    /// Total perturbations evaluated.
    pub iterations: usize,

    /// Temperature steps executed.
    pub temperature_steps: usize,

    /// Temperature when the chain stopped.
    pub final_temperature: f64,

    /// Accepted moves, including improvements.
    pub accepted_moves: usize,

    /// Strictly improving moves.
    pub improving_moves: usize,

    /// Best fitness after each temperature step (non-decreasing).
    pub trace: Vec<f64>,
}

/// Outcome of the whole exploration phase.
#[derive(Debug, Clone)]
pub struct SaPhaseResult {
    /// Surviving chains, ordered by chain index.
    pub chains: Vec<ChainResult>,

    /// Errors of chains that failed.
    pub failures: Vec<LayoutError>,

    /// Set when every chain failed and the naive layout was substituted.
    pub fallback: Option<Solution>,

    /// Fitness evaluations spent in this phase.
    pub evaluations: usize,

    pub duration: Duration,
}

impl SaPhaseResult {
    /// Chain bests sorted by fitness, best first. Falls back to the naive
    /// layout when no chain survived.
    pub fn seeds(&self) -> Vec<Solution> {
        if self.chains.is_empty() {
            return self.fallback.iter().cloned().collect();
        }
        let mut bests: Vec<&ChainResult> = self.chains.iter().collect();
        bests.sort_by(|a, b| b.best_fitness.total_cmp(&a.best_fitness));
        bests.into_iter().map(|c| c.best.clone()).collect()
    }

    /// The single best solution of the phase (max-reduction over chains).
    pub fn best(&self) -> Option<&Solution> {
        self.chains
            .iter()
            .max_by(|a, b| a.best_fitness.total_cmp(&b.best_fitness))
            .map(|c| &c.best)
            .or(self.fallback.as_ref())
    }

    /// Per-chain best-fitness traces, by chain index.
    pub fn traces(&self) -> Vec<Vec<f64>> {
        self.chains.iter().map(|c| c.trace.clone()).collect()
    }
}
