//! Result types of a full optimization run.

use crate::constraints::ConstraintReport;
use crate::fitness::ObjectiveScores;
use crate::ga::GenerationStats;
use crate::model::Solution;
use std::time::Duration;

/// Timing and evaluation count of one phase.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhaseStats {
    pub duration: Duration,
    pub evaluations: usize,
}

/// Per-phase statistics of a run.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunStats {
    pub sa: PhaseStats,
    pub ga: PhaseStats,

    /// Annealing chains that completed.
    pub chains_ok: usize,

    /// Annealing chains that failed and were excluded.
    pub chains_failed: usize,

    /// The naive layout replaced the annealing seeds.
    pub used_fallback: bool,

    /// Master seed actually used (reproduces the run).
    pub seed: u64,
}

impl RunStats {
    pub fn total_duration(&self) -> Duration {
        self.sa.duration + self.ga.duration
    }

    pub fn total_evaluations(&self) -> usize {
        self.sa.evaluations + self.ga.evaluations
    }
}

/// Convergence diagnostics of both phases.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConvergenceHistory {
    /// Best fitness per temperature step, one trace per surviving chain.
    pub sa_traces: Vec<Vec<f64>>,

    /// GA statistics per generation, starting with the initial population.
    pub generations: Vec<GenerationStats>,
}

impl ConvergenceHistory {
    pub fn best_per_generation(&self) -> Vec<f64> {
        self.generations.iter().map(|g| g.best).collect()
    }

    pub fn average_per_generation(&self) -> Vec<f64> {
        self.generations.iter().map(|g| g.average).collect()
    }
}

/// Outcome of [`HsagaOptimizer::optimize`](super::HsagaOptimizer::optimize).
///
/// Infeasible layouts are not errors: check `report.is_feasible()`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptimizationResult {
    pub best: Solution,
    pub fitness: f64,
    pub scores: ObjectiveScores,
    pub report: ConstraintReport,
    pub stats: RunStats,
    pub history: ConvergenceHistory,

    /// The run stopped early on request; `best` is the best found so far.
    pub cancelled: bool,
}

impl OptimizationResult {
    pub fn is_feasible(&self) -> bool {
        self.report.is_feasible()
    }
}
