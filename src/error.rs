//! Error hierarchy for the site-layout engine.
//!
//! Only configuration problems are errors. Infeasible layouts are expressed
//! as penalized fitness, and numerical trouble in the road tracer ends a
//! single streamline rather than the run.

use thiserror::Error;

/// Root error type for all layout-engine failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// A configuration parameter is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The problem contains no buildings to place.
    #[error("at least one building is required")]
    NoBuildings,

    /// Two buildings share the same identifier.
    #[error("duplicate building id: {0}")]
    DuplicateBuilding(String),

    /// The site boundary cannot host any building.
    #[error("degenerate site bounds: {0}")]
    DegenerateBounds(String),

    /// An objective weight names a score provider that was never registered.
    #[error("unknown objective: {0}")]
    UnknownObjective(String),

    /// Objective weights do not sum to one.
    #[error("objective weights must sum to 1.0, got {sum}")]
    InvalidWeights { sum: f64 },

    /// The GA phase was asked to evolve an empty population.
    #[error("genetic algorithm population is empty")]
    EmptyPopulation,

    /// A single annealing chain failed. Recovered by the explorer.
    #[error("annealing chain {chain} failed: {reason}")]
    ChainFailed { chain: usize, reason: String },

    /// NaN or infinity surfaced where a finite value was required.
    #[error("numerical error: {0}")]
    NonFinite(String),
}

/// Convenience alias used across the crate.
pub type LayoutResult<T> = Result<T, LayoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = LayoutError::InvalidWeights { sum: 0.8 };
        assert_eq!(err.to_string(), "objective weights must sum to 1.0, got 0.8");

        let err = LayoutError::ChainFailed {
            chain: 3,
            reason: "non-finite fitness".into(),
        };
        assert!(err.to_string().contains("chain 3"));
    }
}
