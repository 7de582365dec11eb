//! Hybrid SA→GA optimizer (H-SAGA).
//!
//! Annealing chains explore the layout space from random starts; their bests
//! seed a genetic refinement. The optimizer validates everything up front,
//! so it either fails with a configuration error before doing any work or
//! returns a complete [`OptimizationResult`] (possibly infeasible, never
//! partial).

mod config;
mod optimizer;
mod types;

pub use config::HsagaConfig;
pub use optimizer::{optimize, HsagaOptimizer};
pub use types::{ConvergenceHistory, OptimizationResult, PhaseStats, RunStats};
