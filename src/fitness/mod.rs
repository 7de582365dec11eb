//! Multi-objective fitness evaluation.
//!
//! A layout is scored by a weighted sum of normalized objectives, each in
//! `[0, 1]` with higher being better:
//!
//! - **Cost** (inverted): construction cost inflated by access distance and slope
//! - **Walkability**: pairwise distances scored against an ideal band
//! - **Adjacency**: distance-decayed type compatibility, zero beyond a cutoff
//! - **Pluggable**: any number of [`ScoreProvider`]s (solar, wind, ...)
//!
//! The constraint penalty from [`crate::constraints`] is subtracted from the
//! weighted sum. Results are memoized on the [`Solution`](crate::model::Solution).

mod config;
mod evaluator;
pub mod objectives;
mod types;

pub use config::{CompatibilityMatrix, FitnessConfig, ObjectiveWeights};
pub use evaluator::FitnessEvaluator;
pub use types::{ObjectiveScores, ScoreProvider};
