//! Simulated Annealing exploration.
//!
//! Each chain is a single-solution trajectory: perturb one building with
//! temperature-scaled Gaussian jitter (or, while hot, reset it anywhere),
//! accept improvements unconditionally and worsening moves with the
//! Metropolis probability `exp(Δf / T)`, and remember the best-ever state.
//! Several chains run independently and in parallel; the phase keeps every
//! chain's best as seeds for the genetic refinement.
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
//! - Cerny (1985), "Thermodynamical Approach to the Travelling Salesman Problem"
//! - Lundy & Mees (1986), "Convergence of an Annealing Algorithm"

mod config;
mod explorer;
mod runner;
mod types;

pub use config::{CoolingSchedule, SaConfig};
pub use explorer::SaExplorer;
pub use runner::SaRunner;
pub use types::{ChainResult, SaPhaseResult};
