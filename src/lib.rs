//! Campus site-layout optimization and road synthesis.
//!
//! Places a set of buildings on a polygonal site and derives a road network
//! for the result:
//!
//! - **Fitness & constraints**: weighted objectives (construction cost,
//!   walkability, type adjacency, pluggable extras) minus a bounded penalty
//!   for regulatory violations (setbacks, fire separation, overlap, slope,
//!   coverage and floor-area limits).
//! - **H-SAGA**: a hybrid optimizer. Independent simulated-annealing chains
//!   explore the layout space; their best layouts seed a genetic algorithm
//!   with elitist replacement that refines them.
//! - **Tensor field**: building types contribute radial, grid or organic
//!   basis fields whose weighted sum encodes preferred road directions.
//! - **Roads**: streamlines of the field's major eigenvector, traced with
//!   adaptive Runge–Kutta stepping, classified into tiers and assembled
//!   into a [`roads::RoadGraph`].
//!
//! [`planner::CampusPlanner`] runs the whole pipeline.
//!
//! # Features
//!
//! - `parallel` (default): annealing chains, GA evaluation and field rows
//!   run on the rayon pool.
//! - `serde`: `Serialize`/`Deserialize` for configs and results.
//!
//! # Logging
//!
//! The crate emits through the `log` facade and never installs a logger.

pub mod constraints;
pub mod error;
pub mod field;
pub mod fitness;
pub mod ga;
pub mod hsaga;
pub mod model;
pub mod planner;
pub mod problem;
pub mod random;
pub mod roads;
pub mod sa;

pub use error::{LayoutError, LayoutResult};
pub use hsaga::{optimize, HsagaConfig, HsagaOptimizer, OptimizationResult};
pub use planner::{CampusLayout, CampusPlanner, PlannerConfig};
pub use problem::LayoutProblem;
