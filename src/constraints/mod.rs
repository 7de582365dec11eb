//! Constraint validation.
//!
//! Pure penalty functions for the placement rules a campus layout must obey:
//!
//! - **Boundary**: every footprint lies inside the site
//! - **Overlap**: footprints do not intersect
//! - **Setback**: progressive clearance from the boundary by floor count
//! - **Fire separation**: edge gap scaling with the taller building
//! - **Slope**: terrain grade under each building, when terrain is supplied
//! - **Coverage / FAR**: optional site-wide ratios
//!
//! Violations are collected into a [`ConstraintReport`] whose penalty feeds
//! the fitness evaluator. Infeasibility is never an error.

pub mod checks;
mod config;
mod report;
mod validator;

pub use config::ConstraintConfig;
pub use report::{ConstraintReport, Severity, Violation, ViolationKind};
pub use validator::ConstraintValidator;
