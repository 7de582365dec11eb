//! Semantic tensor field over the site.
//!
//! Every placed building contributes a basis field chosen by its type
//! ([`FieldRegistry`]): radial fields pull roads toward commercial and health
//! buildings, grid fields align residential areas, organic fields curve
//! around teaching buildings. Contributions are weighted by importance and
//! distance, summed with a weak background grid, eigen-clamped and smoothed.
//! The road tracer follows the major eigenvector of the result.
//!
//! # References
//!
//! - Chen, Esch, Wonka, Müller & Zhang (2008), "Interactive Procedural Street
//!   Modeling"

mod basis;
mod config;
mod generator;
mod grid;
mod tensor;

pub use basis::{falloff, importance_factor, influence_radius, BasisField, FieldRegistry};
pub use config::FieldConfig;
pub use generator::FieldGenerator;
pub use grid::{FieldSummary, TensorField};
pub use tensor::{Eigen, Tensor};
