//! Genetic Algorithm refinement.
//!
//! Evolves a population of layouts seeded from the annealing phase. Each
//! generation draws parents by tournament, recombines them with uniform
//! crossover, mutates a fraction of the offspring and merges them with the
//! current population, keeping the best `population_size` (elitist
//! replacement, so the best fitness never decreases).
//!
//! # Key Types
//!
//! - [`GaConfig`]: Algorithm parameters (population size, rates, presets)
//! - [`GaRunner`]: Executes the evolutionary loop
//! - [`GaResult`]: Final result with per-generation statistics
//!
//! # Submodules
//!
//! - [`operators`]: uniform crossover and the three layout mutations
//! - [`selection`]: tournament selection
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*
//! - De Jong (2006), *Evolutionary Computation: A Unified Approach*

mod config;
mod init;
pub mod operators;
mod runner;
pub mod selection;

pub use config::{GaConfig, MutationSplit, PopulationMix};
pub use init::initial_population;
pub use runner::{GaResult, GaRunner, GenerationStats};
