//! Layout genetic operators.
//!
//! The genome is a map from building id to position, so crossover exchanges
//! whole positions rather than splicing coordinates.
//!
//! # Crossover
//!
//! - [`uniform_crossover`]: each building inherited from either parent, 50/50
//!
//! # Mutation
//!
//! - [`MutationKind::Local`]: Gaussian jitter of one building
//! - [`MutationKind::Swap`]: exchange the positions of two buildings
//! - [`MutationKind::Reset`]: move one building anywhere in the site
//!
//! Every operator works on an owned copy and leaves it unevaluated.
//!
//! # References
//!
//! - Syswerda (1989), "Uniform Crossover in Genetic Algorithms"

use super::config::{GaConfig, MutationSplit};
use crate::model::{Lineage, Origin, Solution};
use crate::problem::LayoutProblem;
use rand::Rng;
use std::collections::BTreeMap;

/// Uniform crossover producing two complementary children.
///
/// For every building of `parent1`, one child takes that parent's position
/// and the other takes `parent2`'s. A building missing from `parent2` is
/// inherited from `parent1` by both.
///
/// # Complexity
/// O(n log n) for n buildings (map inserts)
pub fn uniform_crossover<R: Rng>(
    parent1: &Solution,
    parent2: &Solution,
    generation: usize,
    rng: &mut R,
) -> (Solution, Solution) {
    let mut first = BTreeMap::new();
    let mut second = BTreeMap::new();
    for (id, &p1) in parent1.positions() {
        let p2 = parent2.position(id).unwrap_or(p1);
        let (a, b) = if rng.random_bool(0.5) { (p1, p2) } else { (p2, p1) };
        first.insert(id.clone(), a);
        second.insert(id.clone(), b);
    }
    let lineage = Lineage {
        origin: Origin::Crossover,
        generation,
        mutations: 0,
    };
    (Solution::new(first, lineage), Solution::new(second, lineage))
}

/// Which mutation operator was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Local,
    Swap,
    Reset,
}

impl MutationKind {
    /// Draws an operator according to `split`.
    pub fn choose<R: Rng>(split: &MutationSplit, rng: &mut R) -> Self {
        let r = rng.random_range(0.0..1.0);
        if r < split.local {
            MutationKind::Local
        } else if r < split.local + split.swap {
            MutationKind::Swap
        } else {
            MutationKind::Reset
        }
    }
}

/// Applies one randomly chosen mutation in place and returns which.
///
/// Swap needs two buildings; on single-building layouts it degrades to a
/// local jitter.
pub fn mutate<R: Rng>(problem: &LayoutProblem, solution: &mut Solution, config: &GaConfig, rng: &mut R) -> MutationKind {
    let kind = match MutationKind::choose(&config.mutation_split, rng) {
        MutationKind::Swap if problem.buildings().len() < 2 => MutationKind::Local,
        kind => kind,
    };
    let buildings = problem.buildings();
    let n = buildings.len();
    match kind {
        MutationKind::Local => {
            let id = buildings[rng.random_range(0..n)].id();
            if let Some(p) = solution.position(id) {
                let sigma = config.mutation_sigma * problem.bounds().extent();
                solution.set_position(id, problem.jitter(p, sigma, rng));
            }
        }
        MutationKind::Swap => {
            let i = rng.random_range(0..n);
            let mut j = rng.random_range(0..n - 1);
            if j >= i {
                j += 1;
            }
            solution.swap_positions(buildings[i].id(), buildings[j].id());
        }
        MutationKind::Reset => {
            let id = buildings[rng.random_range(0..n)].id();
            solution.set_position(id, problem.bounds().random_point(rng));
        }
    }
    solution.clear_fitness();
    solution.lineage_mut().mutations += 1;
    kind
}
