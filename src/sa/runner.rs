//! Single-chain SA execution loop.

use super::config::{CoolingSchedule, SaConfig};
use super::types::ChainResult;
use crate::error::LayoutResult;
use crate::model::{Origin, Solution};
use crate::problem::LayoutProblem;
use crate::random::create_rng;
use rand::Rng;

/// Runs one annealing chain.
///
/// A chain owns its RNG and its current/best solutions; it only reads the
/// shared problem. Iterations within a chain are strictly sequential.
pub struct SaRunner;

impl SaRunner {
    /// Anneals from a random layout, maximizing fitness.
    ///
    /// # Errors
    /// Rejects an invalid `config` up front. Otherwise propagates the first
    /// evaluation error (e.g. a provider returning NaN); the explorer treats
    /// it as a chain failure.
    pub fn run(problem: &LayoutProblem, config: &SaConfig, chain: usize, seed: u64) -> LayoutResult<ChainResult> {
        config.validate()?;
        let mut rng = create_rng(seed);

        // Initialize
        let mut current = problem.random_solution(&mut rng);
        current.lineage_mut().origin = Origin::Annealed { chain };
        let mut current_fitness = problem.evaluate(&mut current)?;
        let mut best = current.clone();
        let mut best_fitness = current_fitness;

        let mut temperature = config.initial_temperature;
        let mut total_iterations = 0usize;
        let mut accepted_moves = 0usize;
        let mut improving_moves = 0usize;
        let mut step = 0usize;
        let mut trace = vec![best_fitness];

        while temperature > config.min_temperature && step < config.max_iterations {
            for _ in 0..config.iterations_per_temperature {
                let mut neighbor = perturb(problem, &current, temperature, config, &mut rng);
                let neighbor_fitness = problem.evaluate(&mut neighbor)?;
                let delta = neighbor_fitness - current_fitness;

                // Metropolis acceptance criterion (maximization)
                let accept = if delta > 0.0 {
                    improving_moves += 1;
                    true
                } else {
                    rng.random_range(0.0..1.0) < (delta / temperature).exp()
                };

                if accept {
                    current = neighbor;
                    current_fitness = neighbor_fitness;
                    accepted_moves += 1;

                    if current_fitness > best_fitness {
                        best = current.clone();
                        best_fitness = current_fitness;
                    }
                }
                total_iterations += 1;
            }

            trace.push(best_fitness);
            temperature = cool(temperature, config, step);
            step += 1;
        }

        log::debug!(
            "chain {chain}: best {best_fitness:.4} after {step} steps ({total_iterations} moves, {accepted_moves} accepted)"
        );

        Ok(ChainResult {
            chain,
            best,
            best_fitness,
            iterations: total_iterations,
            temperature_steps: step,
            final_temperature: temperature,
            accepted_moves,
            improving_moves,
            trace,
        })
    }
}

/// Moves one building: a full reset (only while hot) or Gaussian jitter whose
/// spread shrinks with temperature. Always returns an in-bounds copy.
fn perturb<R: Rng>(
    problem: &LayoutProblem,
    current: &Solution,
    temperature: f64,
    config: &SaConfig,
    rng: &mut R,
) -> Solution {
    let mut neighbor = current.clone();
    let buildings = problem.buildings();
    let target = &buildings[rng.random_range(0..buildings.len())];
    let Some(position) = neighbor.position(target.id()) else {
        return neighbor;
    };

    let heat = temperature / config.initial_temperature;
    let moved = if heat > config.high_temperature_ratio && rng.random_bool(config.reset_probability) {
        problem.bounds().random_point(rng)
    } else {
        let sigma = problem.bounds().extent() * (config.jitter_scale * heat).max(config.min_jitter);
        problem.jitter(position, sigma, rng)
    };
    neighbor.set_position(target.id(), moved);
    neighbor
}

/// Apply the cooling schedule to compute the next temperature.
fn cool(temperature: f64, config: &SaConfig, step: usize) -> f64 {
    match config.cooling {
        CoolingSchedule::Geometric { alpha } => temperature * alpha,

        CoolingSchedule::Linear => {
            let t = config.initial_temperature
                - (step + 1) as f64 * (config.initial_temperature - config.min_temperature)
                    / config.max_iterations as f64;
            // Land exactly on the floor so the loop condition terminates.
            t.max(config.min_temperature)
        }

        CoolingSchedule::LundyMees { beta } => temperature / (1.0 + beta * temperature),
    }
}
