//! GA evolutionary loop execution.
//!
//! [`GaRunner`] orchestrates the refinement process:
//! seeding → evaluation → selection → crossover → mutation → replacement → repeat.

use super::config::GaConfig;
use super::init::initial_population;
use super::operators::{mutate, uniform_crossover};
use super::selection::select_parents;
use crate::error::{LayoutError, LayoutResult};
use crate::model::{Origin, Point, Solution};
use crate::problem::{LayoutProblem, FAILED_FITNESS};
use crate::random::create_rng;
use rand::Rng;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Population statistics after one generation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenerationStats {
    /// Generation index (0 = initial population).
    pub generation: usize,
    pub best: f64,
    pub average: f64,
    pub worst: f64,
    /// Mean distance of building positions from their population centroid,
    /// relative to the site extent.
    pub diversity: f64,
}

/// Result of a GA refinement run.
#[derive(Debug, Clone)]
pub struct GaResult {
    /// The best individual of the final population.
    pub best: Solution,

    /// Best fitness value (same as `best.fitness()`).
    pub best_fitness: f64,

    /// Number of completed generations.
    pub generations: usize,

    /// Whether the run was cancelled externally.
    pub cancelled: bool,

    /// Whether the wall-clock limit stopped the run.
    pub timed_out: bool,

    /// Statistics per generation, starting with the initial population.
    pub history: Vec<GenerationStats>,

    /// Fitness evaluations spent in this phase.
    pub evaluations: usize,

    pub duration: Duration,
}

/// Executes the GA refinement loop.
///
/// # Usage
///
/// ```ignore
/// let phase = SaExplorer::explore(&problem, &sa_config, 7).unwrap();
/// let result = GaRunner::run(&problem, &GaConfig::default(), &phase.seeds(), 7)?;
/// println!("Best fitness: {}", result.best_fitness);
/// ```
pub struct GaRunner;

impl GaRunner {
    /// Runs the GA from the given seeds.
    ///
    /// # Errors
    /// - [`LayoutError::InvalidConfig`] if `config` does not validate
    /// - [`LayoutError::EmptyPopulation`] if no population could be formed
    pub fn run(problem: &LayoutProblem, config: &GaConfig, seeds: &[Solution], seed: u64) -> LayoutResult<GaResult> {
        Self::run_with_cancel(problem, config, seeds, seed, None)
    }

    /// Runs the GA with an optional cancellation token.
    ///
    /// If `cancel` is `Some` and the flag is set to `true`, the GA will
    /// stop before the next generation and return the best solution found
    /// so far.
    pub fn run_with_cancel(
        problem: &LayoutProblem,
        config: &GaConfig,
        seeds: &[Solution],
        seed: u64,
        cancel: Option<Arc<AtomicBool>>,
    ) -> LayoutResult<GaResult> {
        config.validate()?;
        let start = Instant::now();
        let evaluations_before = problem.evaluator().evaluations();
        let mut rng = create_rng(seed);

        // 1. Initialize and evaluate
        let mut population = initial_population(problem, seeds, config, &mut rng)?;
        evaluate_population(problem, &mut population, config.parallel);
        sort_descending(&mut population);

        let mut history = Vec::with_capacity(config.max_generations + 1);
        history.push(generation_stats(problem, &population, 0)?);

        let elite_count = config.elite_count();
        let offspring_count = config.population_size - elite_count;
        let mut cancelled = false;
        let mut timed_out = false;
        let mut generations = 0;

        // 2. Evolutionary loop
        for gen in 1..=config.max_generations {
            if cancel.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                cancelled = true;
                break;
            }
            if config
                .time_limit_ms
                .is_some_and(|ms| start.elapsed() >= Duration::from_millis(ms))
            {
                timed_out = true;
                break;
            }

            let mut offspring = breed(problem, &population, config, offspring_count, gen, &mut rng)?;

            // Lazy: copied-through parents keep their memoized fitness
            evaluate_population(problem, &mut offspring, config.parallel);

            // Elitist replacement (merge, sort, truncate)
            population.append(&mut offspring);
            sort_descending(&mut population);
            population.truncate(config.population_size);

            let stats = generation_stats(problem, &population, gen)?;
            log::trace!(
                "generation {gen}: best {:.4}, avg {:.4}, diversity {:.3}",
                stats.best,
                stats.average,
                stats.diversity
            );
            history.push(stats);
            generations = gen;
        }

        let best = population.into_iter().next().ok_or(LayoutError::EmptyPopulation)?;
        let best_fitness = best.rank_fitness();
        let result = GaResult {
            best,
            best_fitness,
            generations,
            cancelled,
            timed_out,
            history,
            evaluations: problem.evaluator().evaluations() - evaluations_before,
            duration: start.elapsed(),
        };
        log::info!(
            "GA phase: best fitness {:.4} after {} generations ({} evaluations in {:?}){}",
            result.best_fitness,
            result.generations,
            result.evaluations,
            result.duration,
            if cancelled { ", cancelled" } else if timed_out { ", time limit reached" } else { "" }
        );
        Ok(result)
    }
}

/// Selection, crossover and mutation for one generation.
///
/// Parents are drawn in pairs; a pair either crosses over or both copy
/// through. An odd final parent copies through alone.
fn breed<R: Rng>(
    problem: &LayoutProblem,
    population: &[Solution],
    config: &GaConfig,
    count: usize,
    generation: usize,
    rng: &mut R,
) -> LayoutResult<Vec<Solution>> {
    let parents = select_parents(population, config.tournament_size, count, rng)?;
    let mut children = Vec::with_capacity(count + 1);
    let mut pairs = parents.chunks_exact(2);
    for pair in pairs.by_ref() {
        if rng.random_range(0.0..1.0) < config.crossover_rate {
            let (a, b) = uniform_crossover(&pair[0], &pair[1], generation, rng);
            children.push(a);
            children.push(b);
        } else {
            children.extend(pair.iter().map(|p| copy_through(p, generation)));
        }
    }
    children.extend(pairs.remainder().iter().map(|p| copy_through(p, generation)));
    children.truncate(count);

    for child in &mut children {
        if rng.random_range(0.0..1.0) < config.mutation_rate {
            mutate(problem, child, config, rng);
        }
    }
    Ok(children)
}

fn copy_through(parent: &Solution, generation: usize) -> Solution {
    let mut child = parent.clone();
    let lineage = child.lineage_mut();
    lineage.origin = Origin::Copy;
    lineage.generation = generation;
    child
}

/// Evaluate every unevaluated individual. Failures rank last instead of
/// aborting the phase.
fn evaluate_population(problem: &LayoutProblem, population: &mut [Solution], parallel: bool) {
    let evaluate = |s: &mut Solution| {
        if s.is_evaluated() {
            return;
        }
        if catch_unwind(AssertUnwindSafe(|| problem.evaluate_or_worst(s))).is_err() {
            log::warn!("evaluation panicked, ranking solution last");
            s.set_evaluation(FAILED_FITNESS, Default::default());
        }
    };

    #[cfg(feature = "parallel")]
    if parallel {
        population.par_iter_mut().for_each(evaluate);
        return;
    }

    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    population.iter_mut().for_each(evaluate);
}

fn sort_descending(population: &mut [Solution]) {
    population.sort_by(|a, b| b.rank_fitness().total_cmp(&a.rank_fitness()));
}

/// Expects `population` sorted best-first.
fn generation_stats(problem: &LayoutProblem, population: &[Solution], generation: usize) -> LayoutResult<GenerationStats> {
    let first = population.first().ok_or(LayoutError::EmptyPopulation)?;
    let fitness: Vec<f64> = population.iter().map(Solution::rank_fitness).collect();
    let average = fitness.iter().sum::<f64>() / fitness.len() as f64;
    Ok(GenerationStats {
        generation,
        best: first.rank_fitness(),
        average,
        worst: fitness.iter().copied().fold(f64::INFINITY, f64::min),
        diversity: diversity(problem, population),
    })
}

fn diversity(problem: &LayoutProblem, population: &[Solution]) -> f64 {
    let n = population.len() as f64;
    let mut total = 0.0;
    let mut samples = 0usize;
    for building in problem.buildings() {
        let positions: Vec<Point> = population.iter().filter_map(|s| s.position(building.id())).collect();
        if positions.is_empty() {
            continue;
        }
        let centroid = positions.iter().fold(Point::default(), |acc, p| acc + *p).scale(1.0 / positions.len() as f64);
        total += positions.iter().map(|p| p.distance(centroid)).sum::<f64>();
        samples += positions.len();
    }
    if samples == 0 || n == 0.0 {
        return 0.0;
    }
    total / samples as f64 / problem.bounds().extent()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::fixtures::campus_problem;
    use crate::sa::{SaConfig, SaExplorer};
    use proptest::prelude::*;

    fn small() -> GaConfig {
        GaConfig::default()
            .with_population_size(20)
            .with_max_generations(15)
            .with_parallel(false)
    }

    #[test]
    fn test_refines_random_population() {
        let problem = campus_problem();
        let result = GaRunner::run(&problem, &small(), &[], 42).unwrap();
        assert_eq!(result.generations, 15);
        assert_eq!(result.history.len(), 16);
        assert!(result.best_fitness >= result.history[0].best);
        assert!(problem.is_complete(&result.best));
        assert!(!result.cancelled);
        assert!(result.evaluations > 0);
    }

    #[test]
    fn test_seeded_from_annealing() {
        let problem = campus_problem();
        let sa = SaConfig::default().with_num_chains(2).with_min_temperature(0.05);
        let phase = SaExplorer::explore(&problem, &sa, 3).unwrap();
        let seeds = phase.seeds();
        let result = GaRunner::run(&problem, &small(), &seeds, 3).unwrap();
        assert!(
            result.best_fitness >= seeds[0].rank_fitness(),
            "elitism must keep the annealed best: {} < {}",
            result.best_fitness,
            seeds[0].rank_fitness()
        );
    }

    #[test]
    fn test_history_stats_ordered() {
        let problem = campus_problem();
        let result = GaRunner::run(&problem, &small(), &[], 8).unwrap();
        for s in &result.history {
            assert!(s.best >= s.average && s.average >= s.worst, "{s:?}");
            assert!(s.diversity >= 0.0);
        }
        assert!(
            result.history.last().unwrap().diversity <= result.history[0].diversity,
            "a random start should be the most diverse"
        );
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let problem = campus_problem();
        let seq = GaRunner::run(&problem, &small(), &[], 5).unwrap();
        let par = GaRunner::run(&problem, &small().with_parallel(true), &[], 5).unwrap();
        assert_eq!(seq.best_fitness, par.best_fitness);
        assert_eq!(seq.best.positions(), par.best.positions());
    }

    #[test]
    fn test_cancel_before_first_generation() {
        let problem = campus_problem();
        let flag = Arc::new(AtomicBool::new(true));
        let result = GaRunner::run_with_cancel(&problem, &small(), &[], 1, Some(flag)).unwrap();
        assert!(result.cancelled);
        assert_eq!(result.generations, 0);
        assert_eq!(result.history.len(), 1);
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let problem = campus_problem();
        let config = small().with_tournament_size(21);
        let err = GaRunner::run(&problem, &config, &[], 1).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidConfig(_)));
        assert_eq!(problem.evaluator().evaluations(), 0, "nothing may be evaluated before validation");
    }

    #[test]
    fn test_offspring_count_excludes_elites() {
        let problem = campus_problem();
        let config = small().with_elite_ratio(0.25);
        let mut rng = create_rng(1);
        let mut population = initial_population(&problem, &[], &config, &mut rng).unwrap();
        evaluate_population(&problem, &mut population, false);
        let children = breed(&problem, &population, &config, 15, 1, &mut rng).unwrap();
        assert_eq!(children.len(), 15);
        assert!(children.iter().all(|c| c.lineage().generation == 1));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_best_fitness_monotonic(seed in any::<u64>()) {
            let problem = campus_problem();
            let config = small().with_population_size(10).with_max_generations(8);
            let result = GaRunner::run(&problem, &config, &[], seed).unwrap();
            for w in result.history.windows(2) {
                prop_assert!(w[1].best >= w[0].best, "best fell from {} to {}", w[0].best, w[1].best);
            }
            prop_assert!(problem.is_complete(&result.best));
        }
    }
}
