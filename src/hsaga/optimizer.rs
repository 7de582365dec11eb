//! Two-phase driver: annealing exploration, then genetic refinement.

use super::config::HsagaConfig;
use super::types::{ConvergenceHistory, OptimizationResult, PhaseStats, RunStats};
use crate::constraints::ConstraintConfig;
use crate::error::{LayoutError, LayoutResult};
use crate::fitness::{FitnessConfig, FitnessEvaluator};
use crate::ga::{GaConfig, GaRunner};
use crate::model::{Building, SiteBounds};
use crate::problem::LayoutProblem;
use crate::random::{derive_seed, resolve_seed};
use crate::sa::{SaConfig, SaExplorer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Stream id of the GA seed; chains use streams `0..num_chains`.
const GA_STREAM: u64 = u64::MAX;

/// Sequences annealing exploration and genetic refinement.
///
/// # Examples
///
/// ```
/// use u_siteplan::hsaga::{HsagaConfig, HsagaOptimizer};
/// use u_siteplan::model::{Building, BuildingType, SiteBounds};
/// use u_siteplan::problem::LayoutProblem;
/// use u_siteplan::fitness::FitnessEvaluator;
///
/// let buildings = vec![
///     Building::of_type("hall", BuildingType::Residential).unwrap(),
///     Building::of_type("cafe", BuildingType::Dining).unwrap(),
/// ];
/// let bounds = SiteBounds::rectangle(0.0, 0.0, 300.0, 300.0).unwrap();
/// let evaluator = FitnessEvaluator::new(Default::default(), Default::default(), vec![]).unwrap();
/// let problem = LayoutProblem::new(buildings, bounds, evaluator).unwrap();
///
/// let optimizer = HsagaOptimizer::new(HsagaConfig::fast().with_seed(1)).unwrap();
/// let result = optimizer.optimize(&problem).unwrap();
/// assert_eq!(result.best.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct HsagaOptimizer {
    config: HsagaConfig,
}

impl HsagaOptimizer {
    /// # Errors
    /// [`LayoutError::InvalidConfig`] if either phase configuration is invalid.
    pub fn new(config: HsagaConfig) -> LayoutResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &HsagaConfig {
        &self.config
    }

    pub fn optimize(&self, problem: &LayoutProblem) -> LayoutResult<OptimizationResult> {
        self.run(problem, None)
    }

    /// Like [`optimize`](Self::optimize), stopping cooperatively once `cancel`
    /// is set. The flag is checked between phases and between generations.
    pub fn optimize_with_cancel(
        &self,
        problem: &LayoutProblem,
        cancel: Arc<AtomicBool>,
    ) -> LayoutResult<OptimizationResult> {
        self.run(problem, Some(cancel))
    }

    fn run(&self, problem: &LayoutProblem, cancel: Option<Arc<AtomicBool>>) -> LayoutResult<OptimizationResult> {
        let seed = resolve_seed(self.config.seed);
        log::info!(
            "optimizing {} buildings (seed {seed}, {} chains, population {})",
            problem.buildings().len(),
            self.config.sa.num_chains,
            self.config.ga.population_size
        );

        // Phase 1: exploration
        let phase = SaExplorer::explore(problem, &self.config.sa, seed)?;
        let seeds = phase.seeds();
        let mut stats = RunStats {
            sa: PhaseStats {
                duration: phase.duration,
                evaluations: phase.evaluations,
            },
            chains_ok: phase.chains.len(),
            chains_failed: phase.failures.len(),
            used_fallback: phase.fallback.is_some(),
            seed,
            ..RunStats::default()
        };
        let mut history = ConvergenceHistory {
            sa_traces: phase.traces(),
            generations: Vec::new(),
        };

        let is_cancelled = || cancel.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed));

        // Phase 2: refinement
        let (best, cancelled) = if is_cancelled() {
            log::info!("cancelled after SA phase");
            let best = seeds.into_iter().next().ok_or(LayoutError::EmptyPopulation)?;
            (best, true)
        } else {
            let ga = GaRunner::run_with_cancel(
                problem,
                &self.config.ga,
                &seeds,
                derive_seed(seed, GA_STREAM),
                cancel.clone(),
            )?;
            stats.ga = PhaseStats {
                duration: ga.duration,
                evaluations: ga.evaluations,
            };
            history.generations = ga.history;
            (ga.best, ga.cancelled)
        };

        let (scores, report) = match problem.analyze(&best) {
            Ok(analysis) => analysis,
            Err(err) => {
                log::warn!("final analysis failed, reporting memoized scores: {err}");
                (best.scores().cloned().unwrap_or_default(), problem.report(&best))
            }
        };
        let fitness = best.rank_fitness();

        log::info!(
            "best fitness {fitness:.4} (penalty {:.4}, {} violations) in {:?}",
            report.penalty,
            report.violations.len(),
            stats.total_duration()
        );
        Ok(OptimizationResult {
            best,
            fitness,
            scores,
            report,
            stats,
            history,
            cancelled,
        })
    }
}

/// One-call optimization with default fitness weights.
///
/// Builds the evaluator and problem, validates everything, then runs both
/// phases. All configuration errors surface before any work starts.
pub fn optimize(
    buildings: Vec<Building>,
    bounds: SiteBounds,
    constraints: ConstraintConfig,
    sa: SaConfig,
    ga: GaConfig,
) -> LayoutResult<OptimizationResult> {
    let optimizer = HsagaOptimizer::new(HsagaConfig { sa, ga, seed: None })?;
    let evaluator = FitnessEvaluator::new(FitnessConfig::default(), constraints, vec![])?;
    let problem = LayoutProblem::new(buildings, bounds, evaluator)?;
    optimizer.optimize(&problem)
}
