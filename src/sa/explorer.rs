//! Runs independent annealing chains and reduces over their results.

use super::config::SaConfig;
use super::runner::SaRunner;
use super::types::{ChainResult, SaPhaseResult};
use crate::error::{LayoutError, LayoutResult};
use crate::problem::{LayoutProblem, FAILED_FITNESS};
use crate::random::derive_seed;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Exploration phase: `num_chains` independent SA chains.
///
/// Chains share nothing mutable; each gets its own seed derived from the
/// master seed. There is no shared best-so-far tracker: each chain returns
/// its own best and the phase reduces afterwards. A failing chain (error or
/// panic) is logged and excluded; if every chain fails, the naive grid
/// layout is substituted.
pub struct SaExplorer;

impl SaExplorer {
    /// # Errors
    /// Returns [`LayoutError::InvalidConfig`] before any chain starts if
    /// `config` does not validate.
    pub fn explore(problem: &LayoutProblem, config: &SaConfig, master_seed: u64) -> LayoutResult<SaPhaseResult> {
        config.validate()?;
        let start = Instant::now();
        let evaluations_before = problem.evaluator().evaluations();

        let outcomes = run_chains(problem, config, master_seed);

        let mut chains = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(chain) => chains.push(chain),
                Err(err) => {
                    log::warn!("{err}; continuing with remaining chains");
                    failures.push(err);
                }
            }
        }

        let fallback = if chains.is_empty() {
            log::warn!("all {} annealing chains failed, falling back to naive layout", config.num_chains);
            let mut naive = problem.naive_solution();
            if catch_unwind(AssertUnwindSafe(|| problem.evaluate_or_worst(&mut naive))).is_err() {
                log::warn!("naive layout could not be evaluated, ranking it last");
                naive.set_evaluation(FAILED_FITNESS, Default::default());
            }
            Some(naive)
        } else {
            None
        };

        let result = SaPhaseResult {
            chains,
            failures,
            fallback,
            evaluations: problem.evaluator().evaluations() - evaluations_before,
            duration: start.elapsed(),
        };
        if let Some(best) = result.best() {
            log::info!(
                "SA phase: {} chains ok, {} failed, best fitness {:.4}, {} evaluations in {:?}",
                result.chains.len(),
                result.failures.len(),
                best.rank_fitness(),
                result.evaluations,
                result.duration
            );
        }
        Ok(result)
    }
}

fn run_chains(problem: &LayoutProblem, config: &SaConfig, master_seed: u64) -> Vec<LayoutResult<ChainResult>> {
    let run = |chain: usize| run_guarded(problem, config, chain, derive_seed(master_seed, chain as u64));

    #[cfg(feature = "parallel")]
    if config.parallel {
        return (0..config.num_chains).into_par_iter().map(run).collect();
    }

    (0..config.num_chains).map(run).collect()
}

/// Runs one chain, converting a panic into [`LayoutError::ChainFailed`].
fn run_guarded(problem: &LayoutProblem, config: &SaConfig, chain: usize, seed: u64) -> LayoutResult<ChainResult> {
    match catch_unwind(AssertUnwindSafe(|| SaRunner::run(problem, config, chain, seed))) {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(err)) => Err(LayoutError::ChainFailed {
            chain,
            reason: err.to_string(),
        }),
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic".to_string());
            Err(LayoutError::ChainFailed { chain, reason })
        }
    }
}
