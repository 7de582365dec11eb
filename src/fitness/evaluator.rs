//! Weighted-sum fitness with a capped constraint penalty.

use super::config::FitnessConfig;
use super::objectives;
use super::types::{ObjectiveScores, ScoreProvider};
use crate::constraints::{ConstraintConfig, ConstraintReport, ConstraintValidator};
use crate::error::{LayoutError, LayoutResult};
use crate::model::{Building, Point, SiteBounds, Solution, Terrain};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Evaluates layouts.
///
/// `fitness = Σ wᵢ·sᵢ − penalty`, where every `sᵢ ∈ [0, 1]`, the weights sum
/// to 1 and the penalty lies in `[0, cap)`. Fitness therefore lies in
/// `(−cap, 1]`; higher is better.
pub struct FitnessEvaluator {
    config: FitnessConfig,
    validator: ConstraintValidator,
    providers: Vec<Arc<dyn ScoreProvider>>,
    evaluations: AtomicUsize,
}

impl std::fmt::Debug for FitnessEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FitnessEvaluator")
            .field("config", &self.config)
            .field("validator", &self.validator)
            .field("providers", &self.providers.iter().map(|p| p.name()).collect::<Vec<_>>())
            .field("evaluations", &self.evaluations())
            .finish()
    }
}

impl FitnessEvaluator {
    /// Creates an evaluator, validating weights against the registered providers.
    ///
    /// # Errors
    /// - [`LayoutError::InvalidWeights`] if the weights do not sum to 1
    /// - [`LayoutError::UnknownObjective`] if a weight names no provider
    /// - [`LayoutError::InvalidConfig`] for out-of-range parameters
    pub fn new(
        config: FitnessConfig,
        constraints: ConstraintConfig,
        providers: Vec<Arc<dyn ScoreProvider>>,
    ) -> LayoutResult<Self> {
        config.validate()?;
        constraints.validate()?;
        for name in config.weights.extra.keys() {
            if !providers.iter().any(|p| p.name() == name) {
                return Err(LayoutError::UnknownObjective(name.clone()));
            }
        }
        for (i, p) in providers.iter().enumerate() {
            if providers[..i].iter().any(|q| q.name() == p.name()) {
                return Err(LayoutError::InvalidConfig(format!("score provider {} registered twice", p.name())));
            }
        }
        Ok(Self {
            config,
            validator: ConstraintValidator::new(constraints),
            providers,
            evaluations: AtomicUsize::new(0),
        })
    }

    pub fn config(&self) -> &FitnessConfig {
        &self.config
    }

    pub fn validator(&self) -> &ConstraintValidator {
        &self.validator
    }

    /// Number of full (non-memoized) evaluations performed so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }

    /// Evaluates `solution`, memoizing fitness and scores on it.
    ///
    /// Returns the memoized value without recomputation if present.
    ///
    /// # Errors
    /// [`LayoutError::NonFinite`] if any objective produced NaN or infinity.
    pub fn evaluate(
        &self,
        solution: &mut Solution,
        buildings: &[Building],
        bounds: &SiteBounds,
        terrain: Option<&Terrain>,
    ) -> LayoutResult<f64> {
        if let Some(f) = solution.fitness() {
            return Ok(f);
        }
        let (scores, _) = self.score(solution, buildings, bounds, terrain)?;
        let fitness = scores.fitness();
        solution.set_evaluation(fitness, scores);
        Ok(fitness)
    }

    /// Computes scores and the constraint report without touching the memo.
    pub fn score(
        &self,
        solution: &Solution,
        buildings: &[Building],
        bounds: &SiteBounds,
        terrain: Option<&Terrain>,
    ) -> LayoutResult<(ObjectiveScores, ConstraintReport)> {
        self.evaluations.fetch_add(1, Ordering::Relaxed);

        let placed: Vec<(&Building, Point)> = buildings
            .iter()
            .filter_map(|b| solution.position(b.id()).map(|p| (b, p)))
            .collect();

        let weights = &self.config.weights;
        let cost = objectives::cost_score(&placed, bounds, terrain, &self.config);
        let walkability = objectives::walkability_score(&placed, &self.config);
        let adjacency = objectives::adjacency_score(&placed, &self.config);

        let mut weighted_sum =
            weights.cost * cost + weights.walkability * walkability + weights.adjacency * adjacency;

        let mut extra = BTreeMap::new();
        for provider in &self.providers {
            let raw = provider.score(&placed, bounds);
            if !raw.is_finite() {
                return Err(LayoutError::NonFinite(format!("score provider {} returned {raw}", provider.name())));
            }
            let s = raw.clamp(0.0, 1.0);
            weighted_sum += weights.extra.get(provider.name()).copied().unwrap_or(0.0) * s;
            extra.insert(provider.name().to_string(), s);
        }

        let report = self.validator.validate(solution, buildings, bounds, terrain);
        let scores = ObjectiveScores {
            cost,
            walkability,
            adjacency,
            extra,
            weighted_sum,
            penalty: report.penalty,
        };
        if !scores.fitness().is_finite() {
            return Err(LayoutError::NonFinite(format!("fitness {}", scores.fitness())));
        }
        Ok((scores, report))
    }

    /// Constraint report for a layout.
    pub fn report(
        &self,
        solution: &Solution,
        buildings: &[Building],
        bounds: &SiteBounds,
        terrain: Option<&Terrain>,
    ) -> ConstraintReport {
        self.validator.validate(solution, buildings, bounds, terrain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::ObjectiveWeights;
    use crate::model::{BuildingType, Lineage, Origin};

    struct Constant(&'static str, f64);

    impl ScoreProvider for Constant {
        fn name(&self) -> &str {
            self.0
        }
        fn score(&self, _placed: &[(&Building, Point)], _bounds: &SiteBounds) -> f64 {
            self.1
        }
    }

    fn solution(entries: &[(&str, f64, f64)]) -> Solution {
        Solution::new(
            entries
                .iter()
                .map(|&(id, x, y)| (id.to_string(), Point::new(x, y)))
                .collect(),
            Lineage::new(Origin::Random),
        )
    }

    fn buildings() -> Vec<Building> {
        vec![
            Building::new("edu", BuildingType::Educational, 2000.0, 2).unwrap(),
            Building::new("lib", BuildingType::Library, 2000.0, 2).unwrap(),
        ]
    }

    #[test]
    fn test_memoized_evaluation_skips_work() {
        let eval = FitnessEvaluator::new(FitnessConfig::default(), ConstraintConfig::default(), vec![]).unwrap();
        let bounds = SiteBounds::rectangle(0.0, 0.0, 300.0, 300.0).unwrap();
        let mut s = solution(&[("edu", 100.0, 150.0), ("lib", 200.0, 150.0)]);

        let f1 = eval.evaluate(&mut s, &buildings(), &bounds, None).unwrap();
        assert_eq!(eval.evaluations(), 1);
        let f2 = eval.evaluate(&mut s, &buildings(), &bounds, None).unwrap();
        assert_eq!(eval.evaluations(), 1, "memoized fitness must not recompute");
        assert_eq!(f1, f2);

        s.set_position("lib", Point::new(210.0, 150.0));
        eval.evaluate(&mut s, &buildings(), &bounds, None).unwrap();
        assert_eq!(eval.evaluations(), 2);
    }

    #[test]
    fn test_fitness_range_and_breakdown() {
        let eval = FitnessEvaluator::new(FitnessConfig::default(), ConstraintConfig::default(), vec![]).unwrap();
        let bounds = SiteBounds::rectangle(0.0, 0.0, 300.0, 300.0).unwrap();
        let mut s = solution(&[("edu", 150.0, 150.0), ("lib", 151.0, 150.0)]);
        let f = eval.evaluate(&mut s, &buildings(), &bounds, None).unwrap();
        let scores = s.scores().unwrap();
        assert!(scores.penalty > 0.0, "overlapping pair must be penalized");
        assert!(scores.penalty < 0.5);
        assert!((f - (scores.weighted_sum - scores.penalty)).abs() < 1e-12);
        assert!(f > -0.5 && f <= 1.0);
    }

    #[test]
    fn test_unknown_objective_rejected() {
        let config = FitnessConfig::default().with_weights(ObjectiveWeights::new(0.3, 0.3, 0.2).with_extra("solar", 0.2));
        let err = FitnessEvaluator::new(config.clone(), ConstraintConfig::default(), vec![]).unwrap_err();
        assert_eq!(err, LayoutError::UnknownObjective("solar".into()));

        let ok = FitnessEvaluator::new(config, ConstraintConfig::default(), vec![Arc::new(Constant("solar", 0.9))]);
        assert!(ok.is_ok());
    }

    #[test]
    fn test_provider_contributes_and_is_clamped() {
        let config = FitnessConfig::default().with_weights(ObjectiveWeights::new(0.0, 0.0, 0.0).with_extra("solar", 1.0));
        let eval = FitnessEvaluator::new(config, ConstraintConfig::default(), vec![Arc::new(Constant("solar", 3.0))]).unwrap();
        let bounds = SiteBounds::rectangle(0.0, 0.0, 300.0, 300.0).unwrap();
        let mut s = solution(&[("edu", 80.0, 150.0), ("lib", 220.0, 150.0)]);
        let f = eval.evaluate(&mut s, &buildings(), &bounds, None).unwrap();
        assert!((f - 1.0).abs() < 1e-12, "clamped provider score should give 1.0, got {f}");
        assert_eq!(s.scores().unwrap().extra["solar"], 1.0);
    }

    #[test]
    fn test_non_finite_provider_is_an_error() {
        let config = FitnessConfig::default().with_weights(ObjectiveWeights::new(0.5, 0.0, 0.0).with_extra("bad", 0.5));
        let eval = FitnessEvaluator::new(config, ConstraintConfig::default(), vec![Arc::new(Constant("bad", f64::NAN))]).unwrap();
        let bounds = SiteBounds::rectangle(0.0, 0.0, 300.0, 300.0).unwrap();
        let mut s = solution(&[("edu", 80.0, 150.0), ("lib", 220.0, 150.0)]);
        assert!(matches!(
            eval.evaluate(&mut s, &buildings(), &bounds, None),
            Err(LayoutError::NonFinite(_))
        ));
        assert!(!s.is_evaluated());
    }
}
