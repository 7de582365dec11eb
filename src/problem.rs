//! The read-only problem definition shared by every optimizer phase.

use crate::constraints::ConstraintReport;
use crate::error::{LayoutError, LayoutResult};
use crate::fitness::{FitnessEvaluator, ObjectiveScores};
use crate::model::{Building, Lineage, Origin, Point, SiteBounds, Solution, Terrain};
use crate::random::gaussian;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};

/// Fitness recorded for solutions whose evaluation failed numerically.
///
/// Below every attainable fitness (which is bounded below by `-penalty_cap >= -1`).
pub const FAILED_FITNESS: f64 = -2.0;

/// Buildings, site, optional terrain and the fitness evaluator.
///
/// Never mutated once optimization starts. Annealing chains and GA workers
/// borrow it concurrently (`&LayoutProblem` is `Sync`).
#[derive(Debug)]
pub struct LayoutProblem {
    buildings: Vec<Building>,
    bounds: SiteBounds,
    terrain: Option<Terrain>,
    evaluator: FitnessEvaluator,
}

impl LayoutProblem {
    /// # Errors
    /// - [`LayoutError::NoBuildings`] for an empty building list
    /// - [`LayoutError::DuplicateBuilding`] if two buildings share an id
    pub fn new(buildings: Vec<Building>, bounds: SiteBounds, evaluator: FitnessEvaluator) -> LayoutResult<Self> {
        if buildings.is_empty() {
            return Err(LayoutError::NoBuildings);
        }
        let mut seen = BTreeSet::new();
        for b in &buildings {
            if !seen.insert(b.id()) {
                return Err(LayoutError::DuplicateBuilding(b.id().to_string()));
            }
        }
        Ok(Self {
            buildings,
            bounds,
            terrain: None,
            evaluator,
        })
    }

    pub fn with_terrain(mut self, terrain: Terrain) -> Self {
        self.terrain = Some(terrain);
        self
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn building(&self, id: &str) -> Option<&Building> {
        self.buildings.iter().find(|b| b.id() == id)
    }

    pub fn bounds(&self) -> &SiteBounds {
        &self.bounds
    }

    pub fn terrain(&self) -> Option<&Terrain> {
        self.terrain.as_ref()
    }

    pub fn evaluator(&self) -> &FitnessEvaluator {
        &self.evaluator
    }

    /// Evaluates (or returns the memoized fitness of) a solution.
    pub fn evaluate(&self, solution: &mut Solution) -> LayoutResult<f64> {
        self.evaluator
            .evaluate(solution, &self.buildings, &self.bounds, self.terrain.as_ref())
    }

    /// Objective breakdown and constraint report, recomputed from scratch.
    pub fn analyze(&self, solution: &Solution) -> LayoutResult<(ObjectiveScores, ConstraintReport)> {
        self.evaluator
            .score(solution, &self.buildings, &self.bounds, self.terrain.as_ref())
    }

    pub fn report(&self, solution: &Solution) -> ConstraintReport {
        self.evaluator
            .report(solution, &self.buildings, &self.bounds, self.terrain.as_ref())
    }

    /// `true` if the solution has exactly one position for every building id.
    pub fn is_complete(&self, solution: &Solution) -> bool {
        solution.len() == self.buildings.len()
            && self.buildings.iter().all(|b| solution.position(b.id()).is_some())
    }

    /// Evaluates, recording [`FAILED_FITNESS`] instead of propagating a
    /// numerical error. Used where one bad individual must not stop a phase.
    pub fn evaluate_or_worst(&self, solution: &mut Solution) -> f64 {
        match self.evaluate(solution) {
            Ok(f) => f,
            Err(err) => {
                log::warn!("evaluation failed, ranking solution last: {err}");
                solution.set_evaluation(FAILED_FITNESS, ObjectiveScores::default());
                FAILED_FITNESS
            }
        }
    }

    /// Projects a point into the site.
    pub fn clip(&self, p: Point) -> Point {
        self.bounds.clip(p)
    }

    /// Gaussian jitter of `p` with standard deviation `sigma`, clipped to the site.
    pub fn jitter<R: Rng>(&self, p: Point, sigma: f64, rng: &mut R) -> Point {
        let moved = Point::new(p.x + gaussian(rng, sigma), p.y + gaussian(rng, sigma));
        self.bounds.clip(moved)
    }

    /// Every building at a uniformly random in-bounds position.
    pub fn random_solution<R: Rng>(&self, rng: &mut R) -> Solution {
        let positions = self
            .buildings
            .iter()
            .map(|b| (b.id().to_string(), self.bounds.random_point(rng)))
            .collect();
        Solution::new(positions, Lineage::new(Origin::Random))
    }

    /// Deterministic fallback: buildings spread over a regular grid.
    pub fn naive_solution(&self) -> Solution {
        let n = self.buildings.len();
        let cols = (n as f64).sqrt().ceil() as usize;
        let rows = n.div_ceil(cols);
        let bbox = self.bounds.bbox();
        let positions: BTreeMap<String, Point> = self
            .buildings
            .iter()
            .enumerate()
            .map(|(i, b)| {
                let (c, r) = (i % cols, i / cols);
                let p = Point::new(
                    bbox.min.x + bbox.width() * (c as f64 + 0.5) / cols as f64,
                    bbox.min.y + bbox.height() * (r as f64 + 0.5) / rows as f64,
                );
                (b.id().to_string(), self.bounds.clip(p))
            })
            .collect();
        Solution::new(positions, Lineage::new(Origin::Naive))
    }

    /// Copies a solution's positions onto the building list.
    pub fn placed_buildings(&self, solution: &Solution) -> Vec<Building> {
        self.buildings
            .iter()
            .map(|b| {
                let mut placed = b.clone();
                placed.position = solution.position(b.id());
                placed
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::constraints::ConstraintConfig;
    use crate::fitness::FitnessConfig;
    use crate::model::BuildingType;

    /// Five mixed-type buildings on a 500 × 500 site.
    pub fn campus_problem() -> LayoutProblem {
        let buildings = vec![
            Building::new("dorm", BuildingType::Residential, 3000.0, 3).unwrap(),
            Building::new("lecture", BuildingType::Educational, 4000.0, 2).unwrap(),
            Building::new("library", BuildingType::Library, 3000.0, 3).unwrap(),
            Building::new("clinic", BuildingType::Health, 1500.0, 2).unwrap(),
            Building::new("cafe", BuildingType::Dining, 800.0, 1).unwrap(),
        ];
        problem_with(buildings, SiteBounds::rectangle(0.0, 0.0, 500.0, 500.0).unwrap())
    }

    /// Installs the test logger (`RUST_LOG` selects the level) on first use.
    pub fn problem_with(buildings: Vec<Building>, bounds: SiteBounds) -> LayoutProblem {
        let _ = env_logger::builder().is_test(true).try_init();
        let evaluator =
            FitnessEvaluator::new(FitnessConfig::default(), ConstraintConfig::default(), vec![]).unwrap();
        LayoutProblem::new(buildings, bounds, evaluator).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::model::BuildingType;
    use crate::random::create_rng;

    #[test]
    fn test_rejects_empty_and_duplicates() {
        let bounds = SiteBounds::rectangle(0.0, 0.0, 100.0, 100.0).unwrap();
        let eval = || {
            FitnessEvaluator::new(Default::default(), Default::default(), vec![]).unwrap()
        };
        assert_eq!(
            LayoutProblem::new(vec![], bounds.clone(), eval()).unwrap_err(),
            LayoutError::NoBuildings
        );
        let dup = vec![
            Building::of_type("x", BuildingType::Social).unwrap(),
            Building::of_type("x", BuildingType::Dining).unwrap(),
        ];
        assert_eq!(
            LayoutProblem::new(dup, bounds, eval()).unwrap_err(),
            LayoutError::DuplicateBuilding("x".into())
        );
    }

    #[test]
    fn test_random_and_naive_are_complete_and_in_bounds() {
        let problem = campus_problem();
        let mut rng = create_rng(11);
        for s in [problem.random_solution(&mut rng), problem.naive_solution()] {
            assert!(problem.is_complete(&s));
            for p in s.positions().values() {
                assert!(problem.bounds().contains(*p));
            }
        }
    }

    #[test]
    fn test_placed_buildings_carry_positions() {
        let problem = campus_problem();
        let s = problem.naive_solution();
        let placed = problem.placed_buildings(&s);
        assert!(placed.iter().all(|b| b.position.is_some()));
        assert!(problem.buildings().iter().all(|b| b.position.is_none()));
    }
}
