//! End-to-end pipeline: place buildings, then synthesize roads for the layout.

use crate::error::LayoutResult;
use crate::field::{FieldConfig, FieldGenerator, FieldRegistry, FieldSummary};
use crate::hsaga::{HsagaConfig, HsagaOptimizer, OptimizationResult};
use crate::model::{Building, Point, Solution};
use crate::problem::LayoutProblem;
use crate::roads::{NetworkAssembler, NetworkConfig, RoadGraph, StreamlineTracer, TracerConfig};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Configuration of every pipeline stage.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlannerConfig {
    pub optimizer: HsagaConfig,
    pub field: FieldConfig,
    pub registry: FieldRegistry,
    pub tracer: TracerConfig,
    pub network: NetworkConfig,
}

impl PlannerConfig {
    pub fn with_optimizer(mut self, optimizer: HsagaConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_field(mut self, field: FieldConfig) -> Self {
        self.field = field;
        self
    }

    pub fn with_registry(mut self, registry: FieldRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_tracer(mut self, tracer: TracerConfig) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn with_network(mut self, network: NetworkConfig) -> Self {
        self.network = network;
        self
    }

    pub fn validate(&self) -> LayoutResult<()> {
        self.optimizer.validate()?;
        self.field.validate()?;
        self.tracer.validate()?;
        self.network.validate()
    }
}

/// Roads synthesized for one layout.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoadPlan {
    pub field: FieldSummary,
    /// Streamlines kept after tracing (before graph assembly).
    pub streamlines: usize,
    pub graph: RoadGraph,
    pub duration: Duration,
}

/// A placed campus with its road network.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CampusLayout {
    pub optimization: OptimizationResult,
    /// Empty when the run was cancelled during optimization.
    pub roads: RoadPlan,
}

/// Runs optimize → field → trace → assemble.
///
/// # Examples
///
/// ```no_run
/// use u_siteplan::constraints::ConstraintConfig;
/// use u_siteplan::fitness::{FitnessConfig, FitnessEvaluator};
/// use u_siteplan::model::{Building, BuildingType, SiteBounds};
/// use u_siteplan::planner::{CampusPlanner, PlannerConfig};
/// use u_siteplan::problem::LayoutProblem;
///
/// let buildings = vec![
///     Building::of_type("dorm", BuildingType::Residential).unwrap(),
///     Building::of_type("clinic", BuildingType::Health).unwrap(),
/// ];
/// let bounds = SiteBounds::rectangle(0.0, 0.0, 400.0, 300.0).unwrap();
/// let evaluator = FitnessEvaluator::new(FitnessConfig::default(), ConstraintConfig::default(), vec![]).unwrap();
/// let problem = LayoutProblem::new(buildings, bounds, evaluator).unwrap();
///
/// let planner = CampusPlanner::new(PlannerConfig::default()).unwrap();
/// let layout = planner.plan(&problem).unwrap();
/// println!("{} m of road", layout.roads.graph.total_length());
/// ```
#[derive(Debug, Clone)]
pub struct CampusPlanner {
    optimizer: HsagaOptimizer,
    field: FieldGenerator,
    tracer: StreamlineTracer,
    assembler: NetworkAssembler,
}

impl CampusPlanner {
    /// Validates every stage before anything runs.
    pub fn new(config: PlannerConfig) -> LayoutResult<Self> {
        config.validate()?;
        Ok(Self {
            optimizer: HsagaOptimizer::new(config.optimizer)?,
            field: FieldGenerator::new(config.field, config.registry)?,
            tracer: StreamlineTracer::new(config.tracer)?,
            assembler: NetworkAssembler::new(config.network)?,
        })
    }

    /// # Errors
    /// A field grid too large for the site is reported before optimization
    /// starts; evaluation failures propagate from the optimizer.
    pub fn plan(&self, problem: &LayoutProblem) -> LayoutResult<CampusLayout> {
        self.field.config().check_grid(problem.bounds())?;
        let optimization = self.optimizer.optimize(problem)?;
        self.finish(problem, optimization)
    }

    /// Like [`plan`](Self::plan); a cancelled optimization skips road synthesis.
    pub fn plan_with_cancel(&self, problem: &LayoutProblem, cancel: Arc<AtomicBool>) -> LayoutResult<CampusLayout> {
        self.field.config().check_grid(problem.bounds())?;
        let optimization = self.optimizer.optimize_with_cancel(problem, cancel)?;
        self.finish(problem, optimization)
    }

    fn finish(&self, problem: &LayoutProblem, optimization: OptimizationResult) -> LayoutResult<CampusLayout> {
        let roads = if optimization.cancelled {
            RoadPlan::default()
        } else {
            self.roads_for(problem, &optimization.best)?
        };
        Ok(CampusLayout { optimization, roads })
    }

    /// Synthesizes roads for any complete layout of `problem`.
    ///
    /// The field is rebuilt from scratch on every call.
    pub fn roads_for(&self, problem: &LayoutProblem, solution: &Solution) -> LayoutResult<RoadPlan> {
        let start = Instant::now();
        let placed: Vec<(&Building, Point)> = problem
            .buildings()
            .iter()
            .filter_map(|b| solution.position(b.id()).map(|p| (b, p)))
            .collect();
        let bounds = problem.bounds();

        let field = self.field.generate(bounds, &placed)?;
        let summary = field.summary(self.tracer.config().degeneracy_epsilon);
        let seeds = self.tracer.seeds(bounds, &placed);
        let streamlines = self.tracer.trace_all(&field, bounds, &seeds);
        let roads = self.tracer.classify(&field, &streamlines);
        let graph = self.assembler.assemble(&roads);

        log::info!(
            "roads for {} buildings: {} seeds, {} streamlines, {} edges",
            placed.len(),
            seeds.len(),
            streamlines.len(),
            graph.edge_count()
        );
        Ok(RoadPlan {
            field: summary,
            streamlines: streamlines.len(),
            graph,
            duration: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LayoutError;
    use crate::ga::GaConfig;
    use crate::problem::fixtures::campus_problem;
    use std::sync::atomic::Ordering;

    fn fast_config() -> PlannerConfig {
        let optimizer = HsagaConfig::fast()
            .with_ga(GaConfig::fast().with_max_generations(10))
            .with_seed(11);
        PlannerConfig::default().with_optimizer(optimizer)
    }

    #[test]
    fn test_plan_produces_roads() {
        let problem = campus_problem();
        let layout = CampusPlanner::new(fast_config()).unwrap().plan(&problem).unwrap();
        assert!(!layout.optimization.cancelled);
        assert!(problem.is_complete(&layout.optimization.best));

        let roads = &layout.roads;
        assert_eq!(roads.field.cols, 101, "500 m at 5 m cells");
        assert!(roads.streamlines > 0);
        assert!(roads.graph.edge_count() > 0);
        for node in roads.graph.nodes() {
            assert!(problem.bounds().contains(node.position), "{:?}", node.position);
        }
    }

    #[test]
    fn test_roads_for_is_deterministic() {
        let problem = campus_problem();
        let planner = CampusPlanner::new(fast_config()).unwrap();
        let layout = problem.naive_solution();
        let a = planner.roads_for(&problem, &layout).unwrap();
        let b = planner.roads_for(&problem, &layout).unwrap();
        assert_eq!(a.graph, b.graph);
        assert_eq!(a.field, b.field);
    }

    #[test]
    fn test_cancel_skips_roads() {
        let problem = campus_problem();
        let cancel = Arc::new(AtomicBool::new(false));
        cancel.store(true, Ordering::Relaxed);
        let layout = CampusPlanner::new(fast_config())
            .unwrap()
            .plan_with_cancel(&problem, cancel)
            .unwrap();
        assert!(layout.optimization.cancelled);
        assert!(layout.roads.graph.is_empty());
    }

    #[test]
    fn test_invalid_stage_config_fails_fast() {
        let config = fast_config().with_field(FieldConfig::default().with_cell_size(-1.0));
        assert!(matches!(CampusPlanner::new(config), Err(LayoutError::InvalidConfig(_))));
        let config = fast_config().with_network(NetworkConfig::default().with_merge_radius(0.0));
        assert!(CampusPlanner::new(config).is_err());
    }

    #[test]
    fn test_oversized_field_fails_before_optimizing() {
        let problem = campus_problem();
        let field = FieldConfig {
            max_cells: 10_000,
            ..FieldConfig::default()
        };
        let planner = CampusPlanner::new(fast_config().with_field(field)).unwrap();
        assert!(matches!(planner.plan(&problem), Err(LayoutError::InvalidConfig(_))));
        let cancel = Arc::new(AtomicBool::new(false));
        assert!(planner.plan_with_cancel(&problem, cancel).is_err());
        assert_eq!(problem.evaluator().evaluations(), 0);
    }
}
