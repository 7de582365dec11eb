//! Builds a [`ConstraintReport`] for a complete layout.

use super::checks;
use super::config::ConstraintConfig;
use super::report::{ConstraintReport, Violation, ViolationKind};
use crate::model::{Building, Point, SiteBounds, Solution, Terrain};

/// Runs every constraint check over a layout.
#[derive(Debug, Clone, Default)]
pub struct ConstraintValidator {
    config: ConstraintConfig,
}

impl ConstraintValidator {
    pub fn new(config: ConstraintConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConstraintConfig {
        &self.config
    }

    /// Checks all buildings that have a position in `solution`.
    ///
    /// # Complexity
    /// O(n²) in the number of buildings (pairwise overlap and fire rules).
    pub fn validate(
        &self,
        solution: &Solution,
        buildings: &[Building],
        bounds: &SiteBounds,
        terrain: Option<&Terrain>,
    ) -> ConstraintReport {
        let placed: Vec<(&Building, Point)> = buildings
            .iter()
            .filter_map(|b| solution.position(b.id()).map(|p| (b, p)))
            .collect();

        let mut violations = Vec::new();
        let mut push = |kind: ViolationKind, subjects: Vec<String>, magnitude: f64| {
            if magnitude > 0.0 {
                violations.push(Violation {
                    kind,
                    subjects,
                    magnitude,
                });
            }
        };

        for &(b, p) in &placed {
            let r = b.radius();
            push(
                ViolationKind::Boundary,
                vec![b.id().to_string()],
                checks::boundary_violation(bounds, p, r),
            );
            push(
                ViolationKind::Setback,
                vec![b.id().to_string()],
                checks::setback_violation(bounds, p, r, self.config.required_setback(b.floors())),
            );
            if let Some(terrain) = terrain {
                push(
                    ViolationKind::Slope,
                    vec![b.id().to_string()],
                    checks::slope_violation(terrain, p, self.config.max_slope_percent),
                );
            }
        }

        for (i, &(a, pa)) in placed.iter().enumerate() {
            for &(b, pb) in &placed[i + 1..] {
                let pair = || vec![a.id().to_string(), b.id().to_string()];
                push(
                    ViolationKind::Overlap,
                    pair(),
                    checks::overlap_violation(pa, a.radius(), pb, b.radius()),
                );
                push(
                    ViolationKind::FireSeparation,
                    pair(),
                    checks::fire_separation_violation(
                        pa,
                        a.radius(),
                        a.height(),
                        pb,
                        b.radius(),
                        b.height(),
                        &self.config,
                    ),
                );
            }
        }

        if let Some(limit) = self.config.max_coverage {
            let footprint: f64 = placed.iter().map(|(b, _)| b.footprint_area()).sum();
            push(
                ViolationKind::Coverage,
                Vec::new(),
                checks::ratio_violation(footprint, bounds.area(), limit),
            );
        }
        if let Some(limit) = self.config.max_far {
            let floor_area: f64 = placed.iter().map(|(b, _)| b.area()).sum();
            push(
                ViolationKind::FloorAreaRatio,
                Vec::new(),
                checks::ratio_violation(floor_area, bounds.area(), limit),
            );
        }

        let weighted_magnitude: f64 = violations.iter().map(Violation::weighted).sum();
        ConstraintReport {
            penalty: checks::penalty(weighted_magnitude, &self.config),
            weighted_magnitude,
            violations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BuildingType, Lineage, Origin};
    use std::collections::BTreeMap;

    fn layout(entries: &[(&str, f64, f64)]) -> Solution {
        let positions: BTreeMap<String, Point> = entries
            .iter()
            .map(|&(id, x, y)| (id.to_string(), Point::new(x, y)))
            .collect();
        Solution::new(positions, Lineage::new(Origin::Random))
    }

    fn pair() -> Vec<Building> {
        vec![
            Building::new("a", BuildingType::Residential, 1000.0, 2).unwrap(),
            Building::new("b", BuildingType::Dining, 1000.0, 2).unwrap(),
        ]
    }

    #[test]
    fn test_feasible_layout_has_zero_penalty() {
        let bounds = SiteBounds::rectangle(0.0, 0.0, 200.0, 200.0).unwrap();
        let report = ConstraintValidator::default().validate(
            &layout(&[("a", 50.0, 100.0), ("b", 150.0, 100.0)]),
            &pair(),
            &bounds,
            None,
        );
        assert!(report.is_feasible(), "unexpected violations: {:?}", report.violations);
        assert_eq!(report.penalty, 0.0);
    }

    #[test]
    fn test_overlapping_pair_is_penalized() {
        let bounds = SiteBounds::rectangle(0.0, 0.0, 200.0, 200.0).unwrap();
        let report = ConstraintValidator::default().validate(
            &layout(&[("a", 100.0, 100.0), ("b", 105.0, 100.0)]),
            &pair(),
            &bounds,
            None,
        );
        assert_eq!(report.count(ViolationKind::Overlap), 1);
        assert_eq!(report.count(ViolationKind::FireSeparation), 1);
        assert!(report.penalty > 0.0);
        assert!(report.penalty <= ConstraintConfig::default().penalty_cap);
    }

    #[test]
    fn test_slope_only_with_terrain() {
        let bounds = SiteBounds::rectangle(0.0, 0.0, 200.0, 200.0).unwrap();
        let steep = Terrain::from_fn(Point::new(0.0, 0.0), 10.0, 21, 21, |p| p.x * 0.3).unwrap();
        let solution = layout(&[("a", 50.0, 100.0), ("b", 150.0, 100.0)]);
        let validator = ConstraintValidator::default();

        let flat = validator.validate(&solution, &pair(), &bounds, None);
        assert_eq!(flat.count(ViolationKind::Slope), 0);

        let hilly = validator.validate(&solution, &pair(), &bounds, Some(&steep));
        assert_eq!(hilly.count(ViolationKind::Slope), 2);
        assert!((hilly.magnitude_of(ViolationKind::Slope) - 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_coverage_limit() {
        let bounds = SiteBounds::rectangle(0.0, 0.0, 40.0, 40.0).unwrap();
        let validator = ConstraintValidator::new(ConstraintConfig::default().with_max_coverage(0.2));
        let report = validator.validate(&layout(&[("a", 20.0, 20.0)]), &pair()[..1], &bounds, None);
        // 500 m² footprint on 1600 m² = 31.25 %, limit 20 %
        assert!((report.magnitude_of(ViolationKind::Coverage) - 11.25).abs() < 1e-9);
    }
}
