//! Normalized objective scores, each in `[0, 1]` (higher is better).

use super::config::FitnessConfig;
use crate::model::{Building, Point, SiteBounds, Terrain};

/// Score when a pairwise objective has no pairs to look at.
pub const NEUTRAL_WALKABILITY: f64 = 1.0;
pub const NEUTRAL_ADJACENCY: f64 = 0.5;

/// Inverted construction cost.
///
/// Each building's base cost (area × unit cost) is inflated by its distance
/// from the access point and by the terrain grade beneath it. The score is
/// the ratio of base cost to inflated cost, so 1.0 means every building sits
/// on flat ground at the access point.
pub fn cost_score(
    placed: &[(&Building, Point)],
    bounds: &SiteBounds,
    terrain: Option<&Terrain>,
    config: &FitnessConfig,
) -> f64 {
    if placed.is_empty() {
        return 1.0;
    }
    let access = config.access_point.unwrap_or_else(|| bounds.anchor());
    let half_diagonal = (bounds.bbox().diagonal() * 0.5).max(1e-9);

    let mut base_total = 0.0;
    let mut actual_total = 0.0;
    for &(b, p) in placed {
        let base = b.area() * b.kind().unit_cost();
        let access_factor = config.access_cost_factor * (p.distance(access) / half_diagonal);
        let slope_factor = terrain.map_or(0.0, |t| config.slope_cost_factor * t.slope_percent(p));
        base_total += base;
        actual_total += base * (1.0 + access_factor + slope_factor);
    }
    if actual_total <= 0.0 {
        return 1.0;
    }
    (base_total / actual_total).clamp(0.0, 1.0)
}

/// Score of one pairwise distance against the ideal band.
pub fn walk_band_score(distance: f64, config: &FitnessConfig) -> f64 {
    if distance < config.walk_ideal_min {
        (-(config.walk_ideal_min - distance) / config.walk_falloff).exp()
    } else if distance > config.walk_ideal_max {
        (-(distance - config.walk_ideal_max) / config.walk_falloff).exp()
    } else {
        1.0
    }
}

/// Mean band score over all building pairs.
///
/// # Complexity
/// O(n²)
pub fn walkability_score(placed: &[(&Building, Point)], config: &FitnessConfig) -> f64 {
    let mut total = 0.0;
    let mut pairs = 0usize;
    for (i, &(_, a)) in placed.iter().enumerate() {
        for &(_, b) in &placed[i + 1..] {
            total += walk_band_score(a.distance(b), config);
            pairs += 1;
        }
    }
    if pairs == 0 {
        NEUTRAL_WALKABILITY
    } else {
        total / pairs as f64
    }
}

/// Mean distance-decayed type compatibility, mapped from `[-1, 1]` to `[0, 1]`.
///
/// Pairs beyond the cutoff radius contribute zero (neutral).
///
/// # Complexity
/// O(n²)
pub fn adjacency_score(placed: &[(&Building, Point)], config: &FitnessConfig) -> f64 {
    let mut total = 0.0;
    let mut pairs = 0usize;
    for (i, &(a, pa)) in placed.iter().enumerate() {
        for &(b, pb) in &placed[i + 1..] {
            let d = pa.distance(pb);
            if d <= config.adjacency_cutoff {
                let compat = config.compatibility.get(a.kind(), b.kind());
                total += compat * (-d / config.adjacency_decay).exp();
            }
            pairs += 1;
        }
    }
    if pairs == 0 {
        NEUTRAL_ADJACENCY
    } else {
        ((total / pairs as f64 + 1.0) * 0.5).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BuildingType;

    fn building(id: &str, kind: BuildingType) -> Building {
        Building::new(id, kind, 1000.0, 2).unwrap()
    }

    #[test]
    fn test_walk_band() {
        let c = FitnessConfig::default();
        assert_eq!(walk_band_score(100.0, &c), 1.0);
        assert!((walk_band_score(300.0, &c) - (-1.0f64).exp()).abs() < 1e-12);
        assert!((walk_band_score(0.0, &c) - (-0.5f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_single_building_degenerate_pairs() {
        let c = FitnessConfig::default();
        let b = building("a", BuildingType::Library);
        let placed = [(&b, Point::new(10.0, 10.0))];
        assert_eq!(walkability_score(&placed, &c), NEUTRAL_WALKABILITY);
        assert_eq!(adjacency_score(&placed, &c), NEUTRAL_ADJACENCY);
    }

    #[test]
    fn test_adjacency_rewards_compatible_proximity() {
        let c = FitnessConfig::default();
        let edu = building("e", BuildingType::Educational);
        let lib = building("l", BuildingType::Library);
        let near = adjacency_score(&[(&edu, Point::new(0.0, 0.0)), (&lib, Point::new(60.0, 0.0))], &c);
        let far = adjacency_score(&[(&edu, Point::new(0.0, 0.0)), (&lib, Point::new(300.0, 0.0))], &c);
        let beyond = adjacency_score(&[(&edu, Point::new(0.0, 0.0)), (&lib, Point::new(500.0, 0.0))], &c);
        assert!(near > far, "near {near} should beat far {far}");
        assert_eq!(beyond, 0.5);
    }

    #[test]
    fn test_adjacency_penalizes_incompatible_proximity() {
        let c = FitnessConfig::default();
        let sports = building("s", BuildingType::Sports);
        let lib = building("l", BuildingType::Library);
        let near = adjacency_score(&[(&sports, Point::new(0.0, 0.0)), (&lib, Point::new(40.0, 0.0))], &c);
        assert!(near < 0.5);
    }

    #[test]
    fn test_cost_prefers_access_point() {
        let c = FitnessConfig::default();
        let bounds = SiteBounds::rectangle(0.0, 0.0, 200.0, 200.0).unwrap();
        let b = building("a", BuildingType::Health);
        let center = cost_score(&[(&b, Point::new(100.0, 100.0))], &bounds, None, &c);
        let corner = cost_score(&[(&b, Point::new(10.0, 10.0))], &bounds, None, &c);
        assert!((center - 1.0).abs() < 1e-12);
        assert!(corner < center);
        assert!(corner > 0.0);
    }
}
