//! Pure constraint checks.
//!
//! Each function returns a violation magnitude; `0.0` means satisfied.
//! Buildings are modeled as circles of their footprint radius.

use super::config::ConstraintConfig;
use crate::model::{Point, SiteBounds, Terrain};

/// How far a footprint sticks out of the site, in meters.
pub fn boundary_violation(bounds: &SiteBounds, center: Point, radius: f64) -> f64 {
    (radius - bounds.signed_distance(center)).max(0.0)
}

/// Radius-sum shortfall between two footprints, in meters.
pub fn overlap_violation(a: Point, radius_a: f64, b: Point, radius_b: f64) -> f64 {
    (radius_a + radius_b - a.distance(b)).max(0.0)
}

/// Setback shortfall between the footprint edge and the boundary, in meters.
///
/// A footprint that already crosses the boundary has zero clearance, so its
/// shortfall is the full required setback (the crossing itself is reported
/// by [`boundary_violation`]).
pub fn setback_violation(bounds: &SiteBounds, center: Point, radius: f64, required: f64) -> f64 {
    let clearance = (bounds.signed_distance(center) - radius).max(0.0);
    (required - clearance).max(0.0)
}

/// Fire-separation shortfall between two footprint edges, in meters.
pub fn fire_separation_violation(
    a: Point,
    radius_a: f64,
    height_a: f64,
    b: Point,
    radius_b: f64,
    height_b: f64,
    config: &ConstraintConfig,
) -> f64 {
    let gap = a.distance(b) - radius_a - radius_b;
    let required = config.required_fire_separation(height_a, height_b);
    (required - gap).max(0.0)
}

/// Grade excess over the admissible maximum, in percentage points.
pub fn slope_violation(terrain: &Terrain, center: Point, max_slope_percent: f64) -> f64 {
    (terrain.slope_percent(center) - max_slope_percent).max(0.0)
}

/// Ratio excess in percentage points (`actual / site_area - limit`).
pub fn ratio_violation(total: f64, site_area: f64, limit: f64) -> f64 {
    if site_area <= 0.0 {
        return 0.0;
    }
    ((total / site_area - limit) * 100.0).max(0.0)
}

/// Maps a weighted violation magnitude to a penalty in `[0, cap)`.
///
/// Saturating exponential: linear near zero, strictly positive for any
/// violation, and never above the cap.
pub fn penalty(weighted_magnitude: f64, config: &ConstraintConfig) -> f64 {
    if !(weighted_magnitude > 0.0) {
        return 0.0;
    }
    config.penalty_cap * (1.0 - (-weighted_magnitude / config.penalty_scale).exp())
}
