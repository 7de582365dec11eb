//! Streamline tracing through the tensor field.

use super::config::TracerConfig;
use super::integrator::{adaptive_step, StepControl};
use super::tier::Road;
use crate::error::LayoutResult;
use crate::field::TensorField;
use crate::model::geometry::polyline_length;
use crate::model::{Building, Point, SiteBounds};
use std::collections::HashMap;
use std::f64::consts::TAU;

/// Why one direction of a trace ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StopReason {
    /// The next step left the site; the trace ends on the boundary.
    LeftBounds,
    /// Field magnitude below `min_magnitude`.
    WeakField,
    /// Eigenvalues too close to define a direction.
    Degenerate,
    /// Reached an earlier streamline; the last point is the junction.
    Joined,
    MaxSteps,
}

/// A traced path, before classification.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Streamline {
    pub seed: Point,
    pub points: Vec<Point>,
    /// Stop reasons of the backward and forward halves.
    pub stops: [StopReason; 2],
}

impl Streamline {
    pub fn length(&self) -> f64 {
        polyline_length(&self.points)
    }

    /// Points where this streamline ends on an earlier one.
    pub fn junctions(&self) -> Vec<Point> {
        let mut out = Vec::new();
        if self.stops[0] == StopReason::Joined {
            out.extend(self.points.first().copied());
        }
        if self.stops[1] == StopReason::Joined {
            out.extend(self.points.last().copied());
        }
        out
    }
}

/// Hash grid over points of finished streamlines.
struct SpatialIndex {
    cell: f64,
    buckets: HashMap<(i64, i64), Vec<Point>>,
}

impl SpatialIndex {
    fn new(cell: f64) -> Self {
        Self {
            cell,
            buckets: HashMap::new(),
        }
    }

    fn key(&self, p: Point) -> (i64, i64) {
        ((p.x / self.cell).floor() as i64, (p.y / self.cell).floor() as i64)
    }

    /// Inserts the polyline densified to at most half a cell between samples,
    /// so crossing traces cannot slip between stored points.
    fn insert_polyline(&mut self, points: &[Point]) {
        let spacing = self.cell * 0.5;
        for pair in points.windows(2) {
            let n = (pair[0].distance(pair[1]) / spacing).ceil().max(1.0) as usize;
            for i in 0..n {
                let p = pair[0].lerp(pair[1], i as f64 / n as f64);
                self.buckets.entry(self.key(p)).or_default().push(p);
            }
        }
        if let Some(&last) = points.last() {
            self.buckets.entry(self.key(last)).or_default().push(last);
        }
    }

    /// Nearest stored point within `radius` (≤ cell size).
    fn nearest_within(&self, p: Point, radius: f64) -> Option<Point> {
        let (kx, ky) = self.key(p);
        let mut best: Option<(Point, f64)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(bucket) = self.buckets.get(&(kx + dx, ky + dy)) else {
                    continue;
                };
                for &q in bucket {
                    let d = q.distance(p);
                    if d <= radius && best.map_or(true, |(_, bd)| d < bd) {
                        best = Some((q, d));
                    }
                }
            }
        }
        best.map(|(q, _)| q)
    }
}

/// Integrates the major eigenvector field from a set of seeds.
#[derive(Debug, Clone, Default)]
pub struct StreamlineTracer {
    config: TracerConfig,
}

impl StreamlineTracer {
    pub fn new(config: TracerConfig) -> LayoutResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    /// Seeds around building footprints (most important buildings first),
    /// then evenly along the boundary, nudged inside.
    pub fn seeds(&self, bounds: &SiteBounds, placed: &[(&Building, Point)]) -> Vec<Point> {
        let config = &self.config;
        let mut ordered: Vec<&(&Building, Point)> = placed.iter().collect();
        ordered.sort_by(|a, b| {
            b.0.importance()
                .total_cmp(&a.0.importance())
                .then_with(|| a.0.id().cmp(b.0.id()))
        });

        let mut seeds = Vec::new();
        for (building, center) in ordered {
            let r = building.radius() + config.seed_offset;
            for k in 0..config.seeds_per_building {
                let angle = TAU * k as f64 / config.seeds_per_building as f64;
                let p = *center + Point::new(angle.cos(), angle.sin()).scale(r);
                if bounds.contains(p) {
                    seeds.push(p);
                }
            }
        }
        let anchor = bounds.anchor();
        for p in bounds.sample_boundary(config.seed_spacing) {
            let inward = (anchor - p).normalized().unwrap_or_default();
            let q = p + inward.scale(config.seed_offset);
            if bounds.contains(q) {
                seeds.push(q);
            }
        }
        seeds
    }

    /// Traces every seed in order. Seeds that start on an existing
    /// streamline, or whose trace is shorter than `min_length`, yield nothing.
    pub fn trace_all(&self, field: &TensorField, bounds: &SiteBounds, seeds: &[Point]) -> Vec<Streamline> {
        let mut index = SpatialIndex::new(self.config.separation);
        let mut out = Vec::new();
        let mut discarded = 0usize;
        for &seed in seeds {
            if index.nearest_within(seed, self.config.separation).is_some() {
                continue;
            }
            match self.trace(field, bounds, &index, seed) {
                Some(line) => {
                    index.insert_polyline(&line.points);
                    out.push(line);
                }
                None => discarded += 1,
            }
        }
        log::debug!(
            "traced {} streamlines from {} seeds ({discarded} discarded)",
            out.len(),
            seeds.len()
        );
        out
    }

    /// Traces both directions from `seed`.
    fn trace(&self, field: &TensorField, bounds: &SiteBounds, index: &SpatialIndex, seed: Point) -> Option<Streamline> {
        let config = &self.config;
        let dir = field.major_direction(seed, config.min_magnitude, config.degeneracy_epsilon)?;
        let (mut backward, back_stop) = self.trace_direction(field, bounds, index, seed, -dir);
        let (forward, fwd_stop) = self.trace_direction(field, bounds, index, seed, dir);

        backward.reverse();
        backward.extend_from_slice(&forward[1..]);
        let line = Streamline {
            seed,
            points: backward,
            stops: [back_stop, fwd_stop],
        };
        (line.points.len() >= 2 && line.length() >= config.min_length).then_some(line)
    }

    /// Follows the line field from `start`, keeping the heading consistent.
    /// The returned polyline starts at `start`.
    fn trace_direction(
        &self,
        field: &TensorField,
        bounds: &SiteBounds,
        index: &SpatialIndex,
        start: Point,
        heading: Point,
    ) -> (Vec<Point>, StopReason) {
        let config = &self.config;
        let control = StepControl {
            h_min: config.h_min,
            h_max: config.h_max,
            tolerance: config.tolerance,
        };
        let mut points = vec![start];
        let mut p = start;
        let mut heading = heading;
        let mut h = config.initial_step;

        for _ in 0..config.max_steps {
            let e = field.eigen_at(p);
            if !(e.major >= config.min_magnitude) {
                return (points, StopReason::WeakField);
            }
            if !(e.anisotropy() >= config.degeneracy_epsilon) {
                return (points, StopReason::Degenerate);
            }

            let oriented = |q: Point| {
                field
                    .major_direction(q, config.min_magnitude, config.degeneracy_epsilon)
                    .map(|d| if d.dot(heading) < 0.0 { -d } else { d })
            };
            let Some(step) = adaptive_step(&oriented, p, h, control) else {
                return (points, StopReason::Degenerate);
            };
            let next = step.point;

            if !bounds.contains(next) {
                let edge = bounds.clip(next);
                if edge.distance(p) > f64::EPSILON {
                    points.push(edge);
                }
                return (points, StopReason::LeftBounds);
            }
            if let Some(hit) = index.nearest_within(next, config.separation) {
                points.push(hit);
                return (points, StopReason::Joined);
            }

            heading = (next - p).normalized().unwrap_or(heading);
            points.push(next);
            p = next;
            h = step.next_h;
        }
        (points, StopReason::MaxSteps)
    }

    /// Assigns tiers from the mean major eigenvalue along each path.
    pub fn classify(&self, field: &TensorField, streamlines: &[Streamline]) -> Vec<Road> {
        streamlines
            .iter()
            .map(|line| {
                let strength = line.points.iter().map(|&p| field.eigen_at(p).major).sum::<f64>()
                    / line.points.len().max(1) as f64;
                Road {
                    tier: self.config.tiers.classify(strength),
                    points: line.points.clone(),
                    strength,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldConfig, FieldGenerator, FieldRegistry};
    use crate::model::BuildingType;
    use crate::roads::RoadTier;
    use proptest::prelude::*;

    fn site() -> SiteBounds {
        SiteBounds::rectangle(0.0, 0.0, 200.0, 200.0).unwrap()
    }

    /// Background grid only: every trace runs along x.
    fn uniform_field() -> TensorField {
        let config = FieldConfig::default().with_background(0.8, 0.0).with_cell_size(10.0);
        FieldGenerator::new(config, FieldRegistry::default())
            .unwrap()
            .generate(&site(), &[])
            .unwrap()
    }

    #[test]
    fn test_uniform_field_traces_straight_across() {
        let tracer = StreamlineTracer::default();
        let lines = tracer.trace_all(&uniform_field(), &site(), &[Point::new(100.0, 50.0)]);
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line.stops, [StopReason::LeftBounds, StopReason::LeftBounds]);
        assert!((line.length() - 200.0).abs() < 1.0, "length {}", line.length());
        assert!(line.points.iter().all(|p| (p.y - 50.0).abs() < 1e-3));
    }

    #[test]
    fn test_nearby_seed_is_skipped() {
        let tracer = StreamlineTracer::default();
        let seeds = [Point::new(100.0, 50.0), Point::new(60.0, 53.0), Point::new(60.0, 120.0)];
        let lines = tracer.trace_all(&uniform_field(), &site(), &seeds);
        assert_eq!(lines.len(), 2, "the second seed lies on the first streamline");
    }

    #[test]
    fn test_short_traces_discarded() {
        let tracer = StreamlineTracer::new(TracerConfig::default().with_min_length(500.0)).unwrap();
        let lines = tracer.trace_all(&uniform_field(), &site(), &[Point::new(100.0, 50.0)]);
        assert!(lines.is_empty());
    }

    #[test]
    fn test_weak_field_yields_nothing() {
        let config = FieldConfig::default().with_background(0.01, 0.0);
        let field = FieldGenerator::new(config, FieldRegistry::default())
            .unwrap()
            .generate(&site(), &[])
            .unwrap();
        let lines = StreamlineTracer::default().trace_all(&field, &site(), &[Point::new(100.0, 100.0)]);
        assert!(lines.is_empty());
    }

    #[test]
    fn test_crossing_trace_joins_existing() {
        // An existing vertical streamline across a horizontal field.
        let tracer = StreamlineTracer::default();
        let field = uniform_field();
        let mut index = SpatialIndex::new(tracer.config.separation);
        index.insert_polyline(&[Point::new(150.0, 0.0), Point::new(150.0, 200.0)]);
        let (points, stop) =
            tracer.trace_direction(&field, &site(), &index, Point::new(100.0, 80.0), Point::new(1.0, 0.0));
        assert_eq!(stop, StopReason::Joined);
        let junction = *points.last().unwrap();
        assert!((junction.x - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_points_stay_inside_site() {
        let bs = vec![
            Building::of_type("clinic", BuildingType::Health).unwrap(),
            Building::of_type("dorm", BuildingType::Residential).unwrap(),
            Building::of_type("hall", BuildingType::Educational).unwrap(),
        ];
        let spots = [Point::new(50.0, 60.0), Point::new(140.0, 50.0), Point::new(110.0, 150.0)];
        let placed: Vec<(&Building, Point)> = bs.iter().zip(spots).collect();
        let field = FieldGenerator::default().generate(&site(), &placed).unwrap();
        let tracer = StreamlineTracer::default();
        let seeds = tracer.seeds(&site(), &placed);
        assert!(seeds.len() > 12);
        let lines = tracer.trace_all(&field, &site(), &seeds);
        assert!(!lines.is_empty());
        for line in &lines {
            assert!(line.length() >= tracer.config().min_length);
            assert!(line.points.iter().all(|p| site().contains(*p)));
        }
        let roads = tracer.classify(&field, &lines);
        assert_eq!(roads.len(), lines.len());
        assert!(roads.iter().any(|r| r.tier != RoadTier::Pedestrian));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]
        #[test]
        fn prop_traces_long_enough_and_inside(
            xs in prop::collection::vec((20.0f64..180.0, 20.0f64..180.0), 1..4),
        ) {
            let kinds = [BuildingType::Commercial, BuildingType::Educational, BuildingType::Residential];
            let bs: Vec<Building> = (0..xs.len())
                .map(|i| Building::of_type(format!("b{i}"), kinds[i % kinds.len()]).unwrap())
                .collect();
            let placed: Vec<(&Building, Point)> =
                bs.iter().zip(xs.iter().map(|&(x, y)| Point::new(x, y))).collect();
            let field = FieldGenerator::default().generate(&site(), &placed).unwrap();
            let tracer = StreamlineTracer::default();
            let lines = tracer.trace_all(&field, &site(), &tracer.seeds(&site(), &placed));
            for line in &lines {
                prop_assert!(line.length() >= tracer.config().min_length);
                prop_assert!(line.points.iter().all(|p| site().contains(*p)));
            }
        }
    }
}
