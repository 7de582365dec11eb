//! Site boundary.

use super::geometry::{closest_on_segment, Aabb, Point};
use crate::error::{LayoutError, LayoutResult};
use rand::Rng;

/// The region that constrains valid building placement.
///
/// A simple polygon (no self-intersections), stored with vertices in either
/// winding order. An interior anchor point is computed at construction and is
/// used as the last-resort target when clipping, so that clipping always
/// yields a point inside the site, also for concave boundaries.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SiteBounds {
    vertices: Vec<Point>,
    bbox: Aabb,
    area: f64,
    anchor: Point,
}

impl SiteBounds {
    /// Creates bounds from polygon vertices.
    ///
    /// # Errors
    /// [`LayoutError::DegenerateBounds`] if the polygon has fewer than three
    /// vertices, non-finite coordinates, (near) zero area, or no interior.
    pub fn new(vertices: Vec<Point>) -> LayoutResult<Self> {
        if vertices.len() < 3 {
            return Err(LayoutError::DegenerateBounds(format!(
                "polygon needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        if vertices.iter().any(|v| !v.is_finite()) {
            return Err(LayoutError::DegenerateBounds("non-finite vertex".into()));
        }
        let area = shoelace(&vertices).abs();
        if area < 1e-6 {
            return Err(LayoutError::DegenerateBounds(format!("polygon area {area} is zero")));
        }
        let bbox = Aabb::from_points(&vertices)
            .ok_or_else(|| LayoutError::DegenerateBounds("empty polygon".into()))?;

        let mut bounds = Self {
            vertices,
            bbox,
            area,
            anchor: bbox.center(),
        };
        bounds.anchor = bounds
            .find_anchor()
            .ok_or_else(|| LayoutError::DegenerateBounds("no interior point found".into()))?;
        Ok(bounds)
    }

    /// Axis-aligned rectangular site.
    pub fn rectangle(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> LayoutResult<Self> {
        if !(max_x > min_x && max_y > min_y) {
            return Err(LayoutError::DegenerateBounds(format!(
                "rectangle [{min_x}, {max_x}] x [{min_y}, {max_y}] is empty"
            )));
        }
        Self::new(vec![
            Point::new(min_x, min_y),
            Point::new(max_x, min_y),
            Point::new(max_x, max_y),
            Point::new(min_x, max_y),
        ])
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn bbox(&self) -> Aabb {
        self.bbox
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    /// Characteristic length of the site, used to scale perturbations.
    pub fn extent(&self) -> f64 {
        self.bbox.width().max(self.bbox.height())
    }

    /// A point guaranteed to be inside the site.
    pub fn anchor(&self) -> Point {
        self.anchor
    }

    pub fn perimeter(&self) -> f64 {
        self.edges().map(|(a, b)| a.distance(b)).sum()
    }

    fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Point-in-polygon test (even-odd rule). Points on the boundary count as inside.
    pub fn contains(&self, p: Point) -> bool {
        if !p.is_finite() {
            return false;
        }
        if p.x < self.bbox.min.x || p.x > self.bbox.max.x || p.y < self.bbox.min.y || p.y > self.bbox.max.y {
            return false;
        }
        let mut inside = false;
        for (a, b) in self.edges() {
            if p.distance(closest_on_segment(p, a, b)) < 1e-9 {
                return true;
            }
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
                if p.x < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Unsigned distance from `p` to the nearest boundary edge.
    pub fn distance_to_boundary(&self, p: Point) -> f64 {
        self.edges()
            .map(|(a, b)| p.distance(closest_on_segment(p, a, b)))
            .fold(f64::INFINITY, f64::min)
    }

    /// Distance to the boundary, positive inside and negative outside.
    pub fn signed_distance(&self, p: Point) -> f64 {
        let d = self.distance_to_boundary(p);
        if self.contains(p) {
            d
        } else {
            -d
        }
    }

    /// Nearest point on the boundary polygon.
    pub fn nearest_boundary_point(&self, p: Point) -> Point {
        let mut best = self.vertices[0];
        let mut best_d = f64::INFINITY;
        for (a, b) in self.edges() {
            let q = closest_on_segment(p, a, b);
            let d = p.distance_squared(q);
            if d < best_d {
                best_d = d;
                best = q;
            }
        }
        best
    }

    /// Returns a point inside the site as close to `p` as practical.
    ///
    /// Inside points are returned unchanged. Outside points are projected on
    /// the boundary and nudged toward the anchor; if that still fails (deep
    /// concavity) the anchor itself is returned.
    pub fn clip(&self, p: Point) -> Point {
        if self.contains(p) {
            return p;
        }
        if !p.is_finite() {
            return self.anchor;
        }
        let q = self.nearest_boundary_point(p);
        let nudged = q.lerp(self.anchor, 1e-6);
        if self.contains(nudged) {
            nudged
        } else if self.contains(q) {
            q
        } else {
            self.anchor
        }
    }

    /// Uniform random point inside the site (rejection sampling on the bbox).
    pub fn random_point<R: Rng>(&self, rng: &mut R) -> Point {
        for _ in 0..64 {
            let p = Point::new(
                rng.random_range(self.bbox.min.x..=self.bbox.max.x),
                rng.random_range(self.bbox.min.y..=self.bbox.max.y),
            );
            if self.contains(p) {
                return p;
            }
        }
        self.anchor
    }

    /// Points spaced evenly (by arc length) along the boundary.
    pub fn sample_boundary(&self, spacing: f64) -> Vec<Point> {
        let perimeter = self.perimeter();
        if spacing <= 0.0 || !spacing.is_finite() || perimeter <= 0.0 {
            return Vec::new();
        }
        let count = (perimeter / spacing).floor().max(1.0) as usize;
        let step = perimeter / count as f64;
        let mut out = Vec::with_capacity(count);
        let mut target = step * 0.5;
        let mut walked = 0.0;
        for (a, b) in self.edges() {
            let len = a.distance(b);
            while target <= walked + len && out.len() < count {
                let t = if len > 0.0 { (target - walked) / len } else { 0.0 };
                out.push(a.lerp(b, t));
                target += step;
            }
            walked += len;
        }
        out
    }

    fn find_anchor(&self) -> Option<Point> {
        let centroid = polygon_centroid(&self.vertices);
        if self.contains(centroid) && self.distance_to_boundary(centroid) > 0.0 {
            return Some(centroid);
        }
        let steps = 32;
        let mut best: Option<(Point, f64)> = None;
        for i in 1..steps {
            for j in 1..steps {
                let p = Point::new(
                    self.bbox.min.x + self.bbox.width() * i as f64 / steps as f64,
                    self.bbox.min.y + self.bbox.height() * j as f64 / steps as f64,
                );
                if !self.contains(p) {
                    continue;
                }
                let d = self.distance_to_boundary(p);
                if d > 0.0 && best.is_none_or(|(_, bd)| d > bd) {
                    best = Some((p, d));
                }
            }
        }
        best.map(|(p, _)| p)
    }
}

fn shoelace(vertices: &[Point]) -> f64 {
    let n = vertices.len();
    (0..n)
        .map(|i| vertices[i].cross(vertices[(i + 1) % n]))
        .sum::<f64>()
        * 0.5
}

fn polygon_centroid(vertices: &[Point]) -> Point {
    let a = shoelace(vertices);
    let n = vertices.len();
    let (mut cx, mut cy) = (0.0, 0.0);
    for i in 0..n {
        let p = vertices[i];
        let q = vertices[(i + 1) % n];
        let c = p.cross(q);
        cx += (p.x + q.x) * c;
        cy += (p.y + q.y) * c;
    }
    Point::new(cx / (6.0 * a), cy / (6.0 * a))
}
