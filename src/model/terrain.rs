//! Optional terrain elevation grid.

use super::geometry::Point;
use crate::error::{LayoutError, LayoutResult};

/// Regular elevation grid, row-major, with `rows * cols` samples.
///
/// Sampling outside the grid clamps to the nearest edge sample.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Terrain {
    origin: Point,
    cell_size: f64,
    cols: usize,
    rows: usize,
    elevations: Vec<f64>,
}

impl Terrain {
    pub fn new(origin: Point, cell_size: f64, cols: usize, rows: usize, elevations: Vec<f64>) -> LayoutResult<Self> {
        if !(cell_size > 0.0 && cell_size.is_finite()) {
            return Err(LayoutError::InvalidConfig(format!("terrain cell_size must be positive, got {cell_size}")));
        }
        if cols < 2 || rows < 2 {
            return Err(LayoutError::InvalidConfig("terrain needs at least 2x2 samples".into()));
        }
        if elevations.len() != cols * rows {
            return Err(LayoutError::InvalidConfig(format!(
                "terrain expects {} samples, got {}",
                cols * rows,
                elevations.len()
            )));
        }
        if elevations.iter().any(|e| !e.is_finite()) {
            return Err(LayoutError::NonFinite("terrain elevation".into()));
        }
        Ok(Self {
            origin,
            cell_size,
            cols,
            rows,
            elevations,
        })
    }

    /// Builds a grid by evaluating `f` at every sample position.
    pub fn from_fn(
        origin: Point,
        cell_size: f64,
        cols: usize,
        rows: usize,
        f: impl Fn(Point) -> f64,
    ) -> LayoutResult<Self> {
        let mut elevations = Vec::with_capacity(cols * rows);
        for r in 0..rows {
            for c in 0..cols {
                elevations.push(f(Point::new(
                    origin.x + c as f64 * cell_size,
                    origin.y + r as f64 * cell_size,
                )));
            }
        }
        Self::new(origin, cell_size, cols, rows, elevations)
    }

    fn sample(&self, c: usize, r: usize) -> f64 {
        self.elevations[r * self.cols + c]
    }

    /// Bilinearly interpolated elevation.
    pub fn elevation(&self, p: Point) -> f64 {
        let gx = ((p.x - self.origin.x) / self.cell_size).clamp(0.0, (self.cols - 1) as f64);
        let gy = ((p.y - self.origin.y) / self.cell_size).clamp(0.0, (self.rows - 1) as f64);
        let c0 = (gx.floor() as usize).min(self.cols - 2);
        let r0 = (gy.floor() as usize).min(self.rows - 2);
        let tx = gx - c0 as f64;
        let ty = gy - r0 as f64;
        let top = self.sample(c0, r0) * (1.0 - tx) + self.sample(c0 + 1, r0) * tx;
        let bottom = self.sample(c0, r0 + 1) * (1.0 - tx) + self.sample(c0 + 1, r0 + 1) * tx;
        top * (1.0 - ty) + bottom * ty
    }

    /// Grade at `p` in percent (rise over run × 100), by central differences.
    pub fn slope_percent(&self, p: Point) -> f64 {
        let h = self.cell_size * 0.5;
        let dx = (self.elevation(Point::new(p.x + h, p.y)) - self.elevation(Point::new(p.x - h, p.y))) / (2.0 * h);
        let dy = (self.elevation(Point::new(p.x, p.y + h)) - self.elevation(Point::new(p.x, p.y - h))) / (2.0 * h);
        dx.hypot(dy) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_terrain_has_zero_slope() {
        let t = Terrain::from_fn(Point::new(0.0, 0.0), 10.0, 11, 11, |_| 42.0).unwrap();
        assert!((t.elevation(Point::new(37.0, 81.0)) - 42.0).abs() < 1e-12);
        assert!(t.slope_percent(Point::new(50.0, 50.0)) < 1e-12);
    }

    #[test]
    fn test_ramp_slope() {
        // 10 m rise per 100 m along x = 10 %
        let t = Terrain::from_fn(Point::new(0.0, 0.0), 10.0, 21, 21, |p| p.x * 0.1).unwrap();
        let s = t.slope_percent(Point::new(100.0, 100.0));
        assert!((s - 10.0).abs() < 1e-9, "expected 10 %, got {s}");
    }

    #[test]
    fn test_size_mismatch_rejected() {
        assert!(Terrain::new(Point::default(), 1.0, 3, 3, vec![0.0; 8]).is_err());
        assert!(Terrain::new(Point::default(), 0.0, 3, 3, vec![0.0; 9]).is_err());
    }
}
