//! Sampled tensor field on a regular grid with bilinear lookup.

use super::tensor::{Eigen, Tensor};
use crate::model::Point;

/// Tensors sampled on a regular grid of nodes.
///
/// Node `(col, row)` sits at `origin + (col, row) · cell_size`. Sampling
/// between nodes is bilinear; outside the grid it clamps to the edge.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TensorField {
    origin: Point,
    cell_size: f64,
    cols: usize,
    rows: usize,
    cells: Vec<Tensor>,
}

/// Aggregate statistics of a field, for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldSummary {
    pub cols: usize,
    pub rows: usize,
    pub cell_size: f64,
    pub mean_major: f64,
    pub max_major: f64,
    pub mean_anisotropy: f64,
    /// Share of nodes without a usable direction.
    pub degenerate_fraction: f64,
}

impl TensorField {
    /// `cells` is row-major and must hold `cols * rows` tensors.
    pub(crate) fn from_cells(origin: Point, cell_size: f64, cols: usize, rows: usize, cells: Vec<Tensor>) -> Self {
        debug_assert_eq!(cells.len(), cols * rows);
        Self {
            origin,
            cell_size,
            cols,
            rows,
            cells,
        }
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cells(&self) -> &[Tensor] {
        &self.cells
    }

    pub fn node(&self, col: usize, row: usize) -> Option<Tensor> {
        (col < self.cols && row < self.rows).then(|| self.cells[row * self.cols + col])
    }

    pub fn node_position(&self, col: usize, row: usize) -> Point {
        Point::new(
            self.origin.x + col as f64 * self.cell_size,
            self.origin.y + row as f64 * self.cell_size,
        )
    }

    /// Bilinear interpolation of the four surrounding nodes.
    pub fn sample(&self, p: Point) -> Tensor {
        let max_c = (self.cols - 1) as f64;
        let max_r = (self.rows - 1) as f64;
        let fx = ((p.x - self.origin.x) / self.cell_size).clamp(0.0, max_c);
        let fy = ((p.y - self.origin.y) / self.cell_size).clamp(0.0, max_r);
        if !(fx.is_finite() && fy.is_finite()) {
            return Tensor::ZERO;
        }
        let c0 = (fx.floor() as usize).min(self.cols.saturating_sub(2));
        let r0 = (fy.floor() as usize).min(self.rows.saturating_sub(2));
        let c1 = (c0 + 1).min(self.cols - 1);
        let r1 = (r0 + 1).min(self.rows - 1);
        let tx = fx - c0 as f64;
        let ty = fy - r0 as f64;

        let at = |c: usize, r: usize| self.cells[r * self.cols + c];
        at(c0, r0).scale((1.0 - tx) * (1.0 - ty))
            + at(c1, r0).scale(tx * (1.0 - ty))
            + at(c0, r1).scale((1.0 - tx) * ty)
            + at(c1, r1).scale(tx * ty)
    }

    pub fn eigen_at(&self, p: Point) -> Eigen {
        self.sample(p).eigen()
    }

    /// Unit major direction at `p`, or `None` where the field is too weak
    /// (`major < min_magnitude`) or too isotropic (`anisotropy < epsilon`).
    pub fn major_direction(&self, p: Point, min_magnitude: f64, epsilon: f64) -> Option<Point> {
        let e = self.eigen_at(p);
        if !(e.major >= min_magnitude) || !(e.anisotropy() >= epsilon) {
            return None;
        }
        e.major_dir.normalized()
    }

    pub fn summary(&self, epsilon: f64) -> FieldSummary {
        let n = self.cells.len().max(1) as f64;
        let mut sum_major = 0.0;
        let mut max_major = 0.0f64;
        let mut sum_aniso = 0.0;
        let mut degenerate = 0usize;
        for t in &self.cells {
            let e = t.eigen();
            sum_major += e.major;
            max_major = max_major.max(e.major);
            sum_aniso += e.anisotropy();
            if e.anisotropy() < epsilon {
                degenerate += 1;
            }
        }
        FieldSummary {
            cols: self.cols,
            rows: self.rows,
            cell_size: self.cell_size,
            mean_major: sum_major / n,
            max_major,
            mean_anisotropy: sum_aniso / n,
            degenerate_fraction: degenerate as f64 / n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> TensorField {
        // a = column index, c = row index
        let cells = (0..3)
            .flat_map(|r| (0..4).map(move |c| Tensor::new(c as f64, 0.0, r as f64)))
            .collect();
        TensorField::from_cells(Point::new(10.0, 20.0), 5.0, 4, 3, cells)
    }

    #[test]
    fn test_sample_hits_nodes() {
        let f = ramp();
        assert_eq!(f.sample(f.node_position(2, 1)), Tensor::new(2.0, 0.0, 1.0));
        assert_eq!(f.node(3, 2), Some(Tensor::new(3.0, 0.0, 2.0)));
        assert_eq!(f.node(4, 0), None);
    }

    #[test]
    fn test_sample_is_bilinear() {
        let f = ramp();
        let t = f.sample(Point::new(10.0 + 7.5, 20.0 + 2.5));
        assert!((t.a - 1.5).abs() < 1e-12);
        assert!((t.c - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_sample_clamps_outside() {
        let f = ramp();
        assert_eq!(f.sample(Point::new(-100.0, -100.0)), Tensor::new(0.0, 0.0, 0.0));
        assert_eq!(f.sample(Point::new(1e6, 1e6)), Tensor::new(3.0, 0.0, 2.0));
    }

    #[test]
    fn test_major_direction_thresholds() {
        let cells = vec![Tensor::isotropic(1.0); 4];
        let f = TensorField::from_cells(Point::default(), 1.0, 2, 2, cells);
        assert_eq!(f.major_direction(Point::new(0.5, 0.5), 0.1, 1e-3), None);

        let weak = vec![Tensor::from_angle(0.0, 0.01, 0.0); 4];
        let f = TensorField::from_cells(Point::default(), 1.0, 2, 2, weak);
        assert_eq!(f.major_direction(Point::new(0.5, 0.5), 0.1, 1e-3), None);
        assert!(f.major_direction(Point::new(0.5, 0.5), 0.001, 1e-3).is_some());
    }
}
