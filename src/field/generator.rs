//! Composite field synthesis.

use super::basis::{falloff, importance_factor, BasisField, FieldRegistry};
use super::config::FieldConfig;
use super::grid::TensorField;
use super::tensor::Tensor;
use crate::error::LayoutResult;
use crate::model::{Building, Point, SiteBounds};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Builds a [`TensorField`] over the site from placed buildings.
///
/// The field is a pure function of (config, registry, bounds, placement):
/// regenerate it whenever the layout changes instead of patching it.
#[derive(Debug, Clone, Default)]
pub struct FieldGenerator {
    config: FieldConfig,
    registry: FieldRegistry,
}

/// One building's contribution, precomputed per generation.
struct Source<'a> {
    building: &'a Building,
    center: Point,
    weight: f64,
    strategy: BasisField,
}

impl FieldGenerator {
    pub fn new(config: FieldConfig, registry: FieldRegistry) -> LayoutResult<Self> {
        config.validate()?;
        Ok(Self { config, registry })
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    /// Sums the weighted basis fields, clamps eigenvalues and smooths.
    ///
    /// # Errors
    /// [`LayoutError::InvalidConfig`](crate::LayoutError::InvalidConfig) if the grid would exceed `max_cells`.
    pub fn generate(&self, bounds: &SiteBounds, placed: &[(&Building, Point)]) -> LayoutResult<TensorField> {
        let config = &self.config;
        let (cols, rows) = config.check_grid(bounds)?;
        let bbox = bounds.bbox();

        let sources: Vec<Source> = placed
            .iter()
            .map(|&(building, center)| Source {
                building,
                center,
                weight: importance_factor(building),
                strategy: self.registry.strategy(building.kind()),
            })
            .collect();
        let background = Tensor::from_angle(config.background_angle, 1.0, config.grid_minor_ratio)
            .scale(config.background_weight);

        let origin = bbox.min;
        let node = |col: usize, row: usize| {
            let p = Point::new(origin.x + col as f64 * config.cell_size, origin.y + row as f64 * config.cell_size);
            let raw: Tensor = sources
                .iter()
                .map(|s| {
                    let w = s.weight * falloff(s.building, s.center, p, config);
                    s.strategy.tensor(s.center, p, config).scale(w)
                })
                .sum::<Tensor>()
                + background;
            if raw.is_finite() {
                raw.clamp_eigen(config.eigen_min, config.eigen_max)
            } else {
                Tensor::ZERO
            }
        };

        let mut cells = vec![Tensor::ZERO; cols * rows];
        let fill_row = |(row, out): (usize, &mut [Tensor])| {
            for (col, cell) in out.iter_mut().enumerate() {
                *cell = node(col, row);
            }
        };

        #[cfg(feature = "parallel")]
        if config.parallel {
            cells.par_chunks_mut(cols).enumerate().for_each(fill_row);
        } else {
            cells.chunks_mut(cols).enumerate().for_each(fill_row);
        }
        #[cfg(not(feature = "parallel"))]
        cells.chunks_mut(cols).enumerate().for_each(fill_row);

        for _ in 0..config.smoothing_passes {
            cells = smooth(&cells, cols, rows);
        }

        log::debug!(
            "tensor field {cols}x{rows} ({} m cells) from {} buildings",
            config.cell_size,
            placed.len()
        );
        Ok(TensorField::from_cells(origin, config.cell_size, cols, rows, cells))
    }
}

/// One pass of a 3×3 box filter. Convex combinations keep eigenvalues
/// inside the clamp range.
fn smooth(cells: &[Tensor], cols: usize, rows: usize) -> Vec<Tensor> {
    let mut out = Vec::with_capacity(cells.len());
    for r in 0..rows {
        for c in 0..cols {
            let mut sum = Tensor::ZERO;
            let mut n = 0.0;
            for rr in r.saturating_sub(1)..=(r + 1).min(rows - 1) {
                for cc in c.saturating_sub(1)..=(c + 1).min(cols - 1) {
                    sum += cells[rr * cols + cc];
                    n += 1.0;
                }
            }
            out.push(sum.scale(1.0 / n));
        }
    }
    out
}
