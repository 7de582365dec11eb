//! Field generation settings.

use crate::error::{LayoutError, LayoutResult};
use crate::model::SiteBounds;

/// Parameters of the semantic tensor field.
///
/// # Examples
///
/// ```
/// use u_siteplan::field::FieldConfig;
///
/// let config = FieldConfig::default().with_cell_size(4.0).with_smoothing_passes(3);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldConfig {
    /// Grid spacing in meters.
    pub cell_size: f64,

    /// Refuse grids larger than this many nodes.
    pub max_cells: usize,

    /// Distance (m, beyond the footprint radius) over which a building's
    /// basis field decays to `1/e`.
    pub influence_radius: f64,

    /// Influence multiplier for health buildings (emergency access).
    pub health_influence_factor: f64,

    /// Minor/major eigenvalue ratio of grid-aligned fields.
    pub grid_minor_ratio: f64,

    /// Minor/major eigenvalue ratio of radial fields.
    pub radial_minor_ratio: f64,

    /// Wavelength (m) of the organic direction perturbation.
    pub organic_wavelength: f64,

    /// Amplitude (radians) of the organic direction perturbation.
    pub organic_amplitude: f64,

    /// Weight of the site-wide background grid.
    pub background_weight: f64,

    /// Orientation (radians) of the background and residential grids.
    pub background_angle: f64,

    /// Eigenvalue clamp range applied to every cell.
    pub eigen_min: f64,
    pub eigen_max: f64,

    /// 3×3 box-filter passes after clamping.
    pub smoothing_passes: usize,

    /// Fill grid rows on the rayon pool (requires the `parallel` feature).
    pub parallel: bool,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            cell_size: 5.0,
            max_cells: 1_000_000,
            influence_radius: 120.0,
            health_influence_factor: 1.5,
            grid_minor_ratio: 0.3,
            radial_minor_ratio: 0.2,
            organic_wavelength: 80.0,
            organic_amplitude: 0.4,
            background_weight: 0.15,
            background_angle: 0.0,
            eigen_min: 0.0,
            eigen_max: 2.0,
            smoothing_passes: 2,
            parallel: true,
        }
    }
}

impl FieldConfig {
    pub fn with_cell_size(mut self, size: f64) -> Self {
        self.cell_size = size;
        self
    }

    pub fn with_influence_radius(mut self, radius: f64) -> Self {
        self.influence_radius = radius;
        self
    }

    pub fn with_background(mut self, weight: f64, angle: f64) -> Self {
        self.background_weight = weight;
        self.background_angle = angle;
        self
    }

    pub fn with_eigen_range(mut self, min: f64, max: f64) -> Self {
        self.eigen_min = min;
        self.eigen_max = max;
        self
    }

    pub fn with_smoothing_passes(mut self, passes: usize) -> Self {
        self.smoothing_passes = passes;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn validate(&self) -> LayoutResult<()> {
        let invalid = |msg: String| Err(LayoutError::InvalidConfig(msg));
        for (name, v) in [
            ("cell_size", self.cell_size),
            ("influence_radius", self.influence_radius),
            ("health_influence_factor", self.health_influence_factor),
            ("organic_wavelength", self.organic_wavelength),
        ] {
            if !(v > 0.0 && v.is_finite()) {
                return invalid(format!("{name} must be positive and finite, got {v}"));
            }
        }
        for (name, v) in [
            ("grid_minor_ratio", self.grid_minor_ratio),
            ("radial_minor_ratio", self.radial_minor_ratio),
        ] {
            if !(0.0..1.0).contains(&v) {
                return invalid(format!("{name} must be in [0, 1), got {v}"));
            }
        }
        if !(self.background_weight >= 0.0) || !self.organic_amplitude.is_finite() || !self.background_angle.is_finite() {
            return invalid("background weight must be non-negative, angles finite".into());
        }
        if !(self.eigen_min >= 0.0 && self.eigen_max > self.eigen_min && self.eigen_max.is_finite()) {
            return invalid(format!(
                "eigen range must satisfy 0 <= min < max (got [{}, {}])",
                self.eigen_min, self.eigen_max
            ));
        }
        if self.max_cells < 4 {
            return invalid("max_cells must be at least 4".into());
        }
        Ok(())
    }

    /// Grid dimensions `(cols, rows)` covering `bounds`.
    ///
    /// # Errors
    /// [`LayoutError::InvalidConfig`] if the grid would exceed `max_cells`.
    pub fn check_grid(&self, bounds: &SiteBounds) -> LayoutResult<(usize, usize)> {
        let bbox = bounds.bbox();
        let cols = ((bbox.width() / self.cell_size).ceil() as usize + 1).max(2);
        let rows = ((bbox.height() / self.cell_size).ceil() as usize + 1).max(2);
        if cols.saturating_mul(rows) > self.max_cells {
            return Err(LayoutError::InvalidConfig(format!(
                "field grid {cols}x{rows} exceeds max_cells {} (increase cell_size)",
                self.max_cells
            )));
        }
        Ok((cols, rows))
    }
}
