//! Buildings and building types.

use super::geometry::Point;
use crate::error::{LayoutError, LayoutResult};

/// Storey height used to derive building height from floor count, in meters.
pub const FLOOR_HEIGHT: f64 = 3.5;

/// Functional category of a campus building.
///
/// Each type carries an importance weight (used by the tensor field and by
/// seeding order), a base gross floor area, and a unit construction cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BuildingType {
    Residential,
    Educational,
    Administrative,
    Health,
    Commercial,
    Social,
    Library,
    Research,
    Sports,
    Dining,
}

impl BuildingType {
    pub const ALL: [BuildingType; 10] = [
        BuildingType::Residential,
        BuildingType::Educational,
        BuildingType::Administrative,
        BuildingType::Health,
        BuildingType::Commercial,
        BuildingType::Social,
        BuildingType::Library,
        BuildingType::Research,
        BuildingType::Sports,
        BuildingType::Dining,
    ];

    /// Relative importance in `(0, 1]`.
    pub fn importance(self) -> f64 {
        match self {
            BuildingType::Health => 1.0,
            BuildingType::Educational => 0.9,
            BuildingType::Library => 0.85,
            BuildingType::Research => 0.8,
            BuildingType::Administrative => 0.75,
            BuildingType::Commercial => 0.7,
            BuildingType::Residential => 0.65,
            BuildingType::Dining => 0.6,
            BuildingType::Social => 0.55,
            BuildingType::Sports => 0.5,
        }
    }

    /// Typical gross floor area in square meters.
    pub fn base_footprint(self) -> f64 {
        match self {
            BuildingType::Residential => 3000.0,
            BuildingType::Educational => 4000.0,
            BuildingType::Administrative => 2000.0,
            BuildingType::Health => 2500.0,
            BuildingType::Commercial => 1500.0,
            BuildingType::Social => 1200.0,
            BuildingType::Library => 3000.0,
            BuildingType::Research => 3500.0,
            BuildingType::Sports => 5000.0,
            BuildingType::Dining => 1000.0,
        }
    }

    /// Construction cost per square meter of floor area (currency units).
    pub fn unit_cost(self) -> f64 {
        match self {
            BuildingType::Health => 2600.0,
            BuildingType::Research => 2400.0,
            BuildingType::Library => 2000.0,
            BuildingType::Educational => 1800.0,
            BuildingType::Sports => 1600.0,
            BuildingType::Administrative => 1500.0,
            BuildingType::Commercial => 1400.0,
            BuildingType::Dining => 1400.0,
            BuildingType::Social => 1300.0,
            BuildingType::Residential => 1200.0,
        }
    }
}

/// A building to be placed on the site.
///
/// Identity (`id`, type, area, floors) is fixed at construction. The optional
/// `position` is only written by the optimizer when a result is applied.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Building {
    id: String,
    kind: BuildingType,
    area: f64,
    floors: u32,
    pub position: Option<Point>,
}

impl Building {
    /// Creates a building with a target gross floor area and floor count.
    ///
    /// # Errors
    /// [`LayoutError::InvalidConfig`] for an empty id, a non-positive area or
    /// zero floors.
    pub fn new(id: impl Into<String>, kind: BuildingType, area: f64, floors: u32) -> LayoutResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(LayoutError::InvalidConfig("building id must not be empty".into()));
        }
        if !(area > 0.0 && area.is_finite()) {
            return Err(LayoutError::InvalidConfig(format!("building {id}: area must be positive, got {area}")));
        }
        if floors == 0 {
            return Err(LayoutError::InvalidConfig(format!("building {id}: floors must be at least 1")));
        }
        Ok(Self {
            id,
            kind,
            area,
            floors,
            position: None,
        })
    }

    /// Creates a building with the type's base floor area over two floors.
    pub fn of_type(id: impl Into<String>, kind: BuildingType) -> LayoutResult<Self> {
        Self::new(id, kind, kind.base_footprint(), 2)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> BuildingType {
        self.kind
    }

    /// Target gross floor area in square meters.
    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn floors(&self) -> u32 {
        self.floors
    }

    /// Ground-floor footprint area.
    pub fn footprint_area(&self) -> f64 {
        self.area / self.floors as f64
    }

    /// Radius of a circle with the footprint's area.
    pub fn radius(&self) -> f64 {
        (self.footprint_area() / std::f64::consts::PI).sqrt()
    }

    pub fn height(&self) -> f64 {
        self.floors as f64 * FLOOR_HEIGHT
    }

    pub fn importance(&self) -> f64 {
        self.kind.importance()
    }
}
