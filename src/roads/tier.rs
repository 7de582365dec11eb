//! Road tiers and their classification from field strength.

use crate::model::geometry::polyline_length;
use crate::model::Point;

/// Road hierarchy, highest capacity first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RoadTier {
    Primary,
    Secondary,
    Bicycle,
    Pedestrian,
}

impl RoadTier {
    pub const ALL: [RoadTier; 4] = [
        RoadTier::Primary,
        RoadTier::Secondary,
        RoadTier::Bicycle,
        RoadTier::Pedestrian,
    ];

    /// Standard carriageway width in meters.
    pub fn width(self) -> f64 {
        match self {
            RoadTier::Primary => 12.0,
            RoadTier::Secondary => 8.0,
            RoadTier::Bicycle => 3.0,
            RoadTier::Pedestrian => 2.5,
        }
    }
}

/// Minimum mean major eigenvalue for each tier.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TierThresholds {
    pub primary: f64,
    pub secondary: f64,
    pub bicycle: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            primary: 1.0,
            secondary: 0.6,
            bicycle: 0.35,
        }
    }
}

impl TierThresholds {
    pub fn classify(&self, strength: f64) -> RoadTier {
        if strength >= self.primary {
            RoadTier::Primary
        } else if strength >= self.secondary {
            RoadTier::Secondary
        } else if strength >= self.bicycle {
            RoadTier::Bicycle
        } else {
            RoadTier::Pedestrian
        }
    }

    pub fn is_ordered(&self) -> bool {
        self.primary >= self.secondary && self.secondary >= self.bicycle && self.bicycle >= 0.0
    }
}

/// A classified streamline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Road {
    pub tier: RoadTier,
    pub points: Vec<Point>,
    /// Mean major eigenvalue along the path.
    pub strength: f64,
}

impl Road {
    pub fn width(&self) -> f64 {
        self.tier.width()
    }

    pub fn length(&self) -> f64 {
        polyline_length(&self.points)
    }

    pub fn start(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn end(&self) -> Option<Point> {
        self.points.last().copied()
    }
}
