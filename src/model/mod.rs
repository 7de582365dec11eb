//! Spatial domain model: buildings, site bounds, terrain, and candidate layouts.

mod bounds;
mod building;
pub mod geometry;
mod solution;
mod terrain;

pub use bounds::SiteBounds;
pub use building::{Building, BuildingType, FLOOR_HEIGHT};
pub use geometry::{Aabb, Point};
pub use solution::{Lineage, Origin, Solution};
pub use terrain::Terrain;
