//! Road synthesis from a tensor field.
//!
//! Streamlines follow the field's major eigenvector from seeds around
//! buildings and along the site boundary. Each trace is integrated with an
//! adaptive Dormand–Prince 5(4) scheme, classified into a [`RoadTier`] from
//! the field strength along it, and the resulting roads are merged into a
//! [`RoadGraph`] with basic connectivity repair.
//!
//! # Usage
//!
//! ```
//! use u_siteplan::field::FieldGenerator;
//! use u_siteplan::model::{Building, BuildingType, Point, SiteBounds};
//! use u_siteplan::roads::{NetworkAssembler, StreamlineTracer};
//!
//! let bounds = SiteBounds::rectangle(0.0, 0.0, 200.0, 200.0).unwrap();
//! let hall = Building::of_type("hall", BuildingType::Commercial).unwrap();
//! let placed = [(&hall, Point::new(100.0, 100.0))];
//!
//! let field = FieldGenerator::default().generate(&bounds, &placed).unwrap();
//! let tracer = StreamlineTracer::default();
//! let seeds = tracer.seeds(&bounds, &placed);
//! let streamlines = tracer.trace_all(&field, &bounds, &seeds);
//! let roads = tracer.classify(&field, &streamlines);
//! let graph = NetworkAssembler::default().assemble(&roads);
//! assert!(streamlines.iter().all(|s| s.length() >= tracer.config().min_length));
//! println!("{} m of road", graph.total_length());
//! ```

mod config;
mod graph;
mod integrator;
mod network;
mod tier;
mod tracer;

pub use config::{NetworkConfig, TracerConfig};
pub use graph::{EdgeId, NodeId, RoadEdge, RoadGraph, RoadNode};
pub use network::NetworkAssembler;
pub use tier::{Road, RoadTier, TierThresholds};
pub use tracer::{StopReason, Streamline, StreamlineTracer};
