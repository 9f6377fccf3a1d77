//! Polygon kernel: ring validation, measures, boolean operations, and the
//! Voronoi tessellation used by the floe factory and the fracture engine.

pub mod clip;
pub mod polygon;
pub mod voronoi;

pub use clip::{boundary_intersections, difference, intersection, union};
pub use polygon::{Containment, Polygon, Ring};
pub use voronoi::{sample_seeds_in_polygon, voronoi_cells};
