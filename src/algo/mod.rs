//! Mesh processing stages of the wall pipeline.
//!
//! Each stage is a standalone function over [`crate::mesh::PolyMesh`]:
//!
//! - **Cleaning**: [`clean::remove_unreferenced_vertices`]
//! - **Dissolve**: [`dissolve::dissolve_coplanar`] merges coplanar faces
//! - **Transform**: [`transform::transform`] places grid space in the world
//! - **Extrusion**: [`extrude::extrude`] turns a planar mesh into a solid
//!
//! [`crate::pipeline::build_wall`] runs them in order.

pub mod clean;
pub mod dissolve;
pub mod extrude;
pub mod transform;
