//! Core mesh data structures.
//!
//! This module provides the polygon mesh that flows through the wall
//! pipeline and the builder that creates it from an occupancy grid.
//!
//! # Overview
//!
//! [`PolyMesh`] is a face-vertex mesh: a list of positions plus faces that
//! are loops of vertex ids. Faces start out as unit quads and grow into
//! arbitrary simple polygons when coplanar neighbours are merged.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`FaceId`] - Identifies a face
//!
//! These are generic over the underlying integer type ([`MeshIndex`]), `u32`
//! by default.
//!
//! # Construction
//!
//! ```
//! use gridwall::grid::OccupancyGrid;
//! use gridwall::mesh::{build_quad_mesh, PolyMesh};
//!
//! let grid: OccupancyGrid = "##\n#.".parse().unwrap();
//! let mesh: PolyMesh = build_quad_mesh(&grid.flipped_vertically()).unwrap();
//! assert_eq!(mesh.num_faces(), 3);
//! ```

mod builder;
mod index;
mod poly;

pub use builder::build_quad_mesh;
pub use index::{FaceId, MeshIndex, VertexId};
pub use poly::{Face, PolyMesh};
