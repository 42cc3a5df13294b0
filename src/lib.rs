//! # gridwall
//!
//! Turn 2-D occupancy grid maps into extruded 3-D wall meshes, ready to be
//! dropped into a robot simulator.
//!
//! A grid of free/occupied cells becomes a planar quad mesh, is simplified by
//! merging coplanar quads into larger polygons, is placed in the world by
//! the map's resolution and origin, and is finally extruded into a closed
//! solid.
//!
//! ## Features
//!
//! - **Face-vertex polygon mesh** with type-safe indices
//! - **Coplanar face merging** that keeps the silhouette exact
//! - **ROS map loading**: YAML metadata plus PGM/PNG rasters
//! - **Export** to COLLADA, OBJ, PLY and STL
//! - **Gazebo model directories** (`model.config`, `model.sdf`)
//!
//! ## Quick Start
//!
//! ```no_run
//! use gridwall::prelude::*;
//!
//! // Load a ROS map
//! let map = gridwall::map::load_map("office.yaml").unwrap();
//!
//! // Build the walls
//! let model: WallModel = build_wall(&map.grid, &map.placement, &WallOptions::default()).unwrap();
//! println!("Faces: {}", model.mesh().num_faces());
//!
//! // Save the mesh
//! gridwall::io::save(model.mesh(), "office.dae").unwrap();
//! ```
//!
//! ## Building Walls Programmatically
//!
//! ```
//! use gridwall::prelude::*;
//!
//! // Row 0 is the top of the map
//! let grid: OccupancyGrid = "
//!     ####
//!     #..
//!     #..
//! "
//! .parse()
//! .unwrap();
//!
//! let placement = Placement::new(0.05, -1.0, -1.0, 0.0);
//! let options = WallOptions::default().with_height(1.0);
//! let model: WallModel = build_wall(&grid, &placement, &options).unwrap();
//!
//! // One L-shaped polygon on each cap, six walls around it
//! assert_eq!(model.mesh().num_faces(), 2 + 6);
//! assert!(model.is_closed());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod grid;
pub mod io;
pub mod map;
pub mod mesh;
pub mod pipeline;
pub mod sdf;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use gridwall::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::dissolve::DissolveOptions;
    pub use crate::error::{Result, WallError};
    pub use crate::grid::{OccupancyGrid, Placement};
    pub use crate::mesh::{build_quad_mesh, Face, FaceId, MeshIndex, PolyMesh, VertexId};
    pub use crate::pipeline::{build_wall, WallModel, WallOptions};
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_single_wall_cell() {
        let grid: OccupancyGrid = "#".parse().unwrap();
        let model: WallModel =
            build_wall(&grid, &Placement::default(), &WallOptions::default()).unwrap();

        let mesh = model.mesh();
        assert_eq!(mesh.num_vertices(), 8);
        assert_eq!(mesh.num_faces(), 6);
        assert!(mesh.is_valid());
        assert!(model.is_closed());

        let (min, max) = mesh.bounding_box().unwrap();
        assert_eq!((min.x, min.y, min.z), (0.0, 0.0, 0.0));
        assert_eq!((max.x, max.y, max.z), (1.0, 1.0, 2.0));
    }
}
