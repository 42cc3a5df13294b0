//! The grid-to-wall pipeline.
//!
//! [`build_wall`] runs every stage in order:
//!
//! 1. flip the grid so image row 0 ends up at the top (largest y),
//! 2. build one quad per occupied cell ([`build_quad_mesh`]),
//! 3. drop lattice points no cell uses ([`remove_unreferenced_vertices`]),
//! 4. merge coplanar quads into larger polygons ([`dissolve_coplanar`]),
//! 5. move the planar mesh into world space ([`transform`]),
//! 6. extrude it into a closed solid ([`extrude`]).
//!
//! Inputs are validated once here; the stages themselves never fail.
//!
//! # Example
//! ```
//! use gridwall::grid::{OccupancyGrid, Placement};
//! use gridwall::pipeline::{build_wall, WallModel, WallOptions};
//!
//! let grid: OccupancyGrid = "##\n##".parse().unwrap();
//! let model: WallModel = build_wall(&grid, &Placement::default(), &WallOptions::default()).unwrap();
//!
//! assert_eq!(model.mesh().num_faces(), 6);
//! assert_eq!(model.mesh().num_vertices(), 8);
//! assert!(model.is_closed());
//! ```

use tracing::{debug, info, info_span};

use crate::algo::clean::remove_unreferenced_vertices;
use crate::algo::dissolve::{dissolve_coplanar, DissolveOptions};
use crate::algo::extrude::extrude;
use crate::algo::transform::transform;
use crate::error::{Result, WallError};
use crate::grid::{OccupancyGrid, Placement};
use crate::mesh::{build_quad_mesh, MeshIndex, PolyMesh};

/// Default wall height in world units.
pub const DEFAULT_WALL_HEIGHT: f64 = 2.0;

/// Options for [`build_wall`].
#[derive(Debug, Clone)]
pub struct WallOptions {
    /// Height of the extruded walls. Must be positive and finite.
    pub height: f64,

    /// Whether coplanar quads are merged before extrusion. Without merging
    /// every occupied cell keeps its own cap quad.
    pub dissolve: bool,

    /// Parameters of the coplanar merge.
    pub dissolve_options: DissolveOptions,
}

impl Default for WallOptions {
    fn default() -> Self {
        Self {
            height: DEFAULT_WALL_HEIGHT,
            dissolve: true,
            dissolve_options: DissolveOptions::default(),
        }
    }
}

impl WallOptions {
    /// Set the wall height.
    pub fn with_height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }

    /// Enable or disable coplanar merging.
    pub fn with_dissolve(mut self, dissolve: bool) -> Self {
        self.dissolve = dissolve;
        self
    }

    /// Set the coplanar merge parameters.
    pub fn with_dissolve_options(mut self, options: DissolveOptions) -> Self {
        self.dissolve_options = options;
        self
    }

    /// Check the height and the merge parameters.
    pub fn validate(&self) -> Result<()> {
        if !self.height.is_finite() || self.height <= 0.0 {
            return Err(WallError::InvalidHeight {
                height: self.height,
            });
        }
        self.dissolve_options.validate()
    }
}

/// A solid wall mesh in world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct WallModel<I: MeshIndex = u32> {
    mesh: PolyMesh<I>,
    height: f64,
}

impl<I: MeshIndex> WallModel<I> {
    /// The solid mesh.
    #[inline]
    pub fn mesh(&self) -> &PolyMesh<I> {
        &self.mesh
    }

    /// Height the walls were extruded to.
    #[inline]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Whether there are no walls at all (all-free grid).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mesh.is_empty()
    }

    /// Whether the mesh is a closed, consistently oriented surface.
    /// An empty model counts as closed.
    pub fn is_closed(&self) -> bool {
        self.mesh.is_closed()
    }

    /// Whether every edge is used equally often in both directions. Holds
    /// for every model, including ones where walls meet only at a corner.
    pub fn is_watertight(&self) -> bool {
        self.mesh.is_watertight()
    }

    /// Take the mesh out of the model.
    pub fn into_mesh(self) -> PolyMesh<I> {
        self.mesh
    }
}

/// Build the planar, world-space outline of the occupied cells.
///
/// This is every stage of [`build_wall`] except extrusion. Inputs are not
/// validated.
pub fn build_footprint<I: MeshIndex>(
    grid: &OccupancyGrid,
    placement: &Placement,
    options: &WallOptions,
) -> Result<PolyMesh<I>> {
    let flipped = grid.flipped_vertically();
    let lattice: PolyMesh<I> = build_quad_mesh(&flipped)?;
    debug!(
        vertices = lattice.num_vertices(),
        faces = lattice.num_faces(),
        "Built quad lattice"
    );

    let quads = remove_unreferenced_vertices(&lattice);
    let mut footprint = if options.dissolve {
        dissolve_coplanar(&quads, &options.dissolve_options)
    } else {
        quads
    };
    transform(&mut footprint, placement);
    Ok(footprint)
}

/// Turn an occupancy grid into an extruded wall model.
///
/// Fails with [`WallError::InvalidPlacement`] for a non-positive or
/// non-finite cell size, [`WallError::InvalidHeight`] for a bad height and
/// [`WallError::InvalidParameter`] for bad merge options. A grid without
/// occupied cells is not an error; it gives an empty model.
pub fn build_wall<I: MeshIndex>(
    grid: &OccupancyGrid,
    placement: &Placement,
    options: &WallOptions,
) -> Result<WallModel<I>> {
    let _span = info_span!("build_wall", rows = grid.rows(), cols = grid.cols()).entered();

    placement.validate()?;
    options.validate()?;

    let footprint: PolyMesh<I> = build_footprint(grid, placement, options)?;
    let mesh = extrude(&footprint, options.height);

    info!(
        occupied = grid.num_occupied(),
        vertices = mesh.num_vertices(),
        faces = mesh.num_faces(),
        height = options.height,
        "Built wall model"
    );

    Ok(WallModel {
        mesh,
        height: options.height,
    })
}
