//! Placement of a grid-space mesh in world coordinates.
//!
//! Grid-space meshes live on the integer lattice. [`transform`] scales them
//! by the cell size, shifts them by the map origin and finally turns them
//! about the placement pivot:
//!
//! ```text
//! p' = R(theta) * (s * p + t - pivot) + pivot
//! ```
//!
//! Only x and y change; z is left as is. Since `s > 0` and `R` is a proper
//! rotation, face winding and orientation are preserved.

use nalgebra::{Point3, Rotation2, Vector2};
use rayon::prelude::*;
use tracing::debug;

use crate::grid::Placement;
use crate::mesh::{MeshIndex, PolyMesh};

/// Map a single grid-space point to world space.
///
/// # Example
/// ```
/// use gridwall::algo::transform::transform_point;
/// use gridwall::grid::Placement;
/// use nalgebra::Point3;
///
/// let placement = Placement::new(0.5, 1.0, 2.0, 0.0);
/// let p = transform_point(&Point3::new(2.0, 4.0, 0.0), &placement);
/// assert_eq!(p, Point3::new(2.0, 4.0, 0.0));
/// ```
pub fn transform_point(p: &Point3<f64>, placement: &Placement) -> Point3<f64> {
    let rotation = Rotation2::new(placement.origin_theta);
    place(p, placement, &rotation)
}

#[inline]
fn place(p: &Point3<f64>, placement: &Placement, rotation: &Rotation2<f64>) -> Point3<f64> {
    let mut xy = Vector2::new(p.x, p.y) * placement.cell_size;
    xy += Vector2::new(placement.origin_x, placement.origin_y);
    if placement.origin_theta != 0.0 {
        let pivot = placement.pivot.coords;
        xy = rotation * (xy - pivot) + pivot;
    }
    Point3::new(xy.x, xy.y, p.z)
}

/// Move every vertex of `mesh` from grid space to world space.
///
/// Vertices are independent, so they are updated in parallel. The placement
/// is not validated here; [`crate::pipeline::build_wall`] checks it once on
/// entry.
pub fn transform<I: MeshIndex>(mesh: &mut PolyMesh<I>, placement: &Placement) {
    let is_identity = placement.cell_size == 1.0
        && placement.origin_x == 0.0
        && placement.origin_y == 0.0
        && placement.origin_theta == 0.0;
    if is_identity || mesh.num_vertices() == 0 {
        return;
    }

    let rotation = Rotation2::new(placement.origin_theta);
    mesh.vertices
        .par_iter_mut()
        .for_each(|p| *p = place(p, placement, &rotation));

    debug!(
        vertices = mesh.num_vertices(),
        cell_size = placement.cell_size,
        theta = placement.origin_theta,
        "Transformed mesh"
    );
}
