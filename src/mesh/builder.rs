//! Mesh construction from occupancy grids.
//!
//! The grid is turned into a planar quad mesh on the integer lattice: cell
//! `(r, c)` covers `[c, c+1] x [r, r+1]` in the z = 0 plane. Corners are shared
//! between neighbouring cells, so the mesh has no seams.

use nalgebra::Point3;

use super::index::{MeshIndex, VertexId};
use super::poly::PolyMesh;
use crate::error::{Result, WallError};
use crate::grid::OccupancyGrid;

/// Build a planar quad mesh with one face per occupied cell.
///
/// Every lattice point of the `(rows + 1) x (cols + 1)` lattice becomes a
/// vertex, including points no occupied cell touches; run
/// [`crate::algo::clean::remove_unreferenced_vertices`] afterwards to drop
/// them. The vertex at lattice point `(x, y)` has index `x + (cols + 1) * y`.
///
/// Quads are wound bottom-left, bottom-right, top-right, top-left, which is
/// counter-clockwise seen from +z. Row `r` of the grid maps to `y = r`, so
/// image-ordered grids should be flipped first.
///
/// # Example
/// ```
/// use gridwall::grid::OccupancyGrid;
/// use gridwall::mesh::{build_quad_mesh, PolyMesh};
///
/// let grid: OccupancyGrid = "#.\n##".parse().unwrap();
/// let mesh: PolyMesh = build_quad_mesh(&grid).unwrap();
/// assert_eq!(mesh.num_vertices(), 9);
/// assert_eq!(mesh.num_faces(), 3);
/// ```
pub fn build_quad_mesh<I: MeshIndex>(grid: &OccupancyGrid) -> Result<PolyMesh<I>> {
    let h = grid.rows();
    let w = grid.cols();
    let stride = w + 1;

    let num_vertices = (h + 1)
        .checked_mul(stride)
        .filter(|&n| I::can_address(n))
        .ok_or_else(|| {
            WallError::invalid_grid(format!("{h}x{w} grid is too large for the mesh index type"))
        })?;

    let mut mesh = PolyMesh::with_capacity(num_vertices, grid.num_occupied());

    for y in 0..=h {
        for x in 0..=w {
            mesh.add_vertex(Point3::new(x as f64, y as f64, 0.0));
        }
    }

    for y in 0..h {
        for (x, &occupied) in grid.row(y).iter().enumerate() {
            if !occupied {
                continue;
            }
            let bottom_left = x + stride * y;
            let bottom_right = bottom_left + 1;
            let top_left = bottom_left + stride;
            let top_right = top_left + 1;
            mesh.push_face_unchecked(vec![
                VertexId::new(bottom_left),
                VertexId::new(bottom_right),
                VertexId::new(top_right),
                VertexId::new(top_left),
            ]);
        }
    }

    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::FaceId;

    #[test]
    fn test_single_cell() {
        let grid: OccupancyGrid = "#".parse().unwrap();
        let mesh: PolyMesh = build_quad_mesh(&grid).unwrap();

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 1);
        let corners: Vec<usize> = mesh
            .face(FaceId::new(0))
            .vertices()
            .iter()
            .map(|v| v.index())
            .collect();
        assert_eq!(corners, vec![0, 1, 3, 2]);
        assert!(mesh.face_normal(FaceId::new(0)).z > 0.99);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_lattice_indexing() {
        let grid: OccupancyGrid = "...\n...".parse().unwrap();
        let mesh: PolyMesh = build_quad_mesh(&grid).unwrap();

        // 3 rows x 4 columns of lattice points, all allocated up front.
        assert_eq!(mesh.num_vertices(), 12);
        assert_eq!(mesh.num_faces(), 0);
        let p = mesh.position(VertexId::new(2 + 4 * 1));
        assert_eq!((p.x, p.y, p.z), (2.0, 1.0, 0.0));
    }

    #[test]
    fn test_one_face_per_occupied_cell() {
        let grid: OccupancyGrid = "
            #.#.
            .##.
            ####
        "
        .parse()
        .unwrap();
        let mesh: PolyMesh = build_quad_mesh(&grid).unwrap();

        assert_eq!(mesh.num_faces(), grid.num_occupied());
        assert!((mesh.projected_area() - grid.num_occupied() as f64).abs() < 1e-12);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_neighbours_share_vertices() {
        let grid: OccupancyGrid = "##".parse().unwrap();
        let mesh: PolyMesh = build_quad_mesh(&grid).unwrap();

        let a = mesh.face(FaceId::new(0)).vertices();
        let b = mesh.face(FaceId::new(1)).vertices();
        let shared = a.iter().filter(|v| b.contains(v)).count();
        assert_eq!(shared, 2);
        // Interior edge used once in each direction, six boundary edges.
        assert_eq!(mesh.boundary_edges().len(), 6);
    }

    #[test]
    fn test_row_maps_to_y() {
        let grid: OccupancyGrid = ".\n#".parse().unwrap();
        let mesh: PolyMesh = build_quad_mesh(&grid).unwrap();

        let c = mesh.face_centroid(FaceId::new(0));
        assert!((c.y - 1.5).abs() < 1e-12);
    }
}
