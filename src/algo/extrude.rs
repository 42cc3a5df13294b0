//! Extrusion of planar meshes into closed solids.

use rayon::prelude::*;
use tracing::debug;

use crate::mesh::{Face, MeshIndex, PolyMesh, VertexId};

/// Extrude a planar mesh along +z into a closed solid of the given height.
///
/// For a mesh with `n` vertices the result has `2n` vertices: the originals
/// followed by copies lifted by `height`. Faces come in three groups, in
/// this order:
///
/// 1. the bottom cap, the input faces with their winding reversed so they
///    face -z,
/// 2. the top cap, the input faces on the lifted vertices,
/// 3. one quad `[u, v, v', u']` per boundary edge `u -> v`, facing outward.
///
/// Every edge of the output is used equally often in both directions, and
/// the face count is `2 * faces + boundary_edges`. Unless two parts of the
/// input touch at a single vertex, each edge is used by exactly two faces
/// and the solid is closed. A mesh without faces extrudes to an empty mesh.
///
/// `height` is not validated here; [`crate::pipeline::build_wall`] rejects
/// non-positive heights before calling this.
///
/// # Example
/// ```
/// use gridwall::algo::extrude::extrude;
/// use gridwall::grid::OccupancyGrid;
/// use gridwall::mesh::{build_quad_mesh, PolyMesh};
///
/// let grid: OccupancyGrid = "#".parse().unwrap();
/// let quad: PolyMesh = build_quad_mesh(&grid).unwrap();
///
/// let solid = extrude(&quad, 2.0);
/// assert_eq!(solid.num_vertices(), 8);
/// assert_eq!(solid.num_faces(), 6);
/// assert!(solid.is_closed());
/// ```
pub fn extrude<I: MeshIndex>(mesh: &PolyMesh<I>, height: f64) -> PolyMesh<I> {
    if mesh.num_faces() == 0 {
        return PolyMesh::new();
    }

    let n = mesh.num_vertices();
    let lift = |v: VertexId<I>| VertexId::new(v.index() + n);

    let mut vertices = Vec::with_capacity(2 * n);
    vertices.extend_from_slice(&mesh.vertices);
    vertices.extend(mesh.vertices.iter().map(|p| {
        let mut top = *p;
        top.z += height;
        top
    }));

    let boundary = mesh.boundary_edges();

    let mut faces = Vec::with_capacity(2 * mesh.num_faces() + boundary.len());
    faces.extend(mesh.faces.iter().map(Face::reversed));
    faces.extend(
        mesh.faces
            .iter()
            .map(|face| Face::new(face.vertices().iter().copied().map(lift).collect())),
    );

    let sides: Vec<Face<I>> = boundary
        .par_iter()
        .map(|&(u, v)| Face::new(vec![u, v, lift(v), lift(u)]))
        .collect();
    faces.extend(sides);

    debug!(
        caps = mesh.num_faces(),
        sides = boundary.len(),
        height,
        "Extruded mesh"
    );

    PolyMesh { vertices, faces }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::clean::remove_unreferenced_vertices;
    use crate::algo::dissolve::{dissolve_coplanar, DissolveOptions};
    use crate::grid::OccupancyGrid;
    use crate::mesh::{build_quad_mesh, FaceId};
    use approx::assert_relative_eq;

    fn planar(text: &str) -> PolyMesh {
        let grid: OccupancyGrid = text.parse().unwrap();
        remove_unreferenced_vertices(&build_quad_mesh(&grid).unwrap())
    }

    #[test]
    fn test_single_cell_box() {
        let solid = extrude(&planar("#"), 1.5);

        assert_eq!(solid.num_vertices(), 8);
        assert_eq!(solid.num_faces(), 6);
        assert!(solid.is_closed());
        assert!(solid.is_valid());

        let (min, max) = solid.bounding_box().unwrap();
        assert_eq!(min.z, 0.0);
        assert_eq!(max.z, 1.5);
        assert_relative_eq!(solid.surface_area(), 2.0 + 4.0 * 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_cap_orientation() {
        let solid = extrude(&planar("#"), 1.0);
        assert!(solid.face_normal(FaceId::new(0)).z < -0.99);
        assert!(solid.face_normal(FaceId::new(1)).z > 0.99);
    }

    #[test]
    fn test_sides_face_outward() {
        let solid = extrude(&planar("#"), 1.0);
        let center = nalgebra::Point3::new(0.5, 0.5, 0.5);
        for f in 2..solid.num_faces() {
            let fid = FaceId::new(f);
            let outward = solid.face_centroid(fid) - center;
            assert!(solid.face_normal(fid).dot(&outward) > 0.0);
        }
    }

    #[test]
    fn test_face_count_formula() {
        let mesh = planar("##.\n.##\n..#");
        let boundary = mesh.boundary_edges().len();
        let solid = extrude(&mesh, 2.0);

        assert_eq!(solid.num_faces(), 2 * mesh.num_faces() + boundary);
        assert!(solid.is_closed());
    }

    #[test]
    fn test_ring_is_closed() {
        let mesh = dissolve_coplanar(&planar("###\n#.#\n###"), &DissolveOptions::default());
        let solid = extrude(&mesh, 1.0);

        assert!(solid.is_closed());
        // Outer and inner wall are both 4 x 1 around, height 1.
        let sides: f64 = (2 * mesh.num_faces()..solid.num_faces())
            .map(|f| solid.face_area(FaceId::new(f)))
            .sum();
        assert_relative_eq!(sides, 12.0 + 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_corner_touch_is_watertight() {
        let mesh = planar("#.\n.#");
        let solid = extrude(&mesh, 1.0);

        // The shared corner's vertical edge is used by four side quads.
        assert!(!solid.is_closed());
        assert!(solid.is_watertight());
        assert_eq!(solid.num_faces(), 2 * 2 + 8);
    }

    #[test]
    fn test_empty_mesh() {
        let solid = extrude(&planar("..\n.."), 2.0);
        assert_eq!(solid.num_vertices(), 0);
        assert_eq!(solid.num_faces(), 0);
    }

    #[test]
    fn test_deterministic_side_order() {
        let mesh = planar("###\n#.#\n###");
        assert_eq!(extrude(&mesh, 1.0), extrude(&mesh, 1.0));
    }
}
