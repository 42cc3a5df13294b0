//! Removal of loose geometry.

use tracing::debug;

use crate::mesh::{Face, MeshIndex, PolyMesh, VertexId};

/// Drop every vertex that no face references and renumber the faces.
///
/// Surviving vertices keep their relative order, so running this on an
/// already clean mesh returns an identical mesh.
///
/// # Example
/// ```
/// use gridwall::algo::clean::remove_unreferenced_vertices;
/// use gridwall::grid::OccupancyGrid;
/// use gridwall::mesh::{build_quad_mesh, PolyMesh};
///
/// let grid: OccupancyGrid = "#..".parse().unwrap();
/// let lattice: PolyMesh = build_quad_mesh(&grid).unwrap();
/// assert_eq!(lattice.num_vertices(), 8);
///
/// let mesh = remove_unreferenced_vertices(&lattice);
/// assert_eq!(mesh.num_vertices(), 4);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn remove_unreferenced_vertices<I: MeshIndex>(mesh: &PolyMesh<I>) -> PolyMesh<I> {
    let mut referenced = vec![false; mesh.num_vertices()];
    for face in &mesh.faces {
        for v in face.vertices() {
            referenced[v.index()] = true;
        }
    }

    let mut remap: Vec<Option<VertexId<I>>> = vec![None; mesh.num_vertices()];
    let mut vertices = Vec::with_capacity(referenced.iter().filter(|&&r| r).count());
    for (old, pos) in mesh.vertices.iter().enumerate() {
        if referenced[old] {
            remap[old] = Some(VertexId::new(vertices.len()));
            vertices.push(*pos);
        }
    }

    let faces = mesh
        .faces
        .iter()
        .map(|face| {
            Face::new(
                face.vertices()
                    .iter()
                    .filter_map(|v| remap[v.index()])
                    .collect(),
            )
        })
        .collect();

    let removed = mesh.num_vertices() - vertices.len();
    if removed > 0 {
        debug!(removed, remaining = vertices.len(), "Removed unreferenced vertices");
    }

    PolyMesh { vertices, faces }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::OccupancyGrid;
    use crate::mesh::build_quad_mesh;
    use nalgebra::Point3;

    #[test]
    fn test_keeps_referenced_order() {
        let vertices = vec![
            Point3::new(9.0, 9.0, 9.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(7.0, 7.0, 7.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        let mesh: PolyMesh = PolyMesh::from_face_vertex(vertices, &[vec![1, 2, 4]]).unwrap();
        let clean = remove_unreferenced_vertices(&mesh);

        assert_eq!(clean.num_vertices(), 3);
        assert_eq!(clean.positions()[0], Point3::new(0.0, 0.0, 0.0));
        assert_eq!(clean.positions()[2], Point3::new(1.0, 1.0, 0.0));
        let (_, faces) = clean.to_face_vertex();
        assert_eq!(faces, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_idempotent() {
        let grid: OccupancyGrid = "#...\n..##\n....".parse().unwrap();
        let mesh: PolyMesh = build_quad_mesh(&grid).unwrap();

        let once = remove_unreferenced_vertices(&mesh);
        let twice = remove_unreferenced_vertices(&once);
        assert_eq!(once, twice);
        assert!(once.is_valid());
        assert_eq!(once.num_faces(), 3);
        // A lone cell plus a 2x1 block.
        assert_eq!(once.num_vertices(), 4 + 6);
    }

    #[test]
    fn test_all_free_grid_leaves_nothing() {
        let grid: OccupancyGrid = "...\n...".parse().unwrap();
        let mesh: PolyMesh = build_quad_mesh(&grid).unwrap();
        let clean = remove_unreferenced_vertices(&mesh);
        assert_eq!(clean.num_vertices(), 0);
        assert_eq!(clean.num_faces(), 0);
    }

    #[test]
    fn test_geometry_unchanged() {
        let grid: OccupancyGrid = ".#.\n###".parse().unwrap();
        let mesh: PolyMesh = build_quad_mesh(&grid).unwrap();
        let clean = remove_unreferenced_vertices(&mesh);
        assert!((clean.projected_area() - mesh.projected_area()).abs() < 1e-12);
        assert_eq!(clean.bounding_box(), mesh.bounding_box());
    }
}
