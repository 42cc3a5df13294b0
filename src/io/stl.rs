//! STL (stereolithography) export.
//!
//! STL only knows triangles, so every polygon is triangulated first. Merged
//! wall faces can be non-convex (an L-shaped cap, for instance), which is
//! why polygons go through ear clipping rather than a fan.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use nalgebra::Vector3;
use tracing::debug;

use crate::error::{Result, WallError};
use crate::mesh::{FaceId, MeshIndex, PolyMesh};

/// Split every face into triangles with the face's winding.
///
/// Each polygon is flattened into its own plane, measured from its first
/// corner, and ear-clipped there. An `n`-gon always yields `n - 2`
/// triangles. Triangles whose winding comes out against the face normal are
/// flipped back.
///
/// # Example
/// ```
/// use gridwall::grid::OccupancyGrid;
/// use gridwall::io::stl::triangulate;
/// use gridwall::mesh::{build_quad_mesh, PolyMesh};
///
/// let grid: OccupancyGrid = "##".parse().unwrap();
/// let mesh: PolyMesh = build_quad_mesh(&grid).unwrap();
/// assert_eq!(triangulate(&mesh).unwrap().len(), 4);
/// ```
pub fn triangulate<I: MeshIndex>(mesh: &PolyMesh<I>) -> Result<Vec<[usize; 3]>> {
    let mut triangles = Vec::with_capacity(mesh.num_faces() * 2);

    for (fid, face) in mesh.faces() {
        let corners: Vec<usize> = face.vertices().iter().map(|v| v.index()).collect();
        if corners.len() == 3 {
            triangles.push([corners[0], corners[1], corners[2]]);
            continue;
        }

        let coords = face_coords(mesh, fid, &corners);
        let mut indices = earcutr::earcut(&coords, &[], 2).map_err(|_| {
            WallError::invalid_param("face", fid.index(), "could not be triangulated")
        })?;
        if indices.len() != 3 * (corners.len() - 2) {
            debug!(
                face = fid.index(),
                corners = corners.len(),
                triangles = indices.len() / 3,
                "Earcut dropped triangles, clipping ears directly"
            );
            indices = clip_ears(&coords);
        }

        for tri in indices.chunks_exact(3) {
            let mut t = [corners[tri[0]], corners[tri[1]], corners[tri[2]]];
            if !agrees_with(mesh, fid, &t) {
                t.swap(1, 2);
            }
            triangles.push(t);
        }
    }

    Ok(triangles)
}

/// Flat `[x0, y0, x1, y1, ..]` coordinates of a face in its own plane.
///
/// The x axis runs along the first edge and the origin is the first corner,
/// so axis-aligned outlines stay axis-aligned whatever the map rotation.
fn face_coords<I: MeshIndex>(mesh: &PolyMesh<I>, fid: FaceId<I>, corners: &[usize]) -> Vec<f64> {
    let p = mesh.positions();
    let origin = p[corners[0]];
    let normal = mesh.face_newell(fid).try_normalize(f64::EPSILON).unwrap_or_else(Vector3::z);
    let u = (p[corners[1]] - origin)
        .try_normalize(f64::EPSILON)
        .unwrap_or_else(Vector3::x);
    let v = normal.cross(&u);

    corners
        .iter()
        .flat_map(|&i| {
            let d = p[i] - origin;
            [d.dot(&u), d.dot(&v)]
        })
        .collect()
}

/// Plain ear clipping of a simple polygon given as flat 2-D coordinates.
///
/// Always returns `n - 2` triangles. When no proper ear is left (only
/// degenerate corners remain) the flattest corner is cut off instead.
fn clip_ears(coords: &[f64]) -> Vec<usize> {
    let point = |i: usize| (coords[2 * i], coords[2 * i + 1]);
    let n = coords.len() / 2;

    let signed_area: f64 = (0..n)
        .map(|i| {
            let (x0, y0) = point(i);
            let (x1, y1) = point((i + 1) % n);
            x0 * y1 - x1 * y0
        })
        .sum();
    let orientation = if signed_area < 0.0 { -1.0 } else { 1.0 };
    let extent = coords.iter().fold(0.0_f64, |m, c| m.max(c.abs()));
    let eps = 1e-12 * extent * extent;
    let turn = |a: usize, b: usize, c: usize| {
        let (ax, ay) = point(a);
        let (bx, by) = point(b);
        let (cx, cy) = point(c);
        orientation * ((bx - ax) * (cy - ay) - (by - ay) * (cx - ax))
    };

    let mut remaining: Vec<usize> = (0..n).collect();
    let mut out = Vec::with_capacity(3 * n.saturating_sub(2));

    while remaining.len() > 3 {
        let m = remaining.len();
        let corner = |k: usize| {
            (
                remaining[(k + m - 1) % m],
                remaining[k],
                remaining[(k + 1) % m],
            )
        };

        let ear = (0..m).find(|&k| {
            let (a, b, c) = corner(k);
            turn(a, b, c) > eps
                && remaining
                    .iter()
                    .filter(|&&q| q != a && q != b && q != c)
                    .all(|&q| !in_triangle([turn(a, b, q), turn(b, c, q), turn(c, a, q)], eps))
        });
        let k = ear.unwrap_or_else(|| {
            (0..m)
                .max_by(|&x, &y| {
                    let (a, b, c) = corner(x);
                    let (d, e, f) = corner(y);
                    turn(a, b, c).total_cmp(&turn(d, e, f))
                })
                .unwrap_or(0)
        });

        let (a, b, c) = corner(k);
        out.extend_from_slice(&[a, b, c]);
        remaining.remove(k);
    }
    out.extend_from_slice(&remaining);
    out
}

/// Whether a point lies inside or on a triangle, given its turns against
/// the three edges. A corner touching the diagonal blocks the ear, since
/// cutting it would leave a pinched polygon behind.
fn in_triangle(turns: [f64; 3], eps: f64) -> bool {
    turns.iter().all(|&t| t >= -eps)
}

fn agrees_with<I: MeshIndex>(mesh: &PolyMesh<I>, fid: FaceId<I>, t: &[usize; 3]) -> bool {
    let p = mesh.positions();
    let n = (p[t[1]] - p[t[0]]).cross(&(p[t[2]] - p[t[0]]));
    n.dot(&mesh.face_newell(fid)) >= 0.0
}

/// Save a mesh to a binary STL file.
///
/// # Example
///
/// ```no_run
/// use gridwall::io::stl;
/// use gridwall::mesh::PolyMesh;
///
/// let mesh: PolyMesh = PolyMesh::new();
/// stl::save(&mesh, "walls.stl").unwrap();
/// ```
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &PolyMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    let triangles = triangulate(mesh).map_err(|e| WallError::save_error(path, e))?;

    let vertices = mesh.positions();
    let stl_triangles: Vec<stl_io::Triangle> = triangles
        .iter()
        .map(|t| {
            let p0 = &vertices[t[0]];
            let p1 = &vertices[t[1]];
            let p2 = &vertices[t[2]];
            let n = (p1 - p0).cross(&(p2 - p0)).normalize();

            stl_io::Triangle {
                normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [
                    stl_io::Vertex::new([p0.x as f32, p0.y as f32, p0.z as f32]),
                    stl_io::Vertex::new([p1.x as f32, p1.y as f32, p1.z as f32]),
                    stl_io::Vertex::new([p2.x as f32, p2.y as f32, p2.z as f32]),
                ],
            }
        })
        .collect();

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    stl_io::write_stl(&mut writer, stl_triangles.iter())
        .map_err(|e| WallError::save_error(path, e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::clean::remove_unreferenced_vertices;
    use crate::algo::dissolve::{dissolve_coplanar, DissolveOptions};
    use crate::grid::{OccupancyGrid, Placement};
    use crate::mesh::build_quad_mesh;
    use crate::pipeline::{build_wall, WallModel, WallOptions};

    fn tri_area(mesh: &PolyMesh, t: &[usize; 3]) -> f64 {
        let p = mesh.positions();
        0.5 * (p[t[1]] - p[t[0]]).cross(&(p[t[2]] - p[t[0]])).norm()
    }

    #[test]
    fn test_non_convex_cap() {
        let grid: OccupancyGrid = "#.\n##".parse().unwrap();
        let quads = remove_unreferenced_vertices(&build_quad_mesh(&grid).unwrap());
        let merged: PolyMesh = dissolve_coplanar(&quads, &DissolveOptions::default());
        assert_eq!(merged.num_faces(), 1);

        let triangles = triangulate(&merged).unwrap();
        assert_eq!(triangles.len(), 4);
        let area: f64 = triangles.iter().map(|t| tri_area(&merged, t)).sum();
        assert!((area - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_winding_follows_faces() {
        let grid: OccupancyGrid = "##\n#.".parse().unwrap();
        let model: WallModel =
            build_wall(&grid, &Placement::default(), &WallOptions::default()).unwrap();
        let mesh = model.mesh();

        let triangles = triangulate(mesh).unwrap();
        let tri_mesh: PolyMesh = PolyMesh::from_face_vertex(
            mesh.positions().to_vec(),
            &triangles.iter().map(|t| t.to_vec()).collect::<Vec<_>>(),
        )
        .unwrap();
        assert!(tri_mesh.is_closed());
        assert!((tri_mesh.surface_area() - mesh.surface_area()).abs() < 1e-9);
    }

    #[test]
    fn test_rotated_cap_keeps_every_triangle() {
        let grid: OccupancyGrid = "##..\n.###".parse().unwrap();
        for theta in [0.7, 0.3, -1.1, std::f64::consts::FRAC_PI_3] {
            let placement = Placement::new(0.05, 1.0, -2.0, theta);
            let model: WallModel =
                build_wall(&grid, &placement, &WallOptions::default()).unwrap();
            let mesh = model.mesh();

            let expected: usize = mesh.faces().map(|(_, f)| f.len() - 2).sum();
            let triangles = triangulate(mesh).unwrap();
            assert_eq!(triangles.len(), expected);

            let tri_mesh: PolyMesh = PolyMesh::from_face_vertex(
                mesh.positions().to_vec(),
                &triangles.iter().map(|t| t.to_vec()).collect::<Vec<_>>(),
            )
            .unwrap();
            assert!(tri_mesh.is_closed());
            assert!((tri_mesh.surface_area() - mesh.surface_area()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_save_rotated() {
        let grid: OccupancyGrid = "##..\n.###".parse().unwrap();
        let placement = Placement::new(0.05, 1.0, -2.0, 0.7);
        let model: WallModel = build_wall(&grid, &placement, &WallOptions::default()).unwrap();
        let expected: usize = model.mesh().faces().map(|(_, f)| f.len() - 2).sum();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("w.stl");
        save(model.mesh(), &path).unwrap();

        let len = std::fs::metadata(&path).unwrap().len();
        assert_eq!(len, 84 + 50 * expected as u64);
    }

    #[test]
    fn test_clip_ears_l_shape() {
        // L-shape, counter-clockwise, with a reflex corner at (1, 1).
        let coords = [0.0, 0.0, 2.0, 0.0, 2.0, 1.0, 1.0, 1.0, 1.0, 2.0, 0.0, 2.0];
        let indices = clip_ears(&coords);
        assert_eq!(indices.len(), 3 * 4);

        let area: f64 = indices
            .chunks_exact(3)
            .map(|t| {
                let (ax, ay) = (coords[2 * t[0]], coords[2 * t[0] + 1]);
                let (bx, by) = (coords[2 * t[1]], coords[2 * t[1] + 1]);
                let (cx, cy) = (coords[2 * t[2]], coords[2 * t[2] + 1]);
                0.5 * ((bx - ax) * (cy - ay) - (by - ay) * (cx - ax)).abs()
            })
            .sum();
        assert!((area - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_clip_ears_clockwise_with_collinear_corner() {
        // Clockwise rectangle with an extra corner halfway along one side.
        let coords = [0.0, 0.0, 0.0, 1.0, 2.0, 1.0, 2.0, 0.0, 1.0, 0.0];
        let indices = clip_ears(&coords);
        assert_eq!(indices.len(), 3 * 3);
    }

    #[test]
    fn test_save_binary() {
        let grid: OccupancyGrid = "#".parse().unwrap();
        let model: WallModel =
            build_wall(&grid, &Placement::default(), &WallOptions::default()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("walls.stl");
        save(model.mesh(), &path).unwrap();

        // 80-byte header, u32 count, 50 bytes per triangle.
        let len = std::fs::metadata(&path).unwrap().len();
        assert_eq!(len, 84 + 12 * 50);
    }
}
