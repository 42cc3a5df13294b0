//! Face-vertex polygon mesh.
//!
//! [`PolyMesh`] stores vertex positions and faces as ordered lists of vertex
//! ids. Faces may have any number of corners (quads straight out of the grid,
//! larger polygons after coplanar merging) and are wound counter-clockwise
//! when seen from the side their normal points to.
//!
//! The mesh owns its data outright; every pipeline stage takes a mesh and
//! returns a new one rather than editing shared state.

use std::collections::{BTreeMap, HashMap, HashSet};

use nalgebra::{Point3, Vector3};

use super::index::{FaceId, MeshIndex, VertexId};
use crate::error::{Result, WallError};

/// A polygonal face: an ordered loop of vertex ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Face<I: MeshIndex = u32> {
    vertices: Vec<VertexId<I>>,
}

impl<I: MeshIndex> Face<I> {
    /// Create a face from its corner loop.
    pub fn new(vertices: Vec<VertexId<I>>) -> Self {
        Self { vertices }
    }

    /// The corners of the face in winding order.
    #[inline]
    pub fn vertices(&self) -> &[VertexId<I>] {
        &self.vertices
    }

    /// Number of corners.
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the face has no corners.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Iterate over the directed edges `(from, to)` of the face loop.
    pub fn edges(&self) -> impl Iterator<Item = (VertexId<I>, VertexId<I>)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// The same face with opposite winding.
    pub fn reversed(&self) -> Self {
        let mut vertices = self.vertices.clone();
        vertices.reverse();
        Self { vertices }
    }

    /// Rotation of the loop that starts at its smallest vertex id.
    fn canonical(&self) -> Vec<VertexId<I>> {
        let start = self
            .vertices
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| **v)
            .map(|(i, _)| i)
            .unwrap_or(0);
        let mut out = self.vertices[start..].to_vec();
        out.extend_from_slice(&self.vertices[..start]);
        out
    }
}

/// A polygon mesh with shared vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct PolyMesh<I: MeshIndex = u32> {
    pub(crate) vertices: Vec<Point3<f64>>,
    pub(crate) faces: Vec<Face<I>>,
}

impl<I: MeshIndex> Default for PolyMesh<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> PolyMesh<I> {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(num_vertices: usize, num_faces: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(num_vertices),
            faces: Vec::with_capacity(num_faces),
        }
    }

    /// Build a mesh from raw positions and index loops, validating every face.
    pub fn from_face_vertex(vertices: Vec<Point3<f64>>, faces: &[Vec<usize>]) -> Result<Self> {
        if !I::can_address(vertices.len()) {
            return Err(WallError::invalid_param(
                "vertices",
                vertices.len(),
                "too many vertices for the index type",
            ));
        }
        let mut mesh = Self {
            vertices,
            faces: Vec::with_capacity(faces.len()),
        };
        for (fi, face) in faces.iter().enumerate() {
            if face.iter().any(|&v| v >= mesh.vertices.len()) {
                return Err(WallError::invalid_param(
                    "face",
                    fi,
                    "references a vertex that does not exist",
                ));
            }
            let ids = face.iter().map(|&v| VertexId::new(v)).collect();
            mesh.add_face(ids)?;
        }
        Ok(mesh)
    }

    // ==================== Accessors ====================

    /// Get the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Whether the mesh has no faces.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId<I>) -> &Point3<f64> {
        &self.vertices[v.index()]
    }

    /// Set the position of a vertex.
    #[inline]
    pub fn set_position(&mut self, v: VertexId<I>, pos: Point3<f64>) {
        self.vertices[v.index()] = pos;
    }

    /// All vertex positions, indexed by vertex id.
    #[inline]
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    /// Get a face by ID.
    #[inline]
    pub fn face(&self, f: FaceId<I>) -> &Face<I> {
        &self.faces[f.index()]
    }

    /// Iterate over all vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        (0..self.vertices.len()).map(VertexId::new)
    }

    /// Iterate over all face IDs.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        (0..self.faces.len()).map(FaceId::new)
    }

    /// Iterate over all faces with their IDs.
    pub fn faces(&self) -> impl Iterator<Item = (FaceId<I>, &Face<I>)> + '_ {
        self.faces
            .iter()
            .enumerate()
            .map(|(i, f)| (FaceId::new(i), f))
    }

    // ==================== Construction ====================

    /// Add a new vertex and return its ID.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexId<I> {
        let id = VertexId::new(self.vertices.len());
        self.vertices.push(position);
        id
    }

    /// Add a face, rejecting out-of-range or repeated corners.
    pub fn add_face(&mut self, vertices: Vec<VertexId<I>>) -> Result<FaceId<I>> {
        let fi = self.faces.len();
        if vertices.len() < 3 {
            return Err(WallError::invalid_param(
                "face",
                fi,
                "a face needs at least three corners",
            ));
        }
        let mut seen = HashSet::with_capacity(vertices.len());
        for v in &vertices {
            if v.index() >= self.vertices.len() {
                return Err(WallError::invalid_param(
                    "face",
                    fi,
                    "references a vertex that does not exist",
                ));
            }
            if !seen.insert(*v) {
                return Err(WallError::invalid_param(
                    "face",
                    fi,
                    "references the same vertex twice",
                ));
            }
        }
        self.faces.push(Face::new(vertices));
        Ok(FaceId::new(fi))
    }

    /// Push a face the caller already knows to be well formed.
    #[inline]
    pub(crate) fn push_face_unchecked(&mut self, vertices: Vec<VertexId<I>>) {
        debug_assert!(vertices.len() >= 3);
        self.faces.push(Face::new(vertices));
    }

    // ==================== Geometry ====================

    /// Newell vector of a face: normal scaled by twice the polygon area.
    pub fn face_newell(&self, f: FaceId<I>) -> Vector3<f64> {
        newell(self.face(f).vertices().iter().map(|&v| self.position(v)))
    }

    /// Unit normal of a face (zero for degenerate faces).
    pub fn face_normal(&self, f: FaceId<I>) -> Vector3<f64> {
        let n = self.face_newell(f);
        let len = n.norm();
        if len > 0.0 {
            n / len
        } else {
            Vector3::zeros()
        }
    }

    /// Area of a planar face.
    pub fn face_area(&self, f: FaceId<I>) -> f64 {
        0.5 * self.face_newell(f).norm()
    }

    /// Total surface area of the mesh.
    pub fn surface_area(&self) -> f64 {
        self.face_ids().map(|f| self.face_area(f)).sum()
    }

    /// Signed area of the mesh projected onto the xy-plane.
    ///
    /// Counter-clockwise faces count positively, so for a planar mesh facing
    /// +z this is the area of the covered region.
    pub fn projected_area(&self) -> f64 {
        self.face_ids().map(|f| 0.5 * self.face_newell(f).z).sum()
    }

    /// Centroid of a face's corners.
    pub fn face_centroid(&self, f: FaceId<I>) -> Point3<f64> {
        let face = self.face(f);
        let sum = face
            .vertices()
            .iter()
            .fold(Vector3::zeros(), |acc, &v| acc + self.position(v).coords);
        Point3::from(sum / face.len() as f64)
    }

    /// Compute the bounding box of the mesh.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?;
        let mut min = *first;
        let mut max = *first;

        for p in &self.vertices {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }

        Some((min, max))
    }

    // ==================== Topology ====================

    /// Map every directed edge to the face that uses it.
    ///
    /// Later faces win if an edge is used twice in the same direction, which
    /// only happens in meshes that fail [`PolyMesh::is_valid`].
    pub fn directed_edges(&self) -> HashMap<(VertexId<I>, VertexId<I>), FaceId<I>> {
        let mut map = HashMap::with_capacity(self.faces.iter().map(Face::len).sum());
        for (fid, face) in self.faces() {
            for edge in face.edges() {
                map.insert(edge, fid);
            }
        }
        map
    }

    /// Directed edges used by exactly one face, in face order.
    ///
    /// These trace the outer and inner silhouettes of a planar mesh. Each is
    /// returned in the winding of the face that owns it.
    pub fn boundary_edges(&self) -> Vec<(VertexId<I>, VertexId<I>)> {
        let edges = self.directed_edges();
        self.faces
            .iter()
            .flat_map(|face| face.edges())
            .filter(|&(a, b)| !edges.contains_key(&(b, a)))
            .collect()
    }

    /// Number of faces using each undirected edge.
    pub fn edge_face_counts(&self) -> BTreeMap<(VertexId<I>, VertexId<I>), usize> {
        let mut counts = BTreeMap::new();
        for face in &self.faces {
            for (a, b) in face.edges() {
                let key = if a < b { (a, b) } else { (b, a) };
                *counts.entry(key).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Check that the mesh is a closed, consistently oriented 2-manifold
    /// surface: every edge is used by exactly two faces, once per direction.
    pub fn is_closed(&self) -> bool {
        let mut directed: HashSet<(VertexId<I>, VertexId<I>)> = HashSet::new();
        for face in &self.faces {
            for edge in face.edges() {
                if !directed.insert(edge) {
                    return false;
                }
            }
        }
        directed.iter().all(|&(a, b)| directed.contains(&(b, a)))
    }

    /// Check that every edge is used as often in one direction as in the
    /// other. Closed meshes are watertight; so are solids whose parts touch
    /// along an edge or at a vertex.
    pub fn is_watertight(&self) -> bool {
        let mut balance: HashMap<(VertexId<I>, VertexId<I>), i64> = HashMap::new();
        for face in &self.faces {
            for (a, b) in face.edges() {
                let (key, step) = if a < b { ((a, b), 1) } else { ((b, a), -1) };
                *balance.entry(key).or_insert(0) += step;
            }
        }
        balance.values().all(|&b| b == 0)
    }

    // ==================== Validation ====================

    /// Check the structural invariants: every face has at least three
    /// distinct, in-range corners and no face appears twice.
    pub fn is_valid(&self) -> bool {
        let mut seen_faces = HashSet::with_capacity(self.faces.len());
        for face in &self.faces {
            if face.len() < 3 {
                return false;
            }
            let mut corners = HashSet::with_capacity(face.len());
            for v in face.vertices() {
                if v.index() >= self.vertices.len() || !corners.insert(*v) {
                    return false;
                }
            }
            if !seen_faces.insert(face.canonical()) {
                return false;
            }
        }
        true
    }

    /// Convert back to a plain face-vertex representation.
    pub fn to_face_vertex(&self) -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
        let faces = self
            .faces
            .iter()
            .map(|f| f.vertices().iter().map(|v| v.index()).collect())
            .collect();
        (self.vertices.clone(), faces)
    }
}

/// Newell's method over a closed loop of points.
fn newell<'a>(points: impl Iterator<Item = &'a Point3<f64>>) -> Vector3<f64> {
    let mut n = Vector3::zeros();
    let mut iter = points.peekable();
    let Some(first) = iter.peek().copied() else {
        return n;
    };
    while let Some(p) = iter.next() {
        let q = iter.peek().copied().unwrap_or(first);
        n.x += (p.y - q.y) * (p.z + q.z);
        n.y += (p.z - q.z) * (p.x + q.x);
        n.z += (p.x - q.x) * (p.y + q.y);
    }
    n
}
