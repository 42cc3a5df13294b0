//! Coplanar face merging (limited dissolve).
//!
//! Adjacent faces that lie in the same plane are merged pairwise into larger
//! polygons until no pair can be merged any more. Two faces `A` and `B` are
//! merged when
//!
//! - their normals differ by at most [`DissolveOptions::angle_limit`],
//! - the edges they share form a single contiguous run, and
//! - the union is still a simple polygon (no corner visited twice).
//!
//! The merged polygon walks `A` up to the start of the shared run, crosses to
//! `B`, walks `B` around, and returns to `A`; the vertices strictly inside the
//! run disappear. After merging, vertices that sit between two collinear
//! edges and touch nothing else are dissolved, so a merged block of cells is
//! described by its corners only.
//!
//! Faces are stored as circular linked lists of corners while merging, which
//! keeps the cost of a merge proportional to the smaller face's size. The
//! traversal order only depends on face and vertex indices, so a given input
//! always produces the same output.

use std::collections::{HashMap, VecDeque};

use nalgebra::{Point3, Vector3};
use tracing::{debug, info};

use super::clean::remove_unreferenced_vertices;
use crate::error::{Result, WallError};
use crate::mesh::{Face, MeshIndex, PolyMesh, VertexId};

/// Options for coplanar face merging.
#[derive(Debug, Clone)]
pub struct DissolveOptions {
    /// Largest angle in radians between two face normals (or between two
    /// edges meeting at a straight vertex) that still counts as flat.
    pub angle_limit: f64,

    /// Whether to dissolve vertices between collinear boundary edges.
    pub dissolve_collinear: bool,
}

impl Default for DissolveOptions {
    fn default() -> Self {
        Self {
            angle_limit: 5.0_f64.to_radians(),
            dissolve_collinear: true,
        }
    }
}

impl DissolveOptions {
    /// Set the flatness angle limit in radians.
    pub fn with_angle_limit(mut self, angle_limit: f64) -> Self {
        self.angle_limit = angle_limit;
        self
    }

    /// Set whether collinear boundary vertices are dissolved.
    pub fn with_dissolve_collinear(mut self, dissolve: bool) -> Self {
        self.dissolve_collinear = dissolve;
        self
    }

    /// Check that the angle limit is usable.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..std::f64::consts::FRAC_PI_2).contains(&self.angle_limit) {
            return Err(WallError::invalid_param(
                "angle_limit",
                self.angle_limit,
                "must be in [0, pi/2)",
            ));
        }
        Ok(())
    }
}

/// Merge adjacent coplanar faces into larger simple polygons.
///
/// The covered region, its silhouette and the face winding are unchanged;
/// face and vertex counts never grow. Running the function on its own output
/// returns the same mesh.
///
/// # Example
/// ```
/// use gridwall::algo::dissolve::{dissolve_coplanar, DissolveOptions};
/// use gridwall::grid::OccupancyGrid;
/// use gridwall::mesh::{build_quad_mesh, PolyMesh};
///
/// let grid: OccupancyGrid = "##\n##".parse().unwrap();
/// let quads: PolyMesh = build_quad_mesh(&grid).unwrap();
///
/// let merged = dissolve_coplanar(&quads, &DissolveOptions::default());
/// assert_eq!(merged.num_faces(), 1);
/// assert_eq!(merged.num_vertices(), 4);
/// ```
pub fn dissolve_coplanar<I: MeshIndex>(
    mesh: &PolyMesh<I>,
    options: &DissolveOptions,
) -> PolyMesh<I> {
    if mesh.is_empty() {
        return remove_unreferenced_vertices(mesh);
    }

    let cos_limit = options.angle_limit.cos();
    let mut loops = CornerLoops::new(mesh);

    let mut merges = 0usize;
    let mut sweeps = 0usize;
    loop {
        sweeps += 1;
        let merged = loops.sweep(cos_limit);
        merges += merged;
        if merged == 0 {
            break;
        }
    }

    let faces = if options.dissolve_collinear {
        loops.faces_without_straight_vertices(&mesh.vertices, cos_limit)
    } else {
        loops.faces()
    };

    let before = mesh.num_faces();
    let merged_mesh = PolyMesh {
        vertices: mesh.vertices.clone(),
        faces: faces.into_iter().map(Face::new).collect(),
    };
    let result = remove_unreferenced_vertices(&merged_mesh);

    info!(
        faces_before = before,
        faces_after = result.num_faces(),
        vertices_after = result.num_vertices(),
        merges,
        sweeps,
        "Dissolved coplanar faces"
    );

    result
}

/// One corner of a face loop: a vertex and its neighbours along the face.
#[derive(Debug, Clone, Copy)]
struct Corner {
    vertex: usize,
    next: usize,
    prev: usize,
    face: usize,
    alive: bool,
}

/// Faces as circular doubly-linked lists of corners.
struct CornerLoops {
    corners: Vec<Corner>,
    /// One corner of each live face, `None` once the face has been absorbed.
    heads: Vec<Option<usize>>,
    lens: Vec<usize>,
    normals: Vec<Vector3<f64>>,
    /// Directed edge `(from, to)` to the corner at `from`.
    edge_corner: HashMap<(usize, usize), usize>,
    /// Live corners at each vertex.
    vertex_corners: Vec<Vec<usize>>,
}

impl CornerLoops {
    fn new<I: MeshIndex>(mesh: &PolyMesh<I>) -> Self {
        let total: usize = mesh.faces.iter().map(Face::len).sum();
        let mut corners = Vec::with_capacity(total);
        let mut heads = Vec::with_capacity(mesh.num_faces());
        let mut lens = Vec::with_capacity(mesh.num_faces());
        let mut normals = Vec::with_capacity(mesh.num_faces());
        let mut edge_corner = HashMap::with_capacity(total);
        let mut vertex_corners = vec![Vec::new(); mesh.num_vertices()];

        for (fid, face) in mesh.faces() {
            let f = fid.index();
            let base = corners.len();
            let n = face.len();
            for (k, v) in face.vertices().iter().enumerate() {
                corners.push(Corner {
                    vertex: v.index(),
                    next: base + (k + 1) % n,
                    prev: base + (k + n - 1) % n,
                    face: f,
                    alive: true,
                });
                vertex_corners[v.index()].push(base + k);
            }
            for (k, (a, b)) in face.edges().enumerate() {
                edge_corner.insert((a.index(), b.index()), base + k);
            }
            heads.push(Some(base));
            lens.push(n);
            let n = mesh.face_newell(fid);
            let len = n.norm();
            normals.push(if len > 0.0 { n / len } else { Vector3::zeros() });
        }

        Self {
            corners,
            heads,
            lens,
            normals,
            edge_corner,
            vertex_corners,
        }
    }

    /// Corner ids of a face, starting at its head.
    fn face_corners(&self, f: usize) -> Vec<usize> {
        let Some(head) = self.heads[f] else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(self.lens[f]);
        let mut c = head;
        loop {
            out.push(c);
            c = self.corners[c].next;
            if c == head {
                break;
            }
        }
        out
    }

    /// Face on the other side of the edge leaving corner `c`, if any.
    fn neighbour_across(&self, c: usize) -> Option<usize> {
        let from = self.corners[c].vertex;
        let to = self.corners[self.corners[c].next].vertex;
        self.edge_corner
            .get(&(to, from))
            .map(|&twin| self.corners[twin].face)
    }

    /// Grow every face in index order by absorbing its neighbours. Returns
    /// the number of merges performed.
    fn sweep(&mut self, cos_limit: f64) -> usize {
        let mut merges = 0;
        let mut queue = VecDeque::new();
        let mut queued = vec![false; self.heads.len()];

        for a in 0..self.heads.len() {
            if self.heads[a].is_none() {
                continue;
            }
            for c in self.face_corners(a) {
                self.enqueue_across(c, a, &mut queue, &mut queued);
            }
            while let Some(b) = queue.pop_front() {
                queued[b] = false;
                if self.heads[b].is_none() {
                    continue;
                }
                if self.normals[a].dot(&self.normals[b]) < cos_limit {
                    continue;
                }
                if let Some(absorbed) = self.try_merge(a, b) {
                    merges += 1;
                    for c in absorbed {
                        self.enqueue_across(c, a, &mut queue, &mut queued);
                    }
                }
            }
        }
        merges
    }

    /// Queue the face across the edge leaving corner `c`, unless it is `a`
    /// itself or already waiting.
    fn enqueue_across(
        &self,
        c: usize,
        a: usize,
        queue: &mut VecDeque<usize>,
        queued: &mut [bool],
    ) {
        if let Some(g) = self.neighbour_across(c) {
            if g != a && !queued[g] {
                queued[g] = true;
                queue.push_back(g);
            }
        }
    }

    /// Merge face `b` into face `a`. Returns the corners `a` inherited from
    /// `b`, or `None` if the pair cannot be merged into a simple polygon.
    fn try_merge(&mut self, a: usize, b: usize) -> Option<Vec<usize>> {
        let b_corners = self.face_corners(b);
        let m = b_corners.len();

        // Which edges of `b` are shared with `a`.
        let shared: Vec<bool> = b_corners
            .iter()
            .map(|&c| {
                let from = self.corners[c].vertex;
                let to = self.corners[self.corners[c].next].vertex;
                self.edge_corner
                    .get(&(to, from))
                    .is_some_and(|&twin| self.corners[twin].face == a)
            })
            .collect();
        let k = shared.iter().filter(|&&s| s).count();
        if k == 0 || k >= m || k >= self.lens[a] || self.lens[a] + m - 2 * k < 3 {
            return None;
        }

        // The shared edges must form one run.
        let mut starts = (0..m).filter(|&t| shared[t] && !shared[(t + m - 1) % m]);
        let t = starts.next()?;
        if starts.next().is_some() {
            return None;
        }

        // In `b` the run goes q0 -> .. -> qk; `a` walks it backwards.
        let b_run: Vec<usize> = (0..k).map(|s| b_corners[(t + s) % m]).collect();
        let b_qk = b_corners[(t + k) % m];
        let b_before_q0 = b_corners[(t + m - 1) % m];
        let q0 = self.corners[b_run[0]].vertex;

        // Corners of `a` whose outgoing edge is on the run: at qk .. q1.
        let mut a_run = Vec::with_capacity(k);
        for &bc in b_run.iter().rev() {
            let from = self.corners[self.corners[bc].next].vertex;
            let to = self.corners[bc].vertex;
            a_run.push(*self.edge_corner.get(&(from, to))?);
        }
        if a_run.windows(2).any(|w| self.corners[w[0]].next != w[1]) {
            return None;
        }
        let a_before_qk = self.corners[a_run[0]].prev;
        let a_q0 = self.corners[a_run[k - 1]].next;
        if self.corners[a_q0].vertex != q0 {
            return None;
        }

        // The rest of `b` must not touch `a`, or the union would pinch.
        let mut c = self.corners[b_qk].next;
        while c != b_run[0] {
            let v = self.corners[c].vertex;
            if self.vertex_corners[v]
                .iter()
                .any(|&vc| self.corners[vc].face == a)
            {
                return None;
            }
            c = self.corners[c].next;
        }

        for &dead in a_run.iter().chain(b_run.iter()) {
            self.kill_corner(dead);
        }

        // Splice: .. a_before_qk -> [b from qk around to q0) -> a_q0 ..
        self.corners[a_before_qk].next = b_qk;
        self.corners[b_qk].prev = a_before_qk;
        self.corners[b_before_q0].next = a_q0;
        self.corners[a_q0].prev = b_before_q0;

        let mut absorbed = Vec::with_capacity(m - k);
        let mut c = b_qk;
        loop {
            self.corners[c].face = a;
            absorbed.push(c);
            if c == b_before_q0 {
                break;
            }
            c = self.corners[c].next;
        }

        self.lens[a] = self.lens[a] + m - 2 * k;
        self.heads[a] = Some(a_q0);
        self.heads[b] = None;
        self.lens[b] = 0;

        Some(absorbed)
    }

    /// Unlink a corner on the shared run. Must run before the splice, while
    /// `next` still points along the run.
    fn kill_corner(&mut self, c: usize) {
        let corner = self.corners[c];
        let to = self.corners[corner.next].vertex;
        self.edge_corner.remove(&(corner.vertex, to));
        self.vertex_corners[corner.vertex].retain(|&vc| vc != c);
        self.corners[c].alive = false;
    }

    /// Live faces as vertex loops, in face index order.
    fn faces<I: MeshIndex>(&self) -> Vec<Vec<VertexId<I>>> {
        (0..self.heads.len())
            .filter(|&f| self.heads[f].is_some())
            .map(|f| {
                self.face_corners(f)
                    .into_iter()
                    .map(|c| VertexId::new(self.corners[c].vertex))
                    .collect()
            })
            .collect()
    }

    /// Live faces with straight valence-two vertices left out.
    fn faces_without_straight_vertices<I: MeshIndex>(
        &self,
        positions: &[Point3<f64>],
        cos_limit: f64,
    ) -> Vec<Vec<VertexId<I>>> {
        let mut neighbours: Vec<Vec<usize>> = vec![Vec::new(); positions.len()];
        for c in self.corners.iter().filter(|c| c.alive) {
            let from = c.vertex;
            let to = self.corners[c.next].vertex;
            if !neighbours[from].contains(&to) {
                neighbours[from].push(to);
            }
            if !neighbours[to].contains(&from) {
                neighbours[to].push(from);
            }
        }

        let straight: Vec<bool> = neighbours
            .iter()
            .enumerate()
            .map(|(v, nb)| {
                if nb.len() != 2 {
                    return false;
                }
                let d1 = positions[nb[0]] - positions[v];
                let d2 = positions[nb[1]] - positions[v];
                let (l1, l2) = (d1.norm(), d2.norm());
                l1 > 0.0 && l2 > 0.0 && d1.dot(&d2) / (l1 * l2) <= -cos_limit
            })
            .collect();

        let mut dissolved = 0usize;
        let faces = self
            .faces::<I>()
            .into_iter()
            .map(|face| {
                let kept: Vec<VertexId<I>> = face
                    .iter()
                    .copied()
                    .filter(|v| !straight[v.index()])
                    .collect();
                if kept.len() >= 3 {
                    dissolved += face.len() - kept.len();
                    kept
                } else {
                    face
                }
            })
            .collect();
        debug!(dissolved, "Dissolved straight boundary vertices");
        faces
    }
}
