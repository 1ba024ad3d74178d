//! Half-edge topology graph
//!
//! Vertices, half-edges and facets live in arena vectors and are addressed
//! by index handles. Removing an element tombstones its slot, so a handle
//! taken before a collapse can be checked for liveness afterwards instead of
//! dangling.
//!
//! Conventions:
//! - `vertex(h)` is the destination of `h`, `origin(h)` its source.
//! - A vertex anchors one *outgoing* half-edge.
//! - Border half-edges are explicit: they have no facet and are chained
//!   through `next`/`prev` around their hole, so every edge has two
//!   half-edges and `next_around_vertex` visits all outgoing half-edges of
//!   a manifold vertex.

use crate::attribute::CellHandle;
use itertools::Itertools;
use lodcrate_core::{Error, Point3d, Point3f, Result, TriangleMesh, Vector3d};
use std::collections::{HashMap, HashSet};

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(usize);

        impl $name {
            pub fn new(index: usize) -> Self {
                Self(index)
            }
        }

        impl CellHandle for $name {
            #[inline]
            fn index(self) -> usize {
                self.0
            }
        }
    };
}

handle!(
    /// Handle to a vertex of a [`TopologyGraph`]
    VertexId
);
handle!(
    /// Handle to a half-edge of a [`TopologyGraph`]
    HalfedgeId
);
handle!(
    /// Handle to a facet of a [`TopologyGraph`]
    FacetId
);

const UNSET: HalfedgeId = HalfedgeId(usize::MAX);

#[derive(Debug, Clone)]
pub(crate) struct Vertex {
    pub(crate) point: Point3d,
    pub(crate) halfedge: Option<HalfedgeId>,
    pub(crate) alive: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Halfedge {
    pub(crate) vertex: VertexId,
    pub(crate) opposite: HalfedgeId,
    pub(crate) next: HalfedgeId,
    pub(crate) prev: HalfedgeId,
    pub(crate) facet: Option<FacetId>,
    pub(crate) alive: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Facet {
    pub(crate) halfedge: HalfedgeId,
    pub(crate) alive: bool,
}

/// Half-edge mesh the decimator runs on.
#[derive(Debug, Clone)]
pub struct TopologyGraph {
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) halfedges: Vec<Halfedge>,
    pub(crate) facets: Vec<Facet>,
    pub(crate) live_vertices: usize,
    pub(crate) live_halfedges: usize,
    pub(crate) live_facets: usize,
}

impl TopologyGraph {
    /// Build a graph from a triangle mesh. Vertex `i` of the mesh becomes
    /// `VertexId::new(i)`.
    pub fn from_triangle_mesh(mesh: &TriangleMesh) -> Result<Self> {
        let points = mesh
            .vertices
            .iter()
            .map(|p| Point3d::new(p.x as f64, p.y as f64, p.z as f64))
            .collect();
        let polygons: Vec<Vec<usize>> = mesh.faces.iter().map(|f| f.to_vec()).collect();
        Self::from_polygons(points, &polygons)
    }

    /// Build a graph from counter-clockwise polygons indexing `points`.
    pub fn from_polygons(points: Vec<Point3d>, polygons: &[Vec<usize>]) -> Result<Self> {
        let nv = points.len();
        let mut graph = TopologyGraph {
            vertices: points
                .into_iter()
                .map(|point| Vertex {
                    point,
                    halfedge: None,
                    alive: true,
                })
                .collect(),
            halfedges: Vec::new(),
            facets: Vec::with_capacity(polygons.len()),
            live_vertices: nv,
            live_halfedges: 0,
            live_facets: 0,
        };

        let mut directed: HashMap<(usize, usize), HalfedgeId> = HashMap::new();
        let mut out_degree = vec![0usize; nv];

        for (fi, poly) in polygons.iter().enumerate() {
            if poly.len() < 3 {
                return Err(Error::InvalidData(format!(
                    "facet {} has {} vertices, expected at least 3",
                    fi,
                    poly.len()
                )));
            }
            if let Some(&vi) = poly.iter().find(|&&vi| vi >= nv) {
                return Err(Error::InvalidData(format!(
                    "facet {} references vertex {} but the mesh has {} vertices",
                    fi, vi, nv
                )));
            }
            if let Some(vi) = poly.iter().duplicates().next() {
                return Err(Error::InvalidData(format!(
                    "facet {} uses vertex {} more than once",
                    fi, vi
                )));
            }

            let facet = FacetId(graph.facets.len());
            let base = graph.halfedges.len();
            let n = poly.len();
            for (k, (a, b)) in poly.iter().copied().circular_tuple_windows().enumerate() {
                let h = HalfedgeId(base + k);
                if directed.insert((a, b), h).is_some() {
                    return Err(Error::NonManifold(format!(
                        "directed edge ({}, {}) appears twice",
                        a, b
                    )));
                }
                graph.halfedges.push(Halfedge {
                    vertex: VertexId(b),
                    opposite: UNSET,
                    next: HalfedgeId(base + (k + 1) % n),
                    prev: HalfedgeId(base + (k + n - 1) % n),
                    facet: Some(facet),
                    alive: true,
                });
                graph.vertices[a].halfedge.get_or_insert(h);
                out_degree[a] += 1;
            }
            graph.facets.push(Facet {
                halfedge: HalfedgeId(base),
                alive: true,
            });
        }

        // Pair twins; edges without one get a border half-edge.
        let interior = graph.halfedges.len();
        let mut border_from: HashMap<usize, HalfedgeId> = HashMap::new();
        for hi in 0..interior {
            if graph.halfedges[hi].opposite != UNSET {
                continue;
            }
            let b = graph.halfedges[hi].vertex.0;
            let a = graph.halfedges[graph.halfedges[hi].prev.0].vertex.0;
            if let Some(&twin) = directed.get(&(b, a)) {
                graph.halfedges[hi].opposite = twin;
                graph.halfedges[twin.0].opposite = HalfedgeId(hi);
                continue;
            }
            let border = HalfedgeId(graph.halfedges.len());
            graph.halfedges.push(Halfedge {
                vertex: VertexId(a),
                opposite: HalfedgeId(hi),
                next: UNSET,
                prev: UNSET,
                facet: None,
                alive: true,
            });
            graph.halfedges[hi].opposite = border;
            out_degree[b] += 1;
            if border_from.insert(b, border).is_some() {
                return Err(Error::NonManifold(format!(
                    "vertex {} lies on more than one boundary fan",
                    b
                )));
            }
        }

        // Chain border half-edges around their holes.
        for &border in border_from.values() {
            let dest = graph.halfedges[border.0].vertex.0;
            let next = *border_from.get(&dest).ok_or_else(|| {
                Error::NonManifold(format!("boundary is not closed at vertex {}", dest))
            })?;
            graph.halfedges[border.0].next = next;
            graph.halfedges[next.0].prev = border;
        }

        graph.live_halfedges = graph.halfedges.len();
        graph.live_facets = graph.facets.len();

        // A vertex whose outgoing half-edges do not form one fan is pinched.
        for (vi, &degree) in out_degree.iter().enumerate() {
            let ring = graph.halfedges_around_vertex(VertexId(vi)).count();
            if ring != degree {
                return Err(Error::NonManifold(format!(
                    "vertex {} joins {} half-edges but its fan has {}",
                    vi, degree, ring
                )));
            }
        }

        Ok(graph)
    }

    /// Convert back to an indexed triangle mesh, dropping tombstoned
    /// vertices. Polygonal facets are fan-triangulated.
    pub fn to_triangle_mesh(&self) -> TriangleMesh {
        let mut old_to_new = vec![usize::MAX; self.vertices.len()];
        let mut positions = Vec::with_capacity(self.live_vertices);
        for v in self.vertices() {
            old_to_new[v.0] = positions.len();
            let p = self.point(v);
            positions.push(Point3f::new(p.x as f32, p.y as f32, p.z as f32));
        }

        let mut faces = Vec::with_capacity(self.live_facets);
        for f in self.facets() {
            let corners: Vec<usize> = self
                .halfedges_around_facet(f)
                .map(|h| old_to_new[self.origin(h).0])
                .collect();
            for k in 1..corners.len() - 1 {
                faces.push([corners[0], corners[k], corners[k + 1]]);
            }
        }

        TriangleMesh::from_vertices_and_faces(positions, faces)
    }

    // ------------------------------------------------------------
    // Counts and iteration
    // ------------------------------------------------------------

    pub fn vertex_count(&self) -> usize {
        self.live_vertices
    }

    pub fn facet_count(&self) -> usize {
        self.live_facets
    }

    pub fn halfedge_count(&self) -> usize {
        self.live_halfedges
    }

    pub fn edge_count(&self) -> usize {
        self.live_halfedges / 2
    }

    /// Number of vertex slots, tombstones included
    pub fn vertex_capacity(&self) -> usize {
        self.vertices.len()
    }

    /// Live vertices
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.alive)
            .map(|(i, _)| VertexId(i))
    }

    /// Live facets
    pub fn facets(&self) -> impl Iterator<Item = FacetId> + '_ {
        self.facets
            .iter()
            .enumerate()
            .filter(|(_, f)| f.alive)
            .map(|(i, _)| FacetId(i))
    }

    /// Live half-edges
    pub fn halfedges(&self) -> impl Iterator<Item = HalfedgeId> + '_ {
        self.halfedges
            .iter()
            .enumerate()
            .filter(|(_, h)| h.alive)
            .map(|(i, _)| HalfedgeId(i))
    }

    /// Outgoing half-edges of `v`, following `next_around_vertex`
    pub fn halfedges_around_vertex(&self, v: VertexId) -> HalfedgesAroundVertex<'_> {
        let start = self.vertices.get(v.0).and_then(|vx| vx.halfedge);
        HalfedgesAroundVertex {
            graph: self,
            start,
            current: start,
            remaining: self.halfedges.len(),
        }
    }

    /// Half-edges of facet `f`, following `next`
    pub fn halfedges_around_facet(&self, f: FacetId) -> HalfedgesAroundFacet<'_> {
        let start = self.facets[f.0].halfedge;
        HalfedgesAroundFacet {
            graph: self,
            start,
            current: Some(start),
            remaining: self.halfedges.len(),
        }
    }

    // ------------------------------------------------------------
    // Element access
    // ------------------------------------------------------------

    pub fn is_vertex_alive(&self, v: VertexId) -> bool {
        self.vertices.get(v.0).is_some_and(|vx| vx.alive)
    }

    pub fn is_halfedge_alive(&self, h: HalfedgeId) -> bool {
        self.halfedges.get(h.0).is_some_and(|he| he.alive)
    }

    pub fn is_facet_alive(&self, f: FacetId) -> bool {
        self.facets.get(f.0).is_some_and(|fc| fc.alive)
    }

    pub fn point(&self, v: VertexId) -> Point3d {
        self.vertices[v.0].point
    }

    pub fn set_point(&mut self, v: VertexId, point: Point3d) {
        self.vertices[v.0].point = point;
    }

    /// The anchor outgoing half-edge of `v`, `None` if isolated
    pub fn vertex_halfedge(&self, v: VertexId) -> Option<HalfedgeId> {
        self.vertices[v.0].halfedge
    }

    /// Destination vertex
    #[inline]
    pub fn vertex(&self, h: HalfedgeId) -> VertexId {
        self.halfedges[h.0].vertex
    }

    /// Source vertex
    #[inline]
    pub fn origin(&self, h: HalfedgeId) -> VertexId {
        self.vertex(self.opposite(h))
    }

    #[inline]
    pub fn opposite(&self, h: HalfedgeId) -> HalfedgeId {
        self.halfedges[h.0].opposite
    }

    #[inline]
    pub fn next(&self, h: HalfedgeId) -> HalfedgeId {
        self.halfedges[h.0].next
    }

    #[inline]
    pub fn prev(&self, h: HalfedgeId) -> HalfedgeId {
        self.halfedges[h.0].prev
    }

    /// The next outgoing half-edge around the origin of `h`
    #[inline]
    pub fn next_around_vertex(&self, h: HalfedgeId) -> HalfedgeId {
        self.next(self.opposite(h))
    }

    pub fn facet(&self, h: HalfedgeId) -> Option<FacetId> {
        self.halfedges[h.0].facet
    }

    /// True if `h` runs along a hole
    #[inline]
    pub fn is_border(&self, h: HalfedgeId) -> bool {
        self.halfedges[h.0].facet.is_none()
    }

    /// True if either half of the edge runs along a hole
    pub fn is_border_edge(&self, h: HalfedgeId) -> bool {
        self.is_border(h) || self.is_border(self.opposite(h))
    }

    /// Edge vector, destination minus origin
    pub fn direct(&self, h: HalfedgeId) -> Vector3d {
        self.point(self.vertex(h)) - self.point(self.origin(h))
    }

    pub fn is_on_border(&self, v: VertexId) -> bool {
        self.halfedges_around_vertex(v).any(|h| self.is_border(h))
    }

    pub fn valence(&self, v: VertexId) -> usize {
        self.halfedges_around_vertex(v).count()
    }

    /// One-ring of `v` in rotation order
    pub fn neighbors(&self, v: VertexId) -> Vec<VertexId> {
        self.halfedges_around_vertex(v)
            .map(|h| self.vertex(h))
            .collect()
    }

    pub fn find_halfedge(&self, from: VertexId, to: VertexId) -> Option<HalfedgeId> {
        self.halfedges_around_vertex(from)
            .find(|&h| self.vertex(h) == to)
    }

    pub fn facet_halfedge(&self, f: FacetId) -> HalfedgeId {
        self.facets[f.0].halfedge
    }

    pub fn facet_degree(&self, f: FacetId) -> usize {
        self.halfedges_around_facet(f).count()
    }

    pub fn is_triangle(&self, f: FacetId) -> bool {
        let h = self.facet_halfedge(f);
        self.next(self.next(self.next(h))) == h
    }

    /// Area-weighted facet normal (not normalized)
    pub fn facet_normal(&self, f: FacetId) -> Vector3d {
        let corners: Vec<Point3d> = self
            .halfedges_around_facet(f)
            .map(|h| self.point(self.vertex(h)))
            .collect();
        let p0 = corners[0];
        corners
            .iter()
            .tuple_windows()
            .skip(1)
            .map(|(a, b)| (*a - p0).cross(&(*b - p0)))
            .fold(Vector3d::zeros(), |acc, n| acc + n)
    }

    /// Unit vertex normal from the incident facets, zero if degenerate
    pub fn vertex_normal(&self, v: VertexId) -> Vector3d {
        let sum = self
            .halfedges_around_vertex(v)
            .filter_map(|h| self.facet(h))
            .fold(Vector3d::zeros(), |acc, f| acc + self.facet_normal(f));
        sum.try_normalize(0.0).unwrap_or_else(Vector3d::zeros)
    }

    // ------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------

    /// Verify the half-edge invariants of every live element.
    pub fn check_integrity(&self) -> Result<()> {
        let fail = |msg: String| Err(Error::InvalidData(msg));

        let mut out_degree: HashMap<VertexId, usize> = HashMap::new();
        for h in self.halfedges() {
            let he = &self.halfedges[h.0];
            for (what, other) in [("opposite", he.opposite), ("next", he.next), ("prev", he.prev)] {
                if !self.is_halfedge_alive(other) {
                    return fail(format!("{:?} has dead {} {:?}", h, what, other));
                }
            }
            if he.opposite == h || self.opposite(he.opposite) != h {
                return fail(format!("{:?} has asymmetric opposite", h));
            }
            if self.prev(he.next) != h || self.next(he.prev) != h {
                return fail(format!("{:?} has inconsistent next/prev", h));
            }
            if self.facet(he.next) != he.facet {
                return fail(format!("{:?} and its successor disagree on facet", h));
            }
            if let Some(f) = he.facet {
                if !self.is_facet_alive(f) {
                    return fail(format!("{:?} points to dead {:?}", h, f));
                }
            }
            if !self.is_vertex_alive(he.vertex) {
                return fail(format!("{:?} ends at dead {:?}", h, he.vertex));
            }
            if self.origin(h) == he.vertex {
                return fail(format!("{:?} is a loop", h));
            }
            *out_degree.entry(self.origin(h)).or_default() += 1;
        }

        for v in self.vertices() {
            let degree = out_degree.get(&v).copied().unwrap_or(0);
            match self.vertex_halfedge(v) {
                None if degree == 0 => {}
                None => return fail(format!("{:?} has half-edges but no anchor", v)),
                Some(h) => {
                    if !self.is_halfedge_alive(h) || self.origin(h) != v {
                        return fail(format!("{:?} has an invalid anchor {:?}", v, h));
                    }
                    let ring = self.halfedges_around_vertex(v).count();
                    if ring != degree {
                        return fail(format!(
                            "{:?} fan visits {} of {} half-edges",
                            v, ring, degree
                        ));
                    }
                }
            }
        }

        for f in self.facets() {
            let h = self.facet_halfedge(f);
            if !self.is_halfedge_alive(h) || self.facet(h) != Some(f) {
                return fail(format!("{:?} has an invalid anchor {:?}", f, h));
            }
            if self.facet_degree(f) < 3 {
                return fail(format!("{:?} has fewer than three sides", f));
            }
        }

        let counted = (
            self.vertices().count(),
            self.halfedges().count(),
            self.facets().count(),
        );
        if counted != (self.live_vertices, self.live_halfedges, self.live_facets) {
            return fail(format!("live counters out of sync: {:?}", counted));
        }
        if self.live_halfedges % 2 != 0 {
            return fail("odd number of half-edges".to_string());
        }
        Ok(())
    }

    /// Facets that are not triangles
    pub fn non_triangular_facets(&self) -> Vec<FacetId> {
        self.facets().filter(|&f| !self.is_triangle(f)).collect()
    }

    /// Distinct vertices adjacent to both `a` and `b`
    pub fn common_neighbors(&self, a: VertexId, b: VertexId) -> Vec<VertexId> {
        let nb: HashSet<VertexId> = self.neighbors(b).into_iter().collect();
        self.neighbors(a)
            .into_iter()
            .filter(|x| nb.contains(x))
            .unique()
            .collect()
    }
}

/// Iterator over the outgoing half-edges of a vertex
pub struct HalfedgesAroundVertex<'a> {
    graph: &'a TopologyGraph,
    start: Option<HalfedgeId>,
    current: Option<HalfedgeId>,
    remaining: usize,
}

impl Iterator for HalfedgesAroundVertex<'_> {
    type Item = HalfedgeId;

    fn next(&mut self) -> Option<HalfedgeId> {
        let cur = self.current?;
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let next = self.graph.next_around_vertex(cur);
        self.current = if Some(next) == self.start { None } else { Some(next) };
        Some(cur)
    }
}

/// Iterator over the half-edges bounding a facet
pub struct HalfedgesAroundFacet<'a> {
    graph: &'a TopologyGraph,
    start: HalfedgeId,
    current: Option<HalfedgeId>,
    remaining: usize,
}

impl Iterator for HalfedgesAroundFacet<'_> {
    type Item = HalfedgeId;

    fn next(&mut self) -> Option<HalfedgeId> {
        let cur = self.current?;
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let next = self.graph.next(cur);
        self.current = if next == self.start { None } else { Some(next) };
        Some(cur)
    }
}
