//! Edge collapse surgery on a [`TopologyGraph`]

use crate::attribute::CellHandle;
use crate::topology::{FacetId, HalfedgeId, TopologyGraph, VertexId};

/// Performs topology-changing edits on a graph it borrows exclusively.
///
/// Collapsing `h` merges its origin into its destination: the origin vertex
/// is removed and the destination keeps its position.
pub struct TopologyGraphMutator<'a> {
    graph: &'a mut TopologyGraph,
}

impl<'a> TopologyGraphMutator<'a> {
    pub fn new(graph: &'a mut TopologyGraph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &TopologyGraph {
        self.graph
    }

    /// Whether collapsing `h` keeps the graph a valid 2-manifold.
    ///
    /// Checks the link condition (the only vertices adjacent to both ends
    /// are the apexes of the incident triangles), refuses to pinch two
    /// border vertices through an interior edge, and refuses collapses that
    /// would leave an apex with too few neighbours to bound a surface.
    pub fn can_collapse_edge(&self, h: HalfedgeId) -> bool {
        let g = &*self.graph;
        if !g.is_halfedge_alive(h) {
            return false;
        }
        let o = g.opposite(h);
        if g.is_border(h) && g.is_border(o) {
            return false;
        }

        let v = g.origin(h);
        let w = g.vertex(h);
        if !g.is_border_edge(h) && g.is_on_border(v) && g.is_on_border(w) {
            return false;
        }

        let mut apexes = Vec::with_capacity(2);
        for side in [h, o] {
            if g.is_border(side) {
                continue;
            }
            if g.next(g.next(g.next(side))) != side {
                return false;
            }
            apexes.push(g.vertex(g.next(side)));
        }
        if apexes.len() == 2 && apexes[0] == apexes[1] {
            return false;
        }

        // Apexes are always common neighbours, so equal counts mean equal sets.
        if g.common_neighbors(v, w).len() != apexes.len() {
            return false;
        }

        apexes.iter().all(|&a| {
            let min_valence = if g.is_on_border(a) { 3 } else { 4 };
            g.valence(a) >= min_valence
        })
    }

    /// Collapse `h`, removing its origin. Returns the surviving vertex.
    ///
    /// # Panics
    ///
    /// Panics if [`Self::can_collapse_edge`] rejects `h`.
    pub fn collapse_edge(&mut self, h: HalfedgeId) -> VertexId {
        assert!(self.can_collapse_edge(h), "{h:?} cannot be collapsed");

        let o = self.graph.opposite(h);
        let v = self.graph.origin(h);
        let w = self.graph.vertex(h);
        let v_out: Vec<HalfedgeId> = self.graph.halfedges_around_vertex(v).collect();
        let w_out: Vec<HalfedgeId> = self.graph.halfedges_around_vertex(w).collect();
        // Taken before surgery: gluing re-pairs some of these with new opposites.
        let v_in: Vec<HalfedgeId> = v_out.iter().map(|&he| self.graph.opposite(he)).collect();

        for side in [h, o] {
            if self.graph.is_border(side) {
                self.unlink_border(side);
            } else {
                self.remove_triangle(side);
            }
        }
        self.kill_halfedge(h);
        self.kill_halfedge(o);

        for &he in &v_in {
            if self.graph.is_halfedge_alive(he) {
                self.graph.halfedges[he.index()].vertex = w;
            }
        }

        let anchor = w_out
            .iter()
            .chain(&v_out)
            .copied()
            .find(|&he| self.graph.is_halfedge_alive(he));
        self.graph.vertices[w.index()].halfedge = anchor;

        let vertex = &mut self.graph.vertices[v.index()];
        vertex.alive = false;
        vertex.halfedge = None;
        self.graph.live_vertices -= 1;

        w
    }

    /// Drop the triangle on the left of `side` (excluding `side` itself)
    /// and glue its two remaining edges together.
    fn remove_triangle(&mut self, side: HalfedgeId) {
        let g = &mut *self.graph;
        let hn = g.next(side);
        let hp = g.prev(side);
        let apex = g.vertex(hn);
        let hn_o = g.opposite(hn);
        let hp_o = g.opposite(hp);

        g.halfedges[hn_o.index()].opposite = hp_o;
        g.halfedges[hp_o.index()].opposite = hn_o;

        if g.vertices[apex.index()].halfedge == Some(hp) {
            g.vertices[apex.index()].halfedge = Some(hn_o);
        }

        if let Some(f) = g.facet(side) {
            self.kill_facet(f);
        }
        self.kill_halfedge(hn);
        self.kill_halfedge(hp);
    }

    fn unlink_border(&mut self, side: HalfedgeId) {
        let g = &mut *self.graph;
        let p = g.prev(side);
        let n = g.next(side);
        g.halfedges[p.index()].next = n;
        g.halfedges[n.index()].prev = p;
    }

    fn kill_halfedge(&mut self, h: HalfedgeId) {
        let he = &mut self.graph.halfedges[h.index()];
        if he.alive {
            he.alive = false;
            self.graph.live_halfedges -= 1;
        }
    }

    fn kill_facet(&mut self, f: FacetId) {
        let fc = &mut self.graph.facets[f.index()];
        if fc.alive {
            fc.alive = false;
            self.graph.live_facets -= 1;
        }
    }
}
