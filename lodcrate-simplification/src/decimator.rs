//! Greedy vertex decimation by half-edge collapse
//!
//! Every vertex is ranked by the cost ("importance") of its cheapest legal
//! outgoing collapse. The globally cheapest vertex is popped from an
//! indexed heap, collapsed into the destination of its chosen half-edge,
//! and the one-ring touched by the collapse is re-ranked in place.

use crate::attribute::{Attribute, CellHandle};
use crate::heap::MapVertexHeap;
use crate::mutator::TopologyGraphMutator;
use crate::topology::{FacetId, HalfedgeId, TopologyGraph, VertexId};
use crate::MeshSimplifier;
use lodcrate_core::{Error, Point3d, Result, TriangleMesh};
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span, trace};

/// Cost assigned to vertices without a usable collapse.
pub const UNCOLLAPSIBLE_COST: f64 = 1e20;

const MIN_FAN_SIN2: f64 = 1e-10;
const MAX_FAN_COS: f64 = 0.999;
const BORDER_AREA_WEIGHT: f64 = 5.0;

/// Cost metric used to rank candidate collapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DecimationStrategy {
    /// Length of the collapsed edge.
    LengthBased,
    /// Swept volume plus lost border area.
    #[default]
    VolumeAndBorderBased,
    /// Change of the angle sums around the removed vertex's one-ring.
    AngularDefault,
}

/// Decimator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecimatorConfig {
    /// Fraction of the current vertex count to remove
    pub proportion_to_remove: f64,
    /// Vertices whose re-ranked cost is not below this are not re-queued
    pub threshold: f64,
    pub strategy: DecimationStrategy,
}

impl Default for DecimatorConfig {
    fn default() -> Self {
        Self {
            proportion_to_remove: 0.5,
            threshold: UNCOLLAPSIBLE_COST,
            strategy: DecimationStrategy::default(),
        }
    }
}

impl DecimatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(
        proportion_to_remove: f64,
        threshold: f64,
        strategy: DecimationStrategy,
    ) -> Self {
        Self {
            proportion_to_remove,
            threshold,
            strategy,
        }
    }
}

/// One performed collapse: `from` was merged into `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollapseRecord {
    pub from: VertexId,
    pub to: VertexId,
}

/// Summary of one [`Decimator::apply`] run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecimationStats {
    pub vertices_before: usize,
    pub vertices_after: usize,
    pub facets_before: usize,
    pub facets_after: usize,
    pub edges_before: usize,
    pub edges_after: usize,
    /// Collapses performed
    pub collapses: usize,
    /// Popped vertices dropped because they had no legal collapse
    pub skipped: usize,
    /// Collapses in the order they were applied
    pub collapse_log: Vec<CollapseRecord>,
}

/// Greedy decimator over a borrowed [`TopologyGraph`].
///
/// Each [`apply`](Self::apply) call is self-contained: the per-vertex cost
/// state is rebuilt from scratch, the graph is edited in place.
pub struct Decimator<'a> {
    editor: TopologyGraphMutator<'a>,
    vertices_to_remove: usize,
    threshold: f64,
    strategy: DecimationStrategy,
    importance: Attribute<VertexId, f64>,
    priority: Attribute<VertexId, f64>,
    halfedge_to_collapse: Attribute<VertexId, Option<HalfedgeId>>,
    accumulated_cost: Attribute<VertexId, f64>,
    vertex_density: Attribute<VertexId, Option<f64>>,
}

impl<'a> Decimator<'a> {
    pub fn new(graph: &'a mut TopologyGraph) -> Self {
        Self::with_config(graph, &DecimatorConfig::default())
    }

    pub fn with_config(graph: &'a mut TopologyGraph, config: &DecimatorConfig) -> Self {
        let n = graph.vertex_capacity();
        let mut decimator = Self {
            editor: TopologyGraphMutator::new(graph),
            vertices_to_remove: 0,
            threshold: config.threshold,
            strategy: config.strategy,
            importance: Attribute::new(n, UNCOLLAPSIBLE_COST),
            priority: Attribute::new(n, UNCOLLAPSIBLE_COST),
            halfedge_to_collapse: Attribute::new(n, None),
            accumulated_cost: Attribute::new(n, 0.0),
            vertex_density: Attribute::new(n, None),
        };
        decimator.set_proportion_to_remove(config.proportion_to_remove);
        decimator
    }

    pub fn graph(&self) -> &TopologyGraph {
        self.editor.graph()
    }

    /// Budget = `proportion` x the current vertex count, rounded.
    pub fn set_proportion_to_remove(&mut self, proportion: f64) {
        let n = self.graph().vertex_count() as f64;
        self.vertices_to_remove = (proportion * n).round().max(0.0) as usize;
    }

    pub fn set_vertices_to_remove(&mut self, count: usize) {
        self.vertices_to_remove = count;
    }

    pub fn vertices_to_remove(&self) -> usize {
        self.vertices_to_remove
    }

    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = threshold;
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn set_strategy(&mut self, strategy: DecimationStrategy) {
        self.strategy = strategy;
    }

    pub fn strategy(&self) -> DecimationStrategy {
        self.strategy
    }

    /// Scale the importance of `v` by `1 + density`.
    pub fn set_vertex_density(&mut self, v: VertexId, density: f64) {
        self.vertex_density[v] = Some(density);
    }

    pub fn clear_vertex_density(&mut self) {
        self.vertex_density.reset(self.graph().vertex_capacity());
    }

    /// Importance of `v` as of its last evaluation
    pub fn importance(&self, v: VertexId) -> f64 {
        self.importance[v]
    }

    /// Half-edge realizing [`Self::importance`], if any
    pub fn halfedge_to_collapse(&self, v: VertexId) -> Option<HalfedgeId> {
        self.halfedge_to_collapse[v]
    }

    pub fn accumulated_cost(&self, v: VertexId) -> f64 {
        self.accumulated_cost[v]
    }

    /// Run the decimation until the budget is spent or no vertex is left.
    ///
    /// Fails without touching the graph if any facet is not a triangle.
    pub fn apply(&mut self) -> Result<DecimationStats> {
        let span = info_span!(
            "decimate",
            strategy = ?self.strategy,
            budget = self.vertices_to_remove,
            vertices = self.graph().vertex_count()
        );
        let _enter = span.enter();

        if let Some(f) = self.graph().non_triangular_facets().first() {
            return Err(Error::Algorithm(format!(
                "decimation requires a triangle mesh, facet {} has {} sides",
                f.index(),
                self.graph().facet_degree(*f)
            )));
        }

        let mut stats = DecimationStats {
            vertices_before: self.graph().vertex_count(),
            facets_before: self.graph().facet_count(),
            edges_before: self.graph().edge_count(),
            ..Default::default()
        };

        let n = self.graph().vertex_capacity();
        self.importance.reset(n);
        self.priority.reset(n);
        self.halfedge_to_collapse.reset(n);
        self.accumulated_cost.reset(n);

        let vertices: Vec<VertexId> = self.graph().vertices().collect();
        let mut heap = MapVertexHeap::with_capacity(n);
        for &v in &vertices {
            let cost = self.compute_vertex_importance(v);
            self.priority[v] = cost;
        }
        for &v in &vertices {
            heap.push(v, &self.priority);
        }
        debug!(seeded = heap.len(), "computed initial importances");

        let mut budget = self.vertices_to_remove;
        while budget > 0 {
            let Some(v) = heap.pop(&self.priority) else {
                break;
            };
            let h = match self.halfedge_to_collapse[v] {
                Some(h) if self.graph().origin(h) == v && self.can_collapse(h) => h,
                _ => {
                    trace!(vertex = v.index(), "no legal collapse, dropping");
                    stats.skipped += 1;
                    continue;
                }
            };

            budget -= 1;
            let ring = self.graph().neighbors(v);
            let survivor = self.graph().vertex(h);
            self.accumulated_cost[survivor] += self.importance[v];
            self.editor.collapse_edge(h);
            trace!(
                from = v.index(),
                to = survivor.index(),
                cost = self.priority[v],
                "collapsed"
            );
            stats.collapse_log.push(CollapseRecord {
                from: v,
                to: survivor,
            });

            for u in ring {
                if !self.graph().is_vertex_alive(u) {
                    continue;
                }
                let cost = self.compute_vertex_importance(u);
                self.priority[u] = cost;
                if heap.contains(u) {
                    heap.update_cost(u, &self.priority);
                } else if cost < self.threshold {
                    heap.push(u, &self.priority);
                }
            }
        }

        stats.collapses = stats.collapse_log.len();
        stats.vertices_after = self.graph().vertex_count();
        stats.facets_after = self.graph().facet_count();
        stats.edges_after = self.graph().edge_count();
        debug_assert!(self.graph().check_integrity().is_ok());
        debug!(
            collapses = stats.collapses,
            skipped = stats.skipped,
            vertices = stats.vertices_after,
            "decimation finished"
        );
        Ok(stats)
    }

    /// Re-rank `v` and return the cost it should have in the heap, which is
    /// its importance plus whatever it absorbed from earlier collapses.
    pub fn compute_vertex_importance(&mut self, v: VertexId) -> f64 {
        let (mut best, best_h) = self
            .graph()
            .halfedges_around_vertex(v)
            .filter(|&h| self.can_collapse(h))
            .map(|h| (self.edge_collapse_importance(h), Some(h)))
            .fold((UNCOLLAPSIBLE_COST, None), |acc, cur| {
                if cur.0 < acc.0 {
                    cur
                } else {
                    acc
                }
            });

        if let Some(density) = self.vertex_density[v] {
            best *= 1.0 + density;
        }
        self.importance[v] = best;
        self.halfedge_to_collapse[v] = best_h;
        best + self.accumulated_cost[v]
    }

    /// Topological and geometric legality of collapsing `h` into its
    /// destination.
    pub fn can_collapse(&self, h: HalfedgeId) -> bool {
        if !self.editor.can_collapse_edge(h) {
            return false;
        }
        let g = self.graph();
        let v = g.origin(h);
        if !g.is_border_edge(h) && g.is_on_border(v) {
            return false;
        }

        let target = g.point(g.vertex(h));
        let normal = g.vertex_normal(v);
        self.fan_after_collapse(h).into_iter().all(|(p, q)| {
            let e1 = g.point(p) - target;
            let e2 = g.point(q) - target;
            if normal.dot(&e1.cross(&e2)) < 0.0 {
                return false;
            }
            let (l1, l2) = (e1.norm(), e2.norm());
            if l1 == 0.0 || l2 == 0.0 {
                return false;
            }
            let cos = e1.dot(&e2) / (l1 * l2);
            cos > -MAX_FAN_COS && cos < MAX_FAN_COS
        })
    }

    pub fn edge_collapse_importance(&self, h: HalfedgeId) -> f64 {
        match self.strategy {
            DecimationStrategy::LengthBased => self.graph().direct(h).norm(),
            DecimationStrategy::VolumeAndBorderBased => self.volume_and_border_cost(h),
            DecimationStrategy::AngularDefault => self.angular_defect_cost(h),
        }
    }

    /// Corner pairs `(p, q)` of the facets around the origin of `h` that
    /// survive the collapse, in counter-clockwise order. After the collapse
    /// each becomes the triangle `(destination, p, q)`.
    fn fan_after_collapse(&self, h: HalfedgeId) -> Vec<(VertexId, VertexId)> {
        let g = self.graph();
        let (v, w) = (g.origin(h), g.vertex(h));
        g.halfedges_around_vertex(v)
            .filter(|&out| !g.is_border(out))
            .map(|out| (g.vertex(out), g.vertex(g.next(out))))
            .filter(|&(p, q)| p != w && q != w)
            .collect()
    }

    fn volume_and_border_cost(&self, h: HalfedgeId) -> f64 {
        let g = self.graph();
        let v = g.origin(h);
        let pv = g.point(v);
        let pw = g.point(g.vertex(h));
        let dir = g.direct(h);

        let volume: f64 = g
            .halfedges_around_vertex(v)
            .filter(|&out| !g.is_border(out))
            .map(|out| {
                let v0 = g.point(g.vertex(out)) - pv;
                let v1 = g.point(g.vertex(g.next(out))) - pv;
                v0.cross(&v1).dot(&dir).abs()
            })
            .sum();

        let min_sin2 = self
            .fan_after_collapse(h)
            .into_iter()
            .map(|(p, q)| {
                let e1 = g.point(p) - pw;
                let e2 = g.point(q) - pw;
                let denom = e1.norm_squared() * e2.norm_squared();
                if denom > 0.0 {
                    e1.cross(&e2).norm_squared() / denom
                } else {
                    0.0
                }
            })
            .fold(f64::INFINITY, f64::min);
        if min_sin2 < MIN_FAN_SIN2 {
            return UNCOLLAPSIBLE_COST;
        }

        let border_area = if g.is_border_edge(h) {
            self.border_area_delta(h)
        } else {
            0.0
        };
        volume.cbrt() + BORDER_AREA_WEIGHT * border_area.sqrt()
    }

    /// Area cut off the boundary polygon when the border edge `h` shrinks
    /// to its destination: the triangle formed by the origin, its other
    /// border neighbour and the destination.
    fn border_area_delta(&self, h: HalfedgeId) -> f64 {
        let g = self.graph();
        let v = g.origin(h);
        let w = g.vertex(h);
        let u = if g.is_border(h) {
            g.origin(g.prev(h))
        } else {
            g.vertex(g.next(g.opposite(h)))
        };
        if u == w {
            return 0.0;
        }
        let (pu, pv, pw) = (g.point(u), g.point(v), g.point(w));
        0.5 * (pv - pu).cross(&(pw - pu)).norm()
    }

    fn angular_defect_cost(&self, h: HalfedgeId) -> f64 {
        let g = self.graph();
        let v = g.origin(h);
        g.neighbors(v)
            .into_iter()
            .map(|p| (self.angle_sum_after_collapse(p, h) - self.angle_sum(p)).abs())
            .sum()
    }

    fn angle_sum(&self, p: VertexId) -> f64 {
        let g = self.graph();
        let at = g.point(p);
        g.halfedges_around_vertex(p)
            .filter(|&out| !g.is_border(out))
            .map(|out| {
                corner_angle(
                    at,
                    g.point(g.vertex(out)),
                    g.point(g.vertex(g.next(out))),
                )
            })
            .sum()
    }

    /// Angle sum at `p` in the mesh obtained by collapsing `h`.
    fn angle_sum_after_collapse(&self, p: VertexId, h: HalfedgeId) -> f64 {
        let g = self.graph();
        let (v, w) = (g.origin(h), g.vertex(h));
        let removed: [Option<FacetId>; 2] = [g.facet(h), g.facet(g.opposite(h))];
        let pos = |x: VertexId| if x == v { g.point(w) } else { g.point(x) };

        let around = move |center: VertexId| {
            g.halfedges_around_vertex(center)
                .filter(move |&out| g.facet(out).is_some() && !removed.contains(&g.facet(out)))
                .map(move |out| (g.vertex(out), g.vertex(g.next(out))))
        };

        let own: f64 = around(p)
            .map(|(a, b)| corner_angle(pos(p), pos(a), pos(b)))
            .sum();
        if p != w {
            return own;
        }
        let inherited: f64 = around(v)
            .map(|(a, b)| corner_angle(pos(w), pos(a), pos(b)))
            .sum();
        own + inherited
    }
}

/// Interior angle at `at` between the directions to `a` and `b`
fn corner_angle(at: Point3d, a: Point3d, b: Point3d) -> f64 {
    let e1 = a - at;
    let e2 = b - at;
    e1.cross(&e2).norm().atan2(e1.dot(&e2))
}

/// [`MeshSimplifier`] front-end that runs a [`Decimator`] on a copy of the
/// input mesh.
///
/// The reduction ratio is the fraction of vertices to remove.
#[derive(Debug, Clone, Default)]
pub struct VertexDecimator {
    pub config: DecimatorConfig,
}

impl VertexDecimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(strategy: DecimationStrategy) -> Self {
        Self {
            config: DecimatorConfig {
                strategy,
                ..Default::default()
            },
        }
    }

    pub fn with_config(config: DecimatorConfig) -> Self {
        Self { config }
    }
}

impl MeshSimplifier for VertexDecimator {
    fn simplify(&self, mesh: &TriangleMesh, reduction_ratio: f32) -> Result<TriangleMesh> {
        if mesh.is_empty() {
            return Err(Error::InvalidData("Mesh is empty".to_string()));
        }
        if !(0.0..=1.0).contains(&reduction_ratio) {
            return Err(Error::InvalidData(
                "Reduction ratio must be between 0.0 and 1.0".to_string(),
            ));
        }
        if reduction_ratio == 0.0 {
            return Ok(mesh.clone());
        }

        let mut graph = TopologyGraph::from_triangle_mesh(mesh)?;
        let mut decimator = Decimator::with_config(&mut graph, &self.config);
        decimator.set_proportion_to_remove(reduction_ratio as f64);
        decimator.apply()?;
        Ok(graph.to_triangle_mesh())
    }
}
