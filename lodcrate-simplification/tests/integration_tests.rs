//! Integration tests for lodcrate-simplification
//!
//! These tests drive the decimator through its public API and replay the
//! recorded collapse sequences to check that every step was legal.

use lodcrate_core::{Point3f, TriangleMesh};
use lodcrate_simplification::*;

/// Regular icosahedron with outward-facing triangles
fn create_icosahedron() -> TriangleMesh {
    let t = (1.0 + 5.0f32.sqrt()) / 2.0;
    let vertices = vec![
        Point3f::new(-1.0, t, 0.0),
        Point3f::new(1.0, t, 0.0),
        Point3f::new(-1.0, -t, 0.0),
        Point3f::new(1.0, -t, 0.0),
        Point3f::new(0.0, -1.0, t),
        Point3f::new(0.0, 1.0, t),
        Point3f::new(0.0, -1.0, -t),
        Point3f::new(0.0, 1.0, -t),
        Point3f::new(t, 0.0, -1.0),
        Point3f::new(t, 0.0, 1.0),
        Point3f::new(-t, 0.0, -1.0),
        Point3f::new(-t, 0.0, 1.0),
    ];
    let faces = vec![
        [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
        [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
        [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
        [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
    ];
    TriangleMesh::from_vertices_and_faces(vertices, faces)
}

/// Flat or bumped `size` x `size` grid, counter-clockwise seen from +z
fn create_grid(size: usize, bump: f32) -> TriangleMesh {
    let mut vertices = Vec::with_capacity(size * size);
    for y in 0..size {
        for x in 0..size {
            let fx = x as f32 / (size - 1) as f32 * std::f32::consts::PI;
            let fy = y as f32 / (size - 1) as f32 * std::f32::consts::PI;
            vertices.push(Point3f::new(x as f32, y as f32, fx.sin() * fy.sin() * bump));
        }
    }
    let mut faces = Vec::new();
    for y in 0..(size - 1) {
        for x in 0..(size - 1) {
            let tl = y * size + x;
            let tr = tl + 1;
            let bl = (y + 1) * size + x;
            let br = bl + 1;
            faces.push([tl, tr, bl]);
            faces.push([tr, br, bl]);
        }
    }
    TriangleMesh::from_vertices_and_faces(vertices, faces)
}

fn euler_characteristic(g: &TopologyGraph) -> i64 {
    g.vertex_count() as i64 - g.edge_count() as i64 + g.facet_count() as i64
}

/// Replay `log` on a fresh graph of `mesh`, asserting each step is legal.
fn replay_log(
    mesh: &TriangleMesh,
    strategy: DecimationStrategy,
    log: &[CollapseRecord],
) -> TopologyGraph {
    let mut g = TopologyGraph::from_triangle_mesh(mesh).unwrap();
    for record in log {
        let h = g
            .find_halfedge(record.from, record.to)
            .unwrap_or_else(|| panic!("{record:?} is not an edge"));
        {
            let mut d = Decimator::new(&mut g);
            d.set_strategy(strategy);
            assert!(d.can_collapse(h), "{record:?} was not legal");
        }
        TopologyGraphMutator::new(&mut g).collapse_edge(h);
        for he in g.halfedges() {
            assert!(
                g.is_vertex_alive(g.vertex(he)),
                "{record:?} left {he:?} pointing at a removed vertex"
            );
        }
    }
    g
}

#[test]
fn test_icosahedron_one_collapse() {
    let mut g = TopologyGraph::from_triangle_mesh(&create_icosahedron()).unwrap();
    assert_eq!((g.vertex_count(), g.edge_count(), g.facet_count()), (12, 30, 20));

    let mut decimator = Decimator::new(&mut g);
    decimator.set_strategy(DecimationStrategy::VolumeAndBorderBased);
    decimator.set_proportion_to_remove(1.0 / 12.0);
    let stats = decimator.apply().unwrap();

    assert_eq!(stats.collapses, 1);
    assert_eq!((g.vertex_count(), g.edge_count(), g.facet_count()), (11, 27, 18));
    g.check_integrity().unwrap();
}

#[test]
fn test_grid_border_is_respected() {
    let mesh = create_grid(3, 0.0);
    let mut g = TopologyGraph::from_triangle_mesh(&mesh).unwrap();
    let border: Vec<VertexId> = g.vertices().filter(|&v| g.is_on_border(v)).collect();
    assert_eq!(border.len(), 8);

    let mut decimator = Decimator::new(&mut g);
    decimator.set_strategy(DecimationStrategy::LengthBased);
    decimator.set_proportion_to_remove(1.0);
    let stats = decimator.apply().unwrap();
    g.check_integrity().unwrap();

    // Surviving border vertices have not moved.
    for &v in border.iter().filter(|&&v| g.is_vertex_alive(v)) {
        let p = mesh.vertices[v.index()];
        let q = g.point(v);
        assert_eq!((q.x as f32, q.y as f32, q.z as f32), (p.x, p.y, p.z));
    }

    let mut replay = TopologyGraph::from_triangle_mesh(&mesh).unwrap();
    for record in &stats.collapse_log {
        let h = replay.find_halfedge(record.from, record.to).unwrap();
        if replay.is_on_border(record.from) {
            assert!(replay.is_border_edge(h), "border vertex left through {record:?}");
        }
        TopologyGraphMutator::new(&mut replay).collapse_edge(h);
    }
}

#[test]
fn test_collapse_log_replays_legally() {
    let strategies = [
        DecimationStrategy::LengthBased,
        DecimationStrategy::VolumeAndBorderBased,
        DecimationStrategy::AngularDefault,
    ];
    let mesh = create_grid(9, 2.0);
    for strategy in strategies {
        let mut g = TopologyGraph::from_triangle_mesh(&mesh).unwrap();
        let config = DecimatorConfig::with_params(0.6, 1e20, strategy);
        let stats = Decimator::with_config(&mut g, &config).apply().unwrap();
        assert!(stats.collapses > 0, "{strategy:?}");

        let replayed = replay_log(&mesh, strategy, &stats.collapse_log);
        assert_eq!(replayed.vertex_count(), g.vertex_count());
        assert_eq!(replayed.facet_count(), g.facet_count());
        replayed.check_integrity().unwrap();
    }
}

#[test]
fn test_counts_shrink_monotonically() {
    let mesh = create_icosahedron();
    let mut previous = (usize::MAX, usize::MAX);
    for proportion in [0.0, 0.1, 0.2, 0.3, 0.4] {
        let mut g = TopologyGraph::from_triangle_mesh(&mesh).unwrap();
        let mut decimator = Decimator::new(&mut g);
        decimator.set_proportion_to_remove(proportion);
        let stats = decimator.apply().unwrap();

        assert_eq!(stats.vertices_after, stats.vertices_before - stats.collapses);
        assert_eq!(stats.facets_after, stats.facets_before - 2 * stats.collapses);
        assert_eq!(euler_characteristic(&g), 2);

        let current = (g.vertex_count(), g.facet_count());
        assert!(current.0 <= previous.0 && current.1 <= previous.1);
        previous = current;
    }
}

#[test]
fn test_simplifier_and_progressive_mesh_agree() {
    let mesh = create_grid(12, 3.0);
    let config = DecimatorConfig::with_params(0.5, 1e20, DecimationStrategy::VolumeAndBorderBased);

    let simplified = VertexDecimator::with_config(config.clone())
        .simplify(&mesh, 0.5)
        .unwrap();
    let progressive = ProgressiveMesh::build(&mesh, &config).unwrap();
    let lowest = progressive.lod(0.0).unwrap();

    assert_eq!(simplified.face_count(), lowest.face_count());
    assert_eq!(simplified.vertex_count(), lowest.vertex_count());
    assert!(lowest.face_count() < mesh.face_count());
}

#[test]
fn test_heap_rejects_duplicate_push() {
    let mut cost: Attribute<VertexId, f64> = Attribute::new(3, 0.0);
    cost[VertexId::new(0)] = 2.0;
    cost[VertexId::new(1)] = 1.0;
    let mut heap = MapVertexHeap::new();
    heap.push(VertexId::new(0), &cost);
    heap.push(VertexId::new(1), &cost);

    let duplicate = std::panic::catch_unwind(move || {
        let mut heap = heap;
        heap.push(VertexId::new(0), &cost);
    });
    assert!(duplicate.is_err());
}

#[test]
fn test_heap_update_requires_membership() {
    let mut cost: Attribute<VertexId, f64> = Attribute::new(2, 0.0);
    let mut heap = MapVertexHeap::new();
    heap.push(VertexId::new(0), &cost);
    heap.pop(&cost);

    assert!(!heap.contains(VertexId::new(0)));
    assert!(!heap.contains(VertexId::new(1)));

    cost[VertexId::new(1)] = -1.0;
    heap.push(VertexId::new(1), &cost);
    assert!(heap.contains(VertexId::new(1)));
    heap.update_cost(VertexId::new(1), &cost);
    assert_eq!(heap.peek(), Some(VertexId::new(1)));
}
