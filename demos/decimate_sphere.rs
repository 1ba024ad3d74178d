//! Decimation demo
//!
//! Builds a UV sphere, decimates it with every cost strategy and prints the
//! resulting element counts. Set `RUST_LOG=lodcrate_simplification=debug`
//! to see the decimator's own events.

use anyhow::Result;
use lodcrate_core::{Point3f, TriangleMesh};
use lodcrate_simplification::{DecimationStrategy, Decimator, TopologyGraph};
use std::f32::consts::PI;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn uv_sphere(stacks: usize, slices: usize) -> TriangleMesh {
    let mut mesh = TriangleMesh::new();
    let top = mesh.add_vertex(Point3f::new(0.0, 0.0, 1.0));
    for i in 1..stacks {
        let phi = PI * i as f32 / stacks as f32;
        for j in 0..slices {
            let theta = 2.0 * PI * j as f32 / slices as f32;
            mesh.add_vertex(Point3f::new(
                phi.sin() * theta.cos(),
                phi.sin() * theta.sin(),
                phi.cos(),
            ));
        }
    }
    let bottom = mesh.add_vertex(Point3f::new(0.0, 0.0, -1.0));

    let ring = |i: usize, j: usize| 1 + (i - 1) * slices + j % slices;
    for j in 0..slices {
        mesh.add_face([top, ring(1, j), ring(1, j + 1)]);
        mesh.add_face([bottom, ring(stacks - 1, j + 1), ring(stacks - 1, j)]);
    }
    for i in 1..stacks - 1 {
        for j in 0..slices {
            let (a, b) = (ring(i, j), ring(i + 1, j));
            let (c, d) = (ring(i + 1, j + 1), ring(i, j + 1));
            mesh.add_face([a, b, c]);
            mesh.add_face([a, c, d]);
        }
    }
    mesh
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mesh = uv_sphere(24, 48);
    info!(
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "generated sphere"
    );

    println!("lodcrate decimation demo");
    println!("========================");
    println!("{:<24} {:>9} {:>9} {:>9} {:>8}", "strategy", "vertices", "faces", "edges", "skipped");

    for strategy in [
        DecimationStrategy::LengthBased,
        DecimationStrategy::VolumeAndBorderBased,
        DecimationStrategy::AngularDefault,
    ] {
        let mut graph = TopologyGraph::from_triangle_mesh(&mesh)?;
        let mut decimator = Decimator::new(&mut graph);
        decimator.set_strategy(strategy);
        decimator.set_proportion_to_remove(0.75);
        let stats = decimator.apply()?;
        graph.check_integrity()?;

        println!(
            "{:<24} {:>9} {:>9} {:>9} {:>8}",
            format!("{strategy:?}"),
            stats.vertices_after,
            stats.facets_after,
            stats.edges_after,
            stats.skipped
        );
    }

    Ok(())
}
