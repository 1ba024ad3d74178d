//! Level-of-detail demo
//!
//! Decimates a bumpy terrain patch once and extracts a chain of LODs from
//! the recorded collapse sequence.

use anyhow::Result;
use lodcrate_core::{Point3f, TriangleMesh};
use lodcrate_simplification::{DecimationStrategy, DecimatorConfig, ProgressiveMesh};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn terrain(size: usize) -> TriangleMesh {
    let mut vertices = Vec::with_capacity(size * size);
    for y in 0..size {
        for x in 0..size {
            let (fx, fy) = (x as f32 * 0.3, y as f32 * 0.3);
            let h = fx.sin() * fy.cos() + 0.25 * (2.0 * fx + fy).sin();
            vertices.push(Point3f::new(x as f32, y as f32, h));
        }
    }
    let mut faces = Vec::with_capacity((size - 1) * (size - 1) * 2);
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

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mesh = terrain(64);
    let config = DecimatorConfig::with_params(0.9, 1e20, DecimationStrategy::AngularDefault);
    info!(config = %serde_json::to_string(&config)?, "building progressive mesh");

    let progressive = ProgressiveMesh::build(&mesh, &config)?;
    println!(
        "Recorded {} collapses for {} vertices",
        progressive.move_count(),
        mesh.vertex_count()
    );

    for percentage in [100.0, 75.0, 50.0, 25.0, 10.0, 0.0] {
        let lod = progressive.lod(percentage)?;
        let (min, max) = lod.bounding_box();
        println!(
            "LOD {:>5.1}%: {:>5} vertices, {:>5} faces, extent {:.2}",
            percentage,
            lod.vertex_count(),
            lod.face_count(),
            nalgebra::distance(&min, &max)
        );
    }

    Ok(())
}
