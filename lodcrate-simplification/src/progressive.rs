//! Progressive meshes: decimate once, extract any level of detail later
//!
//! [`ProgressiveMesh::build`] runs the decimator on a copy of the input and
//! keeps the ordered list of vertex moves it performed. A level of detail is
//! obtained by replaying a prefix of that list on the original index buffer:
//! each moved vertex is remapped to where it was collapsed, faces that
//! become degenerate are dropped and the surviving vertices are compacted.

use crate::attribute::CellHandle;
use crate::decimator::{Decimator, DecimatorConfig};
use crate::topology::TopologyGraph;
use lodcrate_core::{Error, Point3f, Result, TriangleMesh};
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span};

/// Vertex `from` was merged into vertex `to` (indices into the source mesh)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexMove {
    pub from: usize,
    pub to: usize,
}

/// Source mesh plus the collapse sequence computed for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressiveMesh {
    positions: Vec<Point3f>,
    faces: Vec<[usize; 3]>,
    moves: Vec<VertexMove>,
}

impl ProgressiveMesh {
    /// Decimate `mesh` with `config` and record every collapse.
    pub fn build(mesh: &TriangleMesh, config: &DecimatorConfig) -> Result<Self> {
        let span = info_span!("progressive_build", vertices = mesh.vertex_count());
        let _enter = span.enter();

        if mesh.is_empty() {
            return Err(Error::InvalidData("Mesh is empty".to_string()));
        }

        let mut graph = TopologyGraph::from_triangle_mesh(mesh)?;
        let stats = Decimator::with_config(&mut graph, config).apply()?;
        let moves: Vec<VertexMove> = stats
            .collapse_log
            .iter()
            .map(|r| VertexMove {
                from: r.from.index(),
                to: r.to.index(),
            })
            .collect();
        debug!(moves = moves.len(), "recorded collapse sequence");

        Ok(Self {
            positions: mesh.vertices.clone(),
            faces: mesh.faces.clone(),
            moves,
        })
    }

    pub fn move_count(&self) -> usize {
        self.moves.len()
    }

    pub fn moves(&self) -> &[VertexMove] {
        &self.moves
    }

    /// Extract the mesh at `percentage` of full detail.
    ///
    /// `100` reproduces the source faces, `0` applies every recorded move.
    pub fn lod(&self, percentage: f32) -> Result<TriangleMesh> {
        if !(0.0..=100.0).contains(&percentage) {
            return Err(Error::InvalidData(format!(
                "LOD percentage must be between 0 and 100, got {percentage}"
            )));
        }
        let applied = (self.moves.len() as f32 * (1.0 - percentage / 100.0) + 0.5).floor() as usize;
        let remap = self.remap_table(applied.min(self.moves.len()));

        let mut compact = vec![usize::MAX; self.positions.len()];
        let mut vertices = Vec::new();
        let mut faces = Vec::new();
        for face in &self.faces {
            let [a, b, c] = face.map(|i| remap[i]);
            if a == b || a == c || b == c {
                continue;
            }
            faces.push([a, b, c].map(|i| {
                if compact[i] == usize::MAX {
                    compact[i] = vertices.len();
                    vertices.push(self.positions[i]);
                }
                compact[i]
            }));
        }

        debug!(
            percentage,
            applied,
            vertices = vertices.len(),
            faces = faces.len(),
            "extracted level of detail"
        );
        Ok(TriangleMesh::from_vertices_and_faces(vertices, faces))
    }

    /// Where each source vertex ends up after the first `applied` moves.
    fn remap_table(&self, applied: usize) -> Vec<usize> {
        let mut remap: Vec<usize> = (0..self.positions.len()).collect();
        for m in &self.moves[..applied] {
            remap[m.from] = m.to;
        }
        // Each vertex moves at most once, so chains are acyclic.
        for i in 0..remap.len() {
            let mut cur = i;
            while remap[cur] != cur {
                cur = remap[cur];
            }
            remap[i] = cur;
        }
        remap
    }
}
