//! Mesh decimation and level-of-detail generation
//!
//! This crate reduces triangle meshes by greedy half-edge collapse:
//! - A half-edge topology graph with tombstoned deletion
//! - Legality checks and collapse surgery on that graph
//! - An indexed min-heap keyed by per-vertex attributes
//! - The decimator driving it all, with pluggable cost strategies
//! - Progressive meshes that replay the collapse sequence at any detail level

pub mod attribute;
pub mod heap;
pub mod topology;
pub mod mutator;
pub mod decimator;
pub mod progressive;

#[cfg(test)]
mod test_meshes;

pub use attribute::{Attribute, CellHandle};
pub use heap::{MapCellHeap, MapVertexHeap};
pub use topology::{FacetId, HalfedgeId, TopologyGraph, VertexId};
pub use mutator::TopologyGraphMutator;
pub use decimator::*;
pub use progressive::*;

use lodcrate_core::{TriangleMesh, Result};

/// Simplify a mesh by reducing the number of faces/vertices
pub trait MeshSimplifier {
    /// Simplify mesh with target reduction ratio (0.0 = no reduction, 1.0 = maximum reduction)
    fn simplify(&self, mesh: &TriangleMesh, reduction_ratio: f32) -> Result<TriangleMesh>;
}
