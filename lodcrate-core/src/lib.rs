//! Core data structures for lodcrate
//!
//! This crate provides the value types shared by the lodcrate workspace:
//! point and vector aliases, the indexed triangle mesh used at crate
//! boundaries, and the common error type.

pub mod point;
pub mod mesh;
pub mod error;

pub use point::*;
pub use mesh::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3};

// Type aliases for easier imports
pub type Point = Point3f;
pub type Mesh = TriangleMesh;
