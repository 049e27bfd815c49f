//! Core data structures for radarview
//! 
//! This crate provides the fundamental types shared by the scene graph, the GPU
//! backend, the file readers and the viewer: vertex layouts, transforms,
//! triangle meshes, radar detection records, sensor mountings and colors.

pub mod vertex;
pub mod mesh;
pub mod transform;
pub mod detection;
pub mod sensor;
pub mod color;
pub mod error;

pub use vertex::*;
pub use mesh::*;
pub use transform::*;
pub use detection::*;
pub use sensor::*;
pub use color::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix4, UnitQuaternion};
