//! Retained-mode scene graph for radarview
//!
//! A [`SceneGraph`] owns a tree of [`SceneNode`]s. Each node holds one
//! fixed-capacity vertex buffer, one shader program and one local transform;
//! the graph derives world transforms, broadcasts camera state and visibility,
//! and walks the tree once per frame to upload and draw.
//!
//! GPU access goes through the [`RenderBackend`] trait. [`RecordingBackend`]
//! implements it without a GPU for tests and headless runs.

pub mod backend;
pub mod kind;
pub mod geometry;
pub mod node;
pub mod graph;

pub use backend::*;
pub use kind::*;
pub use geometry::*;
pub use node::*;
pub use graph::*;
