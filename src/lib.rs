//! # radarview
//!
//! Retained-mode scene graph and viewer for automotive radar point-cloud sequences.
//!
//! This is the umbrella crate that re-exports the workspace crates. Use the
//! individual crates for finer control over dependencies.
//!
//! - **Core**: vertex layouts, transforms, meshes, detection records, sensor mountings, colors
//! - **Scene**: scene nodes, the scene graph and the render backend seam
//! - **GPU**: wgpu render backend and shader library
//! - **I/O**: radar sequence and OBJ mesh readers
//! - **Viewer**: radar canvas, camera, picking, timeline and the windowed app
//!
//! ## Quick Start
//!
//! ```rust
//! use radarview::prelude::*;
//!
//! let mut backend = RecordingBackend::new();
//! let root = SceneNode::new(&mut backend, NodeKind::Group, 1).unwrap();
//! let mut graph = SceneGraph::new(root);
//!
//! let ring = SceneNode::new(&mut backend, NodeKind::circle(10.0), 64).unwrap();
//! let ring = graph.add_child(graph.root(), "ring", ring).unwrap();
//! graph.rotate_by(ring, 90.0, Vector3::z()).unwrap();
//!
//! graph.update(&mut backend).unwrap();
//! graph.draw(&mut backend).unwrap();
//! assert_eq!(backend.draws().len(), 2);
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: core, scene, io and gpu
//! - `gpu`: wgpu render backend
//! - `io`: file readers
//! - `viewer`: radar canvas and windowed viewer (implies `gpu` and `io`)
//! - `all`: everything

pub use radarview_core::*;
pub use radarview_scene as scene;

#[cfg(feature = "gpu")]
pub use radarview_gpu as gpu;

#[cfg(feature = "io")]
pub use radarview_io as io;

#[cfg(feature = "viewer")]
pub use radarview_viewer as viewer;

/// Convenient imports for common use cases
pub mod prelude {
    pub use radarview_core::*;
    pub use radarview_scene::{
        CameraState, Geometry, NodeId, NodeKind, RecordingBackend, RenderBackend, SceneGraph, SceneNode, Scope,
        Uniform,
    };

    #[cfg(feature = "io")]
    pub use radarview_io::{read_mesh, read_sequence, FrameWindow, Scan, Sequence};

    #[cfg(feature = "gpu")]
    pub use radarview_gpu::WgpuBackend;

    #[cfg(feature = "viewer")]
    pub use radarview_viewer::{CanvasCamera, RadarCanvas, Settings, Timeline};
}
