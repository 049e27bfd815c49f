//! # radarview GPU
//!
//! wgpu rendering for the radarview scene graph.
//!
//! [`WgpuBackend`] implements [`radarview_scene::RenderBackend`] on top of a
//! window surface. Every scene node gets its own render pipeline and uniform
//! buffer; draws issued by the graph are queued and encoded into one render
//! pass per frame.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use radarview_gpu::WgpuBackend;
//! use radarview_scene::{NodeKind, SceneGraph, SceneNode};
//! use std::sync::Arc;
//!
//! fn frame(window: Arc<winit::window::Window>) -> radarview_core::Result<()> {
//!     let mut backend = pollster::block_on(WgpuBackend::new(window))?;
//!     let mut graph = SceneGraph::new(SceneNode::new(&mut backend, NodeKind::Group, 1)?);
//!
//!     backend.begin_frame()?;
//!     graph.update(&mut backend)?;
//!     graph.draw(&mut backend)?;
//!     backend.end_frame([0.05, 0.05, 0.08, 1.0])
//! }
//! ```

pub mod device;
pub mod shaders;
pub mod backend;

// Re-export commonly used items
pub use device::GpuContext;
pub use shaders::shader_source;
pub use backend::{DrawMode, ProgramUniforms, WgpuBackend};
