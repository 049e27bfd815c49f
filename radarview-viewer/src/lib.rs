//! Interactive viewer for recorded radar sequences
//!
//! [`RadarCanvas`] builds the scene graph (range circles, detection sprites,
//! Doppler arrows and an optional vehicle model) and refills it one frame at a
//! time. The windowed [`app`] drives it from winit events through the wgpu
//! backend; [`run_headless`] steps through a sequence against the recording
//! backend instead.

pub mod settings;
pub mod camera;
pub mod canvas;
pub mod picking;
pub mod timeline;
pub mod headless;
pub mod app;

pub use settings::*;
pub use camera::*;
pub use canvas::*;
pub use picking::nearest_to_ray;
pub use timeline::*;
pub use headless::*;
pub use app::{run, LaunchOptions, LoaderMessage, SequenceLoader};
