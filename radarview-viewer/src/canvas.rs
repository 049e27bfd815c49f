//! The radar canvas: builds the scene and feeds it one frame of detections at a time
//!
//! Scene layout under the root group (rotated 90 degrees about z so the car's
//! forward axis points up the screen):
//!
//! ```text
//! root
//! ├── polar_grid
//! │   ├── circle_0
//! │   └── ... circle_n
//! ├── detection_points
//! ├── detection_vel_lines
//! └── car_mesh (optional)
//! ```

use crate::camera::{CanvasCamera, Ray};
use crate::settings::Settings;
use nalgebra::Vector3;
use radarview_core::{
    detection_color, Color, ColorBy, DetectionVertex, Error, LineVertex, RadarDetection, Result, TriangleMesh,
};
use radarview_scene::{Geometry, NodeId, NodeKind, RenderBackend, SceneGraph, SceneNode, Scope};

/// Color of the vehicle model
pub const CAR_MESH_COLOR: Color = [0.9, 0.9, 0.9, 1.0];

/// Largest Doppler arrow scale the viewer accepts
pub const MAX_DOPPLER_ARROW_SCALE: f32 = 1.0;

/// Scene graph plus the camera and the detections currently shown
pub struct RadarCanvas {
    pub(crate) graph: SceneGraph,
    settings: Settings,
    camera: CanvasCamera,
    /// Physical pixels per logical pixel
    pixel_scale: f32,
    pub(crate) detections: Vec<RadarDetection>,
    color_by: ColorBy,
    pub(crate) selected: Option<usize>,
    pub(crate) points: NodeId,
    lines: NodeId,
    grid: NodeId,
    car: Option<NodeId>,
}

impl RadarCanvas {
    /// Build the scene: grid, detection points and Doppler lines
    pub fn new<B: RenderBackend + ?Sized>(backend: &mut B, settings: Settings, aspect_ratio: f32) -> Result<Self> {
        settings.validate()?;

        let mut graph = SceneGraph::new(SceneNode::new(backend, NodeKind::Group, NodeKind::Group.default_capacity())?);
        let root = graph.root();
        graph.rotate_by(root, 90.0, Vector3::z())?;

        let grid = graph.add_child(
            root,
            "polar_grid",
            SceneNode::new(backend, NodeKind::PolarGrid, NodeKind::PolarGrid.default_capacity())?,
        )?;
        let n = settings.num_circles;
        for i in 0..=n {
            let radius = settings.min_circle_range
                + (settings.max_circle_range - settings.min_circle_range) * (i as f32 / n as f32);
            let mut circle = SceneNode::new(backend, NodeKind::circle(radius), settings.circle_capacity)?;
            circle.fill_color(settings.grid_circle_color);
            graph.add_child(grid, &format!("circle_{}", i), circle)?;
        }

        let points = graph.add_child(
            root,
            "detection_points",
            SceneNode::new(backend, NodeKind::Detections, settings.detection_capacity)?,
        )?;
        // two vertices per detection
        let lines = graph.add_child(
            root,
            "detection_vel_lines",
            SceneNode::new(backend, NodeKind::DopplerLines, settings.detection_capacity * 2)?,
        )?;

        let color_by = settings.color_by;
        let mut canvas = Self {
            graph,
            settings,
            camera: CanvasCamera::new(aspect_ratio),
            pixel_scale: 1.0,
            detections: Vec::new(),
            color_by,
            selected: None,
            points,
            lines,
            grid,
            car: None,
        };
        canvas.apply_camera(backend)?;

        log::info!("Canvas created with {} scene nodes", canvas.graph.len());
        Ok(canvas)
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn camera(&self) -> &CanvasCamera {
        &self.camera
    }

    /// Detections of the frame currently shown
    pub fn detections(&self) -> &[RadarDetection] {
        &self.detections
    }

    pub fn color_by(&self) -> ColorBy {
        self.color_by
    }

    pub fn points_node(&self) -> NodeId {
        self.points
    }

    pub fn lines_node(&self) -> NodeId {
        self.lines
    }

    pub fn grid_node(&self) -> NodeId {
        self.grid
    }

    pub fn car_node(&self) -> Option<NodeId> {
        self.car
    }

    /// Add the vehicle model under the root, rotated and scaled to car coordinates
    pub fn set_car_mesh<B: RenderBackend + ?Sized>(&mut self, backend: &mut B, mesh: &TriangleMesh) -> Result<NodeId> {
        if self.car.is_some() {
            return Err(Error::InvalidData("car mesh is already part of the scene".to_string()));
        }
        let vertices = mesh.flatten(CAR_MESH_COLOR)?;
        let node = SceneNode::with_geometry(backend, NodeKind::Mesh, Geometry::Mesh(vertices))?;

        let root = self.graph.root();
        let car = self.graph.add_child(root, "car_mesh", node)?;
        self.graph.rotate_by(car, 90.0, Vector3::z())?;
        self.graph.scale_by(car, 0.1, 0.1, 0.1)?;
        self.graph.set_camera(backend, car, self.camera.state(), Scope::Node)?;
        self.car = Some(car);

        log::info!("Car mesh added with {} triangles", mesh.face_count());
        Ok(car)
    }

    /// Fill the detection and Doppler line buffers from one frame of detections.
    ///
    /// Fails with `CapacityExceeded` when the frame does not fit; the buffers
    /// are left untouched in that case.
    pub fn update_scene(&mut self, detections: &[RadarDetection], color_by: ColorBy) -> Result<()> {
        let n = detections.len();
        self.graph.node(self.points)?.geometry().ensure_fits(n)?;
        self.graph.node(self.lines)?.geometry().ensure_fits(2 * n)?;

        let min_rcs = detections.iter().map(|d| d.rcs).fold(f32::INFINITY, f32::min);
        let colors: Vec<Color> = detections.iter().map(|d| detection_color(d, color_by)).collect();
        let fg_color = self.settings.clear_color();

        let points = self.graph.node_mut(self.points)?;
        points.clear_vertices();
        let vertices = points
            .detections_mut()
            .ok_or_else(|| Error::InvalidData("detection node has no detection vertices".to_string()))?;
        for ((vertex, detection), color) in vertices.iter_mut().zip(detections).zip(&colors) {
            let size = self.pixel_scale
                * (self.settings.standard_point_size + self.settings.rcs_size_scaling * (detection.rcs - min_rcs));
            *vertex = DetectionVertex::new(detection.position(), *color, fg_color, size);
        }

        if self.settings.draw_doppler_arrows {
            let scale = self.settings.doppler_arrow_scale;
            let lines = self.graph.node_mut(self.lines)?;
            lines.clear_vertices();
            let vertices = lines
                .lines_mut()
                .ok_or_else(|| Error::InvalidData("Doppler node has no line vertices".to_string()))?;
            for ((pair, detection), color) in vertices.chunks_exact_mut(2).zip(detections).zip(&colors) {
                let start = detection.position();
                pair[0] = LineVertex::new(start, *color);
                pair[1] = LineVertex::new(start + detection.velocity_vector() * scale, *color);
            }
            self.graph.set_visible(self.lines, true, Scope::Node)?;
        } else {
            self.graph.set_visible(self.lines, false, Scope::Node)?;
        }

        self.detections = detections.to_vec();
        self.color_by = color_by;
        self.selected = None;
        log::debug!("Scene updated with {} detections colored by {}", n, color_by.label());
        Ok(())
    }

    /// Rebuild the current frame with a different color mode
    pub fn set_color_by(&mut self, color_by: ColorBy) -> Result<()> {
        let detections = std::mem::take(&mut self.detections);
        self.update_scene(&detections, color_by)
    }

    pub fn set_draw_doppler_arrows(&mut self, enabled: bool) -> Result<()> {
        self.settings.draw_doppler_arrows = enabled;
        let detections = std::mem::take(&mut self.detections);
        self.update_scene(&detections, self.color_by)
    }

    /// Length of the Doppler arrows per m/s, clamped to `0..=MAX_DOPPLER_ARROW_SCALE`.
    /// Rebuilds the current frame.
    pub fn set_doppler_arrow_scale(&mut self, scale: f32) -> Result<()> {
        self.settings.doppler_arrow_scale = scale.clamp(0.0, MAX_DOPPLER_ARROW_SCALE);
        let detections = std::mem::take(&mut self.detections);
        self.update_scene(&detections, self.color_by)
    }

    /// Switch between dark and light background. Detection outlines follow the background.
    pub fn set_dark_mode(&mut self, dark_mode: bool) -> Result<()> {
        self.settings.dark_mode = dark_mode;
        let fg_color = self.settings.clear_color();
        let n = self.detections.len();
        if let Some(vertices) = self.graph.node_mut(self.points)?.detections_mut() {
            vertices.iter_mut().take(n).for_each(|v| v.fg_color = fg_color);
        }
        log::info!("{} mode enabled", if dark_mode { "Dark" } else { "Light" });
        Ok(())
    }

    pub fn clear_color(&self) -> Color {
        self.settings.clear_color()
    }

    /// Device pixel ratio applied to detection sizes from the next frame on
    pub fn set_pixel_scale(&mut self, pixel_scale: f32) {
        self.pixel_scale = pixel_scale;
    }

    /// Push the camera's view, projection and scale to every node
    pub fn apply_camera<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> Result<()> {
        let root = self.graph.root();
        self.graph.set_camera(backend, root, self.camera.state(), Scope::Subtree)
    }

    /// Zoom by mouse wheel steps
    pub fn zoom<B: RenderBackend + ?Sized>(&mut self, backend: &mut B, steps: f32) -> Result<()> {
        self.camera.zoom(steps);
        log::trace!("Camera distance {}", self.camera.translate());
        self.apply_camera(backend)
    }

    pub fn resize<B: RenderBackend + ?Sized>(&mut self, backend: &mut B, width: u32, height: u32) -> Result<()> {
        self.camera.set_aspect_ratio(width, height);
        self.apply_camera(backend)
    }

    /// World-space ray through a window pixel
    pub fn ray_at(&self, screen: [f32; 2], viewport: [f32; 2]) -> Option<Ray> {
        self.camera.unproject(screen, viewport)
    }

    /// Upload and draw the whole scene
    pub fn render<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> Result<()> {
        self.graph.update(backend)?;
        self.graph.draw(backend)
    }

    /// Free every GPU resource held by the scene
    pub fn release<B: RenderBackend + ?Sized>(self, backend: &mut B) {
        self.graph.release(backend);
    }
}
