//! Scene nodes: one vertex buffer, one shader program, one local transform

use crate::backend::{BufferHandle, ProgramHandle, RenderBackend, Uniform};
use crate::geometry::Geometry;
use crate::kind::{KindConfig, NodeKind, Primitive};
use nalgebra::Matrix4;
use radarview_core::{Color, DetectionVertex, Error, LineVertex, MeshVertex, Result, Transform3D};
use std::fmt;

/// Index of a node inside its [`SceneGraph`](crate::SceneGraph)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Camera state cached on every node for shader binding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub uniform_scale: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            view: Matrix4::identity(),
            projection: Matrix4::identity(),
            uniform_scale: 1.0,
        }
    }
}

/// Per-node counters, cumulative since construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeStats {
    /// World transform derivations
    pub world_recomputes: u64,
    /// `update()` visits, hidden or not
    pub refreshes: u64,
    /// Vertex buffer uploads
    pub uploads: u64,
    /// Draw calls issued
    pub draws: u64,
}

/// A drawable node of the scene graph
#[derive(Debug)]
pub struct SceneNode {
    kind: NodeKind,
    config: KindConfig,
    geometry: Geometry,
    pub(crate) local: Transform3D,
    pub(crate) world: Transform3D,
    pub(crate) world_resolved: bool,
    pub(crate) visible: bool,
    pub(crate) camera: CameraState,
    program: Option<ProgramHandle>,
    buffer: Option<BufferHandle>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) stats: NodeStats,
    /// Model matrix last sent to the program
    pub(crate) pushed_model: Matrix4<f32>,
}

impl SceneNode {
    /// Create a node with `capacity` zeroed vertices.
    ///
    /// Compiles the kind's shader program and allocates the vertex buffer; any
    /// failure aborts construction and releases what was already allocated.
    pub fn new<B: RenderBackend + ?Sized>(backend: &mut B, kind: NodeKind, capacity: usize) -> Result<Self> {
        let geometry = Geometry::zeroed(kind.config().layout, capacity);
        Self::with_geometry(backend, kind, geometry)
    }

    /// Create a node from prepared vertex data. The data length becomes the capacity.
    pub fn with_geometry<B: RenderBackend + ?Sized>(
        backend: &mut B,
        kind: NodeKind,
        geometry: Geometry,
    ) -> Result<Self> {
        let config = kind.config();
        if geometry.layout() != config.layout {
            return Err(Error::InvalidData(format!(
                "{} node expects {:?} vertices, got {:?}",
                kind.name(),
                config.layout,
                geometry.layout()
            )));
        }

        let program = backend.compile_program(&config.shaders, config.layout, config.primitive)
            .map_err(|e| {
                log::error!("Failed to build {} node: {}", kind.name(), e);
                e
            })?;
        let buffer = match backend.create_vertex_buffer(program, config.layout, geometry.len(), geometry.as_bytes()) {
            Ok(buffer) => buffer,
            Err(e) => {
                backend.release_program(program);
                return Err(e);
            }
        };

        let camera = CameraState::default();
        backend.set_uniform(program, Uniform::Model(Matrix4::identity()));
        backend.set_uniform(program, Uniform::View(camera.view));
        backend.set_uniform(program, Uniform::Projection(camera.projection));
        backend.set_uniform(program, Uniform::Scale(camera.uniform_scale));
        if let Some(width) = config.line_width {
            backend.set_uniform(program, Uniform::LineWidth(width));
        }
        if let Some(antialias) = config.antialias {
            backend.set_uniform(program, Uniform::Antialias(antialias));
        }

        log::debug!("Created {} node with capacity {}", kind.name(), geometry.len());

        Ok(Self {
            kind,
            config,
            geometry,
            local: Transform3D::identity(),
            world: Transform3D::identity(),
            world_resolved: false,
            visible: true,
            camera,
            program: Some(program),
            buffer: Some(buffer),
            parent: None,
            children: Vec::new(),
            stats: NodeStats::default(),
            pushed_model: Matrix4::identity(),
        })
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn primitive(&self) -> Primitive {
        self.config.primitive
    }

    /// Maximum number of vertices, fixed at construction
    pub fn capacity(&self) -> usize {
        self.geometry.len()
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Writable detection vertices; `None` unless the node uses the detection layout.
    /// Changes reach the GPU on the next visible `update()`.
    pub fn detections_mut(&mut self) -> Option<&mut [DetectionVertex]> {
        self.geometry.detections_mut()
    }

    pub fn lines_mut(&mut self) -> Option<&mut [LineVertex]> {
        self.geometry.lines_mut()
    }

    pub fn mesh_mut(&mut self) -> Option<&mut [MeshVertex]> {
        self.geometry.mesh_mut()
    }

    pub fn fill_color(&mut self, color: Color) {
        self.geometry.fill_color(color);
    }

    /// Reset every vertex to transparent, keeping the capacity
    pub fn clear_vertices(&mut self) {
        self.geometry.clear();
    }

    pub fn local_transform(&self) -> Transform3D {
        self.local
    }

    /// Last computed world transform; may be stale until the graph resolves it
    pub fn cached_world_transform(&self) -> Transform3D {
        self.world
    }

    pub fn is_world_resolved(&self) -> bool {
        self.world_resolved
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn program(&self) -> Result<ProgramHandle> {
        self.program.ok_or(Error::NoShaderProgram)
    }

    pub fn buffer(&self) -> Option<BufferHandle> {
        self.buffer
    }

    pub fn parent(&self) -> Result<NodeId> {
        self.parent.ok_or(Error::NoParent)
    }

    /// Children in draw order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn stats(&self) -> NodeStats {
        self.stats
    }

    /// Change the radius and center of a circle node
    pub fn set_circle(&mut self, radius: f32, center: [f32; 2]) -> Result<()> {
        match &mut self.kind {
            NodeKind::Circle { radius: r, center: c } => {
                *r = radius;
                *c = center;
                Ok(())
            }
            other => Err(Error::InvalidData(format!("{} node is not a circle", other.name()))),
        }
    }

    pub(crate) fn push_uniform<B: RenderBackend + ?Sized>(&self, backend: &mut B, uniform: Uniform) -> Result<()> {
        backend.set_uniform(self.program()?, uniform);
        Ok(())
    }

    /// Per-frame CPU-side regeneration, run whether or not the node is visible
    pub(crate) fn refresh(&mut self) {
        self.stats.refreshes += 1;

        if let NodeKind::Circle { radius, center } = self.kind {
            if let Some(vertices) = self.geometry.lines_mut() {
                let segments = vertices.len();
                for (i, vertex) in vertices.iter_mut().enumerate() {
                    let theta = 2.0 * std::f32::consts::PI * i as f32 / segments as f32;
                    vertex.position[0] = radius * theta.cos() + center[0];
                    vertex.position[1] = radius * theta.sin() + center[1];
                }
            }
        }
    }

    pub(crate) fn upload<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> Result<()> {
        let buffer = self.buffer.ok_or(Error::NoVertexBuffer)?;
        backend.upload(buffer, self.geometry.as_bytes())?;
        self.stats.uploads += 1;
        Ok(())
    }

    pub(crate) fn draw<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> Result<()> {
        let program = self.program()?;
        let buffer = self.buffer.ok_or(Error::NoVertexBuffer)?;
        backend.draw(program, buffer, self.config.primitive, self.capacity() as u32);
        self.stats.draws += 1;
        Ok(())
    }

    /// Free the GPU buffer and program. Later program access fails with `NoShaderProgram`,
    /// buffer access with `NoVertexBuffer`.
    pub fn release<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        if let Some(buffer) = self.buffer.take() {
            backend.release_buffer(buffer);
        }
        if let Some(program) = self.program.take() {
            backend.release_program(program);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCall, RecordingBackend};

    #[test]
    fn test_construction_binds_program_and_buffer() {
        let mut backend = RecordingBackend::new();
        let node = SceneNode::new(&mut backend, NodeKind::Detections, 10).unwrap();

        assert_eq!(node.capacity(), 10);
        assert!(node.visible());
        assert!(node.program().is_ok());
        assert!(matches!(node.parent(), Err(Error::NoParent)));
        assert!(matches!(backend.calls()[0], BackendCall::CompileProgram { .. }));
        assert!(matches!(backend.calls()[1], BackendCall::CreateBuffer { capacity: 10, .. }));
        let program = node.program().unwrap();
        assert_eq!(backend.last_uniform(program, "u_antialias"), Some(Uniform::Antialias(1.0)));
        assert_eq!(backend.last_uniform(program, "u_linewidth"), Some(Uniform::LineWidth(0.1)));
    }

    #[test]
    fn test_shader_failure_is_fatal() {
        let mut backend = RecordingBackend::new();
        backend.fail_shader("model_fragment");
        let err = SceneNode::new(&mut backend, NodeKind::Mesh, 3).unwrap_err();
        assert!(matches!(err, Error::Shader { ref name, .. } if name == "model_fragment"));
        assert!(err.to_string().contains("shader compilation failed"));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_layout_mismatch_rejected() {
        let mut backend = RecordingBackend::new();
        let geometry = Geometry::zeroed(crate::kind::VertexLayout::Line, 4);
        assert!(SceneNode::with_geometry(&mut backend, NodeKind::Mesh, geometry).is_err());
    }

    #[test]
    fn test_release_drops_program() {
        let mut backend = RecordingBackend::new();
        let mut node = SceneNode::new(&mut backend, NodeKind::Group, 1).unwrap();
        node.release(&mut backend);
        assert!(matches!(node.program(), Err(Error::NoShaderProgram)));
        assert!(matches!(backend.calls().last(), Some(BackendCall::ReleaseProgram(_))));
    }

    #[test]
    fn test_circle_refresh_builds_ring() {
        let mut backend = RecordingBackend::new();
        let mut node = SceneNode::new(&mut backend, NodeKind::circle(2.0), 4).unwrap();
        node.set_circle(2.0, [1.0, 0.0]).unwrap();
        node.refresh();

        let ring = node.geometry().lines().unwrap();
        assert!((ring[0].position[0] - 3.0).abs() < 1e-6);
        assert!((ring[1].position[1] - 2.0).abs() < 1e-6);
        assert!((ring[2].position[0] + 1.0).abs() < 1e-6);
        assert_eq!(node.stats().refreshes, 1);
    }

    #[test]
    fn test_vertex_access_keeps_capacity_and_layout() {
        let mut backend = RecordingBackend::new();
        let mut node = SceneNode::new(&mut backend, NodeKind::Detections, 10).unwrap();
        assert!(node.lines_mut().is_none());
        assert!(node.mesh_mut().is_none());

        let vertices = node.detections_mut().unwrap();
        assert_eq!(vertices.len(), 10);
        vertices[9].size = 3.0;
        node.fill_color([0.0, 1.0, 0.0, 1.0]);
        node.clear_vertices();

        assert_eq!(node.capacity(), 10);
        assert_eq!(node.geometry().layout(), crate::kind::VertexLayout::Detection);

        backend.clear();
        node.upload(&mut backend).unwrap();
        let buffer = node.buffer().unwrap();
        assert_eq!(backend.uploads_to(buffer)[0].len(), 10 * crate::kind::VertexLayout::Detection.stride());
    }

    #[test]
    fn test_released_node_reports_missing_buffer() {
        let mut backend = RecordingBackend::new();
        let mut node = SceneNode::new(&mut backend, NodeKind::Group, 1).unwrap();
        node.release(&mut backend);
        assert!(matches!(node.upload(&mut backend), Err(Error::NoVertexBuffer)));
    }

    #[test]
    fn test_set_circle_on_other_kind_fails() {
        let mut backend = RecordingBackend::new();
        let mut node = SceneNode::new(&mut backend, NodeKind::Group, 1).unwrap();
        assert!(node.set_circle(1.0, [0.0, 0.0]).is_err());
    }
}
