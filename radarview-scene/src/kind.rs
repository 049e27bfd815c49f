//! The closed set of node kinds and their rendering configuration

use radarview_core::{DetectionVertex, LineVertex, MeshVertex};

/// How the vertices of a buffer are assembled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Points,
    Lines,
    LineLoop,
    Triangles,
}

/// Per-vertex attribute layout of a node's buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexLayout {
    /// position, background color, foreground color, size, selected flag
    Detection,
    /// position, color
    Line,
    /// position, normal, color
    Mesh,
}

impl VertexLayout {
    /// Size of one vertex in bytes
    pub fn stride(&self) -> usize {
        match self {
            VertexLayout::Detection => std::mem::size_of::<DetectionVertex>(),
            VertexLayout::Line => std::mem::size_of::<LineVertex>(),
            VertexLayout::Mesh => std::mem::size_of::<MeshVertex>(),
        }
    }
}

/// Named shader resources making up a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderSet {
    pub vertex: &'static str,
    pub fragment: &'static str,
    pub geometry: Option<&'static str>,
}

impl ShaderSet {
    pub const fn new(vertex: &'static str, fragment: &'static str) -> Self {
        Self { vertex, fragment, geometry: None }
    }

    /// All stage names, vertex first
    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        [Some(self.vertex), Some(self.fragment), self.geometry].into_iter().flatten()
    }
}

pub const LINE_SHADERS: ShaderSet = ShaderSet::new("line_vertex", "line_fragment");
pub const DETECTION_SHADERS: ShaderSet = ShaderSet::new("detection_vertex", "detection_fragment");
pub const MODEL_SHADERS: ShaderSet = ShaderSet::new("model_vertex", "model_fragment");

/// Everything that differs between node kinds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindConfig {
    pub shaders: ShaderSet,
    pub primitive: Primitive,
    pub layout: VertexLayout,
    pub line_width: Option<f32>,
    pub antialias: Option<f32>,
}

/// Kind of a scene node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Pure grouping node; owns a one-vertex line buffer that stays transparent
    Group,
    /// Radar detections drawn as point sprites
    Detections,
    /// Doppler velocity arrows, one line segment per detection
    DopplerLines,
    /// Ring regenerated every frame from its radius and center
    Circle { radius: f32, center: [f32; 2] },
    /// Parent of the range circles
    PolarGrid,
    /// Flat triangle mesh such as the vehicle model
    Mesh,
}

impl NodeKind {
    pub fn circle(radius: f32) -> Self {
        NodeKind::Circle { radius, center: [0.0, 0.0] }
    }

    pub fn config(&self) -> KindConfig {
        match self {
            NodeKind::Group => KindConfig {
                shaders: LINE_SHADERS,
                primitive: Primitive::Lines,
                layout: VertexLayout::Line,
                line_width: Some(1.0),
                antialias: None,
            },
            NodeKind::Detections => KindConfig {
                shaders: DETECTION_SHADERS,
                primitive: Primitive::Points,
                layout: VertexLayout::Detection,
                line_width: Some(0.1),
                antialias: Some(1.0),
            },
            NodeKind::DopplerLines => KindConfig {
                shaders: LINE_SHADERS,
                primitive: Primitive::Lines,
                layout: VertexLayout::Line,
                line_width: Some(2.0),
                antialias: None,
            },
            NodeKind::Circle { .. } => KindConfig {
                shaders: LINE_SHADERS,
                primitive: Primitive::LineLoop,
                layout: VertexLayout::Line,
                line_width: Some(1.0),
                antialias: None,
            },
            NodeKind::PolarGrid => KindConfig {
                shaders: LINE_SHADERS,
                primitive: Primitive::Points,
                layout: VertexLayout::Line,
                line_width: Some(1.0),
                antialias: None,
            },
            NodeKind::Mesh => KindConfig {
                shaders: MODEL_SHADERS,
                primitive: Primitive::Triangles,
                layout: VertexLayout::Mesh,
                line_width: None,
                antialias: None,
            },
        }
    }

    /// Buffer capacity used when the caller has no better number.
    ///
    /// Meshes size their buffer from the imported face count instead.
    pub fn default_capacity(&self) -> usize {
        match self {
            NodeKind::Group => 1,
            NodeKind::Detections | NodeKind::DopplerLines => 50_000,
            NodeKind::Circle { .. } => 500,
            NodeKind::PolarGrid => 2_000,
            NodeKind::Mesh => 50_000,
        }
    }

    /// Short name used in log output
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Group => "group",
            NodeKind::Detections => "detections",
            NodeKind::DopplerLines => "doppler_lines",
            NodeKind::Circle { .. } => "circle",
            NodeKind::PolarGrid => "polar_grid",
            NodeKind::Mesh => "mesh",
        }
    }
}
