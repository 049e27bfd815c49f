//! Fixed-capacity CPU-side vertex arrays

use crate::kind::VertexLayout;
use radarview_core::{Color, DetectionVertex, Error, LineVertex, MeshVertex, Result};

/// Typed vertex data of a node. The length never changes after construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Detections(Vec<DetectionVertex>),
    Lines(Vec<LineVertex>),
    Mesh(Vec<MeshVertex>),
}

impl Geometry {
    /// Zeroed (fully transparent) geometry of the given layout
    pub fn zeroed(layout: VertexLayout, capacity: usize) -> Self {
        match layout {
            VertexLayout::Detection => Geometry::Detections(vec![DetectionVertex::default(); capacity]),
            VertexLayout::Line => Geometry::Lines(vec![LineVertex::default(); capacity]),
            VertexLayout::Mesh => Geometry::Mesh(vec![MeshVertex::default(); capacity]),
        }
    }

    pub fn layout(&self) -> VertexLayout {
        match self {
            Geometry::Detections(_) => VertexLayout::Detection,
            Geometry::Lines(_) => VertexLayout::Line,
            Geometry::Mesh(_) => VertexLayout::Mesh,
        }
    }

    /// Number of vertices, equal to the buffer capacity
    pub fn len(&self) -> usize {
        match self {
            Geometry::Detections(v) => v.len(),
            Geometry::Lines(v) => v.len(),
            Geometry::Mesh(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw bytes as uploaded to the GPU
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Geometry::Detections(v) => bytemuck::cast_slice(v),
            Geometry::Lines(v) => bytemuck::cast_slice(v),
            Geometry::Mesh(v) => bytemuck::cast_slice(v),
        }
    }

    pub fn detections(&self) -> Option<&[DetectionVertex]> {
        match self {
            Geometry::Detections(v) => Some(v),
            _ => None,
        }
    }

    pub fn detections_mut(&mut self) -> Option<&mut [DetectionVertex]> {
        match self {
            Geometry::Detections(v) => Some(v),
            _ => None,
        }
    }

    pub fn lines(&self) -> Option<&[LineVertex]> {
        match self {
            Geometry::Lines(v) => Some(v),
            _ => None,
        }
    }

    pub fn lines_mut(&mut self) -> Option<&mut [LineVertex]> {
        match self {
            Geometry::Lines(v) => Some(v),
            _ => None,
        }
    }

    pub fn mesh(&self) -> Option<&[MeshVertex]> {
        match self {
            Geometry::Mesh(v) => Some(v),
            _ => None,
        }
    }

    pub fn mesh_mut(&mut self) -> Option<&mut [MeshVertex]> {
        match self {
            Geometry::Mesh(v) => Some(v),
            _ => None,
        }
    }

    /// Vertex positions, whatever the layout
    pub fn positions(&self) -> Vec<[f32; 3]> {
        match self {
            Geometry::Detections(v) => v.iter().map(|v| v.position).collect(),
            Geometry::Lines(v) => v.iter().map(|v| v.position).collect(),
            Geometry::Mesh(v) => v.iter().map(|v| v.position).collect(),
        }
    }

    /// Set the color of every vertex. Detections get it as background color.
    pub fn fill_color(&mut self, color: Color) {
        match self {
            Geometry::Detections(v) => v.iter_mut().for_each(|v| v.bg_color = color),
            Geometry::Lines(v) => v.iter_mut().for_each(|v| v.color = color),
            Geometry::Mesh(v) => v.iter_mut().for_each(|v| v.color = color),
        }
    }

    /// Reset every vertex to the transparent default
    pub fn clear(&mut self) {
        match self {
            Geometry::Detections(v) => v.fill(DetectionVertex::default()),
            Geometry::Lines(v) => v.fill(LineVertex::default()),
            Geometry::Mesh(v) => v.fill(MeshVertex::default()),
        }
    }

    /// Fail unless `count` vertices fit into this geometry
    pub fn ensure_fits(&self, count: usize) -> Result<()> {
        if count > self.len() {
            return Err(Error::CapacityExceeded { requested: count, capacity: self.len() });
        }
        Ok(())
    }
}
