//! Vertex layouts uploaded to GPU buffers
//!
//! Every layout is `#[repr(C)]` and `Pod` so a buffer can be handed to the GPU
//! as a plain byte slice. The zeroed default has alpha 0 everywhere, which keeps
//! unused tail entries of a fixed-capacity buffer invisible.

use nalgebra::{Point3, Vector3};
use bytemuck::{Pod, Zeroable};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// RGBA color with components in `[0, 1]`
pub type Color = [f32; 4];

/// Fully transparent black, the value of every unused vertex color
pub const TRANSPARENT: Color = [0.0, 0.0, 0.0, 0.0];

/// One radar detection drawn as a point sprite
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct DetectionVertex {
    pub position: [f32; 3],
    pub bg_color: Color,
    pub fg_color: Color,
    pub size: f32,
    /// 1.0 when the detection is selected, 0.0 otherwise
    pub selected: f32,
}

impl DetectionVertex {
    pub fn new(position: Point3f, bg_color: Color, fg_color: Color, size: f32) -> Self {
        Self {
            position: [position.x, position.y, position.z],
            bg_color,
            fg_color,
            size,
            selected: 0.0,
        }
    }

    pub fn point(&self) -> Point3f {
        Point3f::from(self.position)
    }

    pub fn is_selected(&self) -> bool {
        self.selected > 0.5
    }
}

/// Vertex of a line segment, line loop or grid
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: Color,
}

impl LineVertex {
    pub fn new(position: Point3f, color: Color) -> Self {
        Self {
            position: [position.x, position.y, position.z],
            color,
        }
    }

    pub fn point(&self) -> Point3f {
        Point3f::from(self.position)
    }
}

/// Vertex of a flat, non-indexed triangle mesh
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: Color,
}

impl MeshVertex {
    pub fn new(position: Point3f, normal: Vector3f, color: Color) -> Self {
        Self {
            position: [position.x, position.y, position.z],
            normal: [normal.x, normal.y, normal.z],
            color,
        }
    }

    pub fn point(&self) -> Point3f {
        Point3f::from(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_vertices_are_invisible() {
        assert_eq!(DetectionVertex::default().bg_color[3], 0.0);
        assert_eq!(DetectionVertex::default().fg_color[3], 0.0);
        assert_eq!(LineVertex::default().color, TRANSPARENT);
        assert_eq!(MeshVertex::default().color, TRANSPARENT);
    }

    #[test]
    fn test_layout_sizes() {
        assert_eq!(std::mem::size_of::<DetectionVertex>(), 4 * (3 + 4 + 4 + 1 + 1));
        assert_eq!(std::mem::size_of::<LineVertex>(), 4 * (3 + 4));
        assert_eq!(std::mem::size_of::<MeshVertex>(), 4 * (3 + 3 + 4));
    }
}
