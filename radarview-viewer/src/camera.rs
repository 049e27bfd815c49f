//! Canvas camera: a fixed top-down view pulled back along the z axis

use nalgebra::{Matrix4, Perspective3, Point3, Vector3, Vector4};
use radarview_core::{Point3f, Vector3f};
use radarview_scene::CameraState;

/// Distance of the camera from the ground plane at startup
pub const INITIAL_TRANSLATE: f32 = 100.0;
/// Closest the camera may get to the ground plane
pub const MIN_TRANSLATE: f32 = 2.0;
/// Distance change per mouse wheel step
pub const WHEEL_STEP: f32 = 5.0;

/// A ray in world space with a normalized direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3f,
    pub direction: Vector3f,
}

impl Ray {
    pub fn new(origin: Point3f, direction: Vector3f) -> Self {
        Self { origin, direction: direction.normalize() }
    }

    pub fn at(&self, t: f32) -> Point3f {
        self.origin + self.direction * t
    }

    /// Shortest distance from `point` to the ray. Points behind the origin
    /// measure to the origin itself.
    pub fn distance_to_point(&self, point: &Point3f) -> f32 {
        let t = (point - self.origin).dot(&self.direction).max(0.0);
        (point - self.at(t)).norm()
    }
}

/// Zoomable perspective camera of the radar canvas
#[derive(Debug, Clone)]
pub struct CanvasCamera {
    translate: f32,
    pub aspect_ratio: f32,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl CanvasCamera {
    pub fn new(aspect_ratio: f32) -> Self {
        Self {
            translate: INITIAL_TRANSLATE,
            aspect_ratio,
            fov: 45.0,
            near: 1.0,
            far: 1000.0,
        }
    }

    /// Current distance from the ground plane
    pub fn translate(&self) -> f32 {
        self.translate
    }

    /// Zoom by wheel steps; positive steps move the camera closer
    pub fn zoom(&mut self, steps: f32) {
        self.translate = (self.translate - steps * WHEEL_STEP).max(MIN_TRANSLATE);
    }

    pub fn set_aspect_ratio(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect_ratio = width as f32 / height as f32;
        }
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(0.0, 0.0, -self.translate))
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        Perspective3::new(self.aspect_ratio, self.fov.to_radians(), self.near, self.far).into_inner()
    }

    /// Point sprite scale: shrinks with distance, never below 1/100
    pub fn uniform_scale(&self) -> f32 {
        let t = self.translate;
        (1.0 / 100.0_f32).max((1.0 / t) * t.min(500.0) / 500.0)
    }

    /// View, projection and scale as broadcast to the scene
    pub fn state(&self) -> CameraState {
        CameraState {
            view: self.view_matrix(),
            projection: self.projection_matrix(),
            uniform_scale: self.uniform_scale(),
        }
    }

    /// World-space ray through a pixel. `screen` and `viewport` are in
    /// pixels with the origin at the top left.
    pub fn unproject(&self, screen: [f32; 2], viewport: [f32; 2]) -> Option<Ray> {
        if viewport[0] <= 0.0 || viewport[1] <= 0.0 {
            return None;
        }
        let ndc_x = 2.0 * screen[0] / viewport[0] - 1.0;
        let ndc_y = 1.0 - 2.0 * screen[1] / viewport[1];

        let inverse = (self.projection_matrix() * self.view_matrix()).try_inverse()?;
        let unproject_at = |z: f32| -> Option<Point3f> {
            let p = inverse * Vector4::new(ndc_x, ndc_y, z, 1.0);
            (p.w.abs() > f32::EPSILON).then(|| Point3::new(p.x / p.w, p.y / p.w, p.z / p.w))
        };

        let near = unproject_at(-1.0)?;
        let far = unproject_at(1.0)?;
        Some(Ray::new(near, far - near))
    }
}

impl Default for CanvasCamera {
    fn default() -> Self {
        Self::new(4.0 / 3.0)
    }
}
