//! Affine transforms for scene nodes
//!
//! Matrices follow the nalgebra column-vector convention: a point `p` is
//! transformed as `M * p`, so in `a.then(b)` the transform `a` acts first.

use nalgebra::{Matrix4, Point3, Unit, UnitQuaternion, Vector3};

/// Homogeneous 4x4 transform of a scene node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform3D {
    pub matrix: Matrix4<f32>,
}

impl Transform3D {
    pub fn identity() -> Self {
        Self { matrix: Matrix4::identity() }
    }

    pub fn translation(offset: Vector3<f32>) -> Self {
        Self { matrix: Matrix4::new_translation(&offset) }
    }

    /// Rotation of `degrees` around `axis` (right-handed). A zero axis yields the identity.
    pub fn rotation_degrees(degrees: f32, axis: Vector3<f32>) -> Self {
        match Unit::try_new(axis, f32::EPSILON) {
            Some(axis) => Self {
                matrix: UnitQuaternion::from_axis_angle(&axis, degrees.to_radians()).to_homogeneous(),
            },
            None => Self::identity(),
        }
    }

    /// Per-axis scaling
    pub fn scaling(factors: Vector3<f32>) -> Self {
        Self { matrix: Matrix4::new_nonuniform_scaling(&factors) }
    }

    pub fn transform_point(&self, point: &Point3<f32>) -> Point3<f32> {
        Point3::from_homogeneous(self.matrix * point.to_homogeneous()).unwrap_or(*point)
    }

    /// `self * other`: `other` acts first
    pub fn compose(self, other: Self) -> Self {
        Self { matrix: self.matrix * other.matrix }
    }

    /// Apply `self` first, then `next`
    pub fn then(self, next: Self) -> Self {
        next.compose(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rotation_about_z() {
        let rot = Transform3D::rotation_degrees(90.0, Vector3::z());
        let p = rot.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(0.0, 1.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_then_applies_left_operand_first() {
        let scale = Transform3D::scaling(Vector3::repeat(2.0));
        let shift = Transform3D::translation(Vector3::new(1.0, 0.0, 0.0));

        let p = scale.then(shift).transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(3.0, 0.0, 0.0), epsilon = 1e-6);

        let p = shift.then(scale).transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(4.0, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_zero_axis_is_identity() {
        let t = Transform3D::rotation_degrees(45.0, Vector3::zeros());
        assert_eq!(t, Transform3D::identity());
    }

    #[test]
    fn test_compose_is_matrix_product() {
        let rot = Transform3D::rotation_degrees(30.0, Vector3::x());
        let shift = Transform3D::translation(Vector3::new(0.0, 2.0, -1.0));
        assert_relative_eq!(rot.compose(shift).matrix, rot.matrix * shift.matrix, epsilon = 1e-6);
        assert_eq!(rot.then(shift), shift.compose(rot));
    }
}
