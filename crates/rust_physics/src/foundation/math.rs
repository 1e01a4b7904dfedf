//! Math utilities and types
//!
//! Thin aliases over nalgebra plus the [`Transform`] used by physics components.

pub use nalgebra::{
    Vector3, Vector4,
    Matrix4,
    Quaternion,
    Unit,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type (used for RGBA debug colors)
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Replace the scale (builder style)
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Convert to a transformation matrix (TRS order)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * self.scale.component_mul(&point)
    }

    /// Apply only rotation to a direction
    pub fn rotate_vector(&self, vector: Vec3) -> Vec3 {
        self.rotation * vector
    }

    /// Largest absolute scale factor (used for uniformly scaled shapes like spheres)
    pub fn max_scale(&self) -> f32 {
        self.scale.x.abs().max(self.scale.y.abs()).max(self.scale.z.abs())
    }

    /// True when every component of the transform is a finite number
    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|v| v.is_finite())
            && self.scale.iter().all(|v| v.is_finite())
            && self.rotation.coords.iter().all(|v| v.is_finite())
    }
}

/// Math utility functions
pub mod utils {
    use super::Vec3;

    /// Normalize a vector, returning `None` for zero-length or non-finite input
    ///
    /// Divides by the largest component first so huge or tiny finite vectors
    /// neither overflow nor underflow while squaring.
    pub fn try_normalize(v: Vec3) -> Option<Vec3> {
        if !v.iter().all(|c| c.is_finite()) {
            return None;
        }
        let largest = v.amax();
        if largest <= 0.0 {
            return None;
        }
        let scaled = v / largest;
        Some(scaled / scaled.magnitude())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_transform_point_applies_scale_rotation_translation() {
        let rotation = Quat::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_2);
        let transform = Transform::from_position_rotation(Vec3::new(1.0, 0.0, 0.0), rotation)
            .with_scale(Vec3::new(2.0, 2.0, 2.0));

        let p = transform.transform_point(Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Vec3::new(1.0, 2.0, 0.0), epsilon = 1e-5);

        let matrix_p = transform.to_matrix().transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(matrix_p.coords, p, epsilon = 1e-5);
    }

    #[test]
    fn test_try_normalize_rejects_zero() {
        assert!(utils::try_normalize(Vec3::zeros()).is_none());
        assert!(utils::try_normalize(Vec3::new(f32::NAN, 0.0, 0.0)).is_none());
        assert_relative_eq!(
            utils::try_normalize(Vec3::new(0.0, 3.0, 0.0)).unwrap(),
            Vec3::y()
        );
    }

    #[test]
    fn test_try_normalize_extreme_lengths() {
        assert_relative_eq!(utils::try_normalize(Vec3::new(1e20, 0.0, 0.0)).unwrap(), Vec3::x());
        assert_relative_eq!(
            utils::try_normalize(Vec3::new(3e30, -4e30, 0.0)).unwrap(),
            Vec3::new(0.6, -0.8, 0.0),
            epsilon = 1e-6
        );
        assert_relative_eq!(utils::try_normalize(Vec3::new(0.0, 0.0, -1e-30)).unwrap(), -Vec3::z());
        assert!(utils::try_normalize(Vec3::new(f32::INFINITY, 0.0, 0.0)).is_none());
    }
}
