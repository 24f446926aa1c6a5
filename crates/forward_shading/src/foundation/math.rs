//! Math utilities and types
//!
//! Provides the fundamental math types shared by every pipeline stage, plus
//! the small shading helpers (reflection, interpolation, normal-correction
//! matrices) the vertex and fragment programs are built on.

pub use nalgebra::{Matrix3, Matrix4, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Common math constants
pub mod constants {
    /// Archimedes' constant
    pub const PI: f32 = std::f32::consts::PI;
}

/// Clamp a scalar to the [0, 1] range
#[inline]
pub fn saturate(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Linear interpolation between two colors, `t` in [0, 1]
#[inline]
pub fn mix(from: Vec4, to: Vec4, t: f32) -> Vec4 {
    from + (to - from) * t
}

/// Reflect an incident vector about a unit normal
#[inline]
pub fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - normal * (2.0 * incident.dot(&normal))
}

/// Normal-correction matrix for a model matrix
///
/// The inverse-transpose of the upper-left 3x3 block, which transforms
/// normals into world space without picking up distortion from non-uniform
/// scale. Falls back to the raw linear block when the matrix is singular.
pub fn normal_matrix(model: &Mat4) -> Mat3 {
    let linear: Mat3 = model.fixed_view::<3, 3>(0, 0).into_owned();
    linear
        .try_inverse()
        .map(|inverse| inverse.transpose())
        .unwrap_or(linear)
}

/// De-scaled rotation part of a model matrix
///
/// Extracts the upper-left 3x3 block and normalizes each column, removing
/// per-axis scale the same way scale is separated out of a transform matrix.
/// The result is suitable for transforming normals of instanced geometry
/// where the raw block would introduce shearing.
pub fn rotation_part(model: &Mat4) -> Mat3 {
    let mut linear: Mat3 = model.fixed_view::<3, 3>(0, 0).into_owned();
    for column in 0..3 {
        let length = linear.column(column).magnitude();
        if length > f32::EPSILON {
            let descaled = linear.column(column) / length;
            linear.set_column(column, &descaled);
        }
    }
    linear
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_saturate_clamps_to_unit_range() {
        assert_eq!(saturate(-0.5), 0.0);
        assert_eq!(saturate(0.25), 0.25);
        assert_eq!(saturate(1.5), 1.0);
    }

    #[test]
    fn test_mix_endpoints() {
        let from = Vec4::new(0.0, 0.0, 0.0, 0.0);
        let to = Vec4::new(1.0, 0.5, 0.25, 1.0);
        assert_relative_eq!(mix(from, to, 0.0), from, epsilon = EPSILON);
        assert_relative_eq!(mix(from, to, 1.0), to, epsilon = EPSILON);
        assert_relative_eq!(
            mix(from, to, 0.5),
            Vec4::new(0.5, 0.25, 0.125, 0.5),
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_reflect_mirrors_across_normal() {
        let incident = Vec3::new(1.0, -1.0, 0.0).normalize();
        let normal = Vec3::new(0.0, 1.0, 0.0);
        let reflected = reflect(incident, normal);
        assert_relative_eq!(
            reflected,
            Vec3::new(1.0, 1.0, 0.0).normalize(),
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_normal_matrix_counteracts_non_uniform_scale() {
        // A surface tangent and its normal must stay perpendicular after
        // transformation, which the raw 3x3 block does not guarantee.
        let model = Mat4::new_nonuniform_scaling(&Vec3::new(2.0, 1.0, 1.0))
            * Mat4::from_euler_angles(0.0, 0.0, constants::PI / 4.0);
        let tangent = Vec3::new(1.0, 0.0, 0.0);
        let normal = Vec3::new(0.0, 1.0, 0.0);

        let linear: Mat3 = model.fixed_view::<3, 3>(0, 0).into_owned();
        let transformed_tangent = linear * tangent;
        let transformed_normal = (normal_matrix(&model) * normal).normalize();

        assert_relative_eq!(
            transformed_tangent.dot(&transformed_normal),
            0.0,
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_rotation_part_has_unit_columns() {
        let model = Mat4::from_euler_angles(0.3, 0.7, 0.1)
            * Mat4::new_nonuniform_scaling(&Vec3::new(3.0, 0.5, 7.0));
        let rotation = rotation_part(&model);
        for column in 0..3 {
            assert_relative_eq!(rotation.column(column).magnitude(), 1.0, epsilon = EPSILON);
        }
    }

    #[test]
    fn test_rotation_part_of_pure_rotation_is_identity_transform() {
        let model = Mat4::from_euler_angles(0.2, 0.4, 0.6);
        let linear: Mat3 = model.fixed_view::<3, 3>(0, 0).into_owned();
        assert_relative_eq!(rotation_part(&model), linear, epsilon = EPSILON);
    }
}
