//! Camera abstraction producing view and projection matrices
//!
//! Cameras assemble the matrices consumed by [`FrameConstants`] and, for the
//! shadow-casting directional light, by [`LightSpaceMatrices`]. A directional
//! caster uses an orthographic projection so that depth varies linearly
//! across the shadow map.
//!
//! [`FrameConstants`]: crate::render::frame::FrameConstants
//! [`LightSpaceMatrices`]: crate::render::frame::LightSpaceMatrices

use crate::foundation::math::{constants::PI, Mat4, Point3, Vec3};
use nalgebra::{Orthographic3, Perspective3};

/// Projection kind and parameters
#[derive(Debug, Clone, Copy)]
pub enum Projection {
    /// Perspective projection for the main color pass
    Perspective {
        /// Vertical field of view in radians
        fov_y: f32,
        /// Width over height
        aspect: f32,
        /// Near plane distance
        near: f32,
        /// Far plane distance
        far: f32,
    },
    /// Orthographic projection for the directional shadow caster
    Orthographic {
        /// Half of the projection cube's width and height
        half_extent: f32,
        /// Near plane distance
        near: f32,
        /// Far plane distance
        far: f32,
    },
}

/// A positionable camera with a look-at orientation
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    target: Vec3,
    up: Vec3,
    projection: Projection,
}

impl Camera {
    /// Create a perspective camera at `position`, looking at the origin
    ///
    /// `fov_y_degrees` is converted to radians internally.
    pub fn perspective(position: Vec3, fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::y(),
            projection: Projection::Perspective {
                fov_y: fov_y_degrees * PI / 180.0,
                aspect,
                near,
                far,
            },
        }
    }

    /// Create an orthographic camera at `position`, looking at the origin
    pub fn orthographic(position: Vec3, half_extent: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::y(),
            projection: Projection::Orthographic {
                half_extent,
                near,
                far,
            },
        }
    }

    /// Point the camera at a target with an explicit up vector
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        self.target = target;
        self.up = up;
    }

    /// Move the camera
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Camera position in world space
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// World-to-camera view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(
            &Point3::from(self.position),
            &Point3::from(self.target),
            &self.up,
        )
    }

    /// Camera-to-clip projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            Projection::Perspective {
                fov_y,
                aspect,
                near,
                far,
            } => Perspective3::new(aspect, fov_y, near, far).to_homogeneous(),
            Projection::Orthographic {
                half_extent,
                near,
                far,
            } => Orthographic3::new(
                -half_extent,
                half_extent,
                -half_extent,
                half_extent,
                near,
                far,
            )
            .to_homogeneous(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec4;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_view_matrix_moves_camera_to_origin() {
        let mut camera = Camera::perspective(Vec3::new(0.0, 0.0, 5.0), 45.0, 1.0, 0.1, 100.0);
        camera.look_at(Vec3::zeros(), Vec3::y());
        let eye = camera.view_matrix() * Vec4::new(0.0, 0.0, 5.0, 1.0);
        assert_relative_eq!(eye.xyz(), Vec3::zeros(), epsilon = EPSILON);
    }

    #[test]
    fn test_view_matrix_looks_down_negative_z() {
        let mut camera = Camera::perspective(Vec3::new(0.0, 0.0, 5.0), 45.0, 1.0, 0.1, 100.0);
        camera.look_at(Vec3::zeros(), Vec3::y());
        let origin = camera.view_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!(origin.z < 0.0);
    }

    #[test]
    fn test_orthographic_projection_keeps_w_at_one() {
        let camera = Camera::orthographic(Vec3::new(0.0, 10.0, 0.0), 8.0, 0.1, 20.0);
        let clip = camera.projection_matrix() * Vec4::new(1.0, 2.0, -3.0, 1.0);
        assert_relative_eq!(clip.w, 1.0, epsilon = EPSILON);
    }

    #[test]
    fn test_perspective_projection_divides_by_depth() {
        let camera = Camera::perspective(Vec3::zeros(), 90.0, 1.0, 0.1, 100.0);
        let clip = camera.projection_matrix() * Vec4::new(0.0, 0.0, -10.0, 1.0);
        assert_relative_eq!(clip.w, 10.0, epsilon = EPSILON);
    }
}
