//! Per-draw constant blocks
//!
//! A draw call reads from a [`FrameConstants`] block that is rebuilt once per
//! draw (or per frame) and never mutated while the stages run. Instanced
//! draws additionally carry one [`InstanceTransform`] per drawn instance.

use crate::foundation::math::{normal_matrix, rotation_part, Mat3, Mat4};
use crate::render::camera::Camera;

/// Read-only constants shared by every stage of a draw call
///
/// Immutable while the stages execute; rebuild a fresh block when the model,
/// view or projection changes.
#[derive(Debug, Clone)]
pub struct FrameConstants {
    /// Model (object-to-world) matrix
    pub model: Mat4,
    /// View (world-to-camera) matrix
    pub view: Mat4,
    /// Projection (camera-to-clip) matrix
    pub projection: Mat4,
    /// Precomputed normal-correction matrix: inverse-transpose of the
    /// model's upper-left 3x3 block
    pub normal_matrix: Mat3,
}

impl FrameConstants {
    /// Build a constant block, precomputing the normal-correction matrix
    pub fn new(model: Mat4, view: Mat4, projection: Mat4) -> Self {
        Self {
            normal_matrix: normal_matrix(&model),
            model,
            view,
            projection,
        }
    }

    /// Build a constant block taking view and projection from a camera
    pub fn from_camera(model: Mat4, camera: &Camera) -> Self {
        Self::new(model, camera.view_matrix(), camera.projection_matrix())
    }
}

/// Per-instance transform for instanced draws
///
/// The normal-correction matrix is the de-scaled rotation of the instance
/// model, never its raw upper-left 3x3 block; using the raw block shears
/// normals under non-uniform instance scale.
#[derive(Debug, Clone)]
pub struct InstanceTransform {
    /// Instance model matrix, composed with the frame's model matrix
    pub model: Mat4,
    /// De-scaled rotation of `model`, applied to instance normals
    pub normal_matrix: Mat3,
}

impl InstanceTransform {
    /// Build an instance transform, deriving the normal-correction matrix
    pub fn new(model: Mat4) -> Self {
        Self {
            normal_matrix: rotation_part(&model),
            model,
        }
    }
}

/// View and projection of the shadow-casting light
///
/// Used by the transform stage to re-project fragments into light clip
/// space, and by the depth-only pass that populates the shadow map.
#[derive(Debug, Clone)]
pub struct LightSpaceMatrices {
    /// World-to-light view matrix
    pub view: Mat4,
    /// Light projection matrix (orthographic for a directional caster)
    pub projection: Mat4,
}

impl LightSpaceMatrices {
    /// Build light-space matrices from the caster's camera
    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            view: camera.view_matrix(),
            projection: camera.projection_matrix(),
        }
    }

    /// Combined world-to-light-clip matrix
    pub fn matrix(&self) -> Mat4 {
        self.projection * self.view
    }
}
