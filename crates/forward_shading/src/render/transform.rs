//! Transform stage: per-vertex programs
//!
//! Maps object-space vertices into clip space and derives the world-space
//! position and normal every later stage reads. Each invocation is a pure
//! function of one vertex and the immutable per-draw inputs, so batches run
//! as data-parallel loops with no shared mutable state.

use crate::foundation::math::{rotation_part, Vec2, Vec3, Vec4};
use crate::render::frame::{FrameConstants, InstanceTransform, LightSpaceMatrices};
use bytemuck::{Pod, Zeroable};
use rayon::prelude::*;

/// Vertex attribute layout consumed by the transform stage
///
/// Matches the fixed slot order of the vertex stream: position, normal,
/// texture coordinate.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Object-space position
    pub position: [f32; 3],
    /// Object-space normal
    pub normal: [f32; 3],
    /// Texture coordinate
    pub tex_coords: [f32; 2],
}

impl Vertex {
    /// Create a vertex from math types
    pub fn new(position: Vec3, normal: Vec3, tex_coords: Vec2) -> Self {
        Self {
            position: position.into(),
            normal: normal.into(),
            tex_coords: tex_coords.into(),
        }
    }
}

/// Per-fragment inputs produced by the transform stage
///
/// Populated once per invocation and never mutated by later stages.
#[derive(Debug, Clone, Copy)]
pub struct FragmentContext {
    /// World-space position
    pub world_position: Vec3,
    /// Normalized world-space surface normal
    pub normal: Vec3,
    /// Texture coordinate
    pub tex_coords: Vec2,
    /// Fragment position re-projected into the directional light's clip
    /// space, present when shadow projection is active
    pub light_clip_position: Option<Vec4>,
}

/// Output record of one vertex invocation
#[derive(Debug, Clone, Copy)]
pub struct VertexOutput {
    /// Clip-space position
    pub clip_position: Vec4,
    /// Interpolands consumed by the fragment stages
    pub context: FragmentContext,
}

/// Transform a single vertex
///
/// World position composes the frame model with the instance model when one
/// is supplied. Normals take the frame's precomputed normal-correction
/// matrix for non-instanced draws; instanced draws compose the de-scaled
/// rotations of the base and instance models, never their raw 3x3 blocks.
pub fn shade_vertex(
    vertex: &Vertex,
    frame: &FrameConstants,
    instance: Option<&InstanceTransform>,
    light_space: Option<&LightSpaceMatrices>,
) -> VertexOutput {
    let object_position = Vec4::new(vertex.position[0], vertex.position[1], vertex.position[2], 1.0);
    let world_position = match instance {
        Some(instance) => frame.model * instance.model * object_position,
        None => frame.model * object_position,
    };
    let clip_position = frame.projection * frame.view * world_position;

    let object_normal = Vec3::from(vertex.normal);
    let corrected = match instance {
        Some(instance) => rotation_part(&frame.model) * instance.normal_matrix * object_normal,
        None => frame.normal_matrix * object_normal,
    };
    let normal = corrected
        .try_normalize(f32::EPSILON)
        .unwrap_or(object_normal);

    let light_clip_position =
        light_space.map(|light| light.projection * light.view * world_position);

    VertexOutput {
        clip_position,
        context: FragmentContext {
            world_position: world_position.xyz(),
            normal,
            tex_coords: Vec2::from(vertex.tex_coords),
            light_clip_position,
        },
    }
}

/// Transform a vertex batch in parallel
pub fn transform_vertices(
    vertices: &[Vertex],
    frame: &FrameConstants,
    instance: Option<&InstanceTransform>,
    light_space: Option<&LightSpaceMatrices>,
) -> Vec<VertexOutput> {
    vertices
        .par_iter()
        .map(|vertex| shade_vertex(vertex, frame, instance, light_space))
        .collect()
}

/// Transform a vertex batch once per instance, in parallel over instances
///
/// Outputs are grouped by instance: all vertices of instance 0, then
/// instance 1, and so on.
pub fn transform_instanced(
    vertices: &[Vertex],
    frame: &FrameConstants,
    instances: &[InstanceTransform],
    light_space: Option<&LightSpaceMatrices>,
) -> Vec<VertexOutput> {
    instances
        .par_iter()
        .flat_map_iter(|instance| {
            vertices
                .iter()
                .map(move |vertex| shade_vertex(vertex, frame, Some(instance), light_space))
        })
        .collect()
}
