//! # Forward-Shading Pipeline
//!
//! The pipeline stages, leaves first:
//! - **Transform stage** ([`transform`]): object space to clip space, world
//!   position/normal derivation, instance composition.
//! - **Material accumulator** ([`material`]): multi-layer diffuse/specular
//!   blending under the average or alpha-weighted policy.
//! - **Light accumulator** ([`lighting`]): directional, point and spot
//!   contributions under the Phong or Blinn specular model.
//! - **Shadow resolver** ([`shadow`]): slope-scaled-bias PCF over a depth
//!   map rendered from the directional light.
//! - **Post-process compositor** ([`postprocess`]): multisample resolve,
//!   optional edge detection, gamma correction.
//!
//! Cross-stage ordering is pipeline sequencing, not synchronization: the
//! depth-only pass finishes before the main pass samples its map, and the
//! main pass finishes before the compositor resolves the target. Within a
//! stage every invocation is independent.

pub mod camera;
pub mod frame;
pub mod lighting;
pub mod material;
pub mod pipeline;
pub mod postprocess;
pub mod shadow;
pub mod target;
pub mod texture;
pub mod transform;

pub use camera::{Camera, Projection};
pub use frame::{FrameConstants, InstanceTransform, LightSpaceMatrices};
pub use lighting::{
    DirectionalLight, LightError, PointLight, SpecularModel, Spotlight, MAX_POINT_LIGHTS,
};
pub use material::{BlendPolicy, Material, MaterialError, MaterialSample, MAX_TEXTURE_LAYERS};
pub use pipeline::{ForwardPipeline, SceneLights};
pub use postprocess::{Compositor, CompositorError, CompositorFlags, EDGE_KERNEL};
pub use shadow::{ShadowError, ShadowMap, PCF_KERNEL_TAPS};
pub use target::{ColorTarget, ResolvedImage, TargetError};
pub use texture::{
    CheckerTexture, Filter, ImageTexture, SolidTexture, TextureError, TextureKey, TextureRegistry,
    TextureSample,
};
pub use transform::{
    shade_vertex, transform_instanced, transform_vertices, FragmentContext, Vertex, VertexOutput,
};
