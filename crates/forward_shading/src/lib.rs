//! # Forward Shading
//!
//! A CPU reimplementation of a forward-shading render pipeline: per-vertex
//! and per-fragment programs evaluated as pure functions over explicit
//! vertex and fragment collections.
//!
//! ## Features
//!
//! - **Transform stage**: clip-space projection with instance-level
//!   transform composition and de-scaled normal correction
//! - **Multi-layer materials**: up to three diffuse and specular layers
//!   under an average or alpha-weighted blend policy
//! - **Light accumulation**: one directional light, up to four point
//!   lights and a spotlight, Phong or Blinn specular
//! - **PCF shadows**: one directional shadow caster resolved through a
//!   5x5 percentage-closer filter with slope-scaled bias
//! - **Post-processing**: multisample resolve, optional edge detection,
//!   gamma correction
//!
//! ## Quick Start
//!
//! ```rust
//! use forward_shading::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut registry = TextureRegistry::new();
//!     let albedo = registry.insert(SolidTexture::new(Vec4::new(1.0, 1.0, 1.0, 1.0)));
//!     let material = Material::new(vec![albedo], vec![], 32.0)?;
//!
//!     let lights = SceneLights::new(
//!         Some(DirectionalLight::new(
//!             Vec3::new(0.0, -1.0, 0.0),
//!             Vec3::new(0.1, 0.1, 0.1),
//!             Vec3::new(1.0, 1.0, 1.0),
//!             Vec3::new(1.0, 1.0, 1.0),
//!         )),
//!         vec![],
//!         None,
//!     )?;
//!
//!     let pipeline = ForwardPipeline::new(PipelineConfig::default())?;
//!     let context = FragmentContext {
//!         world_position: Vec3::zeros(),
//!         normal: Vec3::y(),
//!         tex_coords: Vec2::new(0.5, 0.5),
//!         light_clip_position: None,
//!     };
//!     let color = pipeline.shade_fragment(
//!         &context,
//!         &material,
//!         &registry,
//!         &lights,
//!         Vec3::new(0.0, 5.0, 0.0),
//!     );
//!     assert!(color.is_some());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod foundation;
pub mod render;

/// Commonly used types for applications driving the pipeline
pub mod prelude {
    pub use crate::config::{Config, ConfigError, PipelineConfig};
    pub use crate::foundation::math::{Mat3, Mat4, Vec2, Vec3, Vec4};
    pub use crate::render::{
        shade_vertex, transform_instanced, transform_vertices, BlendPolicy, Camera, CheckerTexture,
        ColorTarget, Compositor, CompositorFlags, DirectionalLight, Filter, ForwardPipeline,
        FragmentContext, FrameConstants, ImageTexture, InstanceTransform, LightSpaceMatrices,
        Material, PointLight, ResolvedImage, SceneLights, ShadowMap, SolidTexture, SpecularModel,
        Spotlight, TextureKey, TextureRegistry, TextureSample, Vertex, VertexOutput,
    };
}
