//! Multi-layer surface materials
//!
//! A material is an ordered sequence of diffuse and specular texture layers
//! plus a shininess exponent. The accumulator combines the layers sampled at
//! a fragment's texture coordinate into one diffuse RGBA and one specular
//! RGBA under one of two blend policies.

use crate::foundation::math::{mix, Vec2, Vec4};
use crate::render::texture::{TextureKey, TextureRegistry};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on texture layers of each kind
pub const MAX_TEXTURE_LAYERS: usize = 3;

/// Layer blend policy used by the material accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlendPolicy {
    /// Sum all layers and divide by the layer count
    ///
    /// Used for silhouette/outline detection, where the averaged alpha acts
    /// as a detection threshold.
    Average,
    /// Blend the accumulator toward each layer using that layer's alpha
    ///
    /// `accum = mix(accum, sample, sample.alpha)`, so the last opaque layer
    /// dominates. Standard material shading.
    #[default]
    AlphaWeighted,
}

/// Which layer list a material error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    /// Diffuse color layers
    Diffuse,
    /// Specular intensity layers
    Specular,
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Diffuse => write!(f, "diffuse"),
            Self::Specular => write!(f, "specular"),
        }
    }
}

/// Errors raised at material configuration time
#[derive(Error, Debug)]
pub enum MaterialError {
    /// More layers supplied than the pipeline binds
    #[error("{count} {kind} layers exceed the bound of {MAX_TEXTURE_LAYERS}")]
    TooManyLayers {
        /// Which layer list overflowed
        kind: LayerKind,
        /// Supplied layer count
        count: usize,
    },

    /// A material must carry at least one diffuse layer
    ///
    /// The average policy divides by the loaded layer count; rejecting empty
    /// diffuse lists here keeps that division away from zero.
    #[error("material has no diffuse layers")]
    NoDiffuseLayers,
}

/// Combined per-fragment material values handed to the light accumulator
#[derive(Debug, Clone, Copy)]
pub struct MaterialSample {
    /// Combined diffuse color and alpha
    pub diffuse: Vec4,
    /// Combined specular color and alpha
    pub specular: Vec4,
}

/// A bounded stack of diffuse and specular texture layers
#[derive(Debug, Clone)]
pub struct Material {
    diffuse_layers: Vec<TextureKey>,
    specular_layers: Vec<TextureKey>,
    shininess: f32,
}

impl Material {
    /// Create a material, validating layer counts
    ///
    /// Requires at least one diffuse layer and at most
    /// [`MAX_TEXTURE_LAYERS`] layers of each kind. Specular layers may be
    /// empty; an empty list contributes no specular highlight.
    pub fn new(
        diffuse_layers: Vec<TextureKey>,
        specular_layers: Vec<TextureKey>,
        shininess: f32,
    ) -> Result<Self, MaterialError> {
        if diffuse_layers.is_empty() {
            return Err(MaterialError::NoDiffuseLayers);
        }
        if diffuse_layers.len() > MAX_TEXTURE_LAYERS {
            return Err(MaterialError::TooManyLayers {
                kind: LayerKind::Diffuse,
                count: diffuse_layers.len(),
            });
        }
        if specular_layers.len() > MAX_TEXTURE_LAYERS {
            return Err(MaterialError::TooManyLayers {
                kind: LayerKind::Specular,
                count: specular_layers.len(),
            });
        }
        Ok(Self {
            diffuse_layers,
            specular_layers,
            shininess,
        })
    }

    /// Shininess exponent for the specular term
    pub fn shininess(&self) -> f32 {
        self.shininess
    }

    /// Number of loaded diffuse layers (1..=[`MAX_TEXTURE_LAYERS`])
    pub fn loaded_diffuse(&self) -> usize {
        self.diffuse_layers.len()
    }

    /// Number of loaded specular layers (0..=[`MAX_TEXTURE_LAYERS`])
    pub fn loaded_specular(&self) -> usize {
        self.specular_layers.len()
    }

    /// Sample and combine every layer at one texture coordinate
    pub fn combined_sample(
        &self,
        registry: &TextureRegistry,
        uv: Vec2,
        policy: BlendPolicy,
    ) -> MaterialSample {
        MaterialSample {
            diffuse: accumulate(&self.diffuse_layers, registry, uv, policy),
            specular: accumulate(&self.specular_layers, registry, uv, policy),
        }
    }
}

/// Combine a layer list under the given policy
///
/// Iterates the actual layer count, never the bound. An empty list yields
/// transparent black without dividing; `Material::new` guarantees the
/// diffuse list is never empty.
fn accumulate(
    layers: &[TextureKey],
    registry: &TextureRegistry,
    uv: Vec2,
    policy: BlendPolicy,
) -> Vec4 {
    if layers.is_empty() {
        return Vec4::zeros();
    }
    match policy {
        BlendPolicy::Average => {
            let sum = layers.iter().fold(Vec4::zeros(), |accum, &layer| {
                accum + registry.sample(layer, uv)
            });
            sum / layers.len() as f32
        }
        BlendPolicy::AlphaWeighted => {
            layers.iter().fold(Vec4::zeros(), |accum, &layer| {
                let sample = registry.sample(layer, uv);
                mix(accum, sample, sample.w)
            })
        }
    }
}
