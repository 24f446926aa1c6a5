//! Light types and the per-fragment light accumulator
//!
//! Three pure functions, one per light kind, evaluate a light's RGBA
//! contribution against the combined material values of a fragment. All
//! three funnel their ambient/diffuse/specular terms through one combine
//! function: the shadow factor scales diffuse and specular while ambient
//! stays unshadowed, so shadowed geometry keeps its base tone.

use crate::foundation::math::{reflect, saturate, Vec3, Vec4};
use crate::render::material::MaterialSample;
use crate::render::shadow::ShadowMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed number of point lights a draw call binds
pub const MAX_POINT_LIGHTS: usize = 4;

/// Specular reflection model, selected per pipeline variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpecularModel {
    /// Mirror-reflection vector against the view direction
    #[default]
    Phong,
    /// Half-vector between light and view directions against the normal
    Blinn,
}

/// Errors raised at light configuration time
#[derive(Error, Debug)]
pub enum LightError {
    /// Inner cone cosine must exceed the outer cone cosine
    ///
    /// An inverted cone clamps to zero intensity everywhere; validating here
    /// surfaces the mistake instead of silently masking it.
    #[error("spotlight inner cone cosine {phi_cos} must exceed outer cone cosine {gamma_cos}")]
    InvertedCone {
        /// Cosine of the inner cone angle
        phi_cos: f32,
        /// Cosine of the outer cone angle
        gamma_cos: f32,
    },

    /// More point lights supplied than the pipeline binds
    #[error("{count} point lights exceed the bound of {MAX_POINT_LIGHTS}")]
    TooManyPointLights {
        /// Supplied light count
        count: usize,
    },
}

/// Directional light with parallel rays, the pipeline's only shadow caster
#[derive(Debug, Clone)]
pub struct DirectionalLight {
    /// Unit direction the light travels, normalized at construction
    pub direction: Vec3,
    /// Ambient color
    pub ambient: Vec3,
    /// Diffuse color
    pub diffuse: Vec3,
    /// Specular color
    pub specular: Vec3,
    /// Depth map rendered from the light's point of view, when shadowing
    /// is active
    pub shadow_map: Option<ShadowMap>,
}

impl DirectionalLight {
    /// Create a directional light without a shadow map
    pub fn new(direction: Vec3, ambient: Vec3, diffuse: Vec3, specular: Vec3) -> Self {
        Self {
            direction: direction.normalize(),
            ambient,
            diffuse,
            specular,
            shadow_map: None,
        }
    }

    /// Attach a shadow map populated by the depth-only pass
    pub fn with_shadow_map(mut self, shadow_map: ShadowMap) -> Self {
        self.shadow_map = Some(shadow_map);
        self
    }
}

/// Point light radiating in all directions, attenuated with distance
#[derive(Debug, Clone)]
pub struct PointLight {
    /// World-space position
    pub position: Vec3,
    /// Ambient color
    pub ambient: Vec3,
    /// Diffuse color
    pub diffuse: Vec3,
    /// Specular color
    pub specular: Vec3,
    /// Constant attenuation coefficient
    pub constant: f32,
    /// Linear attenuation coefficient
    pub linear: f32,
    /// Quadratic attenuation coefficient
    pub quadratic: f32,
}

impl PointLight {
    /// Create a point light with explicit attenuation coefficients
    pub fn new(
        position: Vec3,
        ambient: Vec3,
        diffuse: Vec3,
        specular: Vec3,
        constant: f32,
        linear: f32,
        quadratic: f32,
    ) -> Self {
        Self {
            position,
            ambient,
            diffuse,
            specular,
            constant,
            linear,
            quadratic,
        }
    }

    /// Attenuation factor at the given distance: `1 / (c + l*d + q*d^2)`
    pub fn attenuation(&self, distance: f32) -> f32 {
        1.0 / (self.constant + self.linear * distance + self.quadratic * distance * distance)
    }
}

/// Spotlight: a cone of light with linear falloff between two cone angles
#[derive(Debug, Clone)]
pub struct Spotlight {
    /// World-space position
    pub position: Vec3,
    /// Unit direction the cone points, normalized at construction
    pub direction: Vec3,
    /// Ambient color
    pub ambient: Vec3,
    /// Diffuse color
    pub diffuse: Vec3,
    /// Specular color
    pub specular: Vec3,
    /// Cosine of the inner cone angle (full intensity inside)
    pub phi_cos: f32,
    /// Cosine of the outer cone angle (zero intensity outside)
    pub gamma_cos: f32,
}

impl Spotlight {
    /// Create a spotlight from cone angles in radians
    ///
    /// `phi` is the inner cone angle, `gamma` the outer; `phi < gamma` is
    /// required so the stored cosines satisfy `phi_cos > gamma_cos`.
    pub fn new(
        position: Vec3,
        direction: Vec3,
        ambient: Vec3,
        diffuse: Vec3,
        specular: Vec3,
        phi: f32,
        gamma: f32,
    ) -> Result<Self, LightError> {
        Self::from_cosines(
            position,
            direction,
            ambient,
            diffuse,
            specular,
            phi.cos(),
            gamma.cos(),
        )
    }

    /// Create a spotlight from precomputed cone cosines
    pub fn from_cosines(
        position: Vec3,
        direction: Vec3,
        ambient: Vec3,
        diffuse: Vec3,
        specular: Vec3,
        phi_cos: f32,
        gamma_cos: f32,
    ) -> Result<Self, LightError> {
        if phi_cos <= gamma_cos {
            return Err(LightError::InvertedCone { phi_cos, gamma_cos });
        }
        Ok(Self {
            position,
            direction: direction.normalize(),
            ambient,
            diffuse,
            specular,
            phi_cos,
            gamma_cos,
        })
    }

    /// Cone intensity for a fragment lit from `light_dir`
    ///
    /// 1.0 inside the inner cone, 0.0 at and beyond the outer cone, linear
    /// in the cosine between them.
    pub fn cone_intensity(&self, light_dir: Vec3) -> f32 {
        let cos_theta = light_dir.dot(&(-self.direction));
        saturate((cos_theta - self.gamma_cos) / (self.phi_cos - self.gamma_cos))
    }
}

/// Lambert diffuse strength: `max(dot(n, l), 0)`
#[inline]
fn diffuse_strength(normal: Vec3, light_dir: Vec3) -> f32 {
    normal.dot(&light_dir).max(0.0)
}

/// Specular strength under the selected reflection model
fn specular_strength(
    model: SpecularModel,
    normal: Vec3,
    light_dir: Vec3,
    view_dir: Vec3,
    shininess: f32,
) -> f32 {
    match model {
        SpecularModel::Phong => {
            let reflected = reflect(-light_dir, normal);
            view_dir.dot(&reflected).max(0.0).powf(shininess)
        }
        SpecularModel::Blinn => {
            // Degenerate when the light is exactly behind the viewer; the
            // zero fallback shades it as unlit rather than NaN.
            let halfway = (light_dir + view_dir)
                .try_normalize(f32::EPSILON)
                .unwrap_or_else(Vec3::zeros);
            normal.dot(&halfway).max(0.0).powf(shininess)
        }
    }
}

/// Combine ambient/diffuse/specular terms against the material sample
///
/// `shadow_factor` scales diffuse and specular by `1 - factor`; ambient is
/// never shadowed. The returned alpha is the combined diffuse alpha, which
/// downstream accumulation tests against the discard threshold.
fn combine(
    sample: &MaterialSample,
    ambient_color: Vec3,
    diffuse_color: Vec3,
    specular_color: Vec3,
    diffuse_strength: f32,
    specular_strength: f32,
    shadow_factor: f32,
) -> Vec4 {
    let lit = 1.0 - shadow_factor;
    let ambient = sample.diffuse.xyz().component_mul(&ambient_color);
    let diffuse = sample
        .diffuse
        .xyz()
        .component_mul(&diffuse_color)
        .scale(diffuse_strength * lit);
    let specular = sample
        .specular
        .xyz()
        .component_mul(&specular_color)
        .scale(specular_strength * lit);
    let rgb = ambient + diffuse + specular;
    Vec4::new(rgb.x, rgb.y, rgb.z, sample.diffuse.w)
}

/// Directional light contribution; no attenuation
///
/// `shadow_factor` comes from the shadow resolver (0 when the light casts
/// no shadow). Only the directional light consumes a shadow factor.
pub fn directional_contribution(
    light: &DirectionalLight,
    sample: &MaterialSample,
    shininess: f32,
    normal: Vec3,
    view_dir: Vec3,
    model: SpecularModel,
    shadow_factor: f32,
) -> Vec4 {
    let light_dir = -light.direction;
    combine(
        sample,
        light.ambient,
        light.diffuse,
        light.specular,
        diffuse_strength(normal, light_dir),
        specular_strength(model, normal, light_dir, view_dir, shininess),
        shadow_factor,
    )
}

/// Point light contribution
///
/// Attenuation scales the ambient, diffuse and specular terms uniformly;
/// alpha stays at the material value so cutout behavior remains
/// texture-driven regardless of distance.
pub fn point_contribution(
    light: &PointLight,
    sample: &MaterialSample,
    shininess: f32,
    normal: Vec3,
    frag_position: Vec3,
    view_dir: Vec3,
    model: SpecularModel,
) -> Vec4 {
    let to_light = light.position - frag_position;
    let distance = to_light.magnitude();
    let light_dir = to_light
        .try_normalize(f32::EPSILON)
        .unwrap_or_else(Vec3::zeros);
    let contribution = combine(
        sample,
        light.ambient,
        light.diffuse,
        light.specular,
        diffuse_strength(normal, light_dir),
        specular_strength(model, normal, light_dir, view_dir, shininess),
        0.0,
    );
    let rgb = contribution.xyz() * light.attenuation(distance);
    Vec4::new(rgb.x, rgb.y, rgb.z, contribution.w)
}

/// Spotlight contribution
///
/// Cone intensity scales ambient and diffuse; `scale_specular` extends it
/// to the specular term (the shadow-aware pipeline variant).
pub fn spot_contribution(
    light: &Spotlight,
    sample: &MaterialSample,
    shininess: f32,
    normal: Vec3,
    frag_position: Vec3,
    view_dir: Vec3,
    model: SpecularModel,
    scale_specular: bool,
) -> Vec4 {
    let light_dir = (light.position - frag_position)
        .try_normalize(f32::EPSILON)
        .unwrap_or_else(Vec3::zeros);
    let intensity = light.cone_intensity(light_dir);

    let diffuse = diffuse_strength(normal, light_dir) * intensity;
    let mut specular = specular_strength(model, normal, light_dir, view_dir, shininess);
    if scale_specular {
        specular *= intensity;
    }

    // Intensity applies to the ambient term as well, so the cone fades to
    // black outside the outer angle instead of leaving an ambient disc.
    combine(
        sample,
        light.ambient * intensity,
        light.diffuse,
        light.specular,
        diffuse,
        specular,
        0.0,
    )
}
