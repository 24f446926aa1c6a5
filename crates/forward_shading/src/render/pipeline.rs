//! Forward pipeline: per-fragment light accumulation
//!
//! Combines the material accumulator, shadow resolver and light accumulator
//! into the fragment program of the main color pass. Each invocation reads
//! one immutable [`FragmentContext`] and either produces one RGBA color or
//! discards the fragment when its accumulated alpha falls below the cutout
//! threshold. Invocations are independent, so batches run in parallel.

use crate::config::{ConfigError, PipelineConfig};
use crate::foundation::math::{Vec3, Vec4};
use crate::render::lighting::{
    directional_contribution, point_contribution, spot_contribution, DirectionalLight,
    LightError, PointLight, SpecularModel, Spotlight, MAX_POINT_LIGHTS,
};
use crate::render::material::Material;
use crate::render::postprocess::Compositor;
use crate::render::target::{ColorTarget, ResolvedImage};
use crate::render::texture::TextureRegistry;
use crate::render::transform::FragmentContext;
use rayon::prelude::*;

/// The fixed set of lights bound for a draw call
///
/// One optional directional light (the only shadow caster), up to
/// [`MAX_POINT_LIGHTS`] point lights, and one optional spotlight.
#[derive(Debug, Clone, Default)]
pub struct SceneLights {
    /// Directional light, the pipeline's only shadow caster
    pub directional: Option<DirectionalLight>,
    /// Point lights, at most [`MAX_POINT_LIGHTS`]
    pub points: Vec<PointLight>,
    /// Spotlight
    pub spot: Option<Spotlight>,
}

impl SceneLights {
    /// Bind a light set, validating the point-light count
    pub fn new(
        directional: Option<DirectionalLight>,
        points: Vec<PointLight>,
        spot: Option<Spotlight>,
    ) -> Result<Self, LightError> {
        if points.len() > MAX_POINT_LIGHTS {
            return Err(LightError::TooManyPointLights {
                count: points.len(),
            });
        }
        Ok(Self {
            directional,
            points,
            spot,
        })
    }
}

/// The configured fragment pipeline of the main color pass
#[derive(Debug, Clone)]
pub struct ForwardPipeline {
    config: PipelineConfig,
    compositor: Compositor,
}

impl ForwardPipeline {
    /// Build a pipeline from a validated configuration
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let compositor = Compositor::new(config.compositor_flags(), config.gamma)
            .map_err(|error| ConfigError::Invalid(error.to_string()))?;
        log::info!(
            "Forward pipeline: {:?} specular, {:?} blending, discard < {}",
            config.specular_model,
            config.blend_policy,
            config.discard_threshold
        );
        Ok(Self { config, compositor })
    }

    /// Active configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Shade one fragment
    ///
    /// Returns `None` when the accumulated alpha falls below the discard
    /// threshold: the fragment produces no output, implementing alpha-tested
    /// cutout rendering. Neighboring invocations are unaffected.
    pub fn shade_fragment(
        &self,
        context: &FragmentContext,
        material: &Material,
        registry: &TextureRegistry,
        lights: &SceneLights,
        view_position: Vec3,
    ) -> Option<Vec4> {
        let sample = material.combined_sample(registry, context.tex_coords, self.config.blend_policy);
        let view_dir = (view_position - context.world_position)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vec3::zeros);

        let mut color = Vec4::zeros();

        if let Some(directional) = &lights.directional {
            let shadow_factor = match (&directional.shadow_map, context.light_clip_position) {
                (Some(map), Some(light_clip)) => {
                    map.resolve(light_clip, context.normal, -directional.direction)
                }
                _ => 0.0,
            };
            color += directional_contribution(
                directional,
                &sample,
                material.shininess(),
                context.normal,
                view_dir,
                self.config.specular_model,
                shadow_factor,
            );
        }

        for point in &lights.points {
            color += point_contribution(
                point,
                &sample,
                material.shininess(),
                context.normal,
                context.world_position,
                view_dir,
                self.config.specular_model,
            );
        }

        if let Some(spot) = &lights.spot {
            // The shadow-aware (Blinn) variant also scales the spotlight's
            // specular term by cone intensity.
            let scale_specular = self.config.specular_model == SpecularModel::Blinn;
            color += spot_contribution(
                spot,
                &sample,
                material.shininess(),
                context.normal,
                context.world_position,
                view_dir,
                self.config.specular_model,
                scale_specular,
            );
        }

        if color.w < self.config.discard_threshold {
            return None;
        }
        Some(color)
    }

    /// Shade a fragment batch in parallel
    ///
    /// Discarded fragments yield `None` slots so callers can leave the
    /// corresponding target texels untouched.
    pub fn shade_fragments(
        &self,
        contexts: &[FragmentContext],
        material: &Material,
        registry: &TextureRegistry,
        lights: &SceneLights,
        view_position: Vec3,
    ) -> Vec<Option<Vec4>> {
        contexts
            .par_iter()
            .map(|context| self.shade_fragment(context, material, registry, lights, view_position))
            .collect()
    }

    /// Resolve a finished color target through the post-process compositor
    pub fn resolve(&self, target: &ColorTarget) -> ResolvedImage {
        self.compositor.resolve(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::shadow::ShadowMap;
    use crate::render::texture::SolidTexture;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    const UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    const WHITE: Vec3 = Vec3::new(1.0, 1.0, 1.0);
    const BLACK: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    fn flat_context(light_clip: Option<Vec4>) -> FragmentContext {
        FragmentContext {
            world_position: Vec3::zeros(),
            normal: UP,
            tex_coords: crate::foundation::math::Vec2::new(0.5, 0.5),
            light_clip_position: light_clip,
        }
    }

    fn white_material(alpha: f32) -> (TextureRegistry, Material) {
        let mut registry = TextureRegistry::new();
        let key = registry.insert(SolidTexture::new(Vec4::new(1.0, 1.0, 1.0, alpha)));
        let material = Material::new(vec![key], Vec::new(), 32.0).unwrap();
        (registry, material)
    }

    fn pipeline() -> ForwardPipeline {
        ForwardPipeline::new(PipelineConfig::default()).unwrap()
    }

    #[test]
    fn test_directional_scenario_keeps_fragment() {
        // One white directional light straight down onto a flat upward
        // normal with an opaque white texture: full diffuse, no discard.
        let lights = SceneLights::new(
            Some(DirectionalLight::new(
                Vec3::new(0.0, -1.0, 0.0),
                BLACK,
                WHITE,
                BLACK,
            )),
            Vec::new(),
            None,
        )
        .unwrap();
        let (registry, material) = white_material(1.0);
        let color = pipeline()
            .shade_fragment(&flat_context(None), &material, &registry, &lights, UP)
            .expect("fragment must survive the cutout test");
        assert_relative_eq!(color.xyz(), WHITE, epsilon = EPSILON);
        assert!(color.w >= 0.1);
    }

    #[test]
    fn test_transparent_texture_discards_fragment() {
        let lights = SceneLights::new(
            Some(DirectionalLight::new(
                Vec3::new(0.0, -1.0, 0.0),
                BLACK,
                WHITE,
                BLACK,
            )),
            Vec::new(),
            None,
        )
        .unwrap();
        let (registry, material) = white_material(0.0);
        let shaded =
            pipeline().shade_fragment(&flat_context(None), &material, &registry, &lights, UP);
        assert!(shaded.is_none());
    }

    #[test]
    fn test_point_light_scenario_halves_at_distance_ten() {
        let lights = SceneLights::new(
            None,
            vec![PointLight::new(
                Vec3::new(0.0, 10.0, 0.0),
                BLACK,
                WHITE,
                BLACK,
                1.0,
                0.0,
                0.01,
            )],
            None,
        )
        .unwrap();
        let (registry, material) = white_material(1.0);
        let color = pipeline()
            .shade_fragment(&flat_context(None), &material, &registry, &lights, UP)
            .unwrap();
        assert_relative_eq!(color.xyz(), WHITE * 0.5, epsilon = EPSILON);
    }

    #[test]
    fn test_fragment_beyond_shadow_far_plane_is_fully_lit() {
        // The whole map reads depth 0, but a fragment past the far plane
        // must resolve to "no shadow" regardless of the kernel.
        let map = ShadowMap::from_depths(16, 16, vec![0.0; 256]).unwrap();
        let light = DirectionalLight::new(Vec3::new(0.0, -1.0, 0.0), BLACK, WHITE, BLACK)
            .with_shadow_map(map);
        let lights = SceneLights::new(Some(light), Vec::new(), None).unwrap();
        let (registry, material) = white_material(1.0);

        // Light clip depth 1.2 -> ndc z = 1.4.
        let beyond = flat_context(Some(Vec4::new(0.0, 0.0, 1.4, 1.0)));
        let color = pipeline()
            .shade_fragment(&beyond, &material, &registry, &lights, UP)
            .unwrap();
        assert_relative_eq!(color.xyz(), WHITE, epsilon = EPSILON);

        // The same fragment inside the far plane is fully shadowed.
        let inside = flat_context(Some(Vec4::new(0.0, 0.0, 0.0, 1.0)));
        let color = pipeline()
            .shade_fragment(&inside, &material, &registry, &lights, UP)
            .unwrap();
        assert_relative_eq!(color.xyz(), BLACK, epsilon = EPSILON);
    }

    #[test]
    fn test_distant_point_light_does_not_discard_opaque_fragment() {
        // Attenuation dims the color only; an opaque material keeps its
        // alpha and survives the cutout test at any distance.
        let lights = SceneLights::new(
            None,
            vec![PointLight::new(
                Vec3::new(0.0, 100.0, 0.0),
                BLACK,
                WHITE,
                BLACK,
                1.0,
                0.09,
                0.032,
            )],
            None,
        )
        .unwrap();
        let (registry, material) = white_material(1.0);
        let color = pipeline()
            .shade_fragment(&flat_context(None), &material, &registry, &lights, UP)
            .expect("opaque fragment must survive regardless of attenuation");
        assert!(color.xyz().magnitude() < 0.01);
        assert_relative_eq!(color.w, 1.0, epsilon = EPSILON);
    }

    #[test]
    fn test_point_light_bound_is_enforced() {
        let light = PointLight::new(Vec3::zeros(), BLACK, WHITE, BLACK, 1.0, 0.0, 0.0);
        let result = SceneLights::new(None, vec![light; MAX_POINT_LIGHTS + 1], None);
        assert!(matches!(
            result,
            Err(LightError::TooManyPointLights { count: 5 })
        ));
    }

    #[test]
    fn test_parallel_batch_matches_single_fragment_path() {
        let lights = SceneLights::new(
            Some(DirectionalLight::new(
                Vec3::new(0.0, -1.0, 0.0),
                BLACK,
                WHITE,
                BLACK,
            )),
            Vec::new(),
            None,
        )
        .unwrap();
        let (registry, material) = white_material(1.0);
        let contexts = vec![flat_context(None); 32];
        let pipeline = pipeline();
        let batch = pipeline.shade_fragments(&contexts, &material, &registry, &lights, UP);
        assert_eq!(batch.len(), 32);
        let single = pipeline
            .shade_fragment(&contexts[0], &material, &registry, &lights, UP)
            .unwrap();
        for shaded in batch {
            assert_relative_eq!(shaded.unwrap(), single, epsilon = EPSILON);
        }
    }

    #[test]
    fn test_invalid_config_is_rejected_at_build() {
        let config = PipelineConfig {
            samples: 0,
            ..PipelineConfig::default()
        };
        assert!(ForwardPipeline::new(config).is_err());
    }
}
