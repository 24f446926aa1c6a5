//! Shadow scene demo
//!
//! Renders a checkered ground plane lit by a shadow-casting directional
//! light, a warm point light and a spotlight, then resolves the multisampled
//! target through the post-process compositor and writes the result to
//! `shadow_scene.png`.
//!
//! The depth-only pass and the main color pass both go through the library's
//! transform stage; the ground plane is viewed top-down through an
//! orthographic camera so each pixel maps to one point on the plane.

use forward_shading::prelude::*;

const IMAGE_WIDTH: u32 = 320;
const IMAGE_HEIGHT: u32 = 240;
const SHADOW_MAP_SIZE: u32 = 1024;
const OCCLUDER_GRID: u32 = 512;

/// World-space half extent of the visible ground plane
const GROUND_HALF_EXTENT: f32 = 8.0;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let config = PipelineConfig {
        samples: 4,
        ..PipelineConfig::shadow_aware()
    };
    let samples = config.samples;
    let pipeline = ForwardPipeline::new(config)?;

    // Light-space matrices for the directional caster.
    let light_direction = Vec3::new(-0.3, -1.0, -0.3).normalize();
    let mut light_camera = Camera::orthographic(-light_direction * 20.0, 12.0, 0.1, 40.0);
    light_camera.look_at(Vec3::zeros(), Vec3::y());
    let light_space = LightSpaceMatrices::from_camera(&light_camera);

    log::info!("Running depth-only pass ({OCCLUDER_GRID}x{OCCLUDER_GRID} occluder samples)...");
    let shadow_map = depth_pass(&light_camera)?;

    // Scene lights: the shadow-casting sun, a warm point light, a cool spot.
    let sun = DirectionalLight::new(
        light_direction,
        Vec3::new(0.12, 0.12, 0.14),
        Vec3::new(0.9, 0.87, 0.8),
        Vec3::new(0.6, 0.6, 0.6),
    )
    .with_shadow_map(shadow_map);
    let ember = PointLight::new(
        Vec3::new(4.0, 1.5, -3.0),
        Vec3::zeros(),
        Vec3::new(1.0, 0.55, 0.2),
        Vec3::new(1.0, 0.7, 0.4),
        1.0,
        0.09,
        0.032,
    );
    let beam = Spotlight::new(
        Vec3::new(-4.0, 6.0, 4.0),
        Vec3::new(0.0, -1.0, 0.0),
        Vec3::zeros(),
        Vec3::new(0.3, 0.8, 1.0),
        Vec3::new(0.3, 0.8, 1.0),
        12.5_f32.to_radians(),
        17.5_f32.to_radians(),
    )?;
    let lights = SceneLights::new(Some(sun), vec![ember], Some(beam))?;

    // Ground material: an opaque checker base with a translucent tint layer.
    let mut registry = TextureRegistry::new();
    let checker = registry.insert(CheckerTexture::new(
        16,
        Vec4::new(0.85, 0.85, 0.82, 1.0),
        Vec4::new(0.35, 0.35, 0.4, 1.0),
    ));
    let tint = registry.insert(SolidTexture::new(Vec4::new(0.9, 0.8, 0.6, 0.35)));
    let gloss = registry.insert(SolidTexture::new(Vec4::new(1.0, 1.0, 1.0, 1.0)));
    let ground = Material::new(vec![checker, tint], vec![gloss], 32.0)?;

    // Main pass: top-down orthographic view of the ground plane.
    let mut view_camera = Camera::orthographic(Vec3::new(0.0, 20.0, 0.0), GROUND_HALF_EXTENT, 0.1, 40.0);
    view_camera.look_at(Vec3::zeros(), Vec3::new(0.0, 0.0, -1.0));
    let frame = FrameConstants::from_camera(Mat4::identity(), &view_camera);

    log::info!(
        "Shading {IMAGE_WIDTH}x{IMAGE_HEIGHT} pixels at {samples} samples per pixel..."
    );
    let vertices = ground_vertices(samples);
    let outputs = transform_vertices(&vertices, &frame, None, Some(&light_space));
    let contexts: Vec<FragmentContext> = outputs.iter().map(|output| output.context).collect();
    let shaded = pipeline.shade_fragments(
        &contexts,
        &ground,
        &registry,
        &lights,
        view_camera.position(),
    );

    let mut target = ColorTarget::new(IMAGE_WIDTH, IMAGE_HEIGHT, samples)?;
    target.clear(Vec4::new(0.05, 0.06, 0.08, 1.0));
    for (index, color) in shaded.iter().enumerate() {
        // Discarded fragments keep the clear color.
        if let Some(color) = color {
            let sample = index as u32 % samples;
            let pixel = index as u32 / samples;
            target.write(pixel % IMAGE_WIDTH, pixel / IMAGE_WIDTH, sample, *color);
        }
    }

    log::info!("Resolving and writing shadow_scene.png...");
    let resolved = pipeline.resolve(&target);
    let image = image::RgbaImage::from_raw(
        resolved.width(),
        resolved.height(),
        resolved.to_rgba8(),
    )
    .ok_or("resolved image dimensions do not match pixel data")?;
    image.save("shadow_scene.png")?;

    log::info!("Done");
    Ok(())
}

/// Depth-only pass: splat a floating quad occluder into the shadow map
///
/// The occluder is a unit quad instanced above the ground with non-uniform
/// scale and a twist, sampled on a dense grid and projected through the
/// light's camera by the transform stage.
fn depth_pass(light_camera: &Camera) -> Result<ShadowMap, Box<dyn std::error::Error>> {
    let occluder = InstanceTransform::new(
        Mat4::new_translation(&Vec3::new(0.5, 3.5, 0.0))
            * Mat4::from_euler_angles(0.0, 0.6, 0.0)
            * Mat4::new_nonuniform_scaling(&Vec3::new(4.0, 1.0, 3.0)),
    );

    let mut vertices = Vec::with_capacity((OCCLUDER_GRID * OCCLUDER_GRID) as usize);
    for row in 0..OCCLUDER_GRID {
        for column in 0..OCCLUDER_GRID {
            let u = (column as f32 + 0.5) / OCCLUDER_GRID as f32;
            let v = (row as f32 + 0.5) / OCCLUDER_GRID as f32;
            vertices.push(Vertex::new(
                Vec3::new(u - 0.5, 0.0, v - 0.5),
                Vec3::y(),
                Vec2::new(u, v),
            ));
        }
    }

    let frame = FrameConstants::from_camera(Mat4::identity(), light_camera);
    let outputs = transform_vertices(&vertices, &frame, Some(&occluder), None);

    let mut map = ShadowMap::new(SHADOW_MAP_SIZE, SHADOW_MAP_SIZE)?;
    for output in outputs {
        let clip = output.clip_position;
        if clip.w.abs() <= f32::EPSILON {
            continue;
        }
        let ndc = clip.xyz() / clip.w;
        let uv = Vec2::new(ndc.x * 0.5 + 0.5, ndc.y * 0.5 + 0.5);
        map.deposit(uv, ndc.z * 0.5 + 0.5);
    }
    Ok(map)
}

/// One vertex per pixel sample, mapped onto the ground plane
///
/// Sample positions jitter within the pixel on a regular sub-grid, so the
/// multisample resolve smooths the checker and shadow edges.
fn ground_vertices(samples: u32) -> Vec<Vertex> {
    let grid = (samples as f32).sqrt().ceil() as u32;
    let extent = GROUND_HALF_EXTENT * 2.0;

    let mut vertices =
        Vec::with_capacity((IMAGE_WIDTH * IMAGE_HEIGHT * samples) as usize);
    for y in 0..IMAGE_HEIGHT {
        for x in 0..IMAGE_WIDTH {
            for sample in 0..samples {
                let jitter_x = ((sample % grid) as f32 + 0.5) / grid as f32;
                let jitter_y = ((sample / grid) as f32 + 0.5) / grid as f32;
                let u = (x as f32 + jitter_x) / IMAGE_WIDTH as f32;
                let v = (y as f32 + jitter_y) / IMAGE_HEIGHT as f32;
                vertices.push(Vertex::new(
                    Vec3::new(
                        -GROUND_HALF_EXTENT + extent * u,
                        0.0,
                        -GROUND_HALF_EXTENT + extent * v,
                    ),
                    Vec3::y(),
                    Vec2::new(u, v),
                ));
            }
        }
    }
    vertices
}
