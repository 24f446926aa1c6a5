//! Shadow map and percentage-closer filtering resolver
//!
//! The directional light owns a single-channel depth map populated by a
//! depth-only pass over the scene from the light's point of view. The
//! resolver re-projects a fragment into light clip space, compares its depth
//! against a 5x5 neighborhood of map texels with a slope-scaled bias, and
//! averages the hits into a shadow factor in [0, 1].

use crate::foundation::math::{Vec2, Vec3, Vec4};
use thiserror::Error;

/// Half-width of the PCF kernel; the kernel spans `2 * RADIUS + 1` texels
const PCF_KERNEL_RADIUS: i32 = 2;

/// Total tap count of the PCF kernel
pub const PCF_KERNEL_TAPS: u32 =
    ((2 * PCF_KERNEL_RADIUS + 1) * (2 * PCF_KERNEL_RADIUS + 1)) as u32;

/// Errors raised while creating shadow maps
#[derive(Error, Debug)]
pub enum ShadowError {
    /// Depth data does not match the stated dimensions
    #[error("depth data length {actual} does not match {width}x{height}")]
    SizeMismatch {
        /// Stated width
        width: u32,
        /// Stated height
        height: u32,
        /// Provided depth count
        actual: usize,
    },

    /// Zero-sized maps cannot be sampled
    #[error("shadow map dimensions must be non-zero, got {width}x{height}")]
    ZeroSized {
        /// Stated width
        width: u32,
        /// Stated height
        height: u32,
    },
}

/// Single-channel depth texture rendered from the light's point of view
///
/// Depths are in [0, 1] light clip space; texels never written by the depth
/// pass keep the far-plane value 1.0 (no occluder). Reads outside the map
/// also return 1.0, so kernel taps past the border never darken a fragment.
#[derive(Debug, Clone)]
pub struct ShadowMap {
    width: u32,
    height: u32,
    depths: Vec<f32>,
}

impl ShadowMap {
    /// Create a map cleared to the far plane
    pub fn new(width: u32, height: u32) -> Result<Self, ShadowError> {
        if width == 0 || height == 0 {
            return Err(ShadowError::ZeroSized { width, height });
        }
        Ok(Self {
            width,
            height,
            depths: vec![1.0; (width as usize) * (height as usize)],
        })
    }

    /// Create a map from raw depth data, row-major from the top
    pub fn from_depths(width: u32, height: u32, depths: Vec<f32>) -> Result<Self, ShadowError> {
        if width == 0 || height == 0 {
            return Err(ShadowError::ZeroSized { width, height });
        }
        if depths.len() != (width as usize) * (height as usize) {
            return Err(ShadowError::SizeMismatch {
                width,
                height,
                actual: depths.len(),
            });
        }
        Ok(Self {
            width,
            height,
            depths,
        })
    }

    /// Map width in texels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Map height in texels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Size of one texel in [0, 1] texture space
    pub fn texel_size(&self) -> Vec2 {
        Vec2::new(1.0 / self.width as f32, 1.0 / self.height as f32)
    }

    /// Deposit a depth sample from the depth-only pass, keeping the nearest
    ///
    /// Coordinates in [0, 1] texture space; samples outside the map are
    /// ignored.
    pub fn deposit(&mut self, uv: Vec2, depth: f32) {
        if !(0.0..1.0).contains(&uv.x) || !(0.0..1.0).contains(&uv.y) {
            return;
        }
        let x = (uv.x * self.width as f32) as usize;
        let y = (uv.y * self.height as f32) as usize;
        let index = y * self.width as usize + x;
        if depth < self.depths[index] {
            self.depths[index] = depth;
        }
    }

    /// Nearest-texel depth lookup; out-of-range coordinates read 1.0
    fn depth_at(&self, uv: Vec2) -> f32 {
        if !(0.0..1.0).contains(&uv.x) || !(0.0..1.0).contains(&uv.y) {
            return 1.0;
        }
        let x = (uv.x * self.width as f32) as usize;
        let y = (uv.y * self.height as f32) as usize;
        self.depths[y * self.width as usize + x]
    }

    /// Resolve the shadow factor for one fragment
    ///
    /// `light_clip` is the fragment position in light clip space,
    /// `light_dir` the unit vector toward the light. The factor is in
    /// [0, 1], a multiple of `1 / PCF_KERNEL_TAPS`: 0 fully lit, 1 fully
    /// shadowed. Fragments beyond the map's far plane resolve to 0, which
    /// keeps the region outside the light frustum free of false shadows.
    pub fn resolve(&self, light_clip: Vec4, normal: Vec3, light_dir: Vec3) -> f32 {
        if light_clip.w.abs() <= f32::EPSILON {
            return 0.0;
        }
        let ndc = light_clip.xyz() / light_clip.w;
        let projected = ndc * 0.5 + Vec3::new(0.5, 0.5, 0.5);
        let current_depth = projected.z;
        if current_depth > 1.0 {
            return 0.0;
        }

        // Slope-scaled bias: grazing angles need more slack against acne.
        let bias = (0.05 * (1.0 - normal.dot(&light_dir))).max(0.005);

        let texel = self.texel_size();
        let mut hits = 0u32;
        for offset_y in -PCF_KERNEL_RADIUS..=PCF_KERNEL_RADIUS {
            for offset_x in -PCF_KERNEL_RADIUS..=PCF_KERNEL_RADIUS {
                let tap = Vec2::new(
                    projected.x + offset_x as f32 * texel.x,
                    projected.y + offset_y as f32 * texel.y,
                );
                if current_depth - bias > self.depth_at(tap) {
                    hits += 1;
                }
            }
        }
        hits as f32 / PCF_KERNEL_TAPS as f32
    }
}
