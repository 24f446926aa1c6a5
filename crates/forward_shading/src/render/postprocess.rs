//! Post-process compositor
//!
//! Resolves the main pass's (possibly multisampled) color target into the
//! final displayed image. Two independent binary choices combine into four
//! behaviors: plain fetch, per-pixel sample averaging, a 3x3 edge-detection
//! convolution, or the convolution applied per sample and then averaged.
//! Gamma correction is applied last in every mode.
//!
//! This is the only stage operating on a full-screen quad rather than scene
//! geometry; it reads nothing but the color output of the main pass.

use crate::foundation::math::{Vec3, Vec4};
use crate::render::target::{ColorTarget, ResolvedImage};
use rayon::prelude::*;
use thiserror::Error;

bitflags::bitflags! {
    /// Behavior switches of the compositor
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CompositorFlags: u32 {
        /// Convolve each pixel with the edge-detection kernel
        const EDGE_DETECTION = 1 << 0;
        /// Average all samples at each pixel before output
        const MULTISAMPLE = 1 << 1;
    }
}

/// 3x3 edge/sharpen kernel: strong negative center, uniform neighbors
///
/// Weights sum to 1, so flat regions pass through unchanged while
/// discontinuities are amplified.
pub const EDGE_KERNEL: [[f32; 3]; 3] = [
    [2.0, 2.0, 2.0],
    [2.0, -15.0, 2.0],
    [2.0, 2.0, 2.0],
];

/// Errors raised at compositor configuration time
#[derive(Error, Debug)]
pub enum CompositorError {
    /// Gamma must be positive for `pow(rgb, 1/gamma)` to be defined
    #[error("gamma must be positive, got {gamma}")]
    InvalidGamma {
        /// Requested gamma value
        gamma: f32,
    },
}

/// Resolves a color target into the displayed image
#[derive(Debug, Clone)]
pub struct Compositor {
    flags: CompositorFlags,
    gamma: f32,
}

impl Compositor {
    /// Create a compositor, validating the gamma value
    pub fn new(flags: CompositorFlags, gamma: f32) -> Result<Self, CompositorError> {
        if gamma <= 0.0 || !gamma.is_finite() {
            return Err(CompositorError::InvalidGamma { gamma });
        }
        Ok(Self { flags, gamma })
    }

    /// Active behavior switches
    pub fn flags(&self) -> CompositorFlags {
        self.flags
    }

    /// Resolve the target, processing pixels in parallel
    pub fn resolve(&self, target: &ColorTarget) -> ResolvedImage {
        let width = target.width();
        let height = target.height();
        log::debug!(
            "Resolving {}x{} target ({} samples, flags {:?})",
            width,
            height,
            target.samples(),
            self.flags
        );
        let pixels = (0..(width * height) as usize)
            .into_par_iter()
            .map(|index| {
                let x = (index as u32 % width) as i64;
                let y = (index as u32 / width) as i64;
                self.correct_gamma(self.composite(target, x, y))
            })
            .collect();
        ResolvedImage::new(width, height, pixels)
    }

    fn composite(&self, target: &ColorTarget, x: i64, y: i64) -> Vec4 {
        let edge = self.flags.contains(CompositorFlags::EDGE_DETECTION);
        let multisample = self.flags.contains(CompositorFlags::MULTISAMPLE);
        match (edge, multisample) {
            (false, false) => target.fetch(x, y, 0),
            (false, true) => average_samples(target, |sample| target.fetch(x, y, sample)),
            (true, false) => convolve(target, x, y, 0),
            (true, true) => average_samples(target, |sample| convolve(target, x, y, sample)),
        }
    }

    /// `rgb = pow(rgb, 1 / gamma)`; negative kernel output clamps to zero
    /// first, alpha passes through untouched.
    fn correct_gamma(&self, color: Vec4) -> Vec4 {
        let exponent = 1.0 / self.gamma;
        Vec4::new(
            color.x.max(0.0).powf(exponent),
            color.y.max(0.0).powf(exponent),
            color.z.max(0.0).powf(exponent),
            color.w,
        )
    }
}

fn average_samples(target: &ColorTarget, fetch: impl Fn(u32) -> Vec4) -> Vec4 {
    let mut sum = Vec4::zeros();
    for sample in 0..target.samples() {
        sum += fetch(sample);
    }
    sum / target.samples() as f32
}

/// Apply [`EDGE_KERNEL`] over one-texel offsets at a single sample index
fn convolve(target: &ColorTarget, x: i64, y: i64, sample: u32) -> Vec4 {
    let mut rgb = Vec3::zeros();
    for (row, weights) in EDGE_KERNEL.iter().enumerate() {
        for (column, &weight) in weights.iter().enumerate() {
            let tap = target.fetch(x + column as i64 - 1, y + row as i64 - 1, sample);
            rgb += tap.xyz() * weight;
        }
    }
    let center = target.fetch(x, y, sample);
    Vec4::new(rgb.x, rgb.y, rgb.z, center.w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-4;

    fn uniform_target(width: u32, height: u32, samples: u32, color: Vec4) -> ColorTarget {
        let mut target = ColorTarget::new(width, height, samples).unwrap();
        target.clear(color);
        target
    }

    #[test]
    fn test_gamma_round_trips() {
        let gamma = 2.2_f32;
        for channel in [0.0_f32, 0.18, 0.5, 1.0] {
            let encoded = channel.powf(1.0 / gamma);
            assert_relative_eq!(encoded.powf(gamma), channel, epsilon = EPSILON);
        }
    }

    #[test]
    fn test_invalid_gamma_is_rejected() {
        assert!(matches!(
            Compositor::new(CompositorFlags::empty(), 0.0),
            Err(CompositorError::InvalidGamma { .. })
        ));
        assert!(matches!(
            Compositor::new(CompositorFlags::empty(), -1.0),
            Err(CompositorError::InvalidGamma { .. })
        ));
    }

    #[test]
    fn test_pass_through_applies_only_gamma() {
        let color = Vec4::new(0.25, 0.5, 0.75, 1.0);
        let target = uniform_target(2, 2, 1, color);
        let image = Compositor::new(CompositorFlags::empty(), 2.0)
            .unwrap()
            .resolve(&target);
        let expected = Vec4::new(0.25_f32.sqrt(), 0.5_f32.sqrt(), 0.75_f32.sqrt(), 1.0);
        assert_relative_eq!(image.pixel(0, 0), expected, epsilon = EPSILON);
    }

    #[test]
    fn test_multisample_averages_samples() {
        let mut target = ColorTarget::new(1, 1, 2).unwrap();
        target.write(0, 0, 0, Vec4::new(1.0, 0.0, 0.0, 1.0));
        target.write(0, 0, 1, Vec4::new(0.0, 1.0, 0.0, 1.0));
        let image = Compositor::new(CompositorFlags::MULTISAMPLE, 1.0)
            .unwrap()
            .resolve(&target);
        assert_relative_eq!(
            image.pixel(0, 0),
            Vec4::new(0.5, 0.5, 0.0, 1.0),
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_edge_kernel_preserves_flat_regions() {
        // Kernel weights sum to 1, so a uniform image is a fixed point.
        let color = Vec4::new(0.3, 0.6, 0.9, 1.0);
        let target = uniform_target(5, 5, 1, color);
        let image = Compositor::new(CompositorFlags::EDGE_DETECTION, 1.0)
            .unwrap()
            .resolve(&target);
        assert_relative_eq!(image.pixel(2, 2), color, epsilon = EPSILON);
        // Edge clamping keeps the border well-defined too.
        assert_relative_eq!(image.pixel(0, 0), color, epsilon = EPSILON);
    }

    #[test]
    fn test_edge_kernel_amplifies_discontinuities() {
        let mut target = uniform_target(5, 5, 1, Vec4::new(0.0, 0.0, 0.0, 1.0));
        target.write_pixel(2, 2, Vec4::new(1.0, 1.0, 1.0, 1.0));
        let image = Compositor::new(CompositorFlags::EDGE_DETECTION, 1.0)
            .unwrap()
            .resolve(&target);
        // A neighbor of the bright pixel picks up weight 2 from it.
        assert_relative_eq!(image.pixel(1, 2).x, 2.0, epsilon = EPSILON);
        // The bright center itself goes negative and clamps to zero.
        assert_relative_eq!(image.pixel(2, 2).x, 0.0, epsilon = EPSILON);
    }

    #[test]
    fn test_edge_detection_with_multisample_averages_convolutions() {
        let mut target = ColorTarget::new(3, 3, 2).unwrap();
        // Sample 0 uniform gray, sample 1 uniform white: per-sample
        // convolution preserves each, averaging blends them.
        for y in 0..3 {
            for x in 0..3 {
                target.write(x, y, 0, Vec4::new(0.5, 0.5, 0.5, 1.0));
                target.write(x, y, 1, Vec4::new(1.0, 1.0, 1.0, 1.0));
            }
        }
        let flags = CompositorFlags::EDGE_DETECTION | CompositorFlags::MULTISAMPLE;
        let image = Compositor::new(flags, 1.0).unwrap().resolve(&target);
        assert_relative_eq!(
            image.pixel(1, 1).xyz(),
            Vec3::new(0.75, 0.75, 0.75),
            epsilon = EPSILON
        );
    }
}
