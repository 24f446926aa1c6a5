//! Color render targets
//!
//! A [`ColorTarget`] stores one or more color samples per pixel, standing in
//! for the multisampled framebuffer the main color pass writes into. The
//! post-process compositor resolves it into a [`ResolvedImage`] of one color
//! per pixel.

use crate::foundation::math::{saturate, Vec4};
use thiserror::Error;

/// Errors raised at target configuration time
#[derive(Error, Debug)]
pub enum TargetError {
    /// Targets need at least one sample per pixel
    #[error("sample count must be at least 1, got {samples}")]
    ZeroSamples {
        /// Requested sample count
        samples: u32,
    },

    /// Zero-sized targets cannot be resolved
    #[error("target dimensions must be non-zero, got {width}x{height}")]
    ZeroSized {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },
}

/// Color buffer with a fixed number of samples per pixel
///
/// Samples are stored sample-major within each pixel, row-major across the
/// image. Out-of-range fetches clamp to the nearest edge texel, which keeps
/// convolution kernels well-defined at the borders.
#[derive(Debug, Clone)]
pub struct ColorTarget {
    width: u32,
    height: u32,
    samples: u32,
    texels: Vec<Vec4>,
}

impl ColorTarget {
    /// Create a target cleared to transparent black
    pub fn new(width: u32, height: u32, samples: u32) -> Result<Self, TargetError> {
        if width == 0 || height == 0 {
            return Err(TargetError::ZeroSized { width, height });
        }
        if samples == 0 {
            return Err(TargetError::ZeroSamples { samples });
        }
        Ok(Self {
            width,
            height,
            samples,
            texels: vec![Vec4::zeros(); (width * height * samples) as usize],
        })
    }

    /// Create a single-sample target
    pub fn single_sample(width: u32, height: u32) -> Result<Self, TargetError> {
        Self::new(width, height, 1)
    }

    /// Target width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Target height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Samples per pixel
    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// Fill every sample of every pixel with one color
    pub fn clear(&mut self, color: Vec4) {
        self.texels.fill(color);
    }

    fn index(&self, x: u32, y: u32, sample: u32) -> usize {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        let sample = sample.min(self.samples - 1);
        ((y * self.width + x) * self.samples + sample) as usize
    }

    /// Write one sample of one pixel
    pub fn write(&mut self, x: u32, y: u32, sample: u32, color: Vec4) {
        let index = self.index(x, y, sample);
        self.texels[index] = color;
    }

    /// Write every sample of one pixel
    pub fn write_pixel(&mut self, x: u32, y: u32, color: Vec4) {
        for sample in 0..self.samples {
            self.write(x, y, sample, color);
        }
    }

    /// Fetch one sample of one pixel, clamping coordinates to the edge
    pub fn fetch(&self, x: i64, y: i64, sample: u32) -> Vec4 {
        let x = x.clamp(0, i64::from(self.width) - 1) as u32;
        let y = y.clamp(0, i64::from(self.height) - 1) as u32;
        self.texels[self.index(x, y, sample)]
    }
}

/// Resolved single-sample image produced by the compositor
#[derive(Debug, Clone)]
pub struct ResolvedImage {
    width: u32,
    height: u32,
    pixels: Vec<Vec4>,
}

impl ResolvedImage {
    pub(crate) fn new(width: u32, height: u32, pixels: Vec<Vec4>) -> Self {
        debug_assert_eq!(pixels.len(), (width * height) as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Image width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel at (x, y), row-major from the top
    pub fn pixel(&self, x: u32, y: u32) -> Vec4 {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Convert to tightly packed 8-bit RGBA, saturating each channel
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for pixel in &self.pixels {
            for channel in 0..4 {
                bytes.push((saturate(pixel[channel]) * 255.0).round() as u8);
            }
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_rejects_degenerate_shapes() {
        assert!(matches!(
            ColorTarget::new(0, 4, 1),
            Err(TargetError::ZeroSized { .. })
        ));
        assert!(matches!(
            ColorTarget::new(4, 4, 0),
            Err(TargetError::ZeroSamples { .. })
        ));
    }

    #[test]
    fn test_write_and_fetch_round_trip() {
        let mut target = ColorTarget::new(4, 4, 2).unwrap();
        let color = Vec4::new(0.25, 0.5, 0.75, 1.0);
        target.write(2, 3, 1, color);
        assert_eq!(target.fetch(2, 3, 1), color);
        assert_eq!(target.fetch(2, 3, 0), Vec4::zeros());
    }

    #[test]
    fn test_fetch_clamps_to_edges() {
        let mut target = ColorTarget::single_sample(2, 2).unwrap();
        let corner = Vec4::new(1.0, 0.0, 0.0, 1.0);
        target.write(0, 0, 0, corner);
        assert_eq!(target.fetch(-5, -5, 0), corner);
    }

    #[test]
    fn test_clear_fills_every_sample() {
        let mut target = ColorTarget::new(2, 2, 4).unwrap();
        let gray = Vec4::new(0.5, 0.5, 0.5, 1.0);
        target.clear(gray);
        for sample in 0..4 {
            assert_eq!(target.fetch(1, 1, sample), gray);
        }
    }

    #[test]
    fn test_resolved_image_saturates_rgba8() {
        let image = ResolvedImage::new(1, 1, vec![Vec4::new(2.0, -1.0, 0.5, 1.0)]);
        assert_eq!(image.to_rgba8(), vec![255, 0, 128, 255]);
    }
}
