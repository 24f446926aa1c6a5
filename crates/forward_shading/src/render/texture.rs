//! Texture sampling abstraction
//!
//! Shading math never touches image memory directly; it samples through the
//! [`TextureSample`] trait so the fragment programs can be exercised against
//! synthetic textures. Materials reference textures through [`TextureKey`]
//! handles resolved by a [`TextureRegistry`].

use crate::foundation::math::{Vec2, Vec4};
use slotmap::SlotMap;
use std::path::Path;
use thiserror::Error;

slotmap::new_key_type! {
    /// Handle to a texture stored in a [`TextureRegistry`]
    pub struct TextureKey;
}

/// Color returned when a material references a stale or missing texture
///
/// Magenta, so a broken binding is visible in the output instead of
/// silently shading black.
pub const MISSING_TEXTURE_COLOR: Vec4 = Vec4::new(1.0, 0.0, 1.0, 1.0);

/// Coordinate-to-color sampling interface
///
/// Implementations must be pure: the same coordinate always yields the same
/// color, with no interior mutability, so fragment invocations can run in
/// parallel against a shared texture.
pub trait TextureSample: Send + Sync {
    /// Sample the texture at normalized coordinates
    ///
    /// Coordinates outside [0, 1] wrap (repeat addressing).
    fn sample(&self, uv: Vec2) -> Vec4;
}

/// Repeat-wrap a texture coordinate into [0, 1)
#[inline]
fn wrap(coordinate: f32) -> f32 {
    coordinate - coordinate.floor()
}

/// Uniform single-color texture
#[derive(Debug, Clone)]
pub struct SolidTexture {
    color: Vec4,
}

impl SolidTexture {
    /// Create a texture returning `color` everywhere
    pub fn new(color: Vec4) -> Self {
        Self { color }
    }
}

impl TextureSample for SolidTexture {
    fn sample(&self, _uv: Vec2) -> Vec4 {
        self.color
    }
}

/// Two-color checkerboard, `squares` cells per axis
#[derive(Debug, Clone)]
pub struct CheckerTexture {
    squares: u32,
    even: Vec4,
    odd: Vec4,
}

impl CheckerTexture {
    /// Create a checkerboard with `squares` cells along each axis
    pub fn new(squares: u32, even: Vec4, odd: Vec4) -> Self {
        Self {
            squares: squares.max(1),
            even,
            odd,
        }
    }
}

impl TextureSample for CheckerTexture {
    fn sample(&self, uv: Vec2) -> Vec4 {
        let cells = self.squares as f32;
        let cell_x = (wrap(uv.x) * cells) as u32;
        let cell_y = (wrap(uv.y) * cells) as u32;
        if (cell_x + cell_y) % 2 == 0 {
            self.even
        } else {
            self.odd
        }
    }
}

/// Texel filtering mode for image-backed textures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    /// Nearest-texel lookup
    Nearest,
    /// Bilinear blend of the four surrounding texels
    Bilinear,
}

/// Texture backed by decoded image pixels
#[derive(Debug, Clone)]
pub struct ImageTexture {
    width: u32,
    height: u32,
    texels: Vec<Vec4>,
    filter: Filter,
}

/// Errors raised while creating textures
#[derive(Error, Debug)]
pub enum TextureError {
    /// The backing image file could not be decoded
    #[error("failed to load texture image: {0}")]
    Image(#[from] image::ImageError),

    /// Raw texel data does not match the stated dimensions
    #[error("texel data length {actual} does not match {width}x{height}")]
    SizeMismatch {
        /// Stated width
        width: u32,
        /// Stated height
        height: u32,
        /// Provided texel count
        actual: usize,
    },
}

impl ImageTexture {
    /// Create a texture from raw normalized texels, row-major from the top
    pub fn from_texels(
        width: u32,
        height: u32,
        texels: Vec<Vec4>,
        filter: Filter,
    ) -> Result<Self, TextureError> {
        if texels.len() != (width as usize) * (height as usize) {
            return Err(TextureError::SizeMismatch {
                width,
                height,
                actual: texels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            texels,
            filter,
        })
    }

    /// Decode an image file into a texture
    pub fn from_path(path: impl AsRef<Path>, filter: Filter) -> Result<Self, TextureError> {
        let image = image::open(path.as_ref())?.to_rgba8();
        let (width, height) = image.dimensions();
        log::debug!(
            "Loaded texture {:?} ({}x{})",
            path.as_ref(),
            width,
            height
        );
        let texels = image
            .pixels()
            .map(|pixel| {
                Vec4::new(
                    f32::from(pixel[0]) / 255.0,
                    f32::from(pixel[1]) / 255.0,
                    f32::from(pixel[2]) / 255.0,
                    f32::from(pixel[3]) / 255.0,
                )
            })
            .collect();
        Self::from_texels(width, height, texels, filter)
    }

    fn texel(&self, x: u32, y: u32) -> Vec4 {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.texels[(y * self.width + x) as usize]
    }
}

impl TextureSample for ImageTexture {
    fn sample(&self, uv: Vec2) -> Vec4 {
        let u = wrap(uv.x) * self.width as f32;
        let v = wrap(uv.y) * self.height as f32;
        match self.filter {
            Filter::Nearest => self.texel(u as u32, v as u32),
            Filter::Bilinear => {
                // Sample at texel centers, blending the four neighbors.
                let x = u - 0.5;
                let y = v - 0.5;
                let x0 = x.floor();
                let y0 = y.floor();
                let tx = x - x0;
                let ty = y - y0;
                let x0 = x0.rem_euclid(self.width as f32) as u32;
                let y0 = y0.rem_euclid(self.height as f32) as u32;
                let x1 = (x0 + 1) % self.width;
                let y1 = (y0 + 1) % self.height;
                let top = self.texel(x0, y0) * (1.0 - tx) + self.texel(x1, y0) * tx;
                let bottom = self.texel(x0, y1) * (1.0 - tx) + self.texel(x1, y1) * tx;
                top * (1.0 - ty) + bottom * ty
            }
        }
    }
}

/// Owner of every texture a draw call can sample
///
/// Materials store [`TextureKey`] handles; the registry resolves them at
/// shading time. Registered textures are immutable, so the registry can be
/// shared by reference across parallel fragment invocations.
#[derive(Default)]
pub struct TextureRegistry {
    textures: SlotMap<TextureKey, Box<dyn TextureSample>>,
}

impl TextureRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a texture, returning its handle
    pub fn insert(&mut self, texture: impl TextureSample + 'static) -> TextureKey {
        self.textures.insert(Box::new(texture))
    }

    /// Look up a texture by handle
    pub fn get(&self, key: TextureKey) -> Option<&dyn TextureSample> {
        self.textures.get(key).map(AsRef::as_ref)
    }

    /// Sample a texture by handle
    ///
    /// A stale handle yields [`MISSING_TEXTURE_COLOR`] rather than an error;
    /// per-fragment failure is numeric, not control flow.
    pub fn sample(&self, key: TextureKey, uv: Vec2) -> Vec4 {
        self.get(key)
            .map_or(MISSING_TEXTURE_COLOR, |texture| texture.sample(uv))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    const WHITE: Vec4 = Vec4::new(1.0, 1.0, 1.0, 1.0);
    const BLACK: Vec4 = Vec4::new(0.0, 0.0, 0.0, 1.0);

    #[test]
    fn test_solid_texture_ignores_coordinates() {
        let texture = SolidTexture::new(Vec4::new(0.2, 0.4, 0.6, 0.8));
        assert_eq!(texture.sample(Vec2::new(0.0, 0.0)), texture.sample(Vec2::new(7.3, -2.1)));
    }

    #[test]
    fn test_checker_alternates_cells() {
        let texture = CheckerTexture::new(2, WHITE, BLACK);
        assert_eq!(texture.sample(Vec2::new(0.25, 0.25)), WHITE);
        assert_eq!(texture.sample(Vec2::new(0.75, 0.25)), BLACK);
        assert_eq!(texture.sample(Vec2::new(0.75, 0.75)), WHITE);
    }

    #[test]
    fn test_image_texture_nearest_lookup() {
        let texels = vec![WHITE, BLACK, BLACK, WHITE];
        let texture = ImageTexture::from_texels(2, 2, texels, Filter::Nearest).unwrap();
        assert_eq!(texture.sample(Vec2::new(0.25, 0.25)), WHITE);
        assert_eq!(texture.sample(Vec2::new(0.75, 0.25)), BLACK);
    }

    #[test]
    fn test_image_texture_bilinear_blends_neighbors() {
        let texels = vec![WHITE, BLACK, WHITE, BLACK];
        let texture = ImageTexture::from_texels(2, 2, texels, Filter::Bilinear).unwrap();
        // Halfway between a white and a black column.
        let sample = texture.sample(Vec2::new(0.5, 0.25));
        assert_relative_eq!(sample.x, 0.5, epsilon = EPSILON);
    }

    #[test]
    fn test_image_texture_wraps_negative_coordinates() {
        let texels = vec![WHITE, BLACK, BLACK, WHITE];
        let texture = ImageTexture::from_texels(2, 2, texels, Filter::Nearest).unwrap();
        assert_eq!(
            texture.sample(Vec2::new(-0.75, 0.25)),
            texture.sample(Vec2::new(0.25, 0.25))
        );
    }

    #[test]
    fn test_image_texture_rejects_mismatched_texels() {
        let result = ImageTexture::from_texels(2, 2, vec![WHITE; 3], Filter::Nearest);
        assert!(matches!(result, Err(TextureError::SizeMismatch { .. })));
    }

    #[test]
    fn test_registry_resolves_and_reports_missing() {
        let mut registry = TextureRegistry::new();
        let key = registry.insert(SolidTexture::new(WHITE));
        assert_eq!(registry.sample(key, Vec2::zeros()), WHITE);

        let empty = TextureRegistry::new();
        assert_eq!(empty.sample(key, Vec2::zeros()), MISSING_TEXTURE_COLOR);
    }
}
