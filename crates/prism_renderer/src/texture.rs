//! Textures: pure functions from surface coordinates to color.
//!
//! Every texture is immutable after construction, so materials can share
//! them through `Arc` and render threads can sample them concurrently.

use std::path::Path;
use std::sync::Arc;

use prism_math::{Vec2, Vec3};
use rand::RngCore;
use thiserror::Error;

use crate::{Color, Perlin};

/// Errors that can occur while building an image texture.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Invalid texture dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Unsupported channel count: {0}")]
    UnsupportedChannels(u32),

    #[error("Texture data has {actual} bytes, expected {expected}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),
}

pub type TextureResult<T> = Result<T, TextureError>;

/// Trait for color sources sampled at a hit point.
pub trait Texture: Send + Sync {
    /// Color at texture coordinates `uv` and world-space point `p`.
    fn value(&self, uv: Vec2, p: Vec3) -> Color;
}

/// A constant color.
#[derive(Debug, Clone, Copy)]
pub struct SolidColor {
    color: Color,
}

impl SolidColor {
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

impl Texture for SolidColor {
    fn value(&self, _uv: Vec2, _p: Vec3) -> Color {
        self.color
    }
}

/// 3D checkerboard alternating between two textures.
///
/// The cell is picked from the parity of
/// `floor(x * scale) + floor(y * scale) + floor(z * scale)`.
pub struct CheckerTexture {
    scale: f32,
    even: Arc<dyn Texture>,
    odd: Arc<dyn Texture>,
}

impl CheckerTexture {
    /// Default number of cells per world unit.
    pub const DEFAULT_SCALE: f32 = 10.0;

    pub fn new(even: Arc<dyn Texture>, odd: Arc<dyn Texture>) -> Self {
        Self {
            scale: Self::DEFAULT_SCALE,
            even,
            odd,
        }
    }

    /// Checker between two solid colors.
    pub fn from_colors(even: Color, odd: Color) -> Self {
        Self::new(
            Arc::new(SolidColor::new(even)),
            Arc::new(SolidColor::new(odd)),
        )
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }
}

impl Texture for CheckerTexture {
    fn value(&self, uv: Vec2, p: Vec3) -> Color {
        let cell = (p * self.scale).floor();
        let sum = cell.x as i64 + cell.y as i64 + cell.z as i64;

        if sum.rem_euclid(2) == 0 {
            self.even.value(uv, p)
        } else {
            self.odd.value(uv, p)
        }
    }
}

/// Marble-like grey pattern: Perlin turbulence warped through a sine.
#[derive(Clone)]
pub struct NoiseTexture {
    noise: Perlin,
    scale: f32,
}

impl NoiseTexture {
    /// Octaves summed by the turbulence function.
    const TURBULENCE_DEPTH: u32 = 7;

    pub fn new(scale: f32, rng: &mut dyn RngCore) -> Self {
        Self {
            noise: Perlin::new(rng),
            scale,
        }
    }
}

impl Texture for NoiseTexture {
    fn value(&self, _uv: Vec2, p: Vec3) -> Color {
        let turbulence = self.noise.turbulence(p, Self::TURBULENCE_DEPTH);
        Color::ONE * 0.5 * (1.0 + (self.scale * p.z + 10.0 * turbulence).sin())
    }
}

/// Bitmap texture sampled bilinearly by UV.
///
/// Holds 8-bit texels with 1 to 4 channels, row-major with the first row at
/// the top. Decoding is left to the caller (or `ImageTexture::load`).
#[derive(Clone, Debug)]
pub struct ImageTexture {
    width: u32,
    height: u32,
    channels: u32,
    data: Vec<u8>,
}

impl ImageTexture {
    /// Wrap an already decoded pixel buffer.
    pub fn new(width: u32, height: u32, channels: u32, data: Vec<u8>) -> TextureResult<Self> {
        if width == 0 || height == 0 {
            return Err(TextureError::InvalidDimensions { width, height });
        }
        if !(1..=4).contains(&channels) {
            return Err(TextureError::UnsupportedChannels(channels));
        }

        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(TextureError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Decode an image file into an RGB texture.
    pub fn load(path: impl AsRef<Path>) -> TextureResult<Self> {
        let path = path.as_ref();
        let rgb = image::open(path)?.to_rgb8();
        let (width, height) = rgb.dimensions();

        log::debug!(
            "Loaded texture: {} ({}x{})",
            path.display(),
            width,
            height
        );

        Self::new(width, height, 3, rgb.into_raw())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u32 {
        self.channels
    }

    /// Texel at integer coordinates as a color in [0, 1].
    ///
    /// Grey images replicate their single channel.
    fn texel(&self, x: u32, y: u32) -> Color {
        let x = x.min(self.width - 1) as usize;
        let y = y.min(self.height - 1) as usize;
        let channels = self.channels as usize;
        let idx = (y * self.width as usize + x) * channels;
        let px = &self.data[idx..idx + channels];

        let to_unit = |b: u8| b as f32 / 255.0;
        if channels < 3 {
            Color::splat(to_unit(px[0]))
        } else {
            Color::new(to_unit(px[0]), to_unit(px[1]), to_unit(px[2]))
        }
    }
}

impl Texture for ImageTexture {
    fn value(&self, uv: Vec2, _p: Vec3) -> Color {
        // Clamp into the image, flip V so v = 1 is the top row
        let u = uv.x.clamp(0.0, 1.0);
        let v = 1.0 - uv.y.clamp(0.0, 1.0);

        let x = u * (self.width - 1) as f32;
        let y = v * (self.height - 1) as f32;

        let x0 = x.floor() as u32;
        let y0 = y.floor() as u32;
        let fx = x - x0 as f32;
        let fy = y - y0 as f32;

        let top = self.texel(x0, y0).lerp(self.texel(x0 + 1, y0), fx);
        let bottom = self.texel(x0, y0 + 1).lerp(self.texel(x0 + 1, y0 + 1), fx);

        top.lerp(bottom, fy)
    }
}
