//! Packed RGBA output image.

use std::path::Path;

use prism_math::Interval;

use crate::{Color, RenderError};

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a linear color to display-space 8-bit RGBA.
///
/// Channels are clamped to [0, 1] before the square-root gamma curve.
/// Alpha is always 255.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let to_byte = |c: f32| (255.0 * linear_to_gamma(Interval::UNIT.clamp(c))) as u8;
    [to_byte(color.x), to_byte(color.y), to_byte(color.z), 255]
}

/// Pack RGBA bytes into one `u32`, R in the lowest byte and A in the highest.
#[inline]
pub fn pack_rgba(rgba: [u8; 4]) -> u32 {
    u32::from_le_bytes(rgba)
}

/// Inverse of [`pack_rgba`].
#[inline]
pub fn unpack_rgba(pixel: u32) -> [u8; 4] {
    pixel.to_le_bytes()
}

/// Image buffer holding one packed RGBA pixel per `u32`, row-major with
/// row 0 at the top.
///
/// Width and height are always positive.
#[derive(Debug, Clone)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with zeroes (transparent black).
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidDimensions { width, height });
        }

        Ok(Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// All pixels, row-major.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    /// Get the packed pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> u32 {
        self.pixels[self.index(x, y)]
    }

    /// Set the packed pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, pixel: u32) {
        let idx = self.index(x, y);
        self.pixels[idx] = pixel;
    }

    /// Reset every pixel to zero.
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Raw view of the pixel memory, e.g. for texture upload.
    ///
    /// Bytes come out as R, G, B, A per pixel on little-endian hosts; use
    /// [`ImageBuffer::to_rgba_bytes`] for a host-independent copy.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Copy of the pixels as R, G, B, A bytes.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|&p| unpack_rgba(p)).collect()
    }

    /// Write the image as a PNG file.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), RenderError> {
        image::save_buffer(
            path.as_ref(),
            &self.to_rgba_bytes(),
            self.width,
            self.height,
            image::ColorType::Rgba8,
        )?;
        Ok(())
    }

    fn index(&self, x: u32, y: u32) -> usize {
        assert!(x < self.width && y < self.height, "pixel ({}, {}) out of bounds", x, y);
        y as usize * self.width as usize + x as usize
    }
}
