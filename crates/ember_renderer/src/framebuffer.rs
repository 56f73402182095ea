//! Image accumulation and output conversion.

use crate::tile::TileResult;
use crate::Color;

/// Largest intensity written to an 8-bit channel before scaling by 256.
const MAX_INTENSITY: f32 = 0.999;

/// Running sum of radiance samples per pixel.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    pub width: u32,
    pub height: u32,
    accum: Vec<Color>,
    samples: Vec<u32>,
}

impl Framebuffer {
    /// Create an empty framebuffer with no samples anywhere.
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            accum: vec![Color::ZERO; len],
            samples: vec![0; len],
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Add a rendered tile's sums to the buffer.
    pub fn write_tile(&mut self, result: &TileResult) {
        let tile = &result.tile;
        for (offset, color) in result.accum.iter().enumerate() {
            let x = tile.x + offset as u32 % tile.width;
            let y = tile.y + offset as u32 / tile.width;
            let index = self.index(x, y);
            self.accum[index] += *color;
            self.samples[index] += result.samples;
        }
    }

    /// Number of samples recorded at `(x, y)`.
    pub fn sample_count(&self, x: u32, y: u32) -> u32 {
        self.samples[self.index(x, y)]
    }

    pub fn samples(&self) -> &[u32] {
        &self.samples
    }

    /// Average the samples at every pixel. Pixels that were never sampled
    /// resolve to black.
    pub fn resolve(&self) -> ImageBuffer {
        let pixels = self
            .accum
            .iter()
            .zip(&self.samples)
            .map(|(sum, &n)| if n == 0 { Color::ZERO } else { *sum / n as f32 })
            .collect();

        ImageBuffer {
            width: self.width,
            height: self.height,
            pixels,
        }
    }
}

/// Linear colour image in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        self.pixels[(y * self.width + x) as usize] = color;
    }

    /// Gamma-encode to 8-bit RGBA, row-major, top row first.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for color in &self.pixels {
            bytes.extend_from_slice(&color_to_rgba(*color));
        }
        bytes
    }
}

/// Gamma 2 transfer. Negative and NaN input map to 0.
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Quantize one linear colour to an opaque 8-bit pixel.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let byte = |c: f32| (256.0 * linear_to_gamma(c).clamp(0.0, MAX_INTENSITY)) as u8;
    [byte(color.x), byte(color.y), byte(color.z), 255]
}
