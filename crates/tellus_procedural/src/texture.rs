//! # Image Buffers
//!
//! RGBA8 pixel buffers for pushing heightfield / classification
//! visualizations to an external viewer. Encoding to an image *format*
//! is the host's business; this module only lays out pixels.

use bytemuck::cast_slice;

use crate::color::{ColorField, Rgba8};
use crate::heightfield::Heightfield;

/// An RGBA8 image buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerrainImage {
    /// Image width in pixels.
    width: usize,
    /// Image height in pixels.
    height: usize,
    /// Row-major pixels.
    pixels: Vec<Rgba8>,
}

impl TerrainImage {
    /// Visualizes a heightfield as a black-to-white gradient.
    #[must_use]
    pub fn from_heightfield(field: &Heightfield) -> Self {
        let pixels = field
            .values()
            .iter()
            .map(|&h| Rgba8::BLACK.lerp(Rgba8::WHITE, h))
            .collect();
        Self {
            width: field.width(),
            height: field.height(),
            pixels,
        }
    }

    /// Wraps a classified color field as an image.
    #[must_use]
    pub fn from_color_field(colors: &ColorField) -> Self {
        Self {
            width: colors.width(),
            height: colors.height(),
            pixels: colors.pixels().to_vec(),
        }
    }

    /// Image width in pixels.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Row-major pixels.
    #[inline]
    #[must_use]
    pub fn pixels(&self) -> &[Rgba8] {
        &self.pixels
    }

    /// Raw RGBA byte view of the pixels.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        cast_slice(&self.pixels)
    }
}
