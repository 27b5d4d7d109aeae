//! # Heightfield Container
//!
//! Row-major 2D grid of scalar elevation values.
//!
//! When a field feeds the mesh builder it carries a 1-cell border ring
//! around the logical chunk; the border samples only influence edge
//! normals and are never emitted as geometry.

use crate::falloff::FalloffMask;

/// 2D grid of float elevation values.
///
/// Invariant: all values are finite. After Local normalization the
/// minimum is exactly 0.0 and the maximum exactly 1.0 unless the field
/// is constant (then it is all-zero).
#[derive(Clone, Debug, PartialEq)]
pub struct Heightfield {
    /// Grid width in samples.
    width: usize,
    /// Grid height in samples.
    height: usize,
    /// Row-major sample storage.
    values: Vec<f32>,
}

impl Heightfield {
    /// Creates a zero-filled field.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            values: vec![0.0; width * height],
        }
    }

    /// Grid width in samples.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Grid height in samples.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Reads the sample at (x, y).
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        assert!(x < self.width && y < self.height, "sample out of bounds");
        self.values[y * self.width + x]
    }

    /// Writes the sample at (x, y).
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        assert!(x < self.width && y < self.height, "sample out of bounds");
        self.values[y * self.width + x] = value;
    }

    /// Returns the raw row-major samples.
    #[inline]
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Returns the observed (min, max) over all samples.
    ///
    /// An empty field reports (0.0, 0.0).
    #[must_use]
    pub fn min_max(&self) -> (f32, f32) {
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for &v in &self.values {
            min = min.min(v);
            max = max.max(v);
        }
        if self.values.is_empty() {
            (0.0, 0.0)
        } else {
            (min, max)
        }
    }

    /// Overwrites every sample with `value`.
    pub fn fill(&mut self, value: f32) {
        self.values.fill(value);
    }

    /// Applies `f` to every sample in place.
    pub fn remap(&mut self, f: impl Fn(f32) -> f32) {
        for v in &mut self.values {
            *v = f(*v);
        }
    }

    /// Subtracts the falloff mask, clamping at zero.
    ///
    /// Pushes the edges of the map toward zero height, bounding the
    /// terrain into an island. The mask must match the field size.
    ///
    /// # Panics
    ///
    /// Panics if the mask size differs from the field dimensions.
    pub fn apply_falloff(&mut self, mask: &FalloffMask) {
        assert!(
            mask.size() == self.width && mask.size() == self.height,
            "falloff mask size must match the field"
        );
        for y in 0..self.height {
            for x in 0..self.width {
                let shaped = (self.get(x, y) - mask.get(x, y)).max(0.0);
                self.set(x, y, shaped);
            }
        }
    }

    /// Extracts a rectangular sub-window as a new field.
    ///
    /// Used to cut bordered chunk windows out of a larger source field
    /// when tiling or previewing.
    ///
    /// # Panics
    ///
    /// Panics if the window exceeds the field bounds.
    #[must_use]
    pub fn window(&self, x0: usize, y0: usize, width: usize, height: usize) -> Self {
        assert!(
            x0 + width <= self.width && y0 + height <= self.height,
            "window out of bounds"
        );
        let mut out = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                out.set(x, y, self.get(x0 + x, y0 + y));
            }
        }
        out
    }
}

/// Maps `value` from the range [a, b] into [0, 1].
#[inline]
#[must_use]
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    (value - a) / (b - a)
}
