//! # Falloff Mask
//!
//! Precomputed square falloff multiplier that shapes an "island"
//! boundary into a heightfield: subtracting the mask pushes the edges
//! of the map toward zero height.
//!
//! Pure function of the size; generated once and cached by consumers.

/// Radial/square falloff table.
#[derive(Clone, Debug)]
pub struct FalloffMask {
    /// Side length in samples.
    size: usize,
    /// Row-major falloff values in [0, 1].
    values: Vec<f32>,
}

impl FalloffMask {
    /// Sigmoid steepness.
    const SHAPE_A: f32 = 3.0;
    /// Sigmoid midpoint bias.
    const SHAPE_B: f32 = 2.2;

    /// Generates a falloff table of the given side length.
    ///
    /// Each cell is the Chebyshev distance from the center remapped to
    /// [-1, 1] per axis, pushed through [`FalloffMask::evaluate`]. The
    /// result is 0 at the center and approaches 1 at the edges.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn generate(size: usize) -> Self {
        let mut values = Vec::with_capacity(size * size);
        for y in 0..size {
            for x in 0..size {
                let fx = (x as f32 / size as f32) * 2.0 - 1.0;
                let fy = (y as f32 / size as f32) * 2.0 - 1.0;
                let v = fx.abs().max(fy.abs());
                values.push(Self::evaluate(v));
            }
        }
        Self { size, values }
    }

    /// The falloff curve: `v^a / (v^a + b * (1 - v)^a)` with the fixed
    /// shape constants a = 3, b = 2.2.
    ///
    /// Non-decreasing on [0, 1] with `evaluate(0) == 0` and
    /// `evaluate(1) == 1`.
    #[must_use]
    pub fn evaluate(v: f32) -> f32 {
        let rise = v.powf(Self::SHAPE_A);
        rise / (rise + Self::SHAPE_B * (1.0 - v).powf(Self::SHAPE_A))
    }

    /// Side length in samples.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Reads the falloff value at (x, y).
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        assert!(x < self.size && y < self.size, "sample out of bounds");
        self.values[y * self.size + x]
    }
}
