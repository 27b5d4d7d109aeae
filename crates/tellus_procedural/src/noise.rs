//! # Fractal Noise Synthesis
//!
//! Deterministic, seedable heightfield generation from layered
//! gradient noise.
//!
//! ## Determinism Guarantee
//!
//! Given the same `TerrainSeed` and parameters, generation produces
//! **bit-identical** fields on any platform, any time. Chunk-boundary
//! continuity and test reproducibility both depend on this.
//!
//! ## Normalization
//!
//! - `Local`: rescale by the field's own observed min/max. Best
//!   contrast for a single standalone map.
//! - `Global`: rescale by the theoretical amplitude sum, so fields
//!   generated for different chunks are mutually comparable. Required
//!   for seamless cross-chunk height continuity.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::heightfield::{inverse_lerp, Heightfield};

/// World seed for deterministic generation.
///
/// All procedural generation derives from this seed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TerrainSeed(i64);

impl TerrainSeed {
    /// Creates a new terrain seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: i64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// Returns the seed reinterpreted as the unsigned value fed to the
    /// deterministic RNG.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn stream(self) -> u64 {
        self.0 as u64
    }
}

/// How a generated field is rescaled into [0, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NormalizeMode {
    /// Rescale by the field's own observed min/max.
    #[default]
    Local,
    /// Rescale by the theoretical maximum amplitude sum, so that
    /// independently generated chunks agree along their borders.
    Global,
}

/// Parameters for one fractal noise generation call.
///
/// Immutable per call. Out-of-range values are clamped by
/// [`NoiseParameters::sanitized`], never rejected: generation must
/// always succeed.
#[derive(Clone, Copy, Debug)]
pub struct NoiseParameters {
    /// Seed for the permutation table and octave offsets.
    pub seed: TerrainSeed,
    /// Zoom factor; larger values produce smoother terrain. Must be
    /// positive (clamped to [`NoiseParameters::MIN_SCALE`] otherwise).
    pub scale: f32,
    /// Number of noise layers. Zero yields a flat field.
    pub octaves: u32,
    /// Amplitude decay per octave, in [0, 1].
    pub persistence: f32,
    /// Frequency growth per octave, >= 1.
    pub lacunarity: f32,
    /// Sample-space offset. The scheduler passes the chunk's world
    /// center here so adjacent chunks line up.
    pub offset: Vec2,
    /// Rescaling mode for the finished field.
    pub normalize_mode: NormalizeMode,
}

impl NoiseParameters {
    /// Smallest permitted scale; `scale <= 0` is clamped to this.
    pub const MIN_SCALE: f32 = 1e-4;

    /// Per-octave random offset components are drawn from
    /// `[-OFFSET_RANGE, OFFSET_RANGE)`.
    const OFFSET_RANGE: i32 = 10_000;

    /// Returns a copy with every out-of-range value clamped into its
    /// valid domain.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        Self {
            scale: self.scale.max(Self::MIN_SCALE),
            persistence: self.persistence.clamp(0.0, 1.0),
            lacunarity: self.lacunarity.max(1.0),
            ..*self
        }
    }
}

impl Default for NoiseParameters {
    fn default() -> Self {
        Self {
            seed: TerrainSeed::default(),
            scale: 25.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            offset: Vec2::ZERO,
            normalize_mode: NormalizeMode::Local,
        }
    }
}

/// Pre-computed permutation table for gradient noise.
///
/// Computed once from the seed and reused for every sample.
struct PermutationTable {
    /// 512-entry table (256 entries, doubled to avoid index wrapping).
    perm: [u8; 512],
}

impl PermutationTable {
    /// Creates a new permutation table from a seed.
    fn new(seed: TerrainSeed) -> Self {
        let mut perm = [0_u8; 512];
        for (i, slot) in perm.iter_mut().take(256).enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            {
                *slot = i as u8;
            }
        }

        // Fisher-Yates shuffle driven by the deterministic stream.
        let mut rng = ChaCha8Rng::seed_from_u64(seed.stream());
        for i in (1..256).rev() {
            let j = rng.gen_range(0..=i);
            perm.swap(i, j);
        }

        // Double the table so hash lookups never wrap.
        for i in 0..256 {
            perm[256 + i] = perm[i];
        }

        Self { perm }
    }

    /// Hashes a lattice corner to a gradient selector.
    #[inline]
    fn hash(&self, xi: i32, yi: i32) -> u8 {
        let x = (xi & 255) as usize;
        let y = (yi & 255) as usize;
        self.perm[usize::from(self.perm[x]) + y]
    }
}

/// 2D gradient (Perlin) noise generator.
///
/// Produces smooth, continuous values in approximately [-1, 1].
///
/// # Performance
///
/// - O(1) per sample
/// - No allocations
pub struct GradientNoise {
    /// The permutation table.
    table: PermutationTable,
}

impl GradientNoise {
    /// Scales raw gradient noise (bounded by sqrt(2)/2) toward [-1, 1].
    const RANGE_SCALE: f32 = std::f32::consts::SQRT_2;

    /// Creates a new generator from a seed.
    #[must_use]
    pub fn new(seed: TerrainSeed) -> Self {
        Self {
            table: PermutationTable::new(seed),
        }
    }

    /// Samples noise at the given coordinates.
    ///
    /// # Returns
    ///
    /// A value in approximately [-1, 1].
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        let xi = x.floor() as i32;
        let yi = y.floor() as i32;
        let xf = x - xi as f32;
        let yf = y - yi as f32;

        let u = fade(xf);
        let v = fade(yf);

        let aa = self.table.hash(xi, yi);
        let ba = self.table.hash(xi + 1, yi);
        let ab = self.table.hash(xi, yi + 1);
        let bb = self.table.hash(xi + 1, yi + 1);

        let x0 = lerp(gradient(aa, xf, yf), gradient(ba, xf - 1.0, yf), u);
        let x1 = lerp(
            gradient(ab, xf, yf - 1.0),
            gradient(bb, xf - 1.0, yf - 1.0),
            u,
        );

        lerp(x0, x1, v) * Self::RANGE_SCALE
    }
}

/// Quintic fade curve, zero first and second derivative at 0 and 1.
#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

/// Linear interpolation.
#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Dot product of a hashed corner gradient with the offset vector.
#[inline]
fn gradient(hash: u8, x: f32, y: f32) -> f32 {
    match hash & 7 {
        0 => x + y,
        1 => x - y,
        2 => -x + y,
        3 => -x - y,
        4 => x,
        5 => -x,
        6 => y,
        _ => -y,
    }
}

/// Generates a fractal noise heightfield.
///
/// Accumulates `octaves` layers of gradient noise per cell, sampled at
/// `((x - W/2 + off_x) / scale * freq, (y - H/2 + off_y) / scale * freq)`
/// with amplitude starting at 1 and multiplying by `persistence` per
/// octave while frequency multiplies by `lacunarity`.
///
/// The per-octave offsets are drawn from the seeded stream; the caller
/// offset is added on top. Its y component is *subtracted* inside the
/// sample position so that offsets expressed in world space line up
/// with the mesh's flipped Z axis (see `build_terrain_mesh`).
///
/// Never fails: degenerate parameters are clamped, and `octaves == 0`
/// yields a constant-zero field.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn generate(width: usize, height: usize, params: &NoiseParameters) -> Heightfield {
    let params = params.sanitized();
    let noise = GradientNoise::new(params.seed);

    let mut rng = ChaCha8Rng::seed_from_u64(params.seed.stream());
    let mut octave_offsets = Vec::with_capacity(params.octaves as usize);
    for _ in 0..params.octaves {
        let range = -NoiseParameters::OFFSET_RANGE..NoiseParameters::OFFSET_RANGE;
        let ox = rng.gen_range(range.clone()) as f32 + params.offset.x;
        let oy = rng.gen_range(range) as f32 - params.offset.y;
        octave_offsets.push(Vec2::new(ox, oy));
    }

    let mut field = Heightfield::new(width, height);
    let half_width = width as f32 / 2.0;
    let half_height = height as f32 / 2.0;

    let mut observed_min = f32::MAX;
    let mut observed_max = f32::MIN;

    for y in 0..height {
        for x in 0..width {
            let mut amplitude = 1.0_f32;
            let mut frequency = 1.0_f32;
            let mut value = 0.0_f32;

            for offset in &octave_offsets {
                let sample_x = (x as f32 - half_width + offset.x) / params.scale * frequency;
                let sample_y = (y as f32 - half_height + offset.y) / params.scale * frequency;

                value += noise.sample(sample_x, sample_y) * amplitude;
                amplitude *= params.persistence;
                frequency *= params.lacunarity;
            }

            observed_min = observed_min.min(value);
            observed_max = observed_max.max(value);
            field.set(x, y, value);
        }
    }

    tracing::debug!(
        min = observed_min,
        max = observed_max,
        width,
        height,
        "generated raw noise field"
    );

    normalize(&mut field, &params, observed_min, observed_max);
    field
}

/// Rescales the raw field into [0, 1] according to the normalize mode.
fn normalize(field: &mut Heightfield, params: &NoiseParameters, min: f32, max: f32) {
    match params.normalize_mode {
        NormalizeMode::Local => {
            if max - min <= f32::EPSILON {
                // Constant field (e.g. zero octaves): defined as all-zero.
                field.fill(0.0);
            } else {
                field.remap(|v| inverse_lerp(min, max, v));
            }
        }
        NormalizeMode::Global => {
            let mut max_amplitude = 0.0_f32;
            let mut amplitude = 1.0_f32;
            for _ in 0..params.octaves {
                max_amplitude += amplitude;
                amplitude *= params.persistence;
            }
            if max_amplitude <= 0.0 {
                field.fill(0.0);
            } else {
                field.remap(|v| ((v + max_amplitude) / (2.0 * max_amplitude)).clamp(0.0, 1.0));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(seed: i64) -> NoiseParameters {
        NoiseParameters {
            seed: TerrainSeed::new(seed),
            scale: 27.5,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            offset: Vec2::ZERO,
            normalize_mode: NormalizeMode::Local,
        }
    }

    #[test]
    fn test_determinism() {
        let a = generate(64, 64, &params(12345));
        let b = generate(64, 64, &params(12345));
        assert_eq!(a.values(), b.values(), "same seed must reproduce bit-identical fields");
    }

    #[test]
    fn test_different_seeds_different_fields() {
        let a = generate(32, 32, &params(1));
        let b = generate(32, 32, &params(2));
        assert_ne!(a.values(), b.values());
    }

    #[test]
    fn test_local_normalization_hits_exact_bounds() {
        let field = generate(96, 96, &params(42));
        let (min, max) = field.min_max();
        assert_eq!(min, 0.0, "local normalization must reach exactly 0");
        assert_eq!(max, 1.0, "local normalization must reach exactly 1");
    }

    #[test]
    fn test_zero_octaves_is_flat_zero() {
        let mut p = params(7);
        p.octaves = 0;
        for mode in [NormalizeMode::Local, NormalizeMode::Global] {
            p.normalize_mode = mode;
            let field = generate(16, 16, &p);
            assert!(field.values().iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn test_negative_scale_is_clamped_not_fatal() {
        let mut p = params(9);
        p.scale = -3.0;
        let field = generate(8, 8, &p);
        assert!(field.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_global_normalization_in_unit_range() {
        let mut p = params(42);
        p.normalize_mode = NormalizeMode::Global;
        let field = generate(64, 64, &p);
        assert!(field.values().iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_global_mode_chunk_border_continuity() {
        // Two horizontally adjacent chunk fields overlap along a column
        // when offset by exactly the interior size; the shared samples
        // must be bit-identical.
        let size = 19;
        let step = (size - 3) as f32; // interior world span between chunk origins

        let mut left = params(77);
        left.normalize_mode = NormalizeMode::Global;
        let mut right = left;
        right.offset = Vec2::new(step, 0.0);

        let a = generate(size, size, &left);
        let b = generate(size, size, &right);

        for y in 0..size {
            // Right edge interior column of the left chunk lines up with
            // the left edge interior column of the right chunk.
            assert_eq!(
                a.get(size - 2, y),
                b.get(size - 2 - step as usize, y),
                "row {y} must match across the shared border"
            );
        }
    }

    #[test]
    fn test_noise_sample_continuity() {
        let noise = GradientNoise::new(TerrainSeed::new(42));
        let v1 = noise.sample(100.0, 100.0);
        let v2 = noise.sample(100.001, 100.0);
        assert!((v1 - v2).abs() < 0.01, "noise must be continuous");
    }

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn test_noise_sample_range() {
        let noise = GradientNoise::new(TerrainSeed::new(42));
        for i in 0..10_000 {
            let x = (i as f32) * 0.173 - 500.0;
            let y = (i as f32) * 0.131 - 650.0;
            let v = noise.sample(x, y);
            assert!(v.is_finite());
            assert!(
                (-1.5..=1.5).contains(&v),
                "sample {v} out of expected range at ({x}, {y})"
            );
        }
    }
}
