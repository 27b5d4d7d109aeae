//! # Terrain Configuration
//!
//! TOML-loadable settings for generation and streaming. Loaded once at
//! startup, validated, then treated as immutable; the scheduler copies
//! what it needs.
//!
//! Validation catches *structural* mistakes (empty or unordered LOD
//! tables, strides that cannot tile the chunk). Numeric noise
//! parameters are merely clamped downstream - a weird scale produces
//! weird terrain, not an error.

use glam::Vec2;
use serde::Deserialize;
use thiserror::Error;

use tellus_procedural::color::{ColorRamp, Curve, CurvePoint, RampStop, Rgba8};
use tellus_procedural::mesh::lod_stride;
use tellus_procedural::noise::{NoiseParameters, NormalizeMode, TerrainSeed};

/// Configuration loading and validation failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The TOML source could not be parsed.
    #[error("failed to parse terrain config: {0}")]
    Parse(#[from] toml::de::Error),

    /// No detail levels were configured; the scheduler needs at least
    /// one to derive the view distance.
    #[error("detail_levels must not be empty")]
    DetailLevelsEmpty,

    /// A detail level's distance threshold does not increase over the
    /// previous level's.
    #[error("detail_levels[{index}] does not increase the visible distance threshold")]
    UnorderedDetailLevels {
        /// Index of the offending level.
        index: usize,
    },

    /// More than one detail level is flagged for collision.
    #[error("more than one detail level is flagged use_for_collision")]
    MultipleCollisionLevels,

    /// A detail level's stride cannot tile the chunk grid.
    #[error("lod {lod} stride {stride} does not divide chunk size {chunk_size}")]
    StrideIncompatible {
        /// The offending LOD index.
        lod: u32,
        /// Vertex stride derived from the LOD.
        stride: usize,
        /// Chunk size in grid cells (resolution - 1).
        chunk_size: usize,
    },

    /// The mesh resolution is too small to form a grid.
    #[error("mesh resolution {resolution} too small (minimum 2)")]
    ResolutionTooSmall {
        /// The configured resolution.
        resolution: usize,
    },
}

/// How a generated field is rescaled, as spelled in config files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeConfig {
    /// Rescale by the field's own observed min/max.
    Local,
    /// Rescale by the theoretical amplitude sum. The default: endless
    /// terrain needs chunk-independent normalization to stay seamless.
    #[default]
    Global,
}

impl From<NormalizeConfig> for NormalizeMode {
    fn from(mode: NormalizeConfig) -> Self {
        match mode {
            NormalizeConfig::Local => Self::Local,
            NormalizeConfig::Global => Self::Global,
        }
    }
}

/// One entry of the LOD distance table.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct LodLevel {
    /// LOD index fed to mesh construction (0 = full detail).
    pub lod: u32,
    /// Chunks closer than this use this level. Thresholds must
    /// strictly increase down the table; the last one is the maximum
    /// view distance.
    pub visible_distance_threshold: f32,
    /// Whether this level's mesh doubles as the collision shape. At
    /// most one level may set this.
    #[serde(default)]
    pub use_for_collision: bool,
}

/// One control point of the height remap curve, as `[x, y]`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct CurvePointConfig(pub f32, pub f32);

/// One stop of the color ramp.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct RampStopConfig {
    /// Height position of the stop in [0, 1].
    pub position: f32,
    /// Opaque RGB color of the stop.
    pub color: [u8; 3],
}

/// Complete terrain settings.
///
/// Every field has a sensible default, so an empty TOML document is a
/// valid (grayscale, curve-less) configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// World seed.
    pub seed: i64,
    /// Noise zoom factor.
    pub scale: f32,
    /// Number of noise layers.
    pub octaves: u32,
    /// Amplitude decay per octave.
    pub persistence: f32,
    /// Frequency growth per octave.
    pub lacunarity: f32,
    /// Field rescaling mode.
    pub normalize: NormalizeConfig,
    /// Vertices per chunk side at full detail. The chunk covers
    /// `resolution - 1` world units per side.
    pub resolution: usize,
    /// World-space height multiplier applied after the remap curve.
    pub height_scale: f32,
    /// Whether to suppress heights toward chunk borders (island maps).
    pub use_falloff: bool,
    /// Viewer must move at least this far before the scheduler rescans
    /// chunk visibility.
    pub movement_threshold: f32,
    /// LOD used by the single-map editor preview.
    pub editor_preview_lod: u32,
    /// Optional cap on resident chunks; beyond it the least recently
    /// visible invisible chunks are evicted. `None` disables eviction.
    pub max_resident_chunks: Option<usize>,
    /// LOD distance table, nearest first.
    pub detail_levels: Vec<LodLevel>,
    /// Height remap curve control points. Empty = unbound; mesh
    /// construction is skipped with a warning until one is provided.
    pub height_curve: Vec<CurvePointConfig>,
    /// Color ramp stops. Empty = unbound; color rendering is skipped
    /// with a warning.
    pub color_ramp: Vec<RampStopConfig>,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            scale: 25.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            normalize: NormalizeConfig::Global,
            resolution: 241,
            height_scale: 20.0,
            use_falloff: false,
            movement_threshold: 5.0,
            editor_preview_lod: 0,
            max_resident_chunks: None,
            detail_levels: vec![
                LodLevel {
                    lod: 0,
                    visible_distance_threshold: 200.0,
                    use_for_collision: false,
                },
                LodLevel {
                    lod: 2,
                    visible_distance_threshold: 400.0,
                    use_for_collision: false,
                },
                LodLevel {
                    lod: 4,
                    visible_distance_threshold: 600.0,
                    use_for_collision: false,
                },
            ],
            height_curve: Vec::new(),
            color_ramp: Vec::new(),
        }
    }
}

impl TerrainConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the document is malformed or the
    /// settings are structurally inconsistent.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks structural consistency.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolution < 2 {
            return Err(ConfigError::ResolutionTooSmall {
                resolution: self.resolution,
            });
        }
        if self.detail_levels.is_empty() {
            return Err(ConfigError::DetailLevelsEmpty);
        }

        let mut previous = f32::NEG_INFINITY;
        for (index, level) in self.detail_levels.iter().enumerate() {
            if level.visible_distance_threshold <= previous {
                return Err(ConfigError::UnorderedDetailLevels { index });
            }
            previous = level.visible_distance_threshold;

            let stride = lod_stride(level.lod);
            if self.chunk_size() % stride != 0 {
                return Err(ConfigError::StrideIncompatible {
                    lod: level.lod,
                    stride,
                    chunk_size: self.chunk_size(),
                });
            }
        }

        if self
            .detail_levels
            .iter()
            .filter(|level| level.use_for_collision)
            .count()
            > 1
        {
            return Err(ConfigError::MultipleCollisionLevels);
        }

        Ok(())
    }

    /// Chunk footprint in grid cells (and world units) per side.
    #[inline]
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.resolution - 1
    }

    /// Field side length including the seam border ring.
    #[inline]
    #[must_use]
    pub const fn bordered_resolution(&self) -> usize {
        self.resolution + 2
    }

    /// Farthest distance at which any chunk is visible: the last
    /// detail level's threshold.
    #[must_use]
    pub fn max_view_distance(&self) -> f32 {
        self.detail_levels
            .last()
            .map_or(0.0, |level| level.visible_distance_threshold)
    }

    /// Index of the detail level flagged for collision, if any.
    #[must_use]
    pub fn collision_level(&self) -> Option<usize> {
        self.detail_levels
            .iter()
            .position(|level| level.use_for_collision)
    }

    /// Noise parameters for a field sampled at the given world-space
    /// offset.
    #[must_use]
    pub fn noise_parameters(&self, offset: Vec2) -> NoiseParameters {
        NoiseParameters {
            seed: TerrainSeed::new(self.seed),
            scale: self.scale,
            octaves: self.octaves,
            persistence: self.persistence,
            lacunarity: self.lacunarity,
            offset,
            normalize_mode: self.normalize.into(),
        }
    }

    /// The configured height remap curve, or `None` when unbound.
    #[must_use]
    pub fn curve(&self) -> Option<Curve> {
        Curve::new(
            self.height_curve
                .iter()
                .map(|&CurvePointConfig(x, y)| CurvePoint { x, y })
                .collect(),
        )
    }

    /// The configured color ramp, or `None` when unbound.
    #[must_use]
    pub fn ramp(&self) -> Option<ColorRamp> {
        ColorRamp::new(
            self.color_ramp
                .iter()
                .map(|stop| RampStop {
                    position: stop.position,
                    color: Rgba8::new(stop.color[0], stop.color[1], stop.color[2]),
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_valid_default() {
        let config = TerrainConfig::from_toml_str("").unwrap();
        assert_eq!(config.resolution, 241);
        assert_eq!(config.chunk_size(), 240);
        assert_eq!(config.bordered_resolution(), 243);
        assert_eq!(config.max_view_distance(), 600.0);
        assert!(config.curve().is_none());
        assert!(config.ramp().is_none());
        assert!(config.collision_level().is_none());
    }

    #[test]
    fn test_full_document_round_trip() {
        let source = r#"
            seed = 7
            scale = 30.0
            octaves = 5
            resolution = 121
            height_scale = 12.0
            use_falloff = true
            normalize = "local"
            max_resident_chunks = 64

            height_curve = [[0.0, 0.0], [0.4, 0.05], [1.0, 1.0]]

            [[detail_levels]]
            lod = 0
            visible_distance_threshold = 150.0
            use_for_collision = true

            [[detail_levels]]
            lod = 3
            visible_distance_threshold = 300.0

            [[color_ramp]]
            position = 0.0
            color = [0, 0, 200]

            [[color_ramp]]
            position = 1.0
            color = [255, 255, 255]
        "#;
        let config = TerrainConfig::from_toml_str(source).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.chunk_size(), 120);
        assert_eq!(config.collision_level(), Some(0));
        assert_eq!(config.max_view_distance(), 300.0);
        assert!(config.curve().is_some());
        assert!(config.ramp().is_some());
        assert_eq!(config.normalize, NormalizeConfig::Local);
        assert_eq!(config.max_resident_chunks, Some(64));
    }

    #[test]
    fn test_empty_detail_levels_rejected() {
        let mut config = TerrainConfig::default();
        config.detail_levels.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DetailLevelsEmpty)
        ));
    }

    #[test]
    fn test_unordered_detail_levels_rejected() {
        let mut config = TerrainConfig::default();
        config.detail_levels[1].visible_distance_threshold = 100.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnorderedDetailLevels { index: 1 })
        ));
    }

    #[test]
    fn test_multiple_collision_levels_rejected() {
        let mut config = TerrainConfig::default();
        config.detail_levels[0].use_for_collision = true;
        config.detail_levels[1].use_for_collision = true;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MultipleCollisionLevels)
        ));
    }

    #[test]
    fn test_incompatible_stride_rejected() {
        let mut config = TerrainConfig::default();
        // Chunk size 240 divides by every even stride up to 12, so use
        // a resolution whose span a lod-2 stride cannot tile.
        config.resolution = 26;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::StrideIncompatible {
                lod: 2,
                stride: 4,
                chunk_size: 25,
            })
        ));
    }

    #[test]
    fn test_noise_parameters_carry_offset() {
        let config = TerrainConfig::default();
        let params = config.noise_parameters(Vec2::new(240.0, -240.0));
        assert_eq!(params.offset, Vec2::new(240.0, -240.0));
        assert_eq!(params.seed.value(), 0);
        assert_eq!(params.normalize_mode, NormalizeMode::Global);
    }
}
