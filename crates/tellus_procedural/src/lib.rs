//! # TELLUS Procedural Generation
//!
//! Deterministic terrain mathematics: fractal noise heightfields, LOD
//! mesh construction, and height classification.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed always produces the same terrain
//! 2. **Pure**: No threads, no host types - just math over grids
//! 3. **Chunk-aware**: Bordered fields and ghost border geometry keep
//!    independently generated chunks seamless
//! 4. **Forgiving**: Degenerate parameters are clamped, never fatal
//!
//! ## Core Components
//!
//! - `noise`: seedable fractal gradient-noise heightfield synthesis
//! - `falloff`: island-shaping boundary suppression
//! - `mesh`: LOD decimation with seam-free border normals
//! - `color`: height -> color ramp and height remap curves
//! - `texture`: RGBA8 buffers for external visualization
//!
//! ## Example
//!
//! ```rust,ignore
//! use tellus_procedural::{
//!     build_terrain_mesh, generate, Curve, NoiseParameters,
//! };
//!
//! let field = generate(243, 243, &NoiseParameters::default());
//! let mesh = build_terrain_mesh(&field, 20.0, &Curve::identity(), 0)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod color;
pub mod falloff;
pub mod heightfield;
pub mod mesh;
pub mod noise;
pub mod texture;

pub use color::{ColorField, ColorRamp, Curve, CurvePoint, RampStop, Rgba8};
pub use falloff::FalloffMask;
pub use heightfield::{inverse_lerp, Heightfield};
pub use mesh::{build_terrain_mesh, lod_stride, MeshData, MeshError, PackedVertex, VertexRef};
pub use noise::{generate, GradientNoise, NoiseParameters, NormalizeMode, TerrainSeed};
pub use texture::TerrainImage;
