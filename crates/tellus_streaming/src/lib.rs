//! # TELLUS Streaming
//!
//! Viewer-driven terrain chunk streaming over the deterministic
//! generators in `tellus_procedural`.
//!
//! ## Architecture
//!
//! ```text
//! TerrainConfig (TOML)
//!        |
//!        v
//! ChunkScheduler::update(host, viewer)   <- once per frame
//!        |                \
//!        |                 \-- WorkQueue workers:
//!        |                       heightfields, LOD meshes,
//!        |                       collision shapes
//!        v
//! TerrainHost (renderer / physics / tests)
//! ```
//!
//! The scheduler owns all chunk state; the host is a passive sink of
//! attach / upload / visibility / collision calls. Everything the
//! workers produce is deterministic, so the streamed world depends
//! only on the seed, the settings, and the viewer's path.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod chunk;
pub mod config;
pub mod host;
pub mod preview;
pub mod scheduler;
pub mod work_queue;

pub use chunk::{box_distance, ChunkCoord, ChunkState, CollisionState};
pub use config::{
    ConfigError, CurvePointConfig, LodLevel, NormalizeConfig, RampStopConfig, TerrainConfig,
};
pub use host::{ChunkHandle, CollisionShape, GeometryError, TerrainHost};
pub use preview::{render_preview, DrawMode};
pub use scheduler::{select_lod, ChunkScheduler, SchedulerStats};
pub use work_queue::WorkQueue;
