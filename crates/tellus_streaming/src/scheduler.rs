//! # Chunk Streaming Scheduler
//!
//! Viewer-driven streaming: decides which chunks exist, which are
//! visible, at what detail level each renders, and feeds the
//! background queue that generates heightfields, meshes, and collision
//! shapes.
//!
//! ## Update discipline
//!
//! Every [`ChunkScheduler::update`] call:
//!
//! 1. Drains finished background work and integrates it, re-evaluating
//!    any chunk whose data just arrived.
//! 2. If the viewer moved beyond the movement threshold, rescans the
//!    visibility window around the viewer's chunk.
//! 3. Evicts least-recently-visible chunks when a residency cap is
//!    configured.
//!
//! Distances are measured from the viewer to each chunk's *footprint*
//! (an axis-aligned box), so LOD rings stay stable while the viewer
//! crosses a chunk interior.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use glam::{Vec2, Vec3};

use tellus_procedural::color::{ColorField, ColorRamp, Curve};
use tellus_procedural::falloff::FalloffMask;
use tellus_procedural::heightfield::Heightfield;
use tellus_procedural::mesh::{build_terrain_mesh, MeshData, MeshError};
use tellus_procedural::noise;
use tellus_procedural::texture::TerrainImage;

use crate::chunk::{box_distance, ChunkCoord, ChunkState, CollisionState, TerrainChunk};
use crate::config::{ConfigError, LodLevel, TerrainConfig};
use crate::host::{CollisionShape, GeometryError, TerrainHost};
use crate::work_queue::WorkQueue;

/// One finished unit of background work.
enum WorkResult {
    /// A chunk's bordered heightfield and interior classification.
    Heightfield {
        coord: ChunkCoord,
        field: Heightfield,
        colors: Option<ColorField>,
    },
    /// A chunk's mesh at one detail level.
    Mesh {
        coord: ChunkCoord,
        lod_index: usize,
        mesh: Result<MeshData, MeshError>,
    },
    /// A chunk's collision shape bake.
    Collision {
        coord: ChunkCoord,
        shape: Result<CollisionShape, GeometryError>,
    },
}

/// Everything a worker needs to generate chunk data, shared immutably
/// across the pool.
pub(crate) struct GenerationRecipe {
    /// Validated settings snapshot.
    config: TerrainConfig,
    /// Border suppression mask, precomputed once when enabled.
    falloff: Option<FalloffMask>,
    /// Height remap curve, `None` when unbound in config.
    curve: Option<Curve>,
    /// Color ramp for chunk textures, `None` when unbound in config.
    ramp: Option<ColorRamp>,
}

impl GenerationRecipe {
    pub(crate) fn new(config: &TerrainConfig) -> Self {
        let falloff = config
            .use_falloff
            .then(|| FalloffMask::generate(config.bordered_resolution()));
        Self {
            config: config.clone(),
            falloff,
            curve: config.curve(),
            ramp: config.ramp(),
        }
    }

    /// Generates the bordered heightfield for one chunk.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn generate_field(&self, coord: ChunkCoord) -> Heightfield {
        let center = coord.world_center(self.config.chunk_size() as f32);
        let size = self.config.bordered_resolution();
        let mut field = noise::generate(size, size, &self.config.noise_parameters(center));
        if let Some(mask) = &self.falloff {
            field.apply_falloff(mask);
        }
        field
    }

    /// Classifies the chunk's interior (the footprint without the
    /// border ring) through the configured ramp, or `None` when the
    /// ramp is unbound.
    pub(crate) fn classify_interior(&self, field: &Heightfield) -> Option<ColorField> {
        let ramp = self.ramp.as_ref()?;
        let interior = field.window(1, 1, self.config.resolution, self.config.resolution);
        Some(ColorField::classify(&interior, ramp))
    }
}

/// Selects the detail level for a chunk at the given distance: the
/// first level whose threshold covers it, or `None` beyond the last.
#[must_use]
pub fn select_lod(levels: &[LodLevel], distance: f32) -> Option<usize> {
    levels
        .iter()
        .position(|level| distance <= level.visible_distance_threshold)
}

/// Counters returned by each scheduler update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Chunks currently tracked (attached on the host).
    pub tracked_chunks: usize,
    /// Chunks currently visible.
    pub visible_chunks: usize,
    /// Background jobs submitted but not yet integrated.
    pub pending_jobs: usize,
    /// Results integrated during this update.
    pub integrated_results: usize,
    /// Chunks evicted during this update.
    pub evicted_chunks: usize,
}

/// Viewer-driven chunk streaming scheduler.
pub struct ChunkScheduler {
    /// Chunk footprint side length in world units.
    chunk_size: f32,
    /// Half the footprint, for box-distance queries.
    half_extents: Vec2,
    /// LOD distance table, nearest first.
    detail_levels: Vec<LodLevel>,
    /// Index of the collision detail level, if any.
    collision_level: Option<usize>,
    /// World height multiplier for mesh builds.
    height_scale: f32,
    /// Chunks beyond this distance are hidden.
    max_view_distance: f32,
    /// Scan radius in chunks around the viewer.
    chunks_visible: i32,
    /// Squared viewer movement required to trigger a rescan.
    movement_threshold_sq: f32,
    /// Residency cap; `None` disables eviction.
    max_resident: Option<usize>,
    /// Shared generation inputs for workers.
    recipe: Arc<GenerationRecipe>,
    /// Background worker pool.
    queue: WorkQueue<WorkResult>,
    /// All tracked chunks.
    chunks: HashMap<ChunkCoord, TerrainChunk>,
    /// Chunks visible after the latest scan.
    visible: Vec<ChunkCoord>,
    /// Viewer position at the last accepted rescan.
    last_viewer: Option<Vec2>,
    /// Monotonic update counter, drives eviction recency.
    tick: u64,
    /// The unbound-curve warning fires once, not per chunk.
    warned_missing_curve: bool,
    /// The unbound-ramp warning fires once, not per chunk.
    warned_missing_ramp: bool,
}

impl ChunkScheduler {
    /// Creates a scheduler over a validated configuration with the
    /// given number of background workers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration is structurally
    /// inconsistent.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn new(config: &TerrainConfig, workers: usize) -> Result<Self, ConfigError> {
        config.validate()?;

        let chunk_size = config.chunk_size() as f32;
        let max_view_distance = config.max_view_distance();
        let chunks_visible = (max_view_distance / chunk_size).round() as i32;

        tracing::info!(
            chunk_size,
            max_view_distance,
            chunks_visible,
            workers,
            "terrain scheduler ready"
        );

        Ok(Self {
            chunk_size,
            half_extents: Vec2::splat(chunk_size / 2.0),
            detail_levels: config.detail_levels.clone(),
            collision_level: config.collision_level(),
            height_scale: config.height_scale,
            max_view_distance,
            chunks_visible,
            movement_threshold_sq: config.movement_threshold * config.movement_threshold,
            max_resident: config.max_resident_chunks,
            recipe: Arc::new(GenerationRecipe::new(config)),
            queue: WorkQueue::new(workers),
            chunks: HashMap::new(),
            visible: Vec::new(),
            last_viewer: None,
            tick: 0,
            warned_missing_curve: false,
            warned_missing_ramp: false,
        })
    }

    /// Runs one streaming update for the given viewer position.
    pub fn update<H: TerrainHost>(&mut self, host: &mut H, viewer: Vec2) -> SchedulerStats {
        self.tick += 1;

        let results = self.queue.drain();
        let integrated = results.len();
        for result in results {
            self.integrate(host, result);
        }

        let moved = self
            .last_viewer
            .map_or(true, |last| {
                last.distance_squared(viewer) > self.movement_threshold_sq
            });
        if moved {
            self.last_viewer = Some(viewer);
            self.scan(host, viewer);
        }

        let evicted = self.evict(host);

        SchedulerStats {
            tracked_chunks: self.chunks.len(),
            visible_chunks: self.visible.len(),
            pending_jobs: self.queue.pending(),
            integrated_results: integrated,
            evicted_chunks: evicted,
        }
    }

    /// Updates repeatedly until the background queue is quiet and no
    /// results remain, then returns the final stats. Test and shutdown
    /// helper; real hosts call [`ChunkScheduler::update`] per frame.
    pub fn flush<H: TerrainHost>(&mut self, host: &mut H, viewer: Vec2) -> SchedulerStats {
        loop {
            let stats = self.update(host, viewer);
            if stats.pending_jobs == 0 && stats.integrated_results == 0 {
                return stats;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    /// Number of chunks currently tracked.
    #[must_use]
    pub fn tracked_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// Coordinates visible after the latest scan.
    #[must_use]
    pub fn visible_chunks(&self) -> &[ChunkCoord] {
        &self.visible
    }

    /// Snapshot of one chunk's streaming state.
    #[must_use]
    pub fn chunk_state(&self, coord: ChunkCoord) -> Option<ChunkState> {
        self.chunks.get(&coord).map(TerrainChunk::state)
    }

    /// Applies one finished background result.
    fn integrate<H: TerrainHost>(&mut self, host: &mut H, result: WorkResult) {
        match result {
            WorkResult::Heightfield {
                coord,
                field,
                colors,
            } => {
                if let Some(chunk) = self.chunks.get_mut(&coord) {
                    chunk.heightfield = Some(Arc::new(field));
                    if let Some(colors) = colors {
                        host.upload_texture(
                            chunk.handle,
                            &TerrainImage::from_color_field(&colors),
                        );
                        chunk.colors = Some(colors);
                    } else if !self.warned_missing_ramp {
                        self.warned_missing_ramp = true;
                        tracing::warn!("color ramp unbound, chunk textures skipped");
                    }
                }
                // Fresh data may unlock a mesh or collision request.
                if let Some(viewer) = self.last_viewer {
                    self.refresh_chunk(host, coord, viewer);
                }
            }
            WorkResult::Mesh {
                coord,
                lod_index,
                mesh,
            } => match mesh {
                Ok(mesh) => {
                    if let Some(chunk) = self.chunks.get_mut(&coord) {
                        chunk.lod_meshes[lod_index].mesh = Some(Arc::new(mesh));
                    }
                    if let Some(viewer) = self.last_viewer {
                        self.refresh_chunk(host, coord, viewer);
                    }
                }
                Err(error) => {
                    tracing::error!(?coord, lod_index, %error, "chunk mesh build failed, not retrying");
                }
            },
            WorkResult::Collision { coord, shape } => {
                let Some(chunk) = self.chunks.get_mut(&coord) else {
                    return;
                };
                match shape {
                    Ok(shape) => {
                        host.set_collision_shape(chunk.handle, &shape);
                        chunk.collision = CollisionState::Attached;
                    }
                    Err(error) => {
                        chunk.collision = CollisionState::Failed;
                        tracing::warn!(?coord, %error, "collision bake failed, not retrying");
                    }
                }
            }
        }
    }

    /// Rescans the visibility window around the viewer.
    fn scan<H: TerrainHost>(&mut self, host: &mut H, viewer: Vec2) {
        for coord in std::mem::take(&mut self.visible) {
            if let Some(chunk) = self.chunks.get_mut(&coord) {
                if chunk.visible {
                    chunk.visible = false;
                    host.set_visible(chunk.handle, false);
                }
            }
        }

        let origin = ChunkCoord::from_world(viewer, self.chunk_size);
        for dy in -self.chunks_visible..=self.chunks_visible {
            for dx in -self.chunks_visible..=self.chunks_visible {
                let coord = ChunkCoord::new(origin.x + dx, origin.y + dy);
                self.ensure_attached(host, coord);
                self.refresh_chunk(host, coord, viewer);
            }
        }
    }

    /// Attaches a chunk on the host if it is not tracked yet, issuing
    /// its heightfield generation immediately: even chunks beyond the
    /// view distance start generating on creation, so the data is
    /// ready by the time the viewer approaches.
    fn ensure_attached<H: TerrainHost>(&mut self, host: &mut H, coord: ChunkCoord) {
        if self.chunks.contains_key(&coord) {
            return;
        }
        let center = coord.world_center(self.chunk_size);
        let handle = host.attach_chunk(coord, Vec3::new(center.x, 0.0, center.y));
        tracing::debug!(?coord, ?handle, "chunk attached");
        self.chunks.insert(
            coord,
            TerrainChunk::new(coord, handle, center, self.detail_levels.len()),
        );

        let recipe = Arc::clone(&self.recipe);
        self.queue.submit(move || {
            let field = recipe.generate_field(coord);
            let colors = recipe.classify_interior(&field);
            WorkResult::Heightfield {
                coord,
                field,
                colors,
            }
        });
    }

    /// Re-evaluates one chunk: visibility, detail level, and any
    /// background requests its current data allows.
    fn refresh_chunk<H: TerrainHost>(&mut self, host: &mut H, coord: ChunkCoord, viewer: Vec2) {
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };

        let distance = box_distance(viewer, chunk.center, self.half_extents);
        let visible = distance <= self.max_view_distance;

        if visible {
            if let Some(lod_index) = select_lod(&self.detail_levels, distance) {
                let slot = &mut chunk.lod_meshes[lod_index];
                if let Some(mesh) = &slot.mesh {
                    if chunk.uploaded_lod != Some(lod_index) {
                        host.upload_mesh(chunk.handle, mesh);
                        chunk.uploaded_lod = Some(lod_index);
                    }
                } else if !slot.requested {
                    if let Some(field) = &chunk.heightfield {
                        if let Some(curve) = &self.recipe.curve {
                            slot.requested = true;
                            let field = Arc::clone(field);
                            let curve = curve.clone();
                            let height_scale = self.height_scale;
                            let lod = self.detail_levels[lod_index].lod;
                            self.queue.submit(move || WorkResult::Mesh {
                                coord,
                                lod_index,
                                mesh: build_terrain_mesh(&field, height_scale, &curve, lod),
                            });
                        } else if !self.warned_missing_curve {
                            self.warned_missing_curve = true;
                            tracing::warn!("height curve unbound, chunk meshes skipped");
                        }
                    }
                }

                // Collision derives off the already-built mesh for
                // this level, so the bake waits for the mesh to land.
                if self.collision_level == Some(lod_index)
                    && chunk.collision == CollisionState::Missing
                {
                    if let Some(mesh) = &chunk.lod_meshes[lod_index].mesh {
                        chunk.collision = CollisionState::Requested;
                        let mesh = Arc::clone(mesh);
                        self.queue.submit(move || WorkResult::Collision {
                            coord,
                            shape: CollisionShape::from_mesh(&mesh),
                        });
                    }
                }
            }
        }

        if visible != chunk.visible {
            chunk.visible = visible;
            host.set_visible(chunk.handle, visible);
        }
        if visible {
            chunk.last_visible_tick = self.tick;
            if !self.visible.contains(&coord) {
                self.visible.push(coord);
            }
        }
    }

    /// Evicts least-recently-visible invisible chunks past the
    /// residency cap.
    fn evict<H: TerrainHost>(&mut self, host: &mut H) -> usize {
        let Some(cap) = self.max_resident else {
            return 0;
        };

        let mut evicted = 0;
        while self.chunks.len() > cap {
            let candidate = self
                .chunks
                .values()
                .filter(|chunk| !chunk.visible)
                .min_by_key(|chunk| chunk.last_visible_tick)
                .map(|chunk| chunk.coord);
            let Some(coord) = candidate else {
                // Every resident chunk is visible; never evict those.
                break;
            };
            if let Some(chunk) = self.chunks.remove(&coord) {
                host.detach_chunk(chunk.handle);
                tracing::debug!(?coord, "chunk evicted");
                evicted += 1;
            }
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels() -> Vec<LodLevel> {
        vec![
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
        ]
    }

    #[test]
    fn test_select_lod_picks_first_covering_level() {
        assert_eq!(select_lod(&levels(), 0.0), Some(0));
        assert_eq!(select_lod(&levels(), 200.0), Some(0));
        assert_eq!(select_lod(&levels(), 350.0), Some(1));
        assert_eq!(select_lod(&levels(), 600.0), Some(2));
    }

    #[test]
    fn test_select_lod_beyond_table_is_none() {
        assert_eq!(select_lod(&levels(), 600.1), None);
        assert_eq!(select_lod(&[], 0.0), None);
    }

    #[test]
    fn test_recipe_fields_are_deterministic() {
        let config = TerrainConfig {
            resolution: 25,
            octaves: 2,
            ..TerrainConfig::default()
        };
        let recipe = GenerationRecipe::new(&config);
        let a = recipe.generate_field(ChunkCoord::new(1, -2));
        let b = recipe.generate_field(ChunkCoord::new(1, -2));
        assert_eq!(a.values(), b.values());
        assert_eq!(a.width(), config.bordered_resolution());
    }

    #[test]
    fn test_recipe_classifies_interior_when_ramp_bound() {
        use crate::config::RampStopConfig;

        let mut config = TerrainConfig {
            resolution: 25,
            octaves: 2,
            ..TerrainConfig::default()
        };
        let recipe = GenerationRecipe::new(&config);
        let field = recipe.generate_field(ChunkCoord::new(0, 0));
        assert!(recipe.classify_interior(&field).is_none());

        config.color_ramp = vec![
            RampStopConfig {
                position: 0.0,
                color: [0, 0, 200],
            },
            RampStopConfig {
                position: 1.0,
                color: [255, 255, 255],
            },
        ];
        let recipe = GenerationRecipe::new(&config);
        let colors = recipe.classify_interior(&field).unwrap();
        // The classification covers the footprint, not the border ring.
        assert_eq!(colors.width(), 25);
        assert_eq!(colors.height(), 25);
    }

    #[test]
    fn test_recipe_applies_falloff_at_borders() {
        let config = TerrainConfig {
            resolution: 25,
            octaves: 2,
            use_falloff: true,
            ..TerrainConfig::default()
        };
        let recipe = GenerationRecipe::new(&config);
        let field = recipe.generate_field(ChunkCoord::new(0, 0));
        // The falloff mask saturates at the field edge.
        assert_eq!(field.get(0, 0), 0.0);
        assert_eq!(field.get(field.width() - 1, field.height() - 1), 0.0);
    }
}
