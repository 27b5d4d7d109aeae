//! # Chunk Bookkeeping
//!
//! Integer chunk coordinates, the viewer-to-chunk distance field, and
//! the per-chunk record the scheduler keeps while streaming.

use std::sync::Arc;

use glam::Vec2;

use tellus_procedural::color::ColorField;
use tellus_procedural::heightfield::Heightfield;
use tellus_procedural::mesh::MeshData;

use crate::host::ChunkHandle;

/// Integer chunk grid coordinate.
///
/// Chunk `(0, 0)` is centered on the world origin; coordinates grow
/// one per chunk footprint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// Grid column.
    pub x: i32,
    /// Grid row.
    pub y: i32,
}

impl ChunkCoord {
    /// Creates a chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// World-space center of this chunk's footprint.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn world_center(self, chunk_size: f32) -> Vec2 {
        Vec2::new(self.x as f32 * chunk_size, self.y as f32 * chunk_size)
    }

    /// The chunk containing (nearest to) a world position.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_world(position: Vec2, chunk_size: f32) -> Self {
        Self {
            x: (position.x / chunk_size).round() as i32,
            y: (position.y / chunk_size).round() as i32,
        }
    }
}

/// Distance from a point to an axis-aligned box, zero inside.
///
/// The scheduler measures viewer distance against chunk *footprints*,
/// not centers: a viewer standing just outside a chunk's edge is near
/// that chunk no matter how far the center is.
#[inline]
#[must_use]
pub fn box_distance(point: Vec2, center: Vec2, half_extents: Vec2) -> f32 {
    let delta = (point - center).abs() - half_extents;
    delta.max(Vec2::ZERO).length()
}

/// Collision shape lifecycle for one chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CollisionState {
    /// No shape yet and none requested.
    #[default]
    Missing,
    /// A background bake is in flight.
    Requested,
    /// The shape is attached on the host.
    Attached,
    /// Baking failed; never retried automatically.
    Failed,
}

/// Per-LOD mesh slot.
#[derive(Clone, Debug, Default)]
pub(crate) struct LodMeshSlot {
    /// Finished mesh, shared with the host-upload path.
    pub mesh: Option<Arc<MeshData>>,
    /// A background build is in flight or finished. Stays set after a
    /// failed build so the failure is not retried, mirroring
    /// [`CollisionState::Failed`].
    pub requested: bool,
}

/// Everything the scheduler tracks for one chunk.
#[derive(Debug)]
pub(crate) struct TerrainChunk {
    /// Grid coordinate.
    pub coord: ChunkCoord,
    /// Host-side handle from `attach_chunk`.
    pub handle: ChunkHandle,
    /// World-space footprint center.
    pub center: Vec2,
    /// Bordered heightfield once generation finishes.
    pub heightfield: Option<Arc<Heightfield>>,
    /// Interior color classification, present once the heightfield
    /// arrives with a ramp bound.
    pub colors: Option<ColorField>,
    /// One slot per configured detail level.
    pub lod_meshes: Vec<LodMeshSlot>,
    /// Detail level whose mesh is currently uploaded, if any.
    pub uploaded_lod: Option<usize>,
    /// Collision lifecycle.
    pub collision: CollisionState,
    /// Whether the host currently shows this chunk.
    pub visible: bool,
    /// Scheduler tick at which the chunk was last visible. Drives
    /// least-recently-visible eviction.
    pub last_visible_tick: u64,
}

impl TerrainChunk {
    /// Creates a freshly attached chunk with no generated data.
    pub fn new(coord: ChunkCoord, handle: ChunkHandle, center: Vec2, lod_count: usize) -> Self {
        Self {
            coord,
            handle,
            center,
            heightfield: None,
            colors: None,
            lod_meshes: vec![LodMeshSlot::default(); lod_count],
            uploaded_lod: None,
            collision: CollisionState::Missing,
            visible: false,
            last_visible_tick: 0,
        }
    }

    /// Read-only snapshot for callers outside the scheduler.
    pub fn state(&self) -> ChunkState {
        ChunkState {
            coord: self.coord,
            visible: self.visible,
            uploaded_lod: self.uploaded_lod,
            has_heightfield: self.heightfield.is_some(),
            has_color_field: self.colors.is_some(),
            collision: self.collision,
        }
    }
}

/// Public snapshot of one chunk's streaming state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkState {
    /// Grid coordinate.
    pub coord: ChunkCoord,
    /// Whether the host currently shows this chunk.
    pub visible: bool,
    /// Detail level whose mesh is uploaded, if any.
    pub uploaded_lod: Option<usize>,
    /// Whether the heightfield has arrived.
    pub has_heightfield: bool,
    /// Whether the color classification has arrived.
    pub has_color_field: bool,
    /// Collision lifecycle.
    pub collision: CollisionState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_center_scales_by_chunk_size() {
        assert_eq!(
            ChunkCoord::new(2, -1).world_center(240.0),
            Vec2::new(480.0, -240.0)
        );
    }

    #[test]
    fn test_from_world_rounds_to_nearest_chunk() {
        assert_eq!(
            ChunkCoord::from_world(Vec2::new(100.0, -100.0), 240.0),
            ChunkCoord::new(0, 0)
        );
        assert_eq!(
            ChunkCoord::from_world(Vec2::new(130.0, 350.0), 240.0),
            ChunkCoord::new(1, 1)
        );
    }

    #[test]
    fn test_box_distance_outside_face() {
        let d = box_distance(Vec2::new(15.0, 0.0), Vec2::ZERO, Vec2::new(10.0, 10.0));
        assert!((d - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_box_distance_inside_is_zero() {
        let d = box_distance(Vec2::new(3.0, -7.0), Vec2::ZERO, Vec2::new(10.0, 10.0));
        assert_eq!(d, 0.0);
    }

    #[test]
    fn test_box_distance_outside_corner() {
        let d = box_distance(Vec2::new(13.0, 14.0), Vec2::ZERO, Vec2::new(10.0, 10.0));
        assert!((d - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_box_distance_offset_center() {
        let d = box_distance(
            Vec2::new(0.0, 0.0),
            Vec2::new(240.0, 0.0),
            Vec2::new(120.0, 120.0),
        );
        assert!((d - 120.0).abs() < 1e-6);
    }
}
