//! # Host Integration
//!
//! The scheduler never talks to a renderer or physics engine directly;
//! it drives a [`TerrainHost`] implementation. A game engine maps
//! these calls onto scene nodes and collider resources; tests record
//! them.

use glam::Vec3;
use thiserror::Error;

use tellus_procedural::mesh::MeshData;
use tellus_procedural::texture::TerrainImage;

use crate::chunk::ChunkCoord;

/// Opaque host-side identifier for an attached chunk.
///
/// Minted by [`TerrainHost::attach_chunk`] and passed back on every
/// subsequent call for that chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkHandle(pub u64);

/// Collision shape derivation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// The source mesh has no triangles.
    #[error("collision source mesh has no triangles")]
    EmptyMesh,

    /// A vertex position is not finite.
    #[error("collision source vertex {index} is not finite")]
    NonFiniteVertex {
        /// Index of the offending vertex.
        index: usize,
    },
}

/// Triangle-soup collision shape derived from a terrain mesh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollisionShape {
    /// Vertex positions.
    pub vertices: Vec<Vec3>,
    /// Triangle vertex indices, three per triangle.
    pub indices: Vec<u32>,
}

impl CollisionShape {
    /// Derives a collision shape from a terrain mesh.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] when the mesh is empty or carries
    /// non-finite positions; physics engines reject both.
    pub fn from_mesh(mesh: &MeshData) -> Result<Self, GeometryError> {
        if mesh.indices().is_empty() {
            return Err(GeometryError::EmptyMesh);
        }
        for (index, vertex) in mesh.vertices().iter().enumerate() {
            if !vertex.is_finite() {
                return Err(GeometryError::NonFiniteVertex { index });
            }
        }
        Ok(Self {
            vertices: mesh.vertices().to_vec(),
            indices: mesh.indices().to_vec(),
        })
    }

    /// Number of triangles in the shape.
    #[inline]
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Renderer/physics side of terrain streaming.
///
/// The scheduler calls these in a fixed discipline: `attach_chunk`
/// once per chunk, then any number of `upload_mesh` /
/// `set_visible` / `set_collision_shape` calls, then at most one
/// `detach_chunk` (eviction). After detach the handle is dead.
pub trait TerrainHost {
    /// Creates the host-side object for a chunk at the given world
    /// position and returns its handle.
    fn attach_chunk(&mut self, coord: ChunkCoord, world_position: Vec3) -> ChunkHandle;

    /// Replaces the chunk's rendered mesh.
    fn upload_mesh(&mut self, handle: ChunkHandle, mesh: &MeshData);

    /// Replaces the chunk's surface texture (the classified color
    /// map, shared by every LOD of the chunk).
    fn upload_texture(&mut self, handle: ChunkHandle, image: &TerrainImage);

    /// Shows or hides the chunk.
    fn set_visible(&mut self, handle: ChunkHandle, visible: bool);

    /// Attaches a collision shape to the chunk.
    fn set_collision_shape(&mut self, handle: ChunkHandle, shape: &CollisionShape);

    /// Destroys the host-side object for an evicted chunk.
    fn detach_chunk(&mut self, handle: ChunkHandle);

    /// Presents a standalone image (editor preview modes).
    fn display_image(&mut self, image: &TerrainImage);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tellus_procedural::color::Curve;
    use tellus_procedural::heightfield::Heightfield;
    use tellus_procedural::mesh::build_terrain_mesh;

    #[test]
    fn test_collision_shape_from_mesh() {
        let mut field = Heightfield::new(6, 6);
        field.fill(0.5);
        let mesh = build_terrain_mesh(&field, 10.0, &Curve::identity(), 0).unwrap();
        let shape = CollisionShape::from_mesh(&mesh).unwrap();
        assert_eq!(shape.vertices.len(), mesh.vertex_count());
        assert_eq!(shape.triangle_count(), mesh.triangle_count());
    }

    #[test]
    fn test_empty_mesh_rejected() {
        let mesh = MeshData::default();
        assert_eq!(
            CollisionShape::from_mesh(&mesh),
            Err(GeometryError::EmptyMesh)
        );
    }
}
