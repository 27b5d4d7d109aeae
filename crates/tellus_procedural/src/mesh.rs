//! # LOD Mesh Construction
//!
//! Converts a bordered heightfield into an indexed triangle mesh at a
//! selectable decimation level, with correct vertex normals across
//! chunk seams.
//!
//! ## Border geometry
//!
//! The input field carries one extra ring of samples around the
//! logical chunk. Lattice points on that ring become *border vertices*:
//! they participate in normal accumulation (so edge normals account
//! for the neighboring chunk's slope) but are never emitted in the
//! final vertex/index buffers. References are tagged
//! [`VertexRef::Interior`] / [`VertexRef::Border`] - no sentinel index
//! encoding.
//!
//! ## Decimation
//!
//! `stride = if lod == 0 { 1 } else { 2 * lod }`; only interior grid
//! points on the stride lattice become mesh vertices. The border ring
//! stays exactly one cell out at every LOD, so a single heightfield
//! serves all LODs of a chunk. Winding order is fixed and identical
//! across LODs, keeping face orientation stable when swapping meshes
//! at runtime.

use glam::{Vec2, Vec3};

use bytemuck::{Pod, Zeroable};
use thiserror::Error;

use crate::color::Curve;
use crate::heightfield::Heightfield;

/// Mesh construction failures.
///
/// These indicate configuration bugs (bad resolution/LOD pairing), not
/// runtime conditions; the standard 241-vertex resolution divides
/// cleanly for every LOD 0..=6.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// The field is too small to carry a border plus interior geometry.
    #[error("field {width}x{height} too small for bordered meshing (minimum 4x4)")]
    FieldTooSmall {
        /// Field width in samples.
        width: usize,
        /// Field height in samples.
        height: usize,
    },

    /// The LOD stride does not divide the interior grid span.
    #[error("stride {stride} does not divide interior span {span}")]
    StrideMismatch {
        /// Vertex stride derived from the LOD.
        stride: usize,
        /// Interior grid span (interior size - 1).
        span: usize,
    },
}

/// Derives the vertex stride for a LOD index.
#[inline]
#[must_use]
pub const fn lod_stride(lod: u32) -> usize {
    if lod == 0 {
        1
    } else {
        (2 * lod) as usize
    }
}

/// Reference to a mesh lattice vertex.
///
/// Border vertices are ghost geometry: positions that exist only to
/// pass slope influence to adjacent interior vertices during normal
/// accumulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexRef {
    /// Index into the emitted vertex buffer.
    Interior(u32),
    /// Index into the border-only vertex list.
    Border(u32),
}

/// Interleaved GPU-friendly vertex for renderer handoff.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct PackedVertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Unit vertex normal.
    pub normal: [f32; 3],
    /// Texture coordinate over the chunk footprint.
    pub uv: [f32; 2],
}

/// Indexed triangle mesh with auxiliary border geometry.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    /// Emitted vertex positions.
    vertices: Vec<Vec3>,
    /// Emitted texture coordinates, parallel to `vertices`.
    uvs: Vec<Vec2>,
    /// Unit vertex normals, parallel to `vertices`.
    normals: Vec<Vec3>,
    /// Triangle vertex indices, in groups of three.
    indices: Vec<u32>,
    /// Border-only ghost vertex positions (never emitted).
    border_vertices: Vec<Vec3>,
    /// Triangles touching at least one border vertex (never emitted;
    /// used only for normal accumulation).
    border_triangles: Vec<[VertexRef; 3]>,
}

impl MeshData {
    /// Emitted vertex positions.
    #[inline]
    #[must_use]
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Emitted texture coordinates.
    #[inline]
    #[must_use]
    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    /// Unit vertex normals.
    #[inline]
    #[must_use]
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Triangle vertex indices, three per triangle.
    #[inline]
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of emitted vertices.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of emitted triangles.
    #[inline]
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Packs the emitted geometry into interleaved POD vertices.
    #[must_use]
    pub fn packed_vertices(&self) -> Vec<PackedVertex> {
        self.vertices
            .iter()
            .zip(&self.normals)
            .zip(&self.uvs)
            .map(|((position, normal), uv)| PackedVertex {
                position: position.to_array(),
                normal: normal.to_array(),
                uv: uv.to_array(),
            })
            .collect()
    }

    /// Records a triangle, routing it to the emitted index buffer or,
    /// when any corner is a border vertex, to the ghost triangle list.
    fn add_triangle(&mut self, a: VertexRef, b: VertexRef, c: VertexRef) {
        if let (VertexRef::Interior(ia), VertexRef::Interior(ib), VertexRef::Interior(ic)) =
            (a, b, c)
        {
            self.indices.extend([ia, ib, ic]);
        } else {
            self.border_triangles.push([a, b, c]);
        }
    }

    /// Resolves a vertex reference to its position.
    fn position_of(&self, vertex: VertexRef) -> Vec3 {
        match vertex {
            VertexRef::Interior(i) => self.vertices[i as usize],
            VertexRef::Border(i) => self.border_vertices[i as usize],
        }
    }

    /// Computes per-vertex normals from face normals.
    ///
    /// Border triangles contribute their face normal to any interior
    /// corner, which is what keeps lighting continuous across
    /// independently generated chunks. Degenerate (zero-area)
    /// triangles contribute nothing - the guarded normalization never
    /// produces NaNs.
    fn bake_normals(&mut self) {
        let mut accumulated = vec![Vec3::ZERO; self.vertices.len()];

        for triangle in self.indices.chunks_exact(3) {
            let (ia, ib, ic) = (triangle[0], triangle[1], triangle[2]);
            let normal = face_normal(
                self.vertices[ia as usize],
                self.vertices[ib as usize],
                self.vertices[ic as usize],
            );
            accumulated[ia as usize] += normal;
            accumulated[ib as usize] += normal;
            accumulated[ic as usize] += normal;
        }

        for triangle in &self.border_triangles {
            let normal = face_normal(
                self.position_of(triangle[0]),
                self.position_of(triangle[1]),
                self.position_of(triangle[2]),
            );
            for corner in triangle {
                if let VertexRef::Interior(i) = corner {
                    accumulated[*i as usize] += normal;
                }
            }
        }

        self.normals = accumulated
            .into_iter()
            .map(|n| n.try_normalize().unwrap_or(Vec3::Y))
            .collect();
    }
}

/// Area-weighted face normal; zero for degenerate triangles.
#[inline]
fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a).try_normalize().unwrap_or(Vec3::ZERO)
}

/// Builds the stride lattice for one axis of a bordered field: the
/// border sample 0, interior samples `1 + k * stride`, and the border
/// sample `bordered - 1`.
fn axis_lattice(bordered: usize, stride: usize) -> Vec<usize> {
    let mut lattice = Vec::with_capacity((bordered - 3) / stride + 3);
    lattice.push(0);
    let mut position = 1;
    while position <= bordered - 2 {
        lattice.push(position);
        position += stride;
    }
    lattice.push(bordered - 1);
    lattice
}

/// Converts a bordered heightfield into an indexed triangle mesh.
///
/// `field` must include the 1-cell border ring; the emitted geometry
/// covers only the interior. Per-vertex height is
/// `curve.sample(normalized_height) * height_scale`. The mesh is
/// centered on the XZ origin with +X right and grid rows descending in
/// Z, matching the world layout the chunk scheduler assumes.
///
/// # Errors
///
/// [`MeshError::FieldTooSmall`] for fields without room for border plus
/// interior; [`MeshError::StrideMismatch`] when the LOD stride does not
/// divide the interior span.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn build_terrain_mesh(
    field: &Heightfield,
    height_scale: f32,
    curve: &Curve,
    lod: u32,
) -> Result<MeshData, MeshError> {
    let stride = lod_stride(lod);
    let (bordered_w, bordered_h) = (field.width(), field.height());
    if bordered_w < 4 || bordered_h < 4 {
        return Err(MeshError::FieldTooSmall {
            width: bordered_w,
            height: bordered_h,
        });
    }

    let interior_w = bordered_w - 2;
    let interior_h = bordered_h - 2;
    for span in [interior_w - 1, interior_h - 1] {
        if span % stride != 0 {
            return Err(MeshError::StrideMismatch { stride, span });
        }
    }

    let lattice_x = axis_lattice(bordered_w, stride);
    let lattice_y = axis_lattice(bordered_h, stride);

    let top_left_x = -((interior_w - 1) as f32) / 2.0;
    let top_left_z = ((interior_h - 1) as f32) / 2.0;

    let mut mesh = MeshData::default();
    let mut refs = Vec::with_capacity(lattice_x.len() * lattice_y.len());

    for &gy in &lattice_y {
        for &gx in &lattice_x {
            let on_border =
                gx == 0 || gy == 0 || gx == bordered_w - 1 || gy == bordered_h - 1;

            let elevation = curve.sample(field.get(gx, gy)) * height_scale;
            let position = Vec3::new(
                top_left_x + (gx as f32 - 1.0),
                elevation,
                top_left_z - (gy as f32 - 1.0),
            );

            if on_border {
                refs.push(VertexRef::Border(mesh.border_vertices.len() as u32));
                mesh.border_vertices.push(position);
            } else {
                refs.push(VertexRef::Interior(mesh.vertices.len() as u32));
                mesh.vertices.push(position);
                mesh.uvs.push(Vec2::new(
                    (gx - 1) as f32 / (interior_w - 1) as f32,
                    (gy - 1) as f32 / (interior_h - 1) as f32,
                ));
            }
        }
    }

    let columns = lattice_x.len();
    for row in 0..lattice_y.len() - 1 {
        for col in 0..columns - 1 {
            let a = refs[row * columns + col];
            let b = refs[row * columns + col + 1];
            let c = refs[(row + 1) * columns + col];
            let d = refs[(row + 1) * columns + col + 1];

            // Fixed winding, identical at every LOD.
            mesh.add_triangle(a, d, c);
            mesh.add_triangle(d, a, b);
        }
    }

    mesh.bake_normals();
    Ok(mesh)
}
