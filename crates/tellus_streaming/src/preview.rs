//! # Editor Preview
//!
//! Single-map rendering for tuning parameters before streaming: a
//! grayscale noise image, a classified color image, or one meshed
//! chunk, generated synchronously from the configured settings.

use glam::Vec3;

use tellus_procedural::color::ColorField;
use tellus_procedural::mesh::build_terrain_mesh;
use tellus_procedural::texture::TerrainImage;

use crate::chunk::ChunkCoord;
use crate::config::TerrainConfig;
use crate::host::TerrainHost;
use crate::scheduler::GenerationRecipe;

/// What the editor preview draws.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DrawMode {
    /// Grayscale heightfield image.
    #[default]
    NoiseMap,
    /// Ramp-classified color image.
    ColorMap,
    /// One meshed chunk at the configured preview LOD.
    Mesh,
}

/// Generates and presents a single-chunk preview on the host.
///
/// Returns `false` (after logging a warning) when the mode needs a
/// curve or ramp the configuration leaves unbound, or when the preview
/// LOD cannot tile the configured resolution.
pub fn render_preview<H: TerrainHost>(
    config: &TerrainConfig,
    mode: DrawMode,
    host: &mut H,
) -> bool {
    let recipe = GenerationRecipe::new(config);
    let field = recipe.generate_field(ChunkCoord::new(0, 0));

    match mode {
        DrawMode::NoiseMap => {
            host.display_image(&TerrainImage::from_heightfield(&field));
            true
        }
        DrawMode::ColorMap => {
            let Some(ramp) = config.ramp() else {
                tracing::warn!("color ramp unbound, skipping color preview");
                return false;
            };
            let colors = ColorField::classify(&field, &ramp);
            host.display_image(&TerrainImage::from_color_field(&colors));
            true
        }
        DrawMode::Mesh => {
            let Some(curve) = config.curve() else {
                tracing::warn!("height curve unbound, skipping mesh preview");
                return false;
            };
            match build_terrain_mesh(
                &field,
                config.height_scale,
                &curve,
                config.editor_preview_lod,
            ) {
                Ok(mesh) => {
                    let handle = host.attach_chunk(ChunkCoord::new(0, 0), Vec3::ZERO);
                    host.upload_mesh(handle, &mesh);
                    host.set_visible(handle, true);
                    true
                }
                Err(error) => {
                    tracing::warn!(%error, "preview mesh build failed");
                    false
                }
            }
        }
    }
}
