//! Terrain mesh generation: finite-difference normals, two triangles per
//! grid cell, and a flat tangent basis per triangle, packed into the
//! GPU-facing vertex stream.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use tracing::info;

use crate::gpu::GpuBackend;
use crate::render::cache::{self, ResourceCache};

use super::heightmap::{HeightmapData, TerrainVertexAttribute};

/// Vertex buffer slot carrying the packed terrain stream.
pub const TERRAIN_VERTEX_SLOT: u32 = 0;

/// Vertices emitted per grid cell: two triangles, non-indexed.
pub const VERTICES_PER_CELL: usize = 6;

/// GPU-facing vertex. Written once per terrain load and never mutated on the
/// CPU afterward.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
pub struct PackedVertex {
    pub position: Vec3,
    pub tex_coords: Vec2,
    pub normal: Vec3,
    pub tangent: Vec3,
    pub bitangent: Vec3,
}

/// Fill in per-texel normals with the clamped finite-difference estimate.
///
/// The y component of 2.0 encodes the horizontal-to-height scale the shaders
/// were authored against; changing it changes the lighting.
pub fn compute_normals(data: &mut HeightmapData) {
    let width = data.grid.width();
    let height = data.grid.height();
    for column in 0..width {
        for row in 0..height {
            let c = column as i32;
            let r = row as i32;
            let left = data.grid.sample_clamped(c - 1, r);
            let right = data.grid.sample_clamped(c + 1, r);
            let bottom = data.grid.sample_clamped(c, r - 1);
            let top = data.grid.sample_clamped(c, r + 1);
            let index = data.attribute_index(column, row);
            data.attributes[index].normal =
                Vec3::new(left - right, 2.0, bottom - top).normalize();
        }
    }
}

/// Triangulate the grid into the packed vertex stream.
///
/// Each cell of the `(width-1) x (height-1)` cell grid emits two triangles:
/// {topRight, topLeft, bottomLeft} then {bottomLeft, bottomRight, topRight},
/// wound for CCW front faces under back-face culling. Exactly
/// `6 * (width-1) * (height-1)` vertices come out.
pub fn build_vertex_stream(data: &HeightmapData) -> Vec<PackedVertex> {
    let width = data.grid.width();
    let height = data.grid.height();
    if width < 2 || height < 2 {
        return Vec::new();
    }

    let cells = ((width - 1) * (height - 1)) as usize;
    let mut vertices = Vec::with_capacity(cells * VERTICES_PER_CELL);
    for column in 0..width - 1 {
        for row in 0..height - 1 {
            let top_left = data.attribute(column, row);
            let top_right = data.attribute(column + 1, row);
            let bottom_left = data.attribute(column, row + 1);
            let bottom_right = data.attribute(column + 1, row + 1);

            push_triangle(&mut vertices, [top_right, top_left, bottom_left]);
            push_triangle(&mut vertices, [bottom_left, bottom_right, top_right]);
        }
    }
    vertices
}

fn push_triangle(vertices: &mut Vec<PackedVertex>, corners: [&TerrainVertexAttribute; 3]) {
    let (tangent, bitangent) = triangle_basis(corners);
    for corner in corners {
        vertices.push(PackedVertex {
            position: corner.position,
            tex_coords: corner.tex_coords,
            normal: corner.normal,
            tangent,
            bitangent,
        });
    }
}

/// Tangent basis from the UV-delta / position-delta system, shared by all
/// three vertices of the triangle (flat, not smoothed across triangles).
/// A degenerate UV layout falls back to the axis-aligned basis instead of
/// propagating non-finite values.
fn triangle_basis(corners: [&TerrainVertexAttribute; 3]) -> (Vec3, Vec3) {
    let delta_pos1 = corners[1].position - corners[0].position;
    let delta_pos2 = corners[2].position - corners[0].position;
    let delta_uv1 = corners[1].tex_coords - corners[0].tex_coords;
    let delta_uv2 = corners[2].tex_coords - corners[0].tex_coords;

    let determinant = delta_uv1.x * delta_uv2.y - delta_uv2.x * delta_uv1.y;
    if determinant.abs() < 1e-6 {
        return (Vec3::X, Vec3::Z);
    }

    let f = 1.0 / determinant;
    let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * f;
    let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * f;
    (tangent, bitangent)
}

/// Hand the packed stream to the resource cache: ensure the vertex array and
/// vertex buffer for `tag`, bind, push as a static buffer, unbind.
pub fn upload(
    cache: &mut ResourceCache,
    backend: &mut dyn GpuBackend,
    tag: &str,
    vertices: &[PackedVertex],
) -> cache::Result<()> {
    cache.ensure_vertex_array(backend, tag)?;
    cache.ensure_vertex_buffer(backend, tag, TERRAIN_VERTEX_SLOT, false)?;

    cache.bind_vertex_array(backend, tag);
    cache.push_vertex_data(backend, tag, TERRAIN_VERTEX_SLOT, bytemuck::cast_slice(vertices));
    cache.unbind_vertex_array(backend);

    info!(
        "Uploaded terrain mesh '{}' ({} vertices)",
        tag,
        vertices.len()
    );
    Ok(())
}
