//! Terrain entity: heightmap-backed geometry, world bounds, and the
//! barycentric height query used for terrain-following.

mod error;
pub mod heightmap;
pub mod mesh;

pub use error::*;

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::gpu::GpuBackend;
use crate::render::cache::ResourceCache;

use heightmap::{HeightGrid, HeightmapData, TerrainVertexAttribute, DEFAULT_LEVEL};

/// Axis-aligned world extents used to clamp moving entities. Independent of
/// the height grid; may change at any time without a mesh rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl WorldBounds {
    pub fn contains(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    pub fn clamp(&self, point: Vec3) -> Vec3 {
        point.clamp(self.min, self.max)
    }
}

impl Default for WorldBounds {
    fn default() -> Self {
        WorldBounds {
            min: Vec3::splat(f32::MIN),
            max: Vec3::splat(f32::MAX),
        }
    }
}

fn default_level() -> f32 {
    DEFAULT_LEVEL
}

fn default_square_size() -> f32 {
    1.0
}

/// Creation parameters for one terrain. Serializable so project files can
/// carry them; the heightmap path is resolved against the application
/// directory at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainInfo {
    pub tag: String,
    pub heightmap: String,
    #[serde(default = "default_level")]
    pub level: f32,
    #[serde(default = "default_square_size")]
    pub square_size: f32,
    #[serde(default)]
    pub origin: Vec3,
    #[serde(default)]
    pub bounds: Option<WorldBounds>,
}

/// A loaded terrain. The height grid and per-texel attributes stay on the
/// CPU for queries and persistence; the packed mesh lives only on the GPU.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Terrain {
    tag: String,
    heightmap: String,
    level: f32,
    origin: Vec3,
    bounds: WorldBounds,
    grid: HeightGrid,
    attributes: Vec<TerrainVertexAttribute>,
    vertex_count: u32,
}

impl Terrain {
    /// Ingest, level, compute normals, triangulate, and upload.
    ///
    /// If the tag already owns cache entries the mesh stage is skipped and
    /// the existing GPU buffers are reused; a caller that wants a rebuild
    /// must tear down or pick a fresh tag.
    pub fn load(
        info: &TerrainInfo,
        heightmap_path: &Path,
        backend: &mut dyn GpuBackend,
        cache: &mut ResourceCache,
    ) -> Result<Self> {
        let mut data = heightmap::ingest(heightmap_path, info.square_size)?;
        data.level(info.level);
        mesh::compute_normals(&mut data);

        let cells = (data.grid.width().saturating_sub(1)
            * data.grid.height().saturating_sub(1)) as usize;
        let vertex_count = (cells * mesh::VERTICES_PER_CELL) as u32;

        if cache.contains_vertex_array(&info.tag) {
            info!(
                "Terrain '{}' already has cache entries, skipping mesh regeneration",
                info.tag
            );
        } else {
            let vertices = mesh::build_vertex_stream(&data);
            mesh::upload(cache, backend, &info.tag, &vertices)?;
        }

        let HeightmapData { grid, attributes } = data;
        Ok(Terrain {
            tag: info.tag.clone(),
            heightmap: info.heightmap.clone(),
            level: info.level,
            origin: info.origin,
            bounds: info.bounds.unwrap_or_default(),
            grid,
            attributes,
            vertex_count,
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn grid(&self) -> &HeightGrid {
        &self.grid
    }

    pub fn attributes(&self) -> &[TerrainVertexAttribute] {
        &self.attributes
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: WorldBounds) {
        self.bounds = bounds;
    }

    pub fn clamp_to_bounds(&self, point: Vec3) -> Vec3 {
        self.bounds.clamp(point)
    }

    /// Terrain height under a world-space (x, z), plus `offset`.
    ///
    /// The terrain's +Z axis runs opposite world Z, so z is negated before
    /// translating into grid space. Coordinates outside the grid return
    /// `0.0 + offset` rather than erroring.
    pub fn height_at(&self, world_x: f32, world_z: f32, offset: f32) -> f32 {
        let square = self.grid.square_size();
        let local_x = world_x - self.origin.x;
        let local_z = -world_z - self.origin.z;

        let column = (local_x / square).floor();
        let row = (local_z / square).floor();
        let max_column = self.grid.width().saturating_sub(1) as f32;
        let max_row = self.grid.height().saturating_sub(1) as f32;
        if column < 0.0 || row < 0.0 || column >= max_column || row >= max_row {
            return offset;
        }
        let column = column as u32;
        let row = row as u32;

        // Fractional position within the cell.
        let u = (local_x % square) / square;
        let v = (local_z % square) / square;

        let h00 = self.grid.sample(column, row);
        let h10 = self.grid.sample(column + 1, row);
        let h01 = self.grid.sample(column, row + 1);
        let h11 = self.grid.sample(column + 1, row + 1);

        let height = if u <= 1.0 - v {
            barycentric_height(
                Vec3::new(0.0, h00, 0.0),
                Vec3::new(1.0, h10, 0.0),
                Vec3::new(0.0, h01, 1.0),
                u,
                v,
            )
        } else {
            barycentric_height(
                Vec3::new(1.0, h10, 0.0),
                Vec3::new(1.0, h11, 1.0),
                Vec3::new(0.0, h01, 1.0),
                u,
                v,
            )
        };

        height + offset
    }
}

/// Interpolate the y component at `(u, v)` inside the XZ-projected triangle
/// `(a, b, c)` using barycentric weights.
fn barycentric_height(a: Vec3, b: Vec3, c: Vec3, u: f32, v: f32) -> f32 {
    let det = (b.z - c.z) * (a.x - c.x) + (c.x - b.x) * (a.z - c.z);
    let w1 = ((b.z - c.z) * (u - c.x) + (c.x - b.x) * (v - c.z)) / det;
    let w2 = ((c.z - a.z) * (u - c.x) + (a.x - c.x) * (v - c.z)) / det;
    let w3 = 1.0 - w1 - w2;
    w1 * a.y + w2 * b.y + w3 * c.y
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};

    fn make_terrain(heights: Vec<Vec<f32>>, origin: Vec3) -> Terrain {
        let grid = HeightGrid::new(heights, 1.0);
        Terrain {
            tag: "test".to_string(),
            heightmap: "test.png".to_string(),
            level: DEFAULT_LEVEL,
            origin,
            bounds: WorldBounds::default(),
            grid,
            attributes: Vec::new(),
            vertex_count: 0,
        }
    }

    fn flat_heights(size: usize, value: f32) -> Vec<Vec<f32>> {
        vec![vec![value; size]; size]
    }

    #[test]
    fn flat_grid_interpolates_exactly() {
        let terrain = make_terrain(flat_heights(4, 10.0), Vec3::ZERO);
        // Sample both triangle halves and a few interior points; a flat grid
        // must come back exact everywhere in bounds.
        for (x, z) in [(0.25, -0.25), (0.9, -0.1), (1.5, -1.5), (2.1, -2.9)] {
            assert_eq!(terrain.height_at(x, z, 0.0), 10.0);
        }
    }

    #[test]
    fn out_of_bounds_returns_offset_only() {
        let terrain = make_terrain(flat_heights(4, 10.0), Vec3::ZERO);
        assert_eq!(terrain.height_at(-1.0, -1.0, 0.0), 0.0);
        assert_eq!(terrain.height_at(10.0, -1.0, 0.0), 0.0);
        assert_eq!(terrain.height_at(1.0, -10.0, 0.0), 0.0);
        assert_eq!(terrain.height_at(10.0, -10.0, 2.5), 2.5);
    }

    #[test]
    fn positive_world_z_is_behind_the_terrain() {
        // +Z world space maps to negative grid rows, so it falls outside.
        let terrain = make_terrain(flat_heights(4, 10.0), Vec3::ZERO);
        assert_eq!(terrain.height_at(1.0, 1.5, 0.0), 0.0);
        assert_eq!(terrain.height_at(1.0, -1.5, 0.0), 10.0);
    }

    #[test]
    fn offset_rides_on_top_of_the_sample() {
        let terrain = make_terrain(flat_heights(4, 10.0), Vec3::ZERO);
        assert_eq!(terrain.height_at(1.0, -1.0, 1.75), 11.75);
    }

    #[test]
    fn grid_corners_are_exact() {
        let mut heights = flat_heights(4, 0.0);
        heights[2][1] = 7.5;
        let terrain = make_terrain(heights, Vec3::ZERO);
        assert_eq!(terrain.height_at(2.0, -1.0, 0.0), 7.5);
        assert_eq!(terrain.height_at(0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn interior_points_interpolate_the_sloped_plane() {
        // A grid sloping one unit per column is planar, so barycentric
        // interpolation must reproduce the plane at any interior point.
        let mut heights = flat_heights(4, 0.0);
        for (column, col_heights) in heights.iter_mut().enumerate() {
            for sample in col_heights.iter_mut() {
                *sample = column as f32;
            }
        }
        let terrain = make_terrain(heights, Vec3::ZERO);
        // Left triangle half.
        assert!((terrain.height_at(0.25, -0.25, 0.0) - 0.25).abs() < 1e-6);
        // Right triangle half.
        assert!((terrain.height_at(0.9, -0.75, 0.0) - 0.9).abs() < 1e-6);
    }

    #[test]
    fn origin_translates_the_query() {
        let terrain = make_terrain(flat_heights(4, 4.0), Vec3::new(100.0, 0.0, 50.0));
        assert_eq!(terrain.height_at(101.0, -51.0, 0.0), 4.0);
        assert_eq!(terrain.height_at(1.0, -1.0, 0.0), 0.0);
    }

    #[test]
    fn bounds_clamp_and_contain() {
        let mut terrain = make_terrain(flat_heights(4, 1.0), Vec3::ZERO);
        terrain.set_bounds(WorldBounds {
            min: Vec3::new(0.0, 0.0, -3.0),
            max: Vec3::new(3.0, 10.0, 0.0),
        });

        assert!(terrain.bounds().contains(Vec3::new(1.0, 5.0, -1.0)));
        assert!(!terrain.bounds().contains(Vec3::new(4.0, 5.0, -1.0)));
        assert_eq!(
            terrain.clamp_to_bounds(Vec3::new(5.0, 20.0, -7.0)),
            Vec3::new(3.0, 10.0, -3.0)
        );
    }

    #[test]
    fn terrain_state_round_trips_through_json() {
        let mut terrain = make_terrain(flat_heights(4, 2.0), Vec3::new(1.0, 0.0, 2.0));
        terrain.attributes = vec![TerrainVertexAttribute {
            position: Vec3::new(0.0, 2.0, 0.0),
            tex_coords: Vec2::ZERO,
            normal: Vec3::Y,
        }];

        let json = serde_json::to_string(&terrain).unwrap();
        let restored: Terrain = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.tag(), terrain.tag());
        assert_eq!(restored.origin(), terrain.origin());
        assert_eq!(restored.grid().width(), terrain.grid().width());
        assert_eq!(restored.attributes().len(), 1);
        assert_eq!(
            restored.height_at(1.5, -3.5, 0.0),
            terrain.height_at(1.5, -3.5, 0.0)
        );
    }
}
