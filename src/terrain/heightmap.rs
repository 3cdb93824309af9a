//! Heightmap ingestion: grayscale image -> height grid + per-texel vertex
//! attributes.

use std::path::Path;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{DecodeError, DimensionError, Error, Result};

/// Default divisor applied to raw 0-255 samples after ingestion.
pub const DEFAULT_LEVEL: f32 = 25.0;

/// 2D array of terrain height samples indexed `[column][row]`.
///
/// Both dimensions are powers of two (not necessarily equal). The grid is
/// written once at load, leveled once, and read-only afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeightGrid {
    heights: Vec<Vec<f32>>,
    width: u32,
    height: u32,
    square_size: f32,
}

impl HeightGrid {
    pub fn new(heights: Vec<Vec<f32>>, square_size: f32) -> Self {
        let width = heights.len() as u32;
        let height = heights.first().map(|col| col.len()).unwrap_or(0) as u32;
        HeightGrid {
            heights,
            width,
            height,
            square_size,
        }
    }

    /// Columns in the grid.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Rows in the grid.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Highest valid cell index along the column axis.
    pub fn grid_length(&self) -> u32 {
        self.width.saturating_sub(1)
    }

    /// World units spanned by one grid cell.
    pub fn square_size(&self) -> f32 {
        self.square_size
    }

    pub fn sample(&self, column: u32, row: u32) -> f32 {
        self.heights[column as usize][row as usize]
    }

    /// Sample with indices clamped to the nearest edge. Out-of-range indices
    /// never wrap and never read out of bounds.
    pub fn sample_clamped(&self, column: i32, row: i32) -> f32 {
        let c = column.clamp(0, self.width as i32 - 1) as usize;
        let r = row.clamp(0, self.height as i32 - 1) as usize;
        self.heights[c][r]
    }

    fn divide_all(&mut self, factor: f32) {
        for column in &mut self.heights {
            for sample in column.iter_mut() {
                *sample /= factor;
            }
        }
    }
}

/// Per-texel attribute produced 1:1 with height grid samples. Position is
/// `(column, sample, row)`, texture coordinates `(column, row)`; the normal
/// is filled in by the mesh builder.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TerrainVertexAttribute {
    pub position: Vec3,
    pub tex_coords: Vec2,
    pub normal: Vec3,
}

/// Output of heightmap ingestion: the grid plus the flat attribute array,
/// stored column-major (`index = column * rows + row`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeightmapData {
    pub grid: HeightGrid,
    pub attributes: Vec<TerrainVertexAttribute>,
}

impl HeightmapData {
    pub fn attribute_index(&self, column: u32, row: u32) -> usize {
        (column * self.grid.height() + row) as usize
    }

    pub fn attribute(&self, column: u32, row: u32) -> &TerrainVertexAttribute {
        &self.attributes[self.attribute_index(column, row)]
    }

    /// Divide every height sample by `factor`, in both the 2D grid and the
    /// flat attribute array. Runs once, before normal calculation.
    pub fn level(&mut self, factor: f32) {
        self.grid.divide_all(factor);
        for attribute in &mut self.attributes {
            attribute.position.y /= factor;
        }
    }
}

/// Decode a grayscale heightmap image into raw byte-range samples.
///
/// Fails if the image cannot be decoded or if either dimension is not a
/// power of two; the terrain stays unconfigured in that case and the caller
/// must not proceed to mesh building.
pub fn ingest(path: &Path, square_size: f32) -> Result<HeightmapData> {
    let display_path = path.display().to_string();
    let image = image::open(path)
        .map_err(|e| {
            Error::Decode(DecodeError {
                path: display_path.clone(),
                reason: e.to_string(),
            })
        })?
        .to_rgb8();

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || !width.is_power_of_two() || !height.is_power_of_two() {
        return Err(Error::Dimensions(DimensionError {
            path: display_path,
            width,
            height,
        }));
    }

    info!(
        "Ingesting heightmap '{}' ({}x{})",
        display_path, width, height
    );

    let mut heights = vec![vec![0.0f32; height as usize]; width as usize];
    let mut attributes = Vec::with_capacity((width * height) as usize);
    for column in 0..width {
        for row in 0..height {
            // Grayscale input, so the R channel carries the sample.
            let sample = image.get_pixel(column, row).0[0] as f32;
            heights[column as usize][row as usize] = sample;
            attributes.push(TerrainVertexAttribute {
                position: Vec3::new(column as f32, sample, row as f32),
                tex_coords: Vec2::new(column as f32, row as f32),
                normal: Vec3::ZERO,
            });
        }
    }

    Ok(HeightmapData {
        grid: HeightGrid::new(heights, square_size),
        attributes,
    })
}
