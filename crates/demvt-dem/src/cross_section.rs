//! Elevation sampling along a straight line of pixel addresses.

use crate::coord::{TileBounds, TILE_SIZE_LOG2};
use crate::merger::GridMerger;
use crate::zfxy::{elevation_cm, VerticalSlab};
use crate::{DemError, ElevationGrid, Result, TileCoord};
use demvt_metrics::{metric_defs, metrics};
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Default cap on the number of points one cross-section may sample.
pub const DEFAULT_MAX_CROSS_SECTION_POINTS: usize = 10_000;

/// Integer lattice points on the line from `from` to `to` (Bresenham).
///
/// The start point comes first and the end point last; `from == to` yields a
/// single point. On a half-way tie the step goes along the major axis before
/// the diagonal, so `(0, 0) -> (2, 1)` passes through `(1, 0)`.
pub fn rasterize_line(from: (u32, u32), to: (u32, u32)) -> Vec<(u32, u32)> {
    let (mut x, mut y) = (i64::from(from.0), i64::from(from.1));
    let (x1, y1) = (i64::from(to.0), i64::from(to.1));

    let dx = (x1 - x).abs();
    let dy = (y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx - dy;

    let mut points = Vec::with_capacity(line_length(from, to));
    points.push(from);
    while x != x1 || y != y1 {
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }
        // Every step stays inside the bounding box of two u32 endpoints.
        points.push((x as u32, y as u32));
    }
    points
}

/// Number of points [`rasterize_line`] yields for these endpoints.
pub fn line_length(from: (u32, u32), to: (u32, u32)) -> usize {
    let dx = from.0.abs_diff(to.0);
    let dy = from.1.abs_diff(to.1);
    dx.max(dy) as usize + 1
}

/// One sampled pixel along a cross-section.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledPoint {
    /// Pixel address column at the sampling zoom.
    pub x: u32,
    /// Pixel address row at the sampling zoom.
    pub y: u32,
    /// Elevation in meters.
    pub elevation_m: f64,
    /// Elevation in whole centimeters.
    pub elevation_cm: i64,
    /// Vertical slab at the sampling zoom.
    pub slab: VerticalSlab,
    /// The pixel address treated as a tile, in degrees.
    pub footprint: TileBounds,
}

/// Samples merged DEM grids along a line of pixel addresses.
#[derive(Debug, Clone)]
pub struct CrossSectionSampler {
    merger: GridMerger,
    max_points: usize,
}

impl CrossSectionSampler {
    /// Create a sampler reading through `merger`.
    pub fn new(merger: GridMerger) -> Self {
        Self {
            merger,
            max_points: DEFAULT_MAX_CROSS_SECTION_POINTS,
        }
    }

    /// Reject lines longer than `max_points` points.
    pub fn with_max_points(mut self, max_points: usize) -> Self {
        self.max_points = max_points.max(1);
        self
    }

    /// The configured point cap.
    pub fn max_points(&self) -> usize {
        self.max_points
    }

    /// Sample every pixel on the line from `from` to `to` at pixel zoom `z`.
    ///
    /// Both endpoints are `(x, y)` pixel addresses at zoom `z`, which must be at
    /// least 8 so each pixel has a governing tile at `z - 8`. Points come back in
    /// line order. If any governing tile is absent, or a sampled cell holds no
    /// data, the whole request fails with [`DemError::InsufficientData`]. Lines
    /// longer than the point cap fail with [`DemError::LineTooLong`] before
    /// anything is fetched.
    pub async fn sample(
        &self,
        z: u8,
        from: (u32, u32),
        to: (u32, u32),
    ) -> Result<Vec<SampledPoint>> {
        if z < TILE_SIZE_LOG2 {
            return Err(DemError::AncestorOutOfRange {
                steps: TILE_SIZE_LOG2,
                zoom: z,
            });
        }
        TileCoord::new(z, from.0, from.1)?;
        TileCoord::new(z, to.0, to.1)?;

        let length = line_length(from, to);
        if length > self.max_points {
            return Err(DemError::LineTooLong {
                points: length,
                max: self.max_points,
            });
        }

        let pixels: Vec<TileCoord> = rasterize_line(from, to)
            .into_iter()
            .map(|(x, y)| TileCoord { z, x, y })
            .collect();

        let mut seen = HashSet::new();
        let mut governing = Vec::new();
        for pixel in &pixels {
            let tile = pixel.ancestor_at_zoom(z - TILE_SIZE_LOG2)?;
            if seen.insert(tile) {
                governing.push(tile);
            }
        }
        debug!(
            z,
            points = pixels.len(),
            tiles = governing.len(),
            "Sampling cross-section"
        );

        let results = join_all(governing.iter().map(|tile| self.merger.merged_grid(*tile))).await;
        let mut grids: HashMap<TileCoord, Arc<ElevationGrid>> = HashMap::new();
        for (tile, result) in governing.into_iter().zip(results) {
            match result? {
                Some(grid) => {
                    grids.insert(tile, grid);
                }
                None => {
                    warn!(%tile, "Cross-section crosses a tile without data");
                    return Err(insufficient(tile));
                }
            }
        }

        let points = pixels
            .iter()
            .map(|pixel| {
                let (tile, (col, row)) = pixel.ancestor_with_offset(TILE_SIZE_LOG2)?;
                let elevation_m = grids
                    .get(&tile)
                    .and_then(|grid| grid.get(row as usize, col as usize))
                    .ok_or_else(|| {
                        warn!(%pixel, "Cross-section sampled a cell without data");
                        insufficient(tile)
                    })?;
                Ok(SampledPoint {
                    x: pixel.x,
                    y: pixel.y,
                    elevation_m,
                    elevation_cm: elevation_cm(elevation_m),
                    slab: VerticalSlab::new(elevation_m, z),
                    footprint: pixel.bounds(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        metrics::histogram!(metric_defs::CROSS_SECTION_POINTS.name).record(points.len() as f64);
        Ok(points)
    }
}

fn insufficient(tile: TileCoord) -> DemError {
    DemError::InsufficientData {
        z: tile.z,
        x: tile.x,
        y: tile.y,
    }
}
