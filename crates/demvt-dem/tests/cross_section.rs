//! Cross-section sampling against an in-memory grid source.

use approx::assert_relative_eq;
use async_trait::async_trait;
use demvt_dem::{
    CrossSectionSampler, DemError, DemTier, ElevationGrid, GridMerger, GridSource, TileCoord,
    DEFAULT_MAX_CROSS_SECTION_POINTS,
};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
struct MemorySource {
    grids: HashMap<(TileCoord, DemTier), ElevationGrid>,
}

impl MemorySource {
    fn with(mut self, tile: TileCoord, tier: DemTier, grid: ElevationGrid) -> Self {
        self.grids.insert((tile, tier), grid);
        self
    }
}

#[async_trait]
impl GridSource for MemorySource {
    async fn fetch(&self, tile: TileCoord, tier: DemTier) -> Option<ElevationGrid> {
        self.grids.get(&(tile, tier)).cloned()
    }
}

/// Grid where row `r`, column `c` holds `base + c`.
fn ramp(base: f64) -> ElevationGrid {
    let mut grid = ElevationGrid::empty();
    for row in 0..256 {
        for col in 0..256 {
            grid.set(row, col, Some(base + col as f64));
        }
    }
    grid
}

fn tile(z: u8, x: u32, y: u32) -> TileCoord {
    TileCoord::new(z, x, y).unwrap()
}

fn sampler(source: MemorySource) -> CrossSectionSampler {
    CrossSectionSampler::new(GridMerger::new(Arc::new(source), 16))
}

#[tokio::test]
async fn test_four_points_in_one_tile() {
    let source = MemorySource::default().with(tile(0, 0, 0), DemTier::Fine, ramp(100.0));
    let points = sampler(source).sample(8, (0, 0), (3, 0)).await.unwrap();

    let coords: Vec<(u32, u32)> = points.iter().map(|p| (p.x, p.y)).collect();
    assert_eq!(coords, vec![(0, 0), (1, 0), (2, 0), (3, 0)]);
    for (i, point) in points.iter().enumerate() {
        assert_relative_eq!(point.elevation_m, 100.0 + i as f64);
        assert_eq!(point.elevation_cm, 10_000 + 100 * i as i64);
        assert_eq!(point.slab.index, 0);
    }

    // Footprint is the pixel address treated as a zoom 8 tile
    let expected = tile(8, 0, 0).bounds();
    assert_eq!(points[0].footprint, expected);
    assert_relative_eq!(points[0].footprint.min_lon, -180.0);
}

#[tokio::test]
async fn test_line_across_two_governing_tiles() {
    let source = MemorySource::default()
        .with(tile(1, 0, 0), DemTier::Fine, ramp(0.0))
        .with(tile(1, 1, 0), DemTier::Fine, ramp(1000.0));
    let points = sampler(source).sample(9, (254, 10), (257, 10)).await.unwrap();

    let elevations: Vec<f64> = points.iter().map(|p| p.elevation_m).collect();
    assert_eq!(elevations, vec![254.0, 255.0, 1000.0, 1001.0]);
}

#[tokio::test]
async fn test_coarse_fills_sampled_cells() {
    let mut fine = ElevationGrid::empty();
    fine.set(0, 0, Some(5.0));
    let source = MemorySource::default()
        .with(tile(0, 0, 0), DemTier::Fine, fine)
        .with(tile(0, 0, 0), DemTier::Coarse, ramp(50.0));
    let points = sampler(source).sample(8, (0, 0), (2, 0)).await.unwrap();

    let elevations: Vec<f64> = points.iter().map(|p| p.elevation_m).collect();
    assert_eq!(elevations, vec![5.0, 51.0, 52.0]);
}

#[tokio::test]
async fn test_missing_governing_tile_fails() {
    let source = MemorySource::default().with(tile(1, 0, 0), DemTier::Fine, ramp(0.0));
    let err = sampler(source)
        .sample(9, (250, 0), (260, 0))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DemError::InsufficientData { z: 1, x: 1, y: 0 }
    ));
}

#[tokio::test]
async fn test_no_data_cell_fails() {
    let source =
        MemorySource::default().with(tile(0, 0, 0), DemTier::Fine, ElevationGrid::empty());
    let err = sampler(source).sample(8, (0, 0), (1, 1)).await.unwrap_err();
    assert!(matches!(err, DemError::InsufficientData { z: 0, .. }));
}

#[tokio::test]
async fn test_invalid_arguments() {
    let sampler = sampler(MemorySource::default());

    let err = sampler.sample(7, (0, 0), (1, 0)).await.unwrap_err();
    assert!(err.is_invalid_argument());

    let err = sampler.sample(8, (0, 0), (256, 0)).await.unwrap_err();
    assert!(matches!(err, DemError::InvalidCoordinate { .. }));
}

#[tokio::test]
async fn test_fine_zoom_slabs() {
    let mut fine = ElevationGrid::empty();
    fine.set(3, 5, Some(123.45));
    let source = MemorySource::default().with(tile(15, 100, 200), DemTier::Fine, fine);

    // Pixel (5, 3) of tile 15/100/200 at zoom 23
    let x = 100 * 256 + 5;
    let y = 200 * 256 + 3;
    let points = sampler(source).sample(23, (x, y), (x, y)).await.unwrap();

    assert_eq!(points.len(), 1);
    assert_eq!(points[0].elevation_cm, 12345);
    assert_eq!(points[0].slab.index, 30);
    assert_relative_eq!(points[0].slab.base, 120.0);
    assert_relative_eq!(points[0].slab.top, 124.0);
}

#[tokio::test]
async fn test_oversized_line_is_rejected() {
    let sampler = sampler(MemorySource::default());
    let err = sampler
        .sample(30, (0, 0), ((1 << 30) - 1, 0))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DemError::LineTooLong { points: 1_073_741_824, max: DEFAULT_MAX_CROSS_SECTION_POINTS }
    ));
    assert!(err.is_invalid_argument());

    let capped = sampler.with_max_points(3);
    let err = capped.sample(8, (0, 0), (3, 0)).await.unwrap_err();
    assert!(matches!(err, DemError::LineTooLong { points: 4, max: 3 }));
}

#[tokio::test]
async fn test_tie_samples_major_axis_pixel() {
    let source = MemorySource::default().with(tile(0, 0, 0), DemTier::Fine, ramp(0.0));
    let points = sampler(source).sample(8, (0, 0), (2, 1)).await.unwrap();

    let coords: Vec<(u32, u32)> = points.iter().map(|p| (p.x, p.y)).collect();
    assert_eq!(coords, vec![(0, 0), (1, 0), (2, 1)]);
}
