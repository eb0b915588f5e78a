//! # demvt-dem
//!
//! Elevation data for the demvt tile service: quadtree tile algebra, GSI DEM text
//! grids, fine/coarse tier merging with a bounded cache, ZFXY vertical slabs and
//! cross-section sampling.
//!
//! ## Overview
//!
//! ### Tiles and pixel addresses
//!
//! [`TileCoord`] is an OSM Slippy Map tile. A DEM grid is 256x256 cells, so at
//! zoom `z + 8` an `(x, y)` pair addresses exactly one cell of the grid of a zoom
//! `z` tile. [`TileCoord::ancestor_with_offset`] maps a tile back to the tile
//! whose grid holds it and the offset inside that grid.
//!
//! ### DEM tiers
//!
//! GSI serves two tiers as text tiles:
//! - `dem5a` (fine): 5 m data, partial coverage, authoritative where present
//! - `dem` (coarse): 10 m data, used only to fill no-data cells of the fine tier
//!
//! [`GridMerger`] fetches both concurrently through a [`GridSource`] and caches
//! the merged [`ElevationGrid`]. A tile without fine data is absent (`None`).
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use demvt_dem::{CrossSectionSampler, GridMerger, HttpGridSource, SourceConfig, TileCoord};
//!
//! # async fn run() -> demvt_dem::Result<()> {
//! let source = HttpGridSource::new(SourceConfig::default())?;
//! let merger = GridMerger::new(Arc::new(source), 128);
//!
//! // Merged grid governing a zoom 12 tile over Tokyo
//! let tile = TileCoord::new(12, 3638, 1612)?;
//! if let Some(grid) = merger.merged_grid(tile).await? {
//!     println!("{} cells with data", grid.present_cells());
//! }
//!
//! // Elevations along a line of zoom 20 pixel addresses
//! let sampler = CrossSectionSampler::new(merger);
//! let points = sampler.sample(20, (931_340, 412_680), (931_400, 412_700)).await?;
//! println!("{} points", points.len());
//! # Ok(())
//! # }
//! ```

mod cache;
mod coord;
mod cross_section;
mod error;
mod grid;
mod merger;
mod source;
mod zfxy;

pub use cache::{GridCache, DEFAULT_CACHE_CAPACITY};
pub use coord::{Quadrant, TileBounds, TileCoord, MAX_ZOOM, TILE_SIZE, TILE_SIZE_LOG2};
pub use cross_section::{
    line_length, rasterize_line, CrossSectionSampler, SampledPoint,
    DEFAULT_MAX_CROSS_SECTION_POINTS,
};
pub use error::DemError;
pub use grid::{ElevationGrid, GRID_SIZE, NO_DATA_TOKEN};
pub use merger::GridMerger;
pub use source::{
    DemTier, GridSource, HttpGridSource, SourceConfig, DEFAULT_COARSE_URL,
    DEFAULT_FETCH_TIMEOUT, DEFAULT_FINE_URL,
};
pub use zfxy::{elevation_cm, VerticalSlab, VERTICAL_EXTENT_LOG2};

/// Result type for DEM operations.
pub type Result<T> = std::result::Result<T, DemError>;
