//! Quadtree tile coordinates.
//!
//! Tiles follow the OpenStreetMap Slippy Map convention:
//! - `z` is the zoom level (0 to [`MAX_ZOOM`])
//! - `x` is the column (0 to 2^z - 1, from west to east)
//! - `y` is the row (0 to 2^z - 1, from north to south)
//!
//! Every tile at zoom `z` has exactly one parent at `z - 1` and four children at
//! `z + 1`. The same addressing is reused for single DEM pixels: at zoom `z + 8`
//! an `(x, y)` pair addresses one cell of the 256x256 grid of the zoom `z` tile.

use crate::{DemError, Result};
use std::f64::consts::PI;
use std::fmt;

/// Edge length of a DEM grid in cells.
pub const TILE_SIZE: u32 = 256;

/// `log2(TILE_SIZE)`: zoom levels between a tile and its pixel addresses.
pub const TILE_SIZE_LOG2: u8 = 8;

/// Deepest zoom level accepted for tiles and pixel addresses.
pub const MAX_ZOOM: u8 = 30;

/// Position of a child tile within its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    /// Offset (0, 0).
    NorthWest,
    /// Offset (1, 0).
    NorthEast,
    /// Offset (1, 1).
    SouthEast,
    /// Offset (0, 1).
    SouthWest,
}

impl Quadrant {
    /// All quadrants in canonical order.
    pub const ALL: [Quadrant; 4] = [
        Quadrant::NorthWest,
        Quadrant::NorthEast,
        Quadrant::SouthEast,
        Quadrant::SouthWest,
    ];

    /// The `(dx, dy)` bit pair of this quadrant.
    pub const fn offset(self) -> (u32, u32) {
        match self {
            Quadrant::NorthWest => (0, 0),
            Quadrant::NorthEast => (1, 0),
            Quadrant::SouthEast => (1, 1),
            Quadrant::SouthWest => (0, 1),
        }
    }
}

/// OSM-style tile coordinates (z, x, y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    /// Zoom level.
    pub z: u8,
    /// X coordinate (column, 0 at 180°W, increases eastward).
    pub x: u32,
    /// Y coordinate (row, 0 at ~85.05°N, increases southward).
    pub y: u32,
}

/// Geographic bounds of a tile in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBounds {
    /// Minimum latitude (south edge).
    pub min_lat: f64,
    /// Maximum latitude (north edge).
    pub max_lat: f64,
    /// Minimum longitude (west edge).
    pub min_lon: f64,
    /// Maximum longitude (east edge).
    pub max_lon: f64,
}

impl TileBounds {
    /// Closed `[lon, lat]` exterior ring, starting and ending at the north-west corner.
    pub fn ring(&self) -> [[f64; 2]; 5] {
        [
            [self.min_lon, self.max_lat],
            [self.min_lon, self.min_lat],
            [self.max_lon, self.min_lat],
            [self.max_lon, self.max_lat],
            [self.min_lon, self.max_lat],
        ]
    }
}

impl TileCoord {
    /// Create a new tile coordinate, checking it lies inside the pyramid.
    pub fn new(z: u8, x: u32, y: u32) -> Result<Self> {
        if z > MAX_ZOOM {
            return Err(DemError::InvalidZoomLevel(z));
        }
        let max_coord = 1u64 << z;
        if u64::from(x) >= max_coord || u64::from(y) >= max_coord {
            return Err(DemError::InvalidCoordinate { z, x, y });
        }
        Ok(Self { z, x, y })
    }

    /// The child tile occupying `quadrant` of this tile.
    pub fn child(&self, quadrant: Quadrant) -> Result<TileCoord> {
        if self.z >= MAX_ZOOM {
            return Err(DemError::InvalidZoomLevel(self.z + 1));
        }
        let (dx, dy) = quadrant.offset();
        Ok(TileCoord {
            z: self.z + 1,
            x: self.x * 2 + dx,
            y: self.y * 2 + dy,
        })
    }

    /// The parent tile and the quadrant this tile occupies within it.
    pub fn parent(&self) -> Result<(Quadrant, TileCoord)> {
        if self.z == 0 {
            return Err(DemError::NoParent);
        }
        let parent = TileCoord {
            z: self.z - 1,
            x: self.x >> 1,
            y: self.y >> 1,
        };
        for quadrant in Quadrant::ALL {
            if parent.child(quadrant)? == *self {
                return Ok((quadrant, parent));
            }
        }
        Err(DemError::InvalidCoordinate {
            z: self.z,
            x: self.x,
            y: self.y,
        })
    }

    /// Walk `steps` levels up, returning the ancestor and the quadrants passed
    /// through in root-to-leaf order.
    pub fn ancestor_path(&self, steps: u8) -> Result<(TileCoord, Vec<Quadrant>)> {
        if steps > self.z {
            return Err(DemError::AncestorOutOfRange {
                steps,
                zoom: self.z,
            });
        }

        let mut current = *self;
        let mut path = Vec::with_capacity(steps as usize);
        for _ in 0..steps {
            let (quadrant, parent) = current.parent()?;
            path.push(quadrant);
            current = parent;
        }
        path.reverse();

        Ok((current, path))
    }

    /// The ancestor `steps` levels up and this tile's offset inside it, measured
    /// in tiles of this tile's size.
    ///
    /// Multiplying the offset by the sub-tile edge length gives the pixel origin
    /// of this tile within the ancestor's grid.
    pub fn ancestor_with_offset(&self, steps: u8) -> Result<(TileCoord, (u32, u32))> {
        let (ancestor, path) = self.ancestor_path(steps)?;

        let mut offset = (0u32, 0u32);
        for (i, quadrant) in path.iter().enumerate() {
            let weight = 1u32 << (steps as usize - 1 - i);
            let (dx, dy) = quadrant.offset();
            offset.0 += dx * weight;
            offset.1 += dy * weight;
        }

        Ok((ancestor, offset))
    }

    /// The ancestor at `target_zoom`.
    pub fn ancestor_at_zoom(&self, target_zoom: u8) -> Result<TileCoord> {
        if target_zoom > self.z {
            return Err(DemError::TargetZoomAboveTile {
                target: target_zoom,
                zoom: self.z,
            });
        }
        let shift = self.z - target_zoom;
        Ok(TileCoord {
            z: target_zoom,
            x: self.x >> shift,
            y: self.y >> shift,
        })
    }

    /// Get the bounding box for this tile.
    pub fn bounds(&self) -> TileBounds {
        let n = (1u64 << self.z) as f64;

        // Longitude bounds
        let min_lon = self.x as f64 / n * 360.0 - 180.0;
        let max_lon = (self.x as f64 + 1.0) / n * 360.0 - 180.0;

        // Latitude bounds (inverse of Slippy Map formula)
        let max_lat = (PI * (1.0 - 2.0 * self.y as f64 / n)).sinh().atan().to_degrees();
        let min_lat = (PI * (1.0 - 2.0 * (self.y as f64 + 1.0) / n))
            .sinh()
            .atan()
            .to_degrees();

        TileBounds {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}
