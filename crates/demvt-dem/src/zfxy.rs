//! Vertical quantization of elevations into ZFXY slabs.
//!
//! At zoom 0 one vertical slab spans 2^25 meters; each zoom level halves it, so
//! a pixel address at zoom `z` pairs with slabs of `2^25 / 2^z` meters. The slab
//! index `f` of an elevation is `floor(elevation / resolution)`.

/// `log2` of the vertical extent of one slab at zoom 0, in meters.
pub const VERTICAL_EXTENT_LOG2: i32 = 25;

/// The vertical slab containing an elevation at a given zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalSlab {
    /// Slab height in meters at this zoom.
    pub resolution: f64,
    /// Slab index `f`.
    pub index: i64,
    /// Lower bound of the slab in meters.
    pub base: f64,
    /// Upper bound of the slab in meters.
    pub top: f64,
}

impl VerticalSlab {
    /// Slab height in meters at `zoom`.
    pub fn resolution(zoom: u8) -> f64 {
        2f64.powi(VERTICAL_EXTENT_LOG2 - i32::from(zoom))
    }

    /// The slab containing `elevation_m` at `zoom`.
    pub fn new(elevation_m: f64, zoom: u8) -> Self {
        let resolution = Self::resolution(zoom);
        let index = (elevation_m / resolution).floor() as i64;
        Self {
            resolution,
            index,
            base: resolution * index as f64,
            top: resolution * (index + 1) as f64,
        }
    }
}

/// Elevation in whole centimeters, rounding halves toward positive infinity.
pub fn elevation_cm(elevation_m: f64) -> i64 {
    (elevation_m * 100.0 + 0.5).floor() as i64
}
