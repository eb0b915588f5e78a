//! Quantization of merged grids into vector tile features.
//!
//! Each scale factor step serves a tile from the grid of its ancestor one more
//! level up, so a requested tile covers a `256 / 2^(S-1)` cell window of the
//! governing grid. Every cell with data becomes one unit square polygon in the
//! window's local coordinates; the absolute ZFXY address and elevation travel as
//! attributes.

use crate::codec::unit_square_geometry;
use crate::proto::{Feature, GeomType, Layer};
use crate::values::{AttributeValue, ValueTable};
use crate::{Result, TileError};
use demvt_dem::{
    elevation_cm, ElevationGrid, GridMerger, TileCoord, VerticalSlab, TILE_SIZE, TILE_SIZE_LOG2,
};
use std::fmt;
use tracing::debug;

/// Name of the single layer in every tile.
pub const LAYER_NAME: &str = "dem";

/// Vector tile specification version written to layers.
pub const LAYER_VERSION: u32 = 2;

/// Attribute keys in tag order.
pub const ATTRIBUTE_KEYS: [&str; 7] = ["ele", "f_height", "f_base", "x", "y", "z", "f"];

/// Zoom scaling between requested tiles and the tile whose grid governs them.
///
/// A factor of `S` serves zoom `z` tiles from zoom `z - (S-1)` grids, so each
/// output tile is `256 >> (S-1)` cells wide and the minimum servable zoom is `S-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScaleFactor(u8);

impl ScaleFactor {
    /// Smallest factor: tiles map one-to-one onto grids.
    pub const MIN: u8 = 1;
    /// Largest factor: two by two cells per output tile.
    pub const MAX: u8 = TILE_SIZE_LOG2;

    /// Validate a scale factor.
    pub fn new(value: u8) -> Result<Self> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(TileError::InvalidScaleFactor(value));
        }
        Ok(Self(value))
    }

    /// The raw factor `S`.
    pub fn get(&self) -> u8 {
        self.0
    }

    /// Levels between a requested tile and its governing tile.
    pub fn ancestor_steps(&self) -> u8 {
        self.0 - 1
    }

    /// Edge length of a requested tile in grid cells. Also the layer extent.
    pub fn tile_size(&self) -> u32 {
        TILE_SIZE >> self.ancestor_steps()
    }

    /// Lowest zoom that can be served.
    pub fn min_zoom(&self) -> u8 {
        self.ancestor_steps()
    }

    /// Highest zoom backed by upstream data (GSI serves grids up to zoom 15).
    pub fn max_zoom(&self) -> u8 {
        15 + self.ancestor_steps()
    }
}

impl Default for ScaleFactor {
    fn default() -> Self {
        Self(4)
    }
}

impl fmt::Display for ScaleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of building one tile.
#[derive(Debug, Clone, PartialEq)]
pub enum TileContent {
    /// No cell of the tile has data.
    Empty,
    /// A layer with at least one feature.
    Layer(Layer),
}

/// Builds the `dem` layer of requested tiles from merged grids.
#[derive(Debug, Clone)]
pub struct TileFeatureBuilder {
    merger: GridMerger,
    scale: ScaleFactor,
}

impl TileFeatureBuilder {
    /// Create a builder reading through `merger`.
    pub fn new(merger: GridMerger, scale: ScaleFactor) -> Self {
        Self { merger, scale }
    }

    /// The configured scale factor.
    pub fn scale(&self) -> ScaleFactor {
        self.scale
    }

    /// Build the layer for `tile`.
    ///
    /// Returns [`TileContent::Empty`] when the governing tile has no fine data or
    /// the requested window holds no data at all.
    pub async fn build(&self, tile: TileCoord) -> Result<TileContent> {
        let (ancestor, offset) = tile.ancestor_with_offset(self.scale.ancestor_steps())?;

        let Some(grid) = self.merger.merged_grid(ancestor).await? else {
            debug!(%tile, %ancestor, "Governing tile has no data");
            return Ok(TileContent::Empty);
        };

        let layer = build_layer(&grid, ancestor, offset, self.scale);
        debug!(%tile, %ancestor, features = layer.features.len(), "Built tile layer");
        if layer.features.is_empty() {
            Ok(TileContent::Empty)
        } else {
            Ok(TileContent::Layer(layer))
        }
    }
}

/// Quantize the `scale.tile_size()` window at `offset` (in windows) of the
/// `ancestor` grid into a layer.
pub fn build_layer(
    grid: &ElevationGrid,
    ancestor: TileCoord,
    offset: (u32, u32),
    scale: ScaleFactor,
) -> Layer {
    let tile_size = scale.tile_size();
    let (origin_col, origin_row) = (offset.0 * tile_size, offset.1 * tile_size);
    let pixel_zoom = ancestor.z + TILE_SIZE_LOG2;

    let mut values = ValueTable::new();
    let mut features = Vec::new();

    for raw_row in 0..tile_size {
        let row = origin_row + raw_row;
        for raw_col in 0..tile_size {
            let col = origin_col + raw_col;
            let Some(elevation) = grid.get(row as usize, col as usize) else {
                continue;
            };

            let slab = VerticalSlab::new(elevation, pixel_zoom);
            let attributes = [
                AttributeValue::Int(elevation_cm(elevation)),
                AttributeValue::from_f64(slab.top),
                AttributeValue::from_f64(slab.base),
                AttributeValue::Int(i64::from(ancestor.x) * i64::from(TILE_SIZE) + i64::from(col)),
                AttributeValue::Int(i64::from(ancestor.y) * i64::from(TILE_SIZE) + i64::from(row)),
                AttributeValue::Int(i64::from(pixel_zoom)),
                AttributeValue::Int(slab.index),
            ];

            let mut tags = Vec::with_capacity(attributes.len() * 2);
            for (key, value) in attributes.into_iter().enumerate() {
                tags.push(key as u32);
                tags.push(values.insert(value));
            }

            features.push(Feature {
                id: Some(u64::from(((row & 0xFF) << 8) | (col & 0xFF))),
                tags,
                r#type: Some(GeomType::Polygon as i32),
                geometry: unit_square_geometry(raw_col, raw_row).to_vec(),
            });
        }
    }

    Layer {
        version: LAYER_VERSION,
        name: LAYER_NAME.to_string(),
        features,
        keys: ATTRIBUTE_KEYS.iter().map(|k| k.to_string()).collect(),
        values: values.into_proto(),
        extent: tile_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_ring;
    use approx::assert_relative_eq;

    fn tile(z: u8, x: u32, y: u32) -> TileCoord {
        TileCoord::new(z, x, y).unwrap()
    }

    fn int_attr(layer: &Layer, feature: &Feature, key: &str) -> i64 {
        let key_idx = layer.keys.iter().position(|k| k == key).unwrap() as u32;
        let pos = feature.tags.chunks(2).position(|pair| pair[0] == key_idx).unwrap();
        let value_idx = feature.tags[pos * 2 + 1] as usize;
        layer.values[value_idx].int_value.unwrap()
    }

    #[test]
    fn test_scale_factor_bounds() {
        assert!(ScaleFactor::new(0).is_err());
        assert!(ScaleFactor::new(9).is_err());
        let s = ScaleFactor::new(4).unwrap();
        assert_eq!(s.tile_size(), 32);
        assert_eq!(s.min_zoom(), 3);
        assert_eq!(s.max_zoom(), 18);
        assert_eq!(ScaleFactor::new(1).unwrap().tile_size(), 256);
        assert_eq!(ScaleFactor::new(8).unwrap().tile_size(), 2);
        assert_eq!(ScaleFactor::default(), s);
    }

    #[test]
    fn test_children_share_ancestor_with_distinct_windows() {
        let scale = ScaleFactor::new(4).unwrap();
        let parent = tile(9, 100, 200);
        let mut offsets = Vec::new();
        for quadrant in demvt_dem::Quadrant::ALL {
            let child = parent.child(quadrant).unwrap();
            let (ancestor, offset) = child.ancestor_with_offset(scale.ancestor_steps()).unwrap();
            assert_eq!(ancestor, tile(7, 25, 50));
            offsets.push(offset);
        }
        offsets.sort_unstable();
        offsets.dedup();
        assert_eq!(offsets.len(), 4);
    }

    #[test]
    fn test_single_cell_layer() {
        let mut grid = ElevationGrid::empty();
        grid.set(5, 7, Some(123.45));
        let layer = build_layer(&grid, tile(0, 0, 0), (0, 0), ScaleFactor::new(1).unwrap());

        assert_eq!(layer.name, "dem");
        assert_eq!(layer.version, 2);
        assert_eq!(layer.extent, 256);
        assert_eq!(layer.keys, ATTRIBUTE_KEYS);
        assert_eq!(layer.features.len(), 1);

        let feature = &layer.features[0];
        assert_eq!(feature.id, Some((5 << 8) | 7));
        assert_eq!(feature.r#type, Some(GeomType::Polygon as i32));
        assert_eq!(decode_ring(&feature.geometry).unwrap()[0], (7, 5));

        assert_eq!(int_attr(&layer, feature, "ele"), 12345);
        assert_eq!(int_attr(&layer, feature, "f"), 0);
        assert_eq!(int_attr(&layer, feature, "f_base"), 0);
        assert_eq!(int_attr(&layer, feature, "f_height"), 131_072);
        assert_eq!(int_attr(&layer, feature, "x"), 7);
        assert_eq!(int_attr(&layer, feature, "y"), 5);
        assert_eq!(int_attr(&layer, feature, "z"), 8);

        // f and f_base are both 0 and share one table entry
        assert_eq!(layer.values.len(), 6);
    }

    #[test]
    fn test_window_uses_local_geometry_and_absolute_attributes() {
        let mut grid = ElevationGrid::empty();
        // Window (1, 2) of size 32 starts at column 32, row 64
        grid.set(64 + 3, 32 + 1, Some(10.0));
        grid.set(0, 0, Some(99.0));
        let ancestor = tile(12, 3638, 1612);
        let layer = build_layer(&grid, ancestor, (1, 2), ScaleFactor::new(4).unwrap());

        assert_eq!(layer.extent, 32);
        assert_eq!(layer.features.len(), 1);
        let feature = &layer.features[0];
        assert_eq!(decode_ring(&feature.geometry).unwrap()[0], (1, 3));
        assert_eq!(feature.id, Some((67 << 8) | 33));
        assert_eq!(int_attr(&layer, feature, "x"), 3638 * 256 + 33);
        assert_eq!(int_attr(&layer, feature, "y"), 1612 * 256 + 67);
        assert_eq!(int_attr(&layer, feature, "z"), 20);
        // 32 m slabs at zoom 20
        assert_eq!(int_attr(&layer, feature, "f_base"), 0);
        assert_eq!(int_attr(&layer, feature, "f_height"), 32);
    }

    #[test]
    fn test_tags_reference_valid_indices() {
        let mut grid = ElevationGrid::empty();
        for i in 0..32 {
            grid.set(i, i, Some(i as f64 * 3.7 - 20.0));
        }
        let layer = build_layer(&grid, tile(3, 1, 1), (0, 0), ScaleFactor::new(4).unwrap());
        assert_eq!(layer.features.len(), 32);
        for feature in &layer.features {
            assert_eq!(feature.tags.len(), 14);
            for pair in feature.tags.chunks(2) {
                assert!((pair[0] as usize) < layer.keys.len());
                assert!((pair[1] as usize) < layer.values.len());
            }
        }
    }

    #[test]
    fn test_sub_meter_slabs_use_double_values() {
        let mut grid = ElevationGrid::empty();
        grid.set(0, 0, Some(10.3));
        // Pixel zoom 26 has half-meter slabs
        let layer = build_layer(&grid, tile(18, 0, 0), (0, 0), ScaleFactor::new(1).unwrap());
        let feature = &layer.features[0];

        assert_eq!(int_attr(&layer, feature, "f"), 20);
        assert_eq!(int_attr(&layer, feature, "f_base"), 10);

        let key_idx = layer.keys.iter().position(|k| k == "f_height").unwrap() as u32;
        let value_idx = feature
            .tags
            .chunks(2)
            .find(|pair| pair[0] == key_idx)
            .map(|pair| pair[1] as usize)
            .unwrap();
        let value = &layer.values[value_idx];
        assert!(value.int_value.is_none());
        assert_relative_eq!(value.double_value.unwrap(), 10.5);
    }

    #[test]
    fn test_equal_values_share_table_entries() {
        let mut grid = ElevationGrid::empty();
        grid.set(0, 0, Some(42.0));
        grid.set(9, 4, Some(42.0));
        let layer = build_layer(&grid, tile(0, 0, 0), (0, 0), ScaleFactor::new(1).unwrap());
        assert_eq!(layer.features.len(), 2);

        let ele_key = layer.keys.iter().position(|k| k == "ele").unwrap() as u32;
        let ele_index = |feature: &Feature| {
            feature
                .tags
                .chunks(2)
                .find(|pair| pair[0] == ele_key)
                .map(|pair| pair[1])
                .unwrap()
        };
        assert_eq!(ele_index(&layer.features[0]), ele_index(&layer.features[1]));
        assert_eq!(int_attr(&layer, &layer.features[1], "ele"), 4200);
    }
}
