//! # demvt-mvt
//!
//! Mapbox vector tile encoding of merged DEM grids.
//!
//! Every cell with data in the requested window becomes a unit square polygon in
//! a single `dem` layer. The geometry command stream and the deduplicated value
//! table are built by hand; protobuf framing goes through `prost`.
//!
//! ## Layer layout
//!
//! | Key        | Value                                            |
//! |------------|--------------------------------------------------|
//! | `ele`      | elevation in centimeters                          |
//! | `f_height` | top of the ZFXY vertical slab, meters             |
//! | `f_base`   | bottom of the ZFXY vertical slab, meters          |
//! | `x`, `y`   | absolute pixel address at zoom `z`                |
//! | `z`        | pixel zoom: governing tile zoom + 8               |
//! | `f`        | vertical slab index                               |

mod builder;
mod codec;
mod encode;
mod error;
pub mod proto;
mod values;

pub use builder::{
    build_layer, ScaleFactor, TileContent, TileFeatureBuilder, ATTRIBUTE_KEYS, LAYER_NAME,
    LAYER_VERSION,
};
pub use codec::{
    command_decode, command_encode, decode_ring, unit_square_geometry, zigzag_decode,
    zigzag_encode, Command, UNIT_SQUARE_LEN,
};
pub use encode::{decode_tile, encode_tile};
pub use error::TileError;
pub use values::{AttributeValue, ValueTable};

/// Result type for tile building.
pub type Result<T> = std::result::Result<T, TileError>;
