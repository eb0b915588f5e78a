//! Serialization of layers to the vector tile wire format.

use crate::proto::{Layer, Tile};
use demvt_metrics::{metric_defs, metrics};
use prost::Message;

/// Serialize a single-layer tile.
pub fn encode_tile(layer: Layer) -> Vec<u8> {
    let features = layer.features.len();
    let bytes = Tile {
        layers: vec![layer],
    }
    .encode_to_vec();

    metrics::histogram!(metric_defs::TILE_FEATURES.name).record(features as f64);
    metrics::histogram!(metric_defs::TILE_ENCODED_BYTES.name).record(bytes.len() as f64);
    bytes
}

/// Parse a serialized tile.
pub fn decode_tile(bytes: &[u8]) -> Result<Tile, prost::DecodeError> {
    Tile::decode(bytes)
}
