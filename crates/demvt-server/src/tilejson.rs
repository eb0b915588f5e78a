//! TileJSON metadata for the `dem` layer.

use demvt_mvt::{ScaleFactor, LAYER_NAME};
use serde::Serialize;
use std::collections::BTreeMap;

pub const TILEJSON_VERSION: &str = "3.0.0";
pub const TILESET_NAME: &str = "jgsi-dem";
pub const ATTRIBUTION: &str =
    r#"<a href="https://www.gsi.go.jp/" target="_blank">&copy; GSI Japan</a>"#;

const FIELDS: [(&str, &str); 7] = [
    ("ele", "Elevation in centimeters"),
    ("f_height", "Top of the vertical slab in meters"),
    ("f_base", "Bottom of the vertical slab in meters"),
    ("x", "Pixel column at zoom z"),
    ("y", "Pixel row at zoom z"),
    ("z", "Pixel zoom"),
    ("f", "Vertical slab index"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileJson {
    pub tilejson: &'static str,
    pub name: &'static str,
    pub tiles: Vec<String>,
    pub vector_layers: Vec<VectorLayer>,
    pub minzoom: u8,
    pub maxzoom: u8,
    pub attribution: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorLayer {
    pub id: &'static str,
    pub fields: BTreeMap<&'static str, &'static str>,
}

impl TileJson {
    /// Document for tiles served under `base_url`.
    pub fn new(base_url: &str, scale: ScaleFactor) -> Self {
        Self {
            tilejson: TILEJSON_VERSION,
            name: TILESET_NAME,
            tiles: vec![format!(
                "{}/tiles/{{z}}/{{x}}/{{y}}.mvt",
                base_url.trim_end_matches('/')
            )],
            vector_layers: vec![VectorLayer {
                id: LAYER_NAME,
                fields: FIELDS.into_iter().collect(),
            }],
            minzoom: scale.min_zoom(),
            maxzoom: scale.max_zoom(),
            attribution: ATTRIBUTION,
        }
    }
}

/// Base URL for the tile template: the configured public URL, else `http://<host>`.
pub fn base_url(public_url: Option<&str>, host: Option<&str>) -> String {
    match (public_url, host) {
        (Some(url), _) => url.trim_end_matches('/').to_string(),
        (None, Some(host)) => format!("http://{}", host),
        (None, None) => "http://localhost".to_string(),
    }
}
