//! HTTP handlers.
//!
//! Each route handler only extracts its parameters into a [`DemRequest`];
//! [`handle`] does the work and [`respond`] applies headers and compression.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use demvt_dem::SampledPoint;
use demvt_mvt::{encode_tile, TileContent};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::app::AppState;
use crate::encoding::{compress, negotiate};
use crate::error::record_tile_status;
use crate::request::{parse_tile_path, CrossSectionParams, DemRequest};
use crate::tilejson::{base_url, TileJson};
use crate::ServerError;

/// Content type of tile responses.
pub const MVT_CONTENT_TYPE: &str = "application/vnd.mapbox-vector-tile";
/// Content type of JSON responses.
pub const JSON_CONTENT_TYPE: &str = "application/json";

// ============================================================================
// Routes
// ============================================================================

/// `GET /tiles.json`
#[instrument(skip(state, headers))]
pub async fn tile_json(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    dispatch(&state, Ok(DemRequest::TileJson), &headers).await
}

/// `GET /tiles/{z}/{x}/{y}`; anything after a `.` in `y` is ignored.
#[instrument(skip(state, headers))]
pub async fn tile(
    State(state): State<Arc<AppState>>,
    Path((z, x, y)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Response {
    let request = parse_tile_path(&z, &x, &y).map(DemRequest::Tile);
    let response = dispatch(&state, request, &headers).await;
    record_tile_status(response.status());
    response
}

/// `GET /cross-section?z=&from=x,y&to=x,y`
#[instrument(skip(state, headers))]
pub async fn cross_section(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CrossSectionParams>,
    headers: HeaderMap,
) -> Response {
    let request = params.parse().map(DemRequest::CrossSection);
    dispatch(&state, request, &headers).await
}

/// Fallback for unmatched routes.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}

/// `GET /metrics` in the Prometheus text format.
#[cfg(feature = "prometheus")]
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match &state.prometheus {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => ServerError::NotFound.into_response(),
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// A successful response before headers and compression.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A JSON document.
    Json(Vec<u8>),
    /// An encoded vector tile.
    Tile(Vec<u8>),
    /// 204 with an empty body.
    NoContent,
}

async fn dispatch(
    state: &AppState,
    request: Result<DemRequest, ServerError>,
    headers: &HeaderMap,
) -> Response {
    let result = match request {
        Ok(request) => handle(state, request, headers).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(payload) => respond(payload, headers, state.settings.max_age),
        Err(err) => err.into_response(),
    }
}

/// Execute a parsed request.
pub async fn handle(
    state: &AppState,
    request: DemRequest,
    headers: &HeaderMap,
) -> Result<Payload, ServerError> {
    match request {
        DemRequest::TileJson => {
            let host = headers
                .get(header::HOST)
                .and_then(|value| value.to_str().ok());
            let base = base_url(state.settings.public_url.as_deref(), host);
            let doc = TileJson::new(&base, state.tiles.scale());
            Ok(Payload::Json(to_json(&doc)?))
        }
        DemRequest::Tile(tile) => match state.tiles.build(tile).await? {
            TileContent::Empty => Ok(Payload::NoContent),
            TileContent::Layer(layer) => Ok(Payload::Tile(encode_tile(layer))),
        },
        DemRequest::CrossSection(query) => {
            let points = state.sampler.sample(query.z, query.from, query.to).await?;
            Ok(Payload::Json(to_json(&CrossSectionBody::new(&points))?))
        }
    }
}

/// Turn a payload into a response, compressing the body when the client accepts
/// one of the supported codings.
pub fn respond(payload: Payload, headers: &HeaderMap, max_age: u32) -> Response {
    let (content_type, body, cacheable) = match payload {
        Payload::NoContent => return StatusCode::NO_CONTENT.into_response(),
        Payload::Json(body) => (JSON_CONTENT_TYPE, body, false),
        Payload::Tile(body) => (MVT_CONTENT_TYPE, body, true),
    };

    let mut out = HeaderMap::new();
    out.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    if cacheable {
        if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={}", max_age)) {
            out.insert(header::CACHE_CONTROL, value);
        }
    }

    let accept = headers
        .get(header::ACCEPT_ENCODING)
        .and_then(|value| value.to_str().ok());
    let body = match negotiate(accept) {
        Some(coding) => match compress(coding, &body) {
            Ok(compressed) => {
                debug!(%coding, raw = body.len(), compressed = compressed.len(), "Compressed response");
                out.insert(header::VARY, HeaderValue::from_static("accept-encoding"));
                out.insert(header::CONTENT_ENCODING, HeaderValue::from_static(coding.as_str()));
                compressed
            }
            Err(e) => {
                warn!(%coding, error = %e, "Compression failed, sending identity body");
                body
            }
        },
        None => body,
    };

    (StatusCode::OK, out, body).into_response()
}

fn to_json<T: Serialize>(value: &T) -> Result<Vec<u8>, ServerError> {
    serde_json::to_vec(value).map_err(|e| ServerError::Internal(e.to_string()))
}

// ============================================================================
// Cross-section body
// ============================================================================

/// JSON body of the cross-section route.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossSectionBody {
    /// One footprint polygon per point with `ele` (m), `fh` and `fb` properties.
    pub geojson_cubes: FeatureCollection,
    /// `[x, y, elevation_cm, f]` per point, in line order.
    pub annotated_points: Vec<(u32, u32, i64, i64)>,
}

impl CrossSectionBody {
    /// Body for `points`, in line order.
    pub fn new(points: &[SampledPoint]) -> Self {
        Self {
            geojson_cubes: FeatureCollection {
                bbox: None,
                features: points.iter().map(footprint_feature).collect(),
                foreign_members: None,
            },
            annotated_points: points
                .iter()
                .map(|p| (p.x, p.y, p.elevation_cm, p.slab.index))
                .collect(),
        }
    }
}

fn footprint_feature(point: &SampledPoint) -> Feature {
    let ring = point
        .footprint
        .ring()
        .iter()
        .map(|corner| corner.to_vec())
        .collect();

    let mut properties = JsonObject::new();
    properties.insert("ele".into(), (point.elevation_cm as f64 / 100.0).into());
    properties.insert("fh".into(), point.slab.top.into());
    properties.insert("fb".into(), point.slab.base.into());

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}
