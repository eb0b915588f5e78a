//! Error types for the HTTP edge.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use demvt_dem::DemError;
use demvt_metrics::{metric_defs, metrics};
use demvt_mvt::TileError;
use thiserror::Error;

/// Errors surfaced to HTTP clients as a status code and a plain text body.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Request parameters are missing or out of range.
    #[error("{0}")]
    BadRequest(String),

    /// No route matched.
    #[error("not found")]
    NotFound,

    /// A governing tile needed for a complete answer has no data.
    #[error("insufficient DEM data: {0}")]
    InsufficientData(String),

    /// Anything else.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::InsufficientData(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<DemError> for ServerError {
    fn from(err: DemError) -> Self {
        match err {
            DemError::InsufficientData { z, x, y } => {
                ServerError::InsufficientData(format!("{}/{}/{}", z, x, y))
            }
            e if e.is_invalid_argument() => ServerError::BadRequest(e.to_string()),
            e => ServerError::Internal(e.to_string()),
        }
    }
}

impl From<TileError> for ServerError {
    fn from(err: TileError) -> Self {
        match err {
            TileError::Dem(e) => e.into(),
            e => ServerError::BadRequest(e.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }
        (status, self.to_string()).into_response()
    }
}

/// Count a tile response by status.
pub(crate) fn record_tile_status(status: StatusCode) {
    metrics::counter!(metric_defs::TILES_SERVED.name, "status" => status.as_u16().to_string())
        .increment(1);
}
