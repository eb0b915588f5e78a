//! Error types for demvt-mvt.

use demvt_dem::DemError;
use thiserror::Error;

/// Errors that can occur while building vector tiles.
#[derive(Debug, Error)]
pub enum TileError {
    /// Scale factor outside the supported range.
    #[error("Invalid scale factor {0} (must be between {min} and {max})", min = crate::ScaleFactor::MIN, max = crate::ScaleFactor::MAX)]
    InvalidScaleFactor(u8),

    /// Tile algebra or grid lookup failed.
    #[error(transparent)]
    Dem(#[from] DemError),
}

impl TileError {
    /// Whether the error comes from bad input rather than the data or the service.
    pub fn is_invalid_argument(&self) -> bool {
        match self {
            TileError::InvalidScaleFactor(_) => true,
            TileError::Dem(e) => e.is_invalid_argument(),
        }
    }
}
