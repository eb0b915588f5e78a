//! Error types for the DEM crate.

use thiserror::Error;

/// Errors that can occur when working with DEM tiles and grids.
///
/// Missing survey coverage is not an error: sources and the merger report it as
/// `None` instead.
#[derive(Debug, Error)]
pub enum DemError {
    /// Tile coordinate is outside the pyramid for its zoom level.
    #[error("Invalid tile z={z} x={x} y={y}: x and y must be below 2^{z}")]
    InvalidCoordinate {
        /// Zoom level.
        z: u8,
        /// X tile coordinate.
        x: u32,
        /// Y tile coordinate.
        y: u32,
    },

    /// Zoom level is deeper than the pyramid supports.
    #[error("Invalid zoom level {0} (must be at most {max})", max = crate::MAX_ZOOM)]
    InvalidZoomLevel(u8),

    /// A zoom 0 tile has no parent.
    #[error("Tile z=0 has no parent")]
    NoParent,

    /// Asked to walk further up the pyramid than the tile's zoom allows.
    #[error("Cannot ascend {steps} levels from a zoom {zoom} tile")]
    AncestorOutOfRange {
        /// Requested number of levels.
        steps: u8,
        /// Zoom of the starting tile.
        zoom: u8,
    },

    /// Target zoom is deeper than the tile's own zoom.
    #[error("Target zoom {target} is above tile zoom {zoom}")]
    TargetZoomAboveTile {
        /// Requested ancestor zoom.
        target: u8,
        /// Zoom of the starting tile.
        zoom: u8,
    },

    /// Cross-section line samples more points than allowed.
    #[error("Cross-section of {points} points exceeds the limit of {max}")]
    LineTooLong {
        /// Points the line would sample.
        points: usize,
        /// Configured cap.
        max: usize,
    },

    /// DEM text body could not be turned into a grid.
    #[error("Malformed DEM grid at row {row}, column {col}: {reason}")]
    MalformedGrid {
        /// Zero-based row of the offending token.
        row: usize,
        /// Zero-based column of the offending token.
        col: usize,
        /// Reason for failure.
        reason: String,
    },

    /// A governing tile needed for a complete answer has no data.
    #[error("Insufficient DEM data for tile z={z} x={x} y={y}")]
    InsufficientData {
        /// Zoom level.
        z: u8,
        /// X tile coordinate.
        x: u32,
        /// Y tile coordinate.
        y: u32,
    },

    /// Grid cache lock was poisoned (a thread panicked while holding the lock).
    #[error("Grid cache lock was poisoned")]
    CacheLockPoisoned,

    /// HTTP client could not be constructed.
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),
}

impl DemError {
    /// Whether the error comes from bad input coordinates rather than the data.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            DemError::InvalidCoordinate { .. }
                | DemError::InvalidZoomLevel(_)
                | DemError::NoParent
                | DemError::AncestorOutOfRange { .. }
                | DemError::TargetZoomAboveTile { .. }
                | DemError::LineTooLong { .. }
        )
    }
}
