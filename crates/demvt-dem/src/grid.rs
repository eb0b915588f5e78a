//! Fixed-size DEM grids parsed from GSI elevation text tiles.
//!
//! The text format is one line per grid row (north to south) with comma-separated
//! values per column (west to east). Each value is an elevation in meters or the
//! literal `e` for "no data". See <https://maps.gsi.go.jp/development/demtile.html>.

use crate::coord::TILE_SIZE;
use crate::{DemError, Result};

/// Number of rows and columns in every grid.
pub const GRID_SIZE: usize = TILE_SIZE as usize;

/// Token used by the upstream text format for missing cells.
pub const NO_DATA_TOKEN: &str = "e";

/// A 256x256 grid of elevations in meters.
///
/// Cells without data are stored as NaN and read back as `None`.
#[derive(Clone)]
pub struct ElevationGrid {
    /// Elevation data in row-major order (north to south, west to east).
    cells: Vec<f64>,
}

impl PartialEq for ElevationGrid {
    fn eq(&self, other: &Self) -> bool {
        self.cells
            .iter()
            .zip(&other.cells)
            .all(|(a, b)| a == b || (a.is_nan() && b.is_nan()))
    }
}

impl std::fmt::Debug for ElevationGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElevationGrid")
            .field("present_cells", &self.present_cells())
            .finish()
    }
}

impl Default for ElevationGrid {
    fn default() -> Self {
        Self::empty()
    }
}

impl ElevationGrid {
    /// A grid with no data in any cell.
    pub fn empty() -> Self {
        Self {
            cells: vec![f64::NAN; GRID_SIZE * GRID_SIZE],
        }
    }

    /// Parse a GSI DEM text body.
    ///
    /// Tokens are trimmed and empty tokens dropped, so trailing commas and a
    /// trailing newline are tolerated. Short rows and missing trailing rows are padded with
    /// no-data. More than 256 rows or columns, or a token that is neither a number
    /// nor `e`, rejects the whole body.
    pub fn parse(text: &str) -> Result<Self> {
        let mut grid = Self::empty();

        for (row, line) in text.split('\n').enumerate() {
            let tokens: Vec<&str> = line
                .split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .collect();
            if tokens.is_empty() {
                continue;
            }
            if row >= GRID_SIZE {
                return Err(DemError::MalformedGrid {
                    row,
                    col: 0,
                    reason: format!("more than {} rows", GRID_SIZE),
                });
            }
            if tokens.len() > GRID_SIZE {
                return Err(DemError::MalformedGrid {
                    row,
                    col: GRID_SIZE,
                    reason: format!("{} columns, expected at most {}", tokens.len(), GRID_SIZE),
                });
            }
            for (col, token) in tokens.into_iter().enumerate() {
                if token == NO_DATA_TOKEN {
                    continue;
                }
                let value: f64 = token.parse().map_err(|_| DemError::MalformedGrid {
                    row,
                    col,
                    reason: format!("invalid elevation {:?}", token),
                })?;
                if !value.is_finite() {
                    return Err(DemError::MalformedGrid {
                        row,
                        col,
                        reason: format!("non-finite elevation {:?}", token),
                    });
                }
                grid.cells[row * GRID_SIZE + col] = value;
            }
        }

        Ok(grid)
    }

    /// Combine a fine grid with an optional coarse grid.
    ///
    /// Every cell takes the fine value when present, otherwise the coarse value at
    /// the same position. A coarse value never replaces a present fine value.
    pub fn merge(fine: &ElevationGrid, coarse: Option<&ElevationGrid>) -> ElevationGrid {
        let Some(coarse) = coarse else {
            return fine.clone();
        };
        let cells = fine
            .cells
            .iter()
            .zip(&coarse.cells)
            .map(|(&fine, &coarse)| if fine.is_nan() { coarse } else { fine })
            .collect();
        ElevationGrid { cells }
    }

    /// Elevation in meters at `(row, col)`, or `None` for no data.
    ///
    /// # Panics
    /// Panics if `row` or `col` is 256 or more.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        assert!(row < GRID_SIZE && col < GRID_SIZE, "cell ({}, {}) out of range", row, col);
        let value = self.cells[row * GRID_SIZE + col];
        (!value.is_nan()).then_some(value)
    }

    /// Set the elevation at `(row, col)`; `None` clears the cell.
    pub fn set(&mut self, row: usize, col: usize, value: Option<f64>) {
        assert!(row < GRID_SIZE && col < GRID_SIZE, "cell ({}, {}) out of range", row, col);
        self.cells[row * GRID_SIZE + col] = value.unwrap_or(f64::NAN);
    }

    /// Number of cells holding an elevation.
    pub fn present_cells(&self) -> usize {
        self.cells.iter().filter(|v| !v.is_nan()).count()
    }

    /// Whether no cell holds an elevation.
    pub fn is_empty(&self) -> bool {
        self.present_cells() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_of(value: &str) -> String {
        vec![value; GRID_SIZE].join(",")
    }

    #[test]
    fn test_parse_full_grid() {
        let text = (0..GRID_SIZE)
            .map(|r| row_of(&format!("{}.5", r)))
            .collect::<Vec<_>>()
            .join("\n");
        let grid = ElevationGrid::parse(&text).unwrap();
        assert_eq!(grid.present_cells(), GRID_SIZE * GRID_SIZE);
        assert_eq!(grid.get(0, 0), Some(0.5));
        assert_eq!(grid.get(255, 255), Some(255.5));
    }

    #[test]
    fn test_parse_no_data_and_whitespace() {
        let grid = ElevationGrid::parse(" 12.25 , e ,3\n e,e,-1.5,\n").unwrap();
        assert_eq!(grid.get(0, 0), Some(12.25));
        assert_eq!(grid.get(0, 1), None);
        assert_eq!(grid.get(0, 2), Some(3.0));
        assert_eq!(grid.get(1, 2), Some(-1.5));
        assert_eq!(grid.present_cells(), 3);
    }

    #[test]
    fn test_parse_pads_short_rows() {
        let grid = ElevationGrid::parse("1,2\n3").unwrap();
        assert_eq!(grid.get(0, 1), Some(2.0));
        assert_eq!(grid.get(0, 2), None);
        assert_eq!(grid.get(1, 0), Some(3.0));
        assert_eq!(grid.get(200, 200), None);
    }

    #[test]
    fn test_parse_rejects_bad_token() {
        let err = ElevationGrid::parse("1,2\n3,abc").unwrap_err();
        assert!(matches!(err, DemError::MalformedGrid { row: 1, col: 1, .. }));
    }

    #[test]
    fn test_parse_rejects_oversized_grid() {
        let wide = vec!["1"; GRID_SIZE + 1].join(",");
        assert!(matches!(
            ElevationGrid::parse(&wide),
            Err(DemError::MalformedGrid { row: 0, .. })
        ));

        let tall = vec!["1"; GRID_SIZE + 1].join("\n");
        assert!(matches!(
            ElevationGrid::parse(&tall),
            Err(DemError::MalformedGrid { row: 256, .. })
        ));
    }

    #[test]
    fn test_merge_fills_from_coarse_only_where_fine_is_missing() {
        let mut fine = ElevationGrid::empty();
        fine.set(0, 0, Some(10.0));
        let mut coarse = ElevationGrid::empty();
        coarse.set(0, 0, Some(99.0));
        coarse.set(5, 7, Some(42.0));

        let merged = ElevationGrid::merge(&fine, Some(&coarse));
        assert_eq!(merged.get(0, 0), Some(10.0));
        assert_eq!(merged.get(5, 7), Some(42.0));
        assert_eq!(merged.get(1, 1), None);
    }

    #[test]
    fn test_merge_without_coarse() {
        let mut fine = ElevationGrid::empty();
        fine.set(3, 3, Some(1.0));
        assert_eq!(ElevationGrid::merge(&fine, None), fine);
    }
}
