//! Typed requests parsed once at the HTTP edge.

use crate::ServerError;
use demvt_dem::{TileCoord, MAX_ZOOM};
use serde::Deserialize;

/// A routed request with every parameter already validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemRequest {
    /// `GET /tiles.json`
    TileJson,
    /// `GET /tiles/{z}/{x}/{y}`
    Tile(TileCoord),
    /// `GET /cross-section?z=&from=&to=`
    CrossSection(CrossSectionQuery),
}

/// Line of pixel addresses to sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossSectionQuery {
    /// Pixel zoom of both endpoints.
    pub z: u8,
    /// Start `(x, y)`.
    pub from: (u32, u32),
    /// End `(x, y)`.
    pub to: (u32, u32),
}

/// Raw query string of the cross-section route.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrossSectionParams {
    pub z: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl CrossSectionParams {
    /// Validate into a typed query.
    pub fn parse(&self) -> Result<CrossSectionQuery, ServerError> {
        let z = parse_zoom(required(&self.z, "z")?)?;
        Ok(CrossSectionQuery {
            z,
            from: parse_point(required(&self.from, "from")?, "from")?,
            to: parse_point(required(&self.to, "to")?, "to")?,
        })
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, ServerError> {
    value
        .as_deref()
        .ok_or_else(|| ServerError::BadRequest(format!("missing query parameter {:?}", name)))
}

fn parse_zoom(value: &str) -> Result<u8, ServerError> {
    match value.trim().parse::<u8>() {
        Ok(z) if z <= MAX_ZOOM => Ok(z),
        _ => Err(ServerError::BadRequest(format!(
            "invalid zoom {:?} (expected 0 to {})",
            value, MAX_ZOOM
        ))),
    }
}

fn parse_u32(value: &str, name: &str) -> Result<u32, ServerError> {
    value
        .trim()
        .parse()
        .map_err(|_| ServerError::BadRequest(format!("invalid {} {:?}", name, value)))
}

/// Parse an `x,y` pair.
pub fn parse_point(value: &str, name: &str) -> Result<(u32, u32), ServerError> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| ServerError::BadRequest(format!("{} must be \"x,y\", got {:?}", name, value)))?;
    Ok((parse_u32(x, name)?, parse_u32(y, name)?))
}

/// Parse tile path segments. Anything after the first `.` in `y` is ignored,
/// so `12.mvt` and `12.pbf` both address row 12.
pub fn parse_tile_path(z: &str, x: &str, y: &str) -> Result<TileCoord, ServerError> {
    let y = y.split_once('.').map_or(y, |(stem, _)| stem);
    let z = parse_zoom(z)?;
    let x = parse_u32(x, "x")?;
    let y = parse_u32(y, "y")?;
    Ok(TileCoord::new(z, x, y)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_path_strips_suffix() {
        let tile = parse_tile_path("15", "29100", "12900.mvt").unwrap();
        assert_eq!(tile, TileCoord::new(15, 29_100, 12_900).unwrap());
        assert_eq!(parse_tile_path("3", "1", "2.pbf").unwrap().y, 2);
        assert_eq!(parse_tile_path("3", "1", "2").unwrap().y, 2);
    }

    #[test]
    fn test_tile_path_rejects_bad_values() {
        assert!(parse_tile_path("3", "8", "0").is_err());
        assert!(parse_tile_path("31", "0", "0").is_err());
        assert!(parse_tile_path("a", "0", "0").is_err());
        assert!(parse_tile_path("3", "-1", "0").is_err());
        assert!(parse_tile_path("3", "0", ".mvt").is_err());
    }

    #[test]
    fn test_cross_section_params() {
        let params = CrossSectionParams {
            z: Some("18".into()),
            from: Some("232801,103222".into()),
            to: Some(" 232810 , 103230".into()),
        };
        assert_eq!(
            params.parse().unwrap(),
            CrossSectionQuery {
                z: 18,
                from: (232_801, 103_222),
                to: (232_810, 103_230),
            }
        );
    }

    #[test]
    fn test_cross_section_params_missing_or_malformed() {
        let missing = CrossSectionParams {
            z: Some("18".into()),
            from: Some("1,2".into()),
            to: None,
        };
        assert!(matches!(missing.parse(), Err(ServerError::BadRequest(_))));

        let malformed = CrossSectionParams {
            z: Some("18".into()),
            from: Some("1;2".into()),
            to: Some("3,4".into()),
        };
        assert!(matches!(malformed.parse(), Err(ServerError::BadRequest(_))));
    }
}
