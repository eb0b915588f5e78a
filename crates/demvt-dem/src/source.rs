//! Upstream DEM text tile sources.
//!
//! GSI publishes elevation tiles as text at two resolutions:
//! - `dem5a`: 5 m laser survey data, sparse coverage (the fine tier)
//! - `dem`: 10 m data, national coverage (the coarse tier)
//!
//! Both are served as `GET <base>/{z}/{x}/{y}.txt`. A 404 means the tile lies
//! outside survey coverage, which is expected at the edges and is reported as
//! `None` rather than an error.

use crate::{DemError, ElevationGrid, Result, TileCoord};
use async_trait::async_trait;
use demvt_metrics::{metric_defs, metrics};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default fine tier base URL (GSI DEM5A).
pub const DEFAULT_FINE_URL: &str = "https://cyberjapandata.gsi.go.jp/xyz/dem5a";

/// Default coarse tier base URL (GSI DEM10B).
pub const DEFAULT_COARSE_URL: &str = "https://cyberjapandata.gsi.go.jp/xyz/dem";

/// Default deadline for a single upstream fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolution tier of an upstream DEM source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DemTier {
    /// Higher resolution, partial coverage. Authoritative where present.
    Fine,
    /// Lower resolution, fills no-data cells of the fine tier.
    Coarse,
}

impl DemTier {
    /// Returns the tier as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            DemTier::Fine => "fine",
            DemTier::Coarse => "coarse",
        }
    }
}

impl fmt::Display for DemTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that can supply one tier of DEM data for a tile.
#[async_trait]
pub trait GridSource: Send + Sync {
    /// Fetch and parse one tier of a tile. `None` means no data is available.
    async fn fetch(&self, tile: TileCoord, tier: DemTier) -> Option<ElevationGrid>;
}

/// Where and how to fetch upstream tiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// Base URL of the fine tier.
    pub fine_url: String,
    /// Base URL of the coarse tier.
    pub coarse_url: String,
    /// Deadline for one fetch, including reading the body.
    pub timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            fine_url: DEFAULT_FINE_URL.to_string(),
            coarse_url: DEFAULT_COARSE_URL.to_string(),
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl SourceConfig {
    /// URL of `tile` in `tier`.
    pub fn tile_url(&self, tile: TileCoord, tier: DemTier) -> String {
        let base = match tier {
            DemTier::Fine => &self.fine_url,
            DemTier::Coarse => &self.coarse_url,
        };
        format!(
            "{}/{}/{}/{}.txt",
            base.trim_end_matches('/'),
            tile.z,
            tile.x,
            tile.y
        )
    }
}

/// Outcome label for fetch metrics.
#[derive(Debug, Clone, Copy)]
enum FetchOutcome {
    Ok,
    NotFound,
    HttpError,
    Transport,
    Malformed,
}

impl FetchOutcome {
    const fn as_str(&self) -> &'static str {
        match self {
            FetchOutcome::Ok => "ok",
            FetchOutcome::NotFound => "not_found",
            FetchOutcome::HttpError => "http_error",
            FetchOutcome::Transport => "transport",
            FetchOutcome::Malformed => "malformed",
        }
    }
}

/// DEM source backed by HTTP text tiles.
///
/// Failures never propagate: non-success statuses, transport errors, timeouts
/// and malformed bodies all degrade to `None` and are logged.
pub struct HttpGridSource {
    config: SourceConfig,
    client: reqwest::Client,
}

impl fmt::Debug for HttpGridSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpGridSource")
            .field("config", &self.config)
            .finish()
    }
}

impl HttpGridSource {
    /// Create a source with its own HTTP client.
    pub fn new(config: SourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(DemError::HttpRequest)?;
        Ok(Self { config, client })
    }

    /// Get the source configuration.
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    async fn fetch_inner(&self, url: &str) -> (FetchOutcome, Option<ElevationGrid>) {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url, error = %e, "DEM fetch failed");
                return (FetchOutcome::Transport, None);
            }
        };

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!(url, "DEM tile outside coverage");
            return (FetchOutcome::NotFound, None);
        }
        if !status.is_success() {
            warn!(url, status = %status, "DEM fetch returned an error status");
            return (FetchOutcome::HttpError, None);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(url, error = %e, "DEM body could not be read");
                return (FetchOutcome::Transport, None);
            }
        };

        match ElevationGrid::parse(&body) {
            Ok(grid) => (FetchOutcome::Ok, Some(grid)),
            Err(e) => {
                warn!(url, error = %e, "DEM body is malformed");
                (FetchOutcome::Malformed, None)
            }
        }
    }
}

#[async_trait]
impl GridSource for HttpGridSource {
    async fn fetch(&self, tile: TileCoord, tier: DemTier) -> Option<ElevationGrid> {
        let url = self.config.tile_url(tile, tier);
        debug!(%tile, %tier, url, "Fetching DEM tile");

        let started = Instant::now();
        let (outcome, grid) = self.fetch_inner(&url).await;

        metrics::counter!(
            metric_defs::UPSTREAM_FETCHES.name,
            "tier" => tier.as_str(),
            "outcome" => outcome.as_str()
        )
        .increment(1);
        metrics::histogram!(metric_defs::UPSTREAM_FETCH_TIME.name, "tier" => tier.as_str())
            .record(started.elapsed().as_secs_f64() * 1000.0);

        grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_url() {
        let config = SourceConfig::default();
        let tile = TileCoord::new(15, 29_100, 12_900).unwrap();
        assert_eq!(
            config.tile_url(tile, DemTier::Fine),
            "https://cyberjapandata.gsi.go.jp/xyz/dem5a/15/29100/12900.txt"
        );
        assert_eq!(
            config.tile_url(tile, DemTier::Coarse),
            "https://cyberjapandata.gsi.go.jp/xyz/dem/15/29100/12900.txt"
        );
    }

    #[test]
    fn test_tile_url_trims_trailing_slash() {
        let config = SourceConfig {
            fine_url: "http://localhost:9000/fine/".into(),
            ..SourceConfig::default()
        };
        let tile = TileCoord::new(1, 1, 0).unwrap();
        assert_eq!(
            config.tile_url(tile, DemTier::Fine),
            "http://localhost:9000/fine/1/1/0.txt"
        );
    }

    #[test]
    fn test_tier_display() {
        assert_eq!(DemTier::Fine.to_string(), "fine");
        assert_eq!(DemTier::Coarse.to_string(), "coarse");
    }
}
