use clap::Parser;
use demvt_dem::{
    SourceConfig, DEFAULT_CACHE_CAPACITY, DEFAULT_COARSE_URL, DEFAULT_FINE_URL,
    DEFAULT_MAX_CROSS_SECTION_POINTS,
};
use demvt_mvt::{ScaleFactor, TileError};
use std::net::SocketAddr;
use std::time::Duration;

/// `demvt` - Serves GSI elevation data as Mapbox vector tiles.
///
/// Fine and coarse DEM text tiles are fetched from the configured upstream
/// tiers, merged, and re-tiled under the scale factor. A cross-section route
/// samples elevations along a line of pixel addresses.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Socket address the HTTP server binds to.
    #[arg(long = "listen", env = "DEMVT_LISTEN_ADDR", default_value = "0.0.0.0:3000")]
    pub listen_addr: SocketAddr,

    /// Public base URL used in the TileJSON tile template.
    ///
    /// When unset, the template is built from the request `Host` header.
    #[arg(long, env = "DEMVT_PUBLIC_URL")]
    pub public_url: Option<String>,

    /// Base URL of the fine DEM tier.
    #[arg(long, env = "DEMVT_FINE_URL", default_value = DEFAULT_FINE_URL)]
    pub fine_url: String,

    /// Base URL of the coarse DEM tier.
    #[arg(long, env = "DEMVT_COARSE_URL", default_value = DEFAULT_COARSE_URL)]
    pub coarse_url: String,

    /// Scale factor S. Each step above 1 splits a governing tile into four
    /// smaller output tiles.
    #[arg(long, env = "DEMVT_SCALE_FACTOR", default_value_t = 4)]
    pub scale_factor: u8,

    /// Number of merged grids kept in memory.
    #[arg(long, env = "DEMVT_CACHE_CAPACITY", default_value_t = DEFAULT_CACHE_CAPACITY)]
    pub cache_capacity: usize,

    /// Deadline for a single upstream fetch, in milliseconds.
    #[arg(long, env = "DEMVT_FETCH_TIMEOUT_MS", default_value_t = 10_000)]
    pub fetch_timeout_ms: u64,

    /// Longest cross-section, in sampled points, a request may ask for.
    #[arg(
        long,
        env = "DEMVT_MAX_CROSS_SECTION_POINTS",
        default_value_t = DEFAULT_MAX_CROSS_SECTION_POINTS
    )]
    pub max_cross_section_points: usize,

    /// `max-age` of the `cache-control` header on tile responses, in seconds.
    #[arg(long, env = "DEMVT_MAX_AGE", default_value_t = 3600)]
    pub max_age: u32,

    /// Emit log lines as JSON.
    #[arg(long, env = "DEMVT_LOG_JSON")]
    pub log_json: bool,
}

/// Validated settings the application is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct AppSettings {
    pub scale: ScaleFactor,
    pub source: SourceConfig,
    pub cache_capacity: usize,
    pub max_cross_section_points: usize,
    pub public_url: Option<String>,
    pub max_age: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            scale: ScaleFactor::default(),
            source: SourceConfig::default(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            max_cross_section_points: DEFAULT_MAX_CROSS_SECTION_POINTS,
            public_url: None,
            max_age: 3600,
        }
    }
}

impl Config {
    /// Validate the command line into [`AppSettings`].
    pub fn app_settings(&self) -> Result<AppSettings, TileError> {
        Ok(AppSettings {
            scale: ScaleFactor::new(self.scale_factor)?,
            source: SourceConfig {
                fine_url: self.fine_url.clone(),
                coarse_url: self.coarse_url.clone(),
                timeout: Duration::from_millis(self.fetch_timeout_ms),
            },
            cache_capacity: self.cache_capacity,
            max_cross_section_points: self.max_cross_section_points,
            public_url: self
                .public_url
                .as_deref()
                .map(|url| url.trim_end_matches('/').to_string()),
            max_age: self.max_age,
        })
    }
}
