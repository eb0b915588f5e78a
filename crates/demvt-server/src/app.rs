//! Application state and routing.

use crate::config::AppSettings;
use crate::handlers;
use axum::routing::get;
use axum::Router;
use demvt_dem::{CrossSectionSampler, DemError, GridMerger, GridSource, HttpGridSource};
use demvt_mvt::TileFeatureBuilder;
use std::sync::Arc;

/// Everything a request handler needs. Shared behind an `Arc`.
#[derive(Debug)]
pub struct AppState {
    pub tiles: TileFeatureBuilder,
    pub sampler: CrossSectionSampler,
    pub settings: AppSettings,
    #[cfg(feature = "prometheus")]
    pub prometheus: Option<demvt_metrics::PrometheusHandle>,
}

impl AppState {
    /// Build the state over the HTTP upstream described by `settings.source`.
    pub fn from_settings(settings: AppSettings) -> Result<Self, DemError> {
        let source = HttpGridSource::new(settings.source.clone())?;
        Ok(Self::with_source(Arc::new(source), settings))
    }

    /// Build the state over any grid source.
    pub fn with_source(source: Arc<dyn GridSource>, settings: AppSettings) -> Self {
        // Tiles and cross-sections share one cache
        let merger = GridMerger::new(source, settings.cache_capacity);
        Self {
            tiles: TileFeatureBuilder::new(merger.clone(), settings.scale),
            sampler: CrossSectionSampler::new(merger)
                .with_max_points(settings.max_cross_section_points),
            settings,
            #[cfg(feature = "prometheus")]
            prometheus: None,
        }
    }

    /// Serve `GET /metrics` from `handle`.
    #[cfg(feature = "prometheus")]
    pub fn with_prometheus(mut self, handle: demvt_metrics::PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}

/// The service router.
pub fn router(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .route("/tiles.json", get(handlers::tile_json))
        .route("/tiles/:z/:x/:y", get(handlers::tile))
        .route("/cross-section", get(handlers::cross_section));

    #[cfg(feature = "prometheus")]
    let router = router.route("/metrics", get(handlers::metrics));

    router.fallback(handlers::not_found).with_state(state)
}
