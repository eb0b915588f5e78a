//! Metric declarations for the demvt tile service.
//!
//! Every metric the service records is declared once in [`metric_defs`] as a
//! const [`Metric`] carrying its name, kind, unit and label keys. Call sites use
//! the `name` field with the re-exported `metrics` macros, so a typo in a metric
//! name is a compile error rather than a silently new series.
//!
//! ```rust
//! use demvt_metrics::{metric_defs, metrics};
//!
//! metrics::counter!(metric_defs::TILES_SERVED.name, "status" => "200").increment(1);
//! ```
//!
//! With the `prometheus` feature, [`install_prometheus`] installs a global
//! recorder whose handle renders the text exposition format.

pub use metrics;

#[cfg(feature = "prometheus")]
pub use metrics_exporter_prometheus::PrometheusHandle;

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// The kind of metric (counter, gauge, or histogram).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// A monotonically increasing counter.
    Counter,
    /// A value that can go up and down.
    Gauge,
    /// A distribution of recorded values.
    Histogram,
}

impl MetricKind {
    /// Returns the kind as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric declaration with its metadata.
///
/// Built with const constructors so declarations live in `const` items:
///
/// ```rust
/// use demvt_metrics::{Metric, MetricKind};
/// use metrics::Unit;
///
/// const FETCHES: Metric = Metric::counter("demo.fetches")
///     .with_description("Upstream fetches")
///     .with_unit(Unit::Count)
///     .with_labels(&["tier"]);
///
/// assert_eq!(FETCHES.kind, MetricKind::Counter);
/// ```
#[derive(Debug, Clone)]
pub struct Metric {
    /// The metric name (e.g., "demvt.cache.hits").
    pub name: &'static str,
    /// The kind of metric.
    pub kind: MetricKind,
    /// Human-readable description.
    pub description: &'static str,
    /// Unit of measurement, if any.
    pub unit: Option<Unit>,
    /// Label keys recorded with this metric.
    pub labels: &'static [&'static str],
}

impl Metric {
    const fn new(name: &'static str, kind: MetricKind) -> Self {
        Self {
            name,
            kind,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Declare a counter.
    pub const fn counter(name: &'static str) -> Self {
        Self::new(name, MetricKind::Counter)
    }

    /// Declare a gauge.
    pub const fn gauge(name: &'static str) -> Self {
        Self::new(name, MetricKind::Gauge)
    }

    /// Declare a histogram.
    pub const fn histogram(name: &'static str) -> Self {
        Self::new(name, MetricKind::Histogram)
    }

    /// Sets the description.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Sets the unit.
    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Sets the label keys.
    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Registers this metric's description with the installed recorder.
    pub fn describe(&self) {
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => describe_counter!(self.name, unit, self.description),
            (MetricKind::Counter, None) => describe_counter!(self.name, self.description),
            (MetricKind::Gauge, Some(unit)) => describe_gauge!(self.name, unit, self.description),
            (MetricKind::Gauge, None) => describe_gauge!(self.name, self.description),
            (MetricKind::Histogram, Some(unit)) => {
                describe_histogram!(self.name, unit, self.description)
            }
            (MetricKind::Histogram, None) => describe_histogram!(self.name, self.description),
        }
    }
}

/// All metrics recorded by the service.
pub mod metric_defs {
    use super::{Metric, Unit};

    // ========================================================================
    // Upstream DEM Source
    // ========================================================================

    /// Upstream DEM text fetches.
    ///
    /// Labels: tier (fine|coarse), outcome (ok|not_found|http_error|transport|malformed)
    pub const UPSTREAM_FETCHES: Metric = Metric::counter("demvt.upstream.fetches")
        .with_description("Upstream DEM tile fetches")
        .with_unit(Unit::Count)
        .with_labels(&["tier", "outcome"]);

    /// Wall time of one upstream fetch including parsing.
    pub const UPSTREAM_FETCH_TIME: Metric = Metric::histogram("demvt.upstream.fetch_time_ms")
        .with_description("Upstream DEM fetch time in milliseconds")
        .with_unit(Unit::Milliseconds)
        .with_labels(&["tier"]);

    // ========================================================================
    // Grid Cache
    // ========================================================================

    /// Merged grid lookups served from the cache.
    pub const CACHE_HITS: Metric = Metric::counter("demvt.cache.hits")
        .with_description("Merged grid cache hits")
        .with_unit(Unit::Count);

    /// Merged grid lookups that missed the cache.
    pub const CACHE_MISSES: Metric = Metric::counter("demvt.cache.misses")
        .with_description("Merged grid cache misses")
        .with_unit(Unit::Count);

    /// Grids dropped to stay within capacity.
    pub const CACHE_EVICTIONS: Metric = Metric::counter("demvt.cache.evictions")
        .with_description("Merged grids evicted from the cache")
        .with_unit(Unit::Count);

    /// Grids currently held.
    pub const CACHE_ENTRIES: Metric = Metric::gauge("demvt.cache.entries")
        .with_description("Merged grids currently cached")
        .with_unit(Unit::Count);

    // ========================================================================
    // Tiles
    // ========================================================================

    /// Tile responses by HTTP status.
    ///
    /// Labels: status (200|204|400|500)
    pub const TILES_SERVED: Metric = Metric::counter("demvt.tiles.served")
        .with_description("Vector tile responses")
        .with_unit(Unit::Count)
        .with_labels(&["status"]);

    /// Features per non-empty tile.
    pub const TILE_FEATURES: Metric = Metric::histogram("demvt.tiles.features")
        .with_description("Features per encoded tile")
        .with_unit(Unit::Count);

    /// Encoded tile size before compression.
    pub const TILE_ENCODED_BYTES: Metric = Metric::histogram("demvt.tiles.encoded_bytes")
        .with_description("Encoded tile size before compression")
        .with_unit(Unit::Bytes);

    // ========================================================================
    // Cross-section
    // ========================================================================

    /// Points sampled per cross-section.
    pub const CROSS_SECTION_POINTS: Metric = Metric::histogram("demvt.cross_section.points")
        .with_description("Points per cross-section")
        .with_unit(Unit::Count);

    /// Every declared metric, in declaration order.
    pub const ALL: &[&Metric] = &[
        &UPSTREAM_FETCHES,
        &UPSTREAM_FETCH_TIME,
        &CACHE_HITS,
        &CACHE_MISSES,
        &CACHE_EVICTIONS,
        &CACHE_ENTRIES,
        &TILES_SERVED,
        &TILE_FEATURES,
        &TILE_ENCODED_BYTES,
        &CROSS_SECTION_POINTS,
    ];
}

/// Registers descriptions for every metric in [`metric_defs::ALL`].
///
/// Call once after installing a recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}

/// Install a global Prometheus recorder and describe all metrics.
#[cfg(feature = "prometheus")]
pub fn install_prometheus() -> Result<PrometheusHandle, metrics_exporter_prometheus::BuildError> {
    let handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;
    describe_metrics();
    Ok(handle)
}
