//! Statistics Metrics Recorder
//!
//! Counts cache outcomes and snapshot builds so that absorbed cache failures
//! remain visible on the `/metrics` endpoint.

use std::time::Duration;

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::error::{Error, Result};

/// Outcome of a single cache lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLookup {
    Hit,
    Miss,
    /// Backend failure or timeout, treated as a miss
    Error,
    /// Payload present but not decodable, treated as a miss
    Corrupt,
}

impl CacheLookup {
    fn label(&self) -> &'static str {
        match self {
            CacheLookup::Hit => "hit",
            CacheLookup::Miss => "miss",
            CacheLookup::Error => "error",
            CacheLookup::Corrupt => "corrupt",
        }
    }
}

/// Prometheus metrics for the statistics service.
///
/// Every instance owns its own [`Registry`] so several services (or tests)
/// can coexist in one process.
#[derive(Clone)]
pub struct StatsMetrics {
    registry: Registry,
    cache_lookups: IntCounterVec,
    cache_write_failures: IntCounter,
    builds: IntCounterVec,
    build_duration: Histogram,
}

impl StatsMetrics {
    /// Create and register all metrics.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let cache_lookups = IntCounterVec::new(
            Opts::new(
                "stats_cache_lookups_total",
                "Snapshot cache lookups by outcome",
            ),
            &["outcome"],
        )
        .map_err(metrics_error)?;

        let cache_write_failures = IntCounter::new(
            "stats_cache_write_failures_total",
            "Snapshot cache writes that failed and were discarded",
        )
        .map_err(metrics_error)?;

        let builds = IntCounterVec::new(
            Opts::new("stats_builds_total", "Snapshot builds by result"),
            &["result"],
        )
        .map_err(metrics_error)?;

        let build_duration = Histogram::with_opts(
            HistogramOpts::new(
                "stats_build_duration_seconds",
                "Time spent computing a snapshot from the backing stores",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        )
        .map_err(metrics_error)?;

        registry
            .register(Box::new(cache_lookups.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(cache_write_failures.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(builds.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(build_duration.clone()))
            .map_err(metrics_error)?;

        Ok(Self {
            registry,
            cache_lookups,
            cache_write_failures,
            builds,
            build_duration,
        })
    }

    pub fn record_lookup(&self, outcome: CacheLookup) {
        self.cache_lookups
            .with_label_values(&[outcome.label()])
            .inc();
    }

    pub fn record_write_failure(&self) {
        self.cache_write_failures.inc();
    }

    pub fn record_build(&self, success: bool, elapsed: Duration) {
        let result = if success { "success" } else { "failure" };
        self.builds.with_label_values(&[result]).inc();
        self.build_duration.observe(elapsed.as_secs_f64());
    }

    /// Number of lookups recorded with the given outcome.
    pub fn lookups(&self, outcome: CacheLookup) -> u64 {
        self.cache_lookups
            .with_label_values(&[outcome.label()])
            .get()
    }

    pub fn write_failures(&self) -> u64 {
        self.cache_write_failures.get()
    }

    /// Number of builds recorded with the given result.
    pub fn builds(&self, success: bool) -> u64 {
        let result = if success { "success" } else { "failure" };
        self.builds.with_label_values(&[result]).get()
    }

    /// Render all metrics in the Prometheus text format.
    pub fn encode(&self) -> Result<(String, Vec<u8>)> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(metrics_error)?;
        Ok((encoder.format_type().to_string(), buffer))
    }
}

impl std::fmt::Debug for StatsMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsMetrics")
            .field("write_failures", &self.write_failures())
            .finish()
    }
}

fn metrics_error(e: prometheus::Error) -> Error {
    Error::Internal(format!("Metrics registry error: {}", e))
}
