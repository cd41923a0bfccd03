//! Statistics Service
//!
//! The dependency-injection context the HTTP layer talks to. It wires the
//! snapshot builder to the cache-aside orchestrator; no store handle lives
//! anywhere else.

use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use super::builder::{BuilderConfig, SnapshotBuilder};
use super::cache_aside::CacheAside;
use crate::domain::ports::{
    GuidanceStore, SnapshotCache, StatisticsSnapshot, StatusCount, SubmissionStore,
};
use crate::error::Result;
use crate::metrics::StatsMetrics;

/// Default cache key for the global dashboard snapshot.
pub const GLOBAL_STATS_KEY: &str = "global_stats_dashboard";

/// Service-level settings.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Cache key for the global snapshot
    pub cache_key: String,
    /// Lifetime of a published snapshot
    pub cache_ttl: Duration,
    /// Bound on each cache read or write
    pub cache_timeout: Duration,
    /// Snapshot assembly settings
    pub builder: BuilderConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cache_key: GLOBAL_STATS_KEY.to_string(),
            cache_ttl: Duration::from_secs(60),
            cache_timeout: Duration::from_secs(1),
            builder: BuilderConfig::default(),
        }
    }
}

/// Dashboard statistics over the submission and guidance stores.
pub struct StatsService {
    builder: SnapshotBuilder,
    cache_aside: CacheAside,
    cache_key: String,
    cache_ttl: Duration,
    metrics: StatsMetrics,
}

impl StatsService {
    pub fn new(
        config: ServiceConfig,
        submissions: Arc<dyn SubmissionStore>,
        guidance: Arc<dyn GuidanceStore>,
        cache: Arc<dyn SnapshotCache>,
    ) -> Result<Self> {
        let metrics = StatsMetrics::new()?;

        Ok(Self {
            builder: SnapshotBuilder::new(submissions, guidance, config.builder),
            cache_aside: CacheAside::new(cache, config.cache_timeout, metrics.clone()),
            cache_key: config.cache_key,
            cache_ttl: config.cache_ttl,
            metrics,
        })
    }

    /// Global dashboard statistics, cached for the configured TTL.
    #[instrument(skip(self))]
    pub async fn global_stats(&self) -> Result<StatisticsSnapshot> {
        self.cache_aside
            .get_or_build(&self.cache_key, self.cache_ttl, || {
                self.builder.build_global_stats()
            })
            .await
    }

    /// Submission counts per status, always computed live.
    #[instrument(skip(self))]
    pub async fn status_breakdown(&self) -> Result<Vec<StatusCount>> {
        self.builder.status_breakdown().await
    }

    pub fn metrics(&self) -> &StatsMetrics {
        &self.metrics
    }

    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }
}

impl std::fmt::Debug for StatsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsService")
            .field("cache_key", &self.cache_key)
            .field("cache_ttl", &self.cache_ttl)
            .field("builder", &self.builder)
            .finish()
    }
}
