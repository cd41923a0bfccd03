//! Cache-Aside Orchestrator
//!
//! Serves a snapshot from the cache when one is present, otherwise builds a
//! fresh one and publishes it back with an expiry.
//!
//! # Failure policy
//!
//! ```text
//! cache read fails / times out   → warn, count, treat as miss
//! cached payload undecodable     → warn, count, treat as miss
//! build fails                    → return the error, nothing written
//! cache write fails / times out  → warn, count, still return the snapshot
//! ```
//!
//! Concurrent misses for the same key each rebuild independently; builds are
//! pure reads, so the only cost is redundant work.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, instrument, warn};

use crate::domain::ports::{SnapshotCache, SnapshotSource, StatisticsSnapshot};
use crate::error::{Error, Result};
use crate::metrics::{CacheLookup, StatsMetrics};

/// Cache-aside access to statistics snapshots.
pub struct CacheAside {
    cache: Arc<dyn SnapshotCache>,
    cache_timeout: Duration,
    metrics: StatsMetrics,
}

impl CacheAside {
    pub fn new(cache: Arc<dyn SnapshotCache>, cache_timeout: Duration, metrics: StatsMetrics) -> Self {
        Self {
            cache,
            cache_timeout,
            metrics,
        }
    }

    /// Return the snapshot cached under `key`, or build, publish and return
    /// a fresh one.
    ///
    /// Performs at most one cache read, one build and one cache write. Only a
    /// build failure is returned as an error.
    #[instrument(skip(self, build), fields(ttl_secs = ttl.as_secs()))]
    pub async fn get_or_build<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        build: F,
    ) -> Result<StatisticsSnapshot>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<StatisticsSnapshot>>,
    {
        if let Some(snapshot) = self.lookup(key).await {
            return Ok(snapshot);
        }

        let started = Instant::now();
        let built = build().await;
        self.metrics.record_build(built.is_ok(), started.elapsed());

        let snapshot = built?.with_source(SnapshotSource::Live);
        self.publish(key, ttl, &snapshot).await;

        Ok(snapshot)
    }

    async fn lookup(&self, key: &str) -> Option<StatisticsSnapshot> {
        let payload = match self.bounded(self.cache.get(key)).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                debug!(key, "Cache miss");
                self.metrics.record_lookup(CacheLookup::Miss);
                return None;
            }
            Err(e) => {
                warn!(key, error = %e, "Cache read failed, computing live");
                self.metrics.record_lookup(CacheLookup::Error);
                return None;
            }
        };

        match serde_json::from_str::<StatisticsSnapshot>(&payload) {
            Ok(snapshot) => {
                debug!(key, "Cache hit");
                self.metrics.record_lookup(CacheLookup::Hit);
                Some(snapshot.with_source(SnapshotSource::Cache))
            }
            Err(e) => {
                warn!(key, error = %Error::from(e), "Discarding undecodable cached snapshot");
                self.metrics.record_lookup(CacheLookup::Corrupt);
                None
            }
        }
    }

    async fn publish(&self, key: &str, ttl: Duration, snapshot: &StatisticsSnapshot) {
        let payload = match serde_json::to_string(snapshot) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key, error = %Error::from(e), "Could not encode snapshot for cache");
                self.metrics.record_write_failure();
                return;
            }
        };

        match self.bounded(self.cache.set(key, payload, ttl)).await {
            Ok(()) => debug!(key, "Published snapshot to cache"),
            Err(e) => {
                warn!(key, error = %e, "Cache write failed, snapshot not cached");
                self.metrics.record_write_failure();
            }
        }
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.cache_timeout, fut)
            .await
            .map_err(|_| {
                Error::CacheUnavailable(format!("timed out after {:?}", self.cache_timeout))
            })?
    }
}

impl std::fmt::Debug for CacheAside {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheAside")
            .field("cache_timeout", &self.cache_timeout)
            .finish()
    }
}
