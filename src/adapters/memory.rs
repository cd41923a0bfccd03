//! In-Memory Adapters
//!
//! Row-level fixtures implementing every statistics port. They compute the
//! same aggregates as the SQL and document adapters, which makes them
//! suitable for tests and for running the service without infrastructure.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;

use crate::domain::ports::{
    GuidanceStore, MilestoneTally, SnapshotCache, StatusCount, SubmissionStore, SubmissionTotals,
};
use crate::error::{Error, Result};

// =============================================================================
// Submission Store
// =============================================================================

#[derive(Debug, Clone)]
struct SubmissionRow {
    id: i64,
    status: String,
}

#[derive(Debug, Clone)]
struct MilestoneRow {
    submission_id: i64,
    status: String,
}

/// In-memory submissions and milestones tables.
#[derive(Debug, Default)]
pub struct InMemorySubmissionStore {
    submissions: RwLock<Vec<SubmissionRow>>,
    milestones: RwLock<Vec<MilestoneRow>>,
    failure: RwLock<Option<String>>,
    calls: AtomicUsize,
}

impl InMemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a submission row.
    pub fn add_submission(&self, id: i64, status: impl Into<String>) {
        self.submissions.write().push(SubmissionRow {
            id,
            status: status.into(),
        });
    }

    /// Insert a milestone row belonging to `submission_id`.
    pub fn add_milestone(&self, submission_id: i64, status: impl Into<String>) {
        self.milestones.write().push(MilestoneRow {
            submission_id,
            status: status.into(),
        });
    }

    /// Make every subsequent query fail with `message` (or succeed again with `None`).
    pub fn set_failure(&self, message: Option<&str>) {
        *self.failure.write() = message.map(str::to_string);
    }

    /// Number of queries executed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn begin_query(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure.read().as_ref() {
            Some(message) => Err(Error::Relational(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SubmissionStore for InMemorySubmissionStore {
    async fn submission_totals(&self, graduated_status: &str) -> Result<SubmissionTotals> {
        self.begin_query()?;

        let submissions = self.submissions.read();
        let graduated = submissions
            .iter()
            .filter(|s| s.status == graduated_status)
            .count();

        Ok(SubmissionTotals {
            total: submissions.len() as u64,
            graduated: graduated as u64,
        })
    }

    async fn milestone_tallies(&self, approved_status: &str) -> Result<Vec<MilestoneTally>> {
        self.begin_query()?;

        let submissions = self.submissions.read();
        let milestones = self.milestones.read();

        // LEFT JOIN semantics: every submission appears, with or without milestones
        let tallies = submissions
            .iter()
            .map(|s| {
                let (approved, total) = milestones
                    .iter()
                    .filter(|m| m.submission_id == s.id)
                    .fold((0u64, 0u64), |(approved, total), m| {
                        let hit = u64::from(m.status == approved_status);
                        (approved + hit, total + 1)
                    });
                MilestoneTally::new(s.id, approved, total)
            })
            .collect();

        Ok(tallies)
    }

    async fn status_counts(&self) -> Result<Vec<StatusCount>> {
        self.begin_query()?;

        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for submission in self.submissions.read().iter() {
            *counts.entry(submission.status.clone()).or_default() += 1;
        }

        Ok(counts
            .into_iter()
            .map(|(status, count)| StatusCount::new(status, count))
            .collect())
    }
}

// =============================================================================
// Guidance Store
// =============================================================================

/// In-memory guidance message collection (only its size matters).
#[derive(Debug, Default)]
pub struct InMemoryGuidanceStore {
    messages: AtomicU64,
    failure: RwLock<Option<String>>,
    calls: AtomicUsize,
}

impl InMemoryGuidanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_messages(count: u64) -> Self {
        let store = Self::default();
        store.messages.store(count, Ordering::SeqCst);
        store
    }

    pub fn add_messages(&self, count: u64) {
        self.messages.fetch_add(count, Ordering::SeqCst);
    }

    pub fn set_failure(&self, message: Option<&str>) {
        *self.failure.write() = message.map(str::to_string);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GuidanceStore for InMemoryGuidanceStore {
    async fn count_messages(&self) -> Result<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.failure.read().as_ref() {
            return Err(Error::Document(message.clone()));
        }
        Ok(self.messages.load(Ordering::SeqCst))
    }
}

// =============================================================================
// Snapshot Cache
// =============================================================================

#[derive(Debug, Clone)]
struct CachedValue {
    value: String,
    expires_at: Instant,
}

impl CachedValue {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory key-value cache with per-entry expiry.
///
/// Can be switched unavailable to simulate a cache outage.
#[derive(Debug)]
pub struct InMemorySnapshotCache {
    entries: DashMap<String, CachedValue>,
    available: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl Default for InMemorySnapshotCache {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
            available: AtomicBool::new(true),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }
}

impl InMemorySnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the backend going down (`false`) or coming back (`true`).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Whether an unexpired entry exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false)
    }

    /// Raw stored payload for `key`, ignoring expiry.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Number of `get` calls received (including failed ones).
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `set` calls received (including failed ones).
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::CacheUnavailable("connection refused".to_string()))
        }
    }
}

#[async_trait]
impl SnapshotCache for InMemorySnapshotCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.ensure_available()?;

        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.ensure_available()?;

        self.entries.insert(
            key.to_string(),
            CachedValue {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_submission_totals() {
        let store = InMemorySubmissionStore::new();
        store.add_submission(1, "lulus");
        store.add_submission(2, "pengajuan");
        store.add_submission(3, "Lulus");

        let totals = store.submission_totals("lulus").await.unwrap();

        // Status match is case-sensitive
        assert_eq!(totals, SubmissionTotals { total: 3, graduated: 1 });
    }

    #[tokio::test]
    async fn test_milestone_tallies_left_join() {
        let store = InMemorySubmissionStore::new();
        store.add_submission(1, "bimbingan");
        store.add_submission(2, "pengajuan");
        store.add_milestone(1, "acc");
        store.add_milestone(1, "pending");

        let tallies = store.milestone_tallies("acc").await.unwrap();

        assert_eq!(
            tallies,
            vec![MilestoneTally::new(1, 1, 2), MilestoneTally::new(2, 0, 0)]
        );
    }

    #[tokio::test]
    async fn test_status_counts_sorted() {
        let store = InMemorySubmissionStore::new();
        store.add_submission(1, "sidang");
        store.add_submission(2, "lulus");
        store.add_submission(3, "sidang");

        let counts = store.status_counts().await.unwrap();

        assert_eq!(
            counts,
            vec![StatusCount::new("lulus", 1), StatusCount::new("sidang", 2)]
        );
    }

    #[tokio::test]
    async fn test_submission_store_failure() {
        let store = InMemorySubmissionStore::new();
        store.set_failure(Some("Lost connection to MySQL server"));

        assert_matches!(
            store.submission_totals("lulus").await,
            Err(Error::Relational(_))
        );
        assert_eq!(store.calls(), 1);

        store.set_failure(None);
        assert!(store.status_counts().await.is_ok());
    }

    #[tokio::test]
    async fn test_guidance_store() {
        let store = InMemoryGuidanceStore::with_messages(3);
        store.add_messages(2);

        assert_eq!(store.count_messages().await.unwrap(), 5);

        store.set_failure(Some("server selection timeout"));
        assert_matches!(store.count_messages().await, Err(Error::Document(_)));
        assert_eq!(store.calls(), 2);
    }

    #[tokio::test]
    async fn test_cache_set_get() {
        let cache = InMemorySnapshotCache::new();

        assert_eq!(cache.get("k").await.unwrap(), None);

        cache
            .set("k", "payload".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(cache.get("k").await.unwrap(), Some("payload".to_string()));
        assert!(cache.contains("k"));
        assert_eq!(cache.reads(), 2);
        assert_eq!(cache.writes(), 1);
    }

    #[tokio::test]
    async fn test_cache_expiry() {
        let cache = InMemorySnapshotCache::new();
        cache
            .set("k", "payload".to_string(), Duration::from_millis(20))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(!cache.contains("k"));
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.raw("k").is_none());
    }

    #[tokio::test]
    async fn test_cache_unavailable() {
        let cache = InMemorySnapshotCache::new();
        cache.set_available(false);

        assert_matches!(cache.get("k").await, Err(Error::CacheUnavailable(_)));
        assert_matches!(
            cache.set("k", "v".into(), Duration::from_secs(1)).await,
            Err(Error::CacheUnavailable(_))
        );

        cache.set_available(true);
        assert!(cache.get("k").await.is_ok());
    }
}
