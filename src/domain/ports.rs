//! Domain Ports (DDD Port/Adapter Pattern)
//!
//! This module defines the value objects the statistics core works with and
//! the narrow read-only ports it depends on. Infrastructure adapters
//! implement these traits to provide concrete backing stores.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Domain Layer                            │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │                    Ports (Traits)                    │    │
//! │  │  SubmissionStore │ GuidanceStore │ SnapshotCache    │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Infrastructure Layer                       │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │                  Adapters (Impls)                    │    │
//! │  │  MySqlAdapter │ MongoAdapter │ RedisAdapter │ InMem │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

// =============================================================================
// Value Objects
// =============================================================================

/// Where a snapshot handed to the caller came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotSource {
    /// Served from the snapshot cache
    #[serde(rename = "cache")]
    Cache,
    /// Freshly computed from the backing stores
    #[serde(rename = "database_live")]
    Live,
}

impl std::fmt::Display for SnapshotSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotSource::Cache => write!(f, "cache"),
            SnapshotSource::Live => write!(f, "database_live"),
        }
    }
}

/// Dashboard statistics computed for one point in time.
///
/// This is an immutable value object; use [`StatisticsSnapshot::with_source`]
/// to re-label where a copy came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    /// Number of rows in the submissions table
    pub total_submissions: u64,
    /// Submissions in the graduated status
    pub graduated_submissions: u64,
    /// Mean milestone completion across submissions that have milestones
    pub average_progress_percentage: f64,
    /// Number of guidance messages across the whole collection
    pub total_guidance_messages: u64,
    /// When the snapshot was computed
    pub computed_at: DateTime<Utc>,
    /// Cache or live computation
    pub source: SnapshotSource,
}

impl StatisticsSnapshot {
    /// An all-zero snapshot stamped now.
    pub fn empty() -> Self {
        Self {
            total_submissions: 0,
            graduated_submissions: 0,
            average_progress_percentage: 0.0,
            total_guidance_messages: 0,
            computed_at: Utc::now(),
            source: SnapshotSource::Live,
        }
    }

    /// Return the same snapshot labelled with a different source.
    pub fn with_source(mut self, source: SnapshotSource) -> Self {
        self.source = source;
        self
    }

    /// Compare every field except `computed_at` and `source`.
    pub fn same_figures(&self, other: &StatisticsSnapshot) -> bool {
        self.total_submissions == other.total_submissions
            && self.graduated_submissions == other.graduated_submissions
            && self.average_progress_percentage == other.average_progress_percentage
            && self.total_guidance_messages == other.total_guidance_messages
    }
}

/// Submission counts from the relational store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmissionTotals {
    pub total: u64,
    pub graduated: u64,
}

/// Milestone counts for a single submission.
///
/// Submissions without milestones are reported with `total == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MilestoneTally {
    pub submission_id: i64,
    pub approved: u64,
    pub total: u64,
}

impl MilestoneTally {
    pub fn new(submission_id: i64, approved: u64, total: u64) -> Self {
        Self {
            submission_id,
            approved,
            total,
        }
    }

    /// Completion percentage, or `None` when the submission has no milestones.
    pub fn progress_percentage(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        Some(self.approved.min(self.total) as f64 * 100.0 / self.total as f64)
    }
}

/// Number of submissions in one status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: String,
    pub count: u64,
}

impl StatusCount {
    pub fn new(status: impl Into<String>, count: u64) -> Self {
        Self {
            status: status.into(),
            count,
        }
    }
}

// =============================================================================
// Submission Store Port
// =============================================================================

/// Port for read-only aggregate queries over submissions and milestones.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Count all submissions and those whose status equals `graduated_status`.
    async fn submission_totals(&self, graduated_status: &str) -> Result<SubmissionTotals>;

    /// Per-submission milestone tallies, counting `approved_status` milestones
    /// as approved. Includes submissions with no milestones.
    async fn milestone_tallies(&self, approved_status: &str) -> Result<Vec<MilestoneTally>>;

    /// Submission counts grouped by status.
    async fn status_counts(&self) -> Result<Vec<StatusCount>>;
}

// =============================================================================
// Guidance Store Port
// =============================================================================

/// Port for the guidance message document store.
#[async_trait]
pub trait GuidanceStore: Send + Sync {
    /// Count every guidance message document.
    async fn count_messages(&self) -> Result<u64>;
}

// =============================================================================
// Snapshot Cache Port
// =============================================================================

/// Port for the key-value snapshot cache.
///
/// Values are opaque serialized payloads; expiry is enforced by the backend.
#[async_trait]
pub trait SnapshotCache: Send + Sync {
    /// Fetch the payload stored under `key`, if it exists and has not expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, expiring after `ttl`.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;
}

// =============================================================================
// Tests
// =============================================================================
