//! Snapshot Builder
//!
//! Queries the submission and guidance stores concurrently and merges the
//! results into one [`StatisticsSnapshot`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, instrument};

use crate::domain::ports::{
    GuidanceStore, MilestoneTally, SnapshotSource, StatisticsSnapshot, StatusCount,
    SubmissionStore, SubmissionTotals,
};
use crate::error::{Error, Result};

/// Store names used in timeout errors.
const RELATIONAL_STORE: &str = "mysql";
const DOCUMENT_STORE: &str = "mongodb";

/// Settings for snapshot assembly.
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Submission status counted as graduated (exact, case-sensitive)
    pub graduated_status: String,
    /// Milestone status counted as approved
    pub approved_milestone_status: String,
    /// Bound on every backing-store call
    pub query_timeout: Duration,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            graduated_status: "lulus".to_string(),
            approved_milestone_status: "acc".to_string(),
            query_timeout: Duration::from_secs(5),
        }
    }
}

/// Builds statistics snapshots from the backing stores.
pub struct SnapshotBuilder {
    submissions: Arc<dyn SubmissionStore>,
    guidance: Arc<dyn GuidanceStore>,
    config: BuilderConfig,
}

impl SnapshotBuilder {
    pub fn new(
        submissions: Arc<dyn SubmissionStore>,
        guidance: Arc<dyn GuidanceStore>,
        config: BuilderConfig,
    ) -> Self {
        Self {
            submissions,
            guidance,
            config,
        }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Compute a fresh snapshot.
    ///
    /// The two relational aggregates and the document count run concurrently.
    /// Any failure or timeout fails the whole build; no partial snapshot is
    /// ever produced.
    #[instrument(skip(self))]
    pub async fn build_global_stats(&self) -> Result<StatisticsSnapshot> {
        let timeout = self.config.query_timeout;

        let (totals, tallies, messages) = tokio::try_join!(
            bounded(
                RELATIONAL_STORE,
                timeout,
                self.submissions
                    .submission_totals(&self.config.graduated_status),
            ),
            bounded(
                RELATIONAL_STORE,
                timeout,
                self.submissions
                    .milestone_tallies(&self.config.approved_milestone_status),
            ),
            bounded(DOCUMENT_STORE, timeout, self.guidance.count_messages()),
        )?;

        let snapshot = assemble_snapshot(totals, &tallies, messages);
        debug!(
            total = snapshot.total_submissions,
            graduated = snapshot.graduated_submissions,
            progress = snapshot.average_progress_percentage,
            messages = snapshot.total_guidance_messages,
            "Built statistics snapshot"
        );
        Ok(snapshot)
    }

    /// Submission counts per status, sorted by status. Never cached.
    #[instrument(skip(self))]
    pub async fn status_breakdown(&self) -> Result<Vec<StatusCount>> {
        let mut counts = bounded(
            RELATIONAL_STORE,
            self.config.query_timeout,
            self.submissions.status_counts(),
        )
        .await?;

        counts.sort_by(|a, b| a.status.cmp(&b.status));
        Ok(counts)
    }
}

impl std::fmt::Debug for SnapshotBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotBuilder")
            .field("config", &self.config)
            .finish()
    }
}

/// Merge store results into a live snapshot stamped now.
pub fn assemble_snapshot(
    totals: SubmissionTotals,
    tallies: &[MilestoneTally],
    total_guidance_messages: u64,
) -> StatisticsSnapshot {
    StatisticsSnapshot {
        total_submissions: totals.total,
        graduated_submissions: totals.graduated.min(totals.total),
        average_progress_percentage: round2(average_progress(tallies)),
        total_guidance_messages,
        computed_at: Utc::now(),
        source: SnapshotSource::Live,
    }
}

/// Mean completion percentage over submissions that have milestones.
///
/// Submissions without milestones contribute to neither side of the mean.
/// Returns 0 when no submission has milestones.
pub fn average_progress(tallies: &[MilestoneTally]) -> f64 {
    let (sum, count) = tallies
        .iter()
        .filter_map(MilestoneTally::progress_percentage)
        .fold((0.0, 0usize), |(sum, count), pct| (sum + pct, count + 1));

    if count == 0 {
        return 0.0;
    }
    (sum / count as f64).clamp(0.0, 100.0)
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

async fn bounded<T, F>(store: &str, timeout: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| Error::QueryTimeout {
            store: store.to_string(),
            timeout: format!("{:?}", timeout),
        })?
}
