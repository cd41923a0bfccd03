//! Thesis Monitoring Integration Tests
//!
//! End-to-end behaviour of the statistics service over in-memory stores:
//! - Snapshot figures
//! - Cache-aside lifecycle
//! - Failure handling

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;

use thesis_monitor::adapters::{
    InMemoryGuidanceStore, InMemorySnapshotCache, InMemorySubmissionStore,
};
use thesis_monitor::stats::GLOBAL_STATS_KEY;
use thesis_monitor::{Error, ServiceConfig, SnapshotSource, StatsService};

struct Fixture {
    submissions: Arc<InMemorySubmissionStore>,
    guidance: Arc<InMemoryGuidanceStore>,
    cache: Arc<InMemorySnapshotCache>,
    service: StatsService,
}

fn fixture_with(config: ServiceConfig) -> Fixture {
    let submissions = Arc::new(InMemorySubmissionStore::new());
    let guidance = Arc::new(InMemoryGuidanceStore::new());
    let cache = Arc::new(InMemorySnapshotCache::new());
    let service = StatsService::new(
        config,
        submissions.clone(),
        guidance.clone(),
        cache.clone(),
    )
    .unwrap();

    Fixture {
        submissions,
        guidance,
        cache,
        service,
    }
}

fn fixture() -> Fixture {
    fixture_with(ServiceConfig::default())
}

// =============================================================================
// Snapshot Figures
// =============================================================================

mod figures {
    use super::*;

    #[tokio::test]
    async fn test_dashboard_scenario() {
        let f = fixture();
        f.submissions.add_submission(1, "lulus");
        f.submissions.add_submission(2, "revisi");
        f.submissions.add_milestone(1, "acc");
        f.submissions.add_milestone(1, "acc");
        f.guidance.add_messages(3);

        let snapshot = f.service.global_stats().await.unwrap();

        assert_eq!(snapshot.total_submissions, 2);
        assert_eq!(snapshot.graduated_submissions, 1);
        // Submission 2 has no milestones and is left out of the mean
        assert_eq!(snapshot.average_progress_percentage, 100.0);
        assert_eq!(snapshot.total_guidance_messages, 3);
        assert_eq!(snapshot.source, SnapshotSource::Live);
    }

    #[tokio::test]
    async fn test_empty_stores() {
        let f = fixture();

        let snapshot = f.service.global_stats().await.unwrap();

        assert_eq!(snapshot.total_submissions, 0);
        assert_eq!(snapshot.graduated_submissions, 0);
        assert_eq!(snapshot.average_progress_percentage, 0.0);
        assert_eq!(snapshot.total_guidance_messages, 0);
    }

    #[tokio::test]
    async fn test_partial_progress_is_rounded() {
        let f = fixture();
        f.submissions.add_submission(1, "proses");
        f.submissions.add_milestone(1, "acc");
        f.submissions.add_milestone(1, "pending");
        f.submissions.add_milestone(1, "pending");

        let snapshot = f.service.global_stats().await.unwrap();
        assert_eq!(snapshot.average_progress_percentage, 33.33);
    }

    #[tokio::test]
    async fn test_status_breakdown_is_live() {
        let f = fixture();
        f.submissions.add_submission(1, "revisi");

        let first = f.service.status_breakdown().await.unwrap();
        f.submissions.add_submission(2, "lulus");
        let second = f.service.status_breakdown().await.unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 2);
        assert!(!f.cache.contains("submissions_status"));
    }
}

// =============================================================================
// Cache-Aside Lifecycle
// =============================================================================

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn test_second_request_served_from_cache() {
        let f = fixture();
        f.submissions.add_submission(1, "lulus");
        f.guidance.add_messages(4);

        let live = f.service.global_stats().await.unwrap();
        let cached = f.service.global_stats().await.unwrap();

        assert_eq!(live.source, SnapshotSource::Live);
        assert_eq!(cached.source, SnapshotSource::Cache);
        assert!(live.same_figures(&cached));
        assert_eq!(live.computed_at, cached.computed_at);
        assert!(f.cache.contains(GLOBAL_STATS_KEY));
    }

    #[tokio::test]
    async fn test_cached_snapshot_hides_new_data_until_expiry() {
        let f = fixture_with(ServiceConfig {
            cache_ttl: Duration::from_millis(100),
            ..ServiceConfig::default()
        });
        f.guidance.add_messages(1);

        let first = f.service.global_stats().await.unwrap();
        f.guidance.add_messages(1);
        let stale = f.service.global_stats().await.unwrap();
        assert_eq!(stale.total_guidance_messages, first.total_guidance_messages);

        tokio::time::sleep(Duration::from_millis(200)).await;

        let fresh = f.service.global_stats().await.unwrap();
        assert_eq!(fresh.source, SnapshotSource::Live);
        assert_eq!(fresh.total_guidance_messages, 2);
    }

    #[tokio::test]
    async fn test_unchanged_data_yields_same_figures() {
        let f = fixture_with(ServiceConfig {
            cache_ttl: Duration::from_millis(50),
            ..ServiceConfig::default()
        });
        f.submissions.add_submission(1, "lulus");
        f.submissions.add_milestone(1, "acc");

        let first = f.service.global_stats().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let rebuilt = f.service.global_stats().await.unwrap();

        assert_eq!(rebuilt.source, SnapshotSource::Live);
        assert!(first.same_figures(&rebuilt));
    }

    #[tokio::test]
    async fn test_concurrent_requests_agree() {
        let f = fixture();
        f.submissions.add_submission(1, "lulus");
        f.submissions.add_submission(2, "proses");
        f.submissions.add_milestone(2, "acc");
        f.submissions.add_milestone(2, "revisi");
        f.guidance.add_messages(5);

        let results =
            futures::future::join_all((0..8).map(|_| f.service.global_stats())).await;

        let snapshots: Vec<_> = results.into_iter().map(Result::unwrap).collect();
        assert!(snapshots.windows(2).all(|w| w[0].same_figures(&w[1])));
        assert_eq!(snapshots[0].average_progress_percentage, 50.0);
    }

    #[tokio::test]
    async fn test_custom_cache_key() {
        let f = fixture_with(ServiceConfig {
            cache_key: "dashboard_v2".to_string(),
            ..ServiceConfig::default()
        });

        f.service.global_stats().await.unwrap();

        assert!(f.cache.contains("dashboard_v2"));
        assert!(!f.cache.contains(GLOBAL_STATS_KEY));
    }
}

// =============================================================================
// Failure Handling
// =============================================================================

mod failures {
    use super::*;

    #[tokio::test]
    async fn test_cache_outage_serves_live_data() {
        let f = fixture();
        f.submissions.add_submission(1, "lulus");
        f.cache.set_available(false);

        let first = f.service.global_stats().await.unwrap();
        let second = f.service.global_stats().await.unwrap();

        assert_eq!(first.source, SnapshotSource::Live);
        assert_eq!(second.source, SnapshotSource::Live);
        // Totals and tallies once per build
        assert_eq!(f.submissions.calls(), 4);
        assert_eq!(f.service.metrics().write_failures(), 2);
    }

    #[tokio::test]
    async fn test_cache_recovers_after_outage() {
        let f = fixture();
        f.cache.set_available(false);
        f.service.global_stats().await.unwrap();

        f.cache.set_available(true);
        let rebuilt = f.service.global_stats().await.unwrap();
        let cached = f.service.global_stats().await.unwrap();

        assert_eq!(rebuilt.source, SnapshotSource::Live);
        assert_eq!(cached.source, SnapshotSource::Cache);
    }

    #[tokio::test]
    async fn test_relational_failure_is_not_cached() {
        let f = fixture();
        f.submissions.set_failure(Some("Can't connect to MySQL server"));

        let result = f.service.global_stats().await;
        assert_matches!(result, Err(Error::Relational(_)));
        assert_eq!(f.cache.writes(), 0);

        f.submissions.set_failure(None);
        let snapshot = f.service.global_stats().await.unwrap();
        assert_eq!(snapshot.source, SnapshotSource::Live);
    }

    #[tokio::test]
    async fn test_document_failure_is_not_cached() {
        let f = fixture();
        f.guidance.set_failure(Some("server selection timeout"));

        let result = f.service.global_stats().await;
        assert_matches!(result, Err(Error::Document(_)));
        assert!(!f.cache.contains(GLOBAL_STATS_KEY));
    }

    #[tokio::test]
    async fn test_failed_rebuild_writes_nothing() {
        let f = fixture_with(ServiceConfig {
            cache_ttl: Duration::from_millis(50),
            ..ServiceConfig::default()
        });
        f.guidance.add_messages(7);
        f.service.global_stats().await.unwrap();
        assert_eq!(f.cache.writes(), 1);

        tokio::time::sleep(Duration::from_millis(100)).await;
        f.guidance.set_failure(Some("not primary"));

        assert!(f.service.global_stats().await.is_err());
        assert_eq!(f.cache.writes(), 1);
        assert!(!f.cache.contains(GLOBAL_STATS_KEY));
    }
}

// =============================================================================
// Properties
// =============================================================================

mod properties {
    use super::*;
    use proptest::prelude::*;
    use thesis_monitor::domain::{MilestoneTally, SubmissionTotals};
    use thesis_monitor::stats::{assemble_snapshot, average_progress};

    fn tally() -> impl Strategy<Value = MilestoneTally> {
        (0i64..1000, 0u64..50, 0u64..50)
            .prop_map(|(id, approved, total)| MilestoneTally::new(id, approved.min(total), total))
    }

    proptest! {
        #[test]
        fn average_stays_within_bounds(tallies in prop::collection::vec(tally(), 0..40)) {
            let avg = average_progress(&tallies);
            prop_assert!((0.0..=100.0).contains(&avg));
        }

        #[test]
        fn graduated_never_exceeds_total(
            total in 0u64..10_000,
            graduated in 0u64..10_000,
            messages in 0u64..10_000,
        ) {
            let snapshot = assemble_snapshot(SubmissionTotals { total, graduated }, &[], messages);
            prop_assert!(snapshot.graduated_submissions <= snapshot.total_submissions);
            prop_assert_eq!(snapshot.total_guidance_messages, messages);
        }

        #[test]
        fn zero_milestone_submissions_do_not_move_the_mean(
            tallies in prop::collection::vec(tally(), 0..20),
            empties in 0usize..10,
        ) {
            let mut padded = tallies.clone();
            padded.extend((0..empties).map(|i| MilestoneTally::new(10_000 + i as i64, 0, 0)));
            prop_assert_eq!(average_progress(&tallies), average_progress(&padded));
        }

        #[test]
        fn service_snapshot_is_consistent(
            statuses in prop::collection::vec(prop::sample::select(vec!["lulus", "proses", "revisi"]), 0..15),
            milestones in prop::collection::vec((0i64..15, prop::bool::ANY), 0..30),
        ) {
            let f = fixture();
            for (id, status) in statuses.iter().enumerate() {
                f.submissions.add_submission(id as i64, *status);
            }
            for (id, approved) in &milestones {
                f.submissions.add_milestone(*id, if *approved { "acc" } else { "pending" });
            }

            let snapshot = tokio_test::block_on(f.service.global_stats()).unwrap();

            prop_assert_eq!(snapshot.total_submissions, statuses.len() as u64);
            prop_assert!(snapshot.graduated_submissions <= snapshot.total_submissions);
            prop_assert!((0.0..=100.0).contains(&snapshot.average_progress_percentage));
        }
    }
}
