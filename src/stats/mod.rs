//! Statistics Core
//!
//! # Architecture
//!
//! ```text
//! StatsService ──▶ CacheAside ──hit──▶ cached snapshot
//!                      │
//!                     miss
//!                      ▼
//!               SnapshotBuilder ──▶ SubmissionStore (x2) ┐
//!                      │       └──▶ GuidanceStore        ┘ concurrent
//!                      ▼
//!               merge ──▶ cache set (TTL) ──▶ live snapshot
//! ```

mod builder;
mod cache_aside;
mod service;

pub use builder::{assemble_snapshot, average_progress, round2, BuilderConfig, SnapshotBuilder};
pub use cache_aside::CacheAside;
pub use service::{ServiceConfig, StatsService, GLOBAL_STATS_KEY};
