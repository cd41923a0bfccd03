//! Domain Layer
//!
//! Value objects and port traits for the statistics core.
//!
//! # Usage
//!
//! ```ignore
//! use thesis_monitor::domain::ports::{GuidanceStore, SubmissionStore};
//!
//! // Use traits for dependency injection
//! async fn graduation_rate<S: SubmissionStore>(store: &S) -> Result<f64> {
//!     let totals = store.submission_totals("lulus").await?;
//!     // ...
//! }
//! ```

pub mod ports;

pub use ports::{
    // Port traits
    GuidanceStore,
    // Value objects
    MilestoneTally,
    SnapshotCache,
    SnapshotSource,
    StatisticsSnapshot,
    StatusCount,
    SubmissionStore,
    SubmissionTotals,
};
