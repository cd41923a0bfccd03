//! Metrics module
//!
//! Prometheus instrumentation for cache and build outcomes.

mod recorder;

pub use recorder::{CacheLookup, StatsMetrics};
