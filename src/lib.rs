//! Thesis Monitoring Service
//!
//! Dashboard statistics for the thesis platform, aggregated across the
//! submission database (MySQL) and the guidance message store (MongoDB) and
//! served through a time-bounded Redis cache.
//!
//! # Architecture
//!
//! The service follows a cache-aside pattern:
//!
//! ```text
//! HTTP → StatsService → CacheAside ──hit──▶ snapshot (source = cache)
//!                           │
//!                          miss
//!                           ▼
//!                    SnapshotBuilder → MySQL + MongoDB (concurrent)
//!                           │
//!                           ▼
//!                    cache SET EX → snapshot (source = database_live)
//! ```
//!
//! Cache failures never fail a request; backing-store failures always do,
//! and no partial snapshot is ever returned.
//!
//! # Modules
//!
//! - [`adapters`] - Store adapters implementing domain ports
//! - [`config`] - Command-line and environment configuration
//! - [`domain`] - Value objects and ports
//! - [`error`] - Error types
//! - [`metrics`] - Prometheus instrumentation
//! - [`server`] - HTTP front end
//! - [`stats`] - Snapshot builder and cache-aside orchestrator

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod server;
pub mod stats;

// Re-export commonly used types
pub use domain::{SnapshotSource, StatisticsSnapshot, StatusCount};
pub use error::{Error, Result};
pub use stats::{CacheAside, ServiceConfig, SnapshotBuilder, StatsService};
