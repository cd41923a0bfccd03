//! Infrastructure Adapters
//!
//! This module contains adapter implementations for the domain ports,
//! following the Port/Adapter (Hexagonal) architecture pattern.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Domain Layer                              │
//! │  ┌────────────────────────────────────────────────────────────┐ │
//! │  │                    Ports (Traits)                           │ │
//! │  │    SubmissionStore  │  GuidanceStore  │  SnapshotCache      │ │
//! │  └────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Adapters (This Module)                       │
//! │  ┌────────────────────────────────────────────────────────────┐ │
//! │  │ MySqlSubmissionStore │ MongoGuidanceStore │ RedisSnapshot  │ │
//! │  │ InMemorySubmissionStore │ InMemoryGuidanceStore │ ...      │ │
//! │  └────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use thesis_monitor::adapters::{MySqlConfig, MySqlSubmissionStore};
//! use thesis_monitor::domain::ports::SubmissionStore;
//!
//! let store = MySqlSubmissionStore::connect_lazy(&MySqlConfig::default());
//! let totals = store.submission_totals("lulus").await?;
//! ```

mod memory;
mod mongo;
mod mysql;
mod redis_cache;

pub use self::memory::{InMemoryGuidanceStore, InMemorySnapshotCache, InMemorySubmissionStore};
pub use self::mongo::{MongoConfig, MongoGuidanceStore, DEFAULT_COLLECTION};
pub use self::mysql::{MySqlConfig, MySqlSubmissionStore};
pub use self::redis_cache::{RedisConfig, RedisSnapshotCache};
