//! Error types for the Thesis Monitoring Service

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while computing and serving statistics
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Cache Errors (always recovered locally)
    // =========================================================================
    /// Cache backend unreachable, failed, or timed out
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    /// Cached payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // =========================================================================
    // Backing Store Errors (surfaced to the caller)
    // =========================================================================
    /// Relational (submission) store query failed
    #[error("MySQL Error: {0}")]
    Relational(String),

    /// Document (guidance) store query failed
    #[error("MongoDB Error: {0}")]
    Document(String),

    /// A backing-store call exceeded its time bound
    #[error("Query against {store} timed out after {timeout}")]
    QueryTimeout { store: String, timeout: String },

    // =========================================================================
    // Plumbing Errors
    // =========================================================================
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal Error: {0}")]
    Internal(String),
}

impl Error {
    /// True for failures of the relational or document store.
    ///
    /// These are the only errors a statistics request ever reports to the
    /// client; cache and serialization errors are absorbed as misses.
    pub fn is_backing_store(&self) -> bool {
        matches!(
            self,
            Error::Relational(_) | Error::Document(_) | Error::QueryTimeout { .. }
        )
    }

    /// True for failures of the cache layer.
    pub fn is_cache(&self) -> bool {
        matches!(self, Error::CacheUnavailable(_) | Error::Serialization(_))
    }
}
