//! Error types for the medsafe core

use thiserror::Error;

/// Main error type for medsafe operations
///
/// Most of these never reach the caller of
/// [`InteractionResolver::check_interactions`](crate::InteractionResolver::check_interactions):
/// the resolver recovers every runtime condition locally and always returns a report.
#[derive(Debug, Error)]
pub enum MedSafeError {
    /// Database operation error (from sqlx)
    #[error("Database error: {0}")]
    DatabaseSqlx(#[from] sqlx::Error),

    /// Database operation error (custom message)
    #[error("Database error: {0}")]
    Database(String),

    /// Graph backend is down, timed out, or short-circuited
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Fallback store did not become ready within the wait budget
    #[error("Store not ready after {waited_ms}ms")]
    StoreInitTimeout {
        /// How long the caller waited
        waited_ms: u64,
    },

    /// Fallback store initialization failed permanently
    #[error("Store initialization failed: {0}")]
    StoreInitFailed(String),

    /// A single lookup failed after the store was ready
    #[error("Query error: {0}")]
    Query(String),

    /// Seed dataset missing or malformed
    #[error("Seed data error: {0}")]
    SeedData(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Network/HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenient Result type using MedSafeError
pub type Result<T> = std::result::Result<T, MedSafeError>;

impl MedSafeError {
    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        MedSafeError::Database(msg.into())
    }

    /// Create a backend-unavailable error
    pub fn backend_unavailable(msg: impl Into<String>) -> Self {
        MedSafeError::BackendUnavailable(msg.into())
    }

    /// Create a store-init-failed error
    pub fn store_init_failed(msg: impl Into<String>) -> Self {
        MedSafeError::StoreInitFailed(msg.into())
    }

    /// Create a query error
    pub fn query(msg: impl Into<String>) -> Self {
        MedSafeError::Query(msg.into())
    }

    /// Create a seed data error
    pub fn seed_data(msg: impl Into<String>) -> Self {
        MedSafeError::SeedData(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        MedSafeError::Config(msg.into())
    }

    /// True for errors the resolver treats as "store has no data for now"
    /// rather than a per-pair query failure.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(
            self,
            MedSafeError::StoreInitTimeout { .. } | MedSafeError::StoreInitFailed(_)
        )
    }
}
