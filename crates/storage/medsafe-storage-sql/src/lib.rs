//! MedSafe SQL storage
//!
//! Relational fallback store for drug interactions.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Re-exports
pub use medsafe_core;

pub mod sqlite;

pub use sqlite::{connect_sqlite, SeedOutcome, SqliteInteractionStore};
