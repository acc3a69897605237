//! MedSafe Core
//!
//! Safety core for checking drug-drug interactions across a medication list.
//! It includes:
//!
//! - A look-alike / sound-alike safety gate that blocks confusable name pairs
//! - Name similarity signals (phonetic, edit distance, token and prefix)
//! - A bounded, order-insensitive result cache
//! - Tiered resolution: optional graph backend, then a seeded fallback store
//! - Store readiness tracking so queries never run against a half-seeded store
//!
//! # Example
//!
//! ```no_run
//! use medsafe_core::*;
//! use std::sync::Arc;
//!
//! async fn run(store: Arc<dyn InteractionStore>) -> Result<()> {
//!     let resolver = InteractionResolver::new(store, ResolverConfig::from_env()?);
//!     let report = resolver.check_interactions(&["warfarin", "aspirin"]).await;
//!     println!("{}", serde_json::to_string_pretty(&report)?);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use uuid::Uuid;

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod nlp;
pub mod readiness;
pub mod resilience;
pub mod resolver;
pub mod safety;
pub mod seed;
pub mod store;
pub mod types;
pub mod utils;

pub use backend::{backend_from_config, HttpGraphBackend, InteractionBackend, NullBackend};
pub use cache::{CacheStats, PairKey, ResultCache};
pub use config::{load_env, load_env_from_path, GraphConfig, ResolverConfig, StoreConfig};
pub use error::{MedSafeError, Result};
pub use nlp::{normalize_term, NameSimilarityEngine};
pub use readiness::{Readiness, StoreState};
pub use resilience::{CircuitBreaker, CircuitState};
pub use resolver::{InteractionResolver, PairOutcome, ResolverHealth};
pub use safety::{SafetyGate, SafetyVerdict};
pub use seed::{SeedDataset, SeedEntry, EXPECTED_MIN_SEED_ENTRIES};
pub use store::InteractionStore;
pub use types::*;
pub use utils::{init_logging, Logger};
