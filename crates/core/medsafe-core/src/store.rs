//! Fallback store interface
//!
//! Implemented by the relational adapters in `medsafe-storage-sql`.

use crate::readiness::StoreState;
use crate::types::InteractionRecord;
use crate::Result;
use async_trait::async_trait;

/// Durable source of interaction data, used when the graph tier misses
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InteractionStore: Send + Sync {
    /// Look up the unordered pair `(drug_a, drug_b)`. Names are normalized.
    ///
    /// Waits a bounded time for initialization. Returns
    /// [`StoreInitTimeout`](crate::MedSafeError::StoreInitTimeout) or
    /// [`StoreInitFailed`](crate::MedSafeError::StoreInitFailed) when the store
    /// cannot answer yet, which is different from `Ok(None)`.
    async fn query_interaction(
        &self,
        drug_a: &str,
        drug_b: &str,
    ) -> Result<Option<InteractionRecord>>;

    /// Current initialization state
    fn state(&self) -> StoreState;
}
