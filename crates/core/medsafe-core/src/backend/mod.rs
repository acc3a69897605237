//! Optional preferred data tier
//!
//! The resolver always holds a backend. "No graph configured" is
//! [`NullBackend`], which soft-misses every lookup.

mod graph;
mod null;

pub use graph::{GraphInteraction, HttpGraphBackend};
pub use null::NullBackend;

use crate::config::{GraphConfig, ResolverConfig};
use crate::types::InteractionRecord;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A richer, optional source of interaction data
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InteractionBackend: Send + Sync {
    /// Short name for logs and health output
    fn name(&self) -> &'static str;

    /// Look up the unordered pair. `Ok(None)` is a miss; errors are treated
    /// by the resolver as soft misses too.
    async fn find_interaction(
        &self,
        drug_a: &str,
        drug_b: &str,
    ) -> Result<Option<InteractionRecord>>;
}

/// Pick the backend implied by configuration
pub fn backend_from_config(
    graph: &GraphConfig,
    resolver: &ResolverConfig,
) -> Result<Arc<dyn InteractionBackend>> {
    match &graph.base_url {
        Some(url) => Ok(Arc::new(HttpGraphBackend::new(
            url,
            resolver.graph_timeout,
            graph.failure_threshold,
            graph.cooldown,
        )?)),
        None => Ok(Arc::new(NullBackend)),
    }
}
