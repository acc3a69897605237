use super::InteractionBackend;
use crate::types::InteractionRecord;
use crate::Result;
use async_trait::async_trait;

/// Backend used when no graph is configured. Always misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBackend;

#[async_trait]
impl InteractionBackend for NullBackend {
    fn name(&self) -> &'static str {
        "null"
    }

    async fn find_interaction(
        &self,
        _drug_a: &str,
        _drug_b: &str,
    ) -> Result<Option<InteractionRecord>> {
        Ok(None)
    }
}
