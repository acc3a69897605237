//! Aggregated result of a multi-drug interaction check

use super::InteractionResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response returned by [`InteractionResolver::check_interactions`](crate::InteractionResolver::check_interactions)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionReport {
    /// True if `interactions` is non-empty (safety blocks included)
    pub found_interactions: bool,
    /// Known interactions and safety blocks, in pair order
    pub interactions: Vec<InteractionResult>,
    /// Normalized input names
    pub drugs_checked: Vec<String>,
    /// Non-fatal advisories
    pub warnings: Vec<String>,
    /// True if a deadline cut the fan-out short
    #[serde(default)]
    pub partial: bool,
    /// Number of pairs that completed
    #[serde(default)]
    pub pairs_checked: usize,
    /// Correlates the report with log lines
    pub request_id: Uuid,
    /// When the check ran
    pub checked_at: DateTime<Utc>,
}

impl InteractionReport {
    /// Report with no pairs
    pub fn empty(drugs_checked: Vec<String>) -> Self {
        Self {
            found_interactions: false,
            interactions: Vec::new(),
            drugs_checked,
            warnings: Vec::new(),
            partial: false,
            pairs_checked: 0,
            request_id: Uuid::new_v4(),
            checked_at: Utc::now(),
        }
    }

    /// Result for the unordered pair `(a, b)`, if any
    pub fn find(&self, a: &str, b: &str) -> Option<&InteractionResult> {
        self.interactions.iter().find(|result| {
            let (x, y) = result.pair();
            (x == a && y == b) || (x == b && y == a)
        })
    }

    /// Only the safety blocks
    pub fn safety_blocks(&self) -> impl Iterator<Item = &InteractionResult> {
        self.interactions.iter().filter(|r| r.is_safety_block())
    }

    /// True if any pair was refused by the safety gate
    pub fn has_safety_blocks(&self) -> bool {
        self.safety_blocks().next().is_some()
    }
}
