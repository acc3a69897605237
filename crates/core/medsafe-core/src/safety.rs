//! Look-alike prevention gate
//!
//! Runs before any lookup. A pair that trips any check is never compared:
//! a cached or stored interaction for one of two confusable names must not
//! be silently applied to the other.

use crate::nlp::{normalize_term, NameSimilarityEngine};
use crate::types::{BlockReason, SafetyBlockResult};
use std::sync::Arc;
use tracing::warn;

/// Edit distance at or below which two names are considered confusable
pub const MAX_CONFUSABLE_EDIT_DISTANCE: usize = 2;

/// Shorter name must be at least this long for the edit-distance check to apply
pub const MIN_LENGTH_FOR_EDIT_CHECK: usize = 5;

/// Outcome of assessing one pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyVerdict {
    /// Names are distinct enough to compare
    Safe,
    /// Names must not be compared
    Unsafe(BlockReason),
}

impl SafetyVerdict {
    /// True for `Unsafe`
    pub fn is_unsafe(&self) -> bool {
        matches!(self, SafetyVerdict::Unsafe(_))
    }
}

/// Decides whether two drug names are safe to compare at all
#[derive(Clone)]
pub struct SafetyGate {
    engine: Arc<NameSimilarityEngine>,
}

impl SafetyGate {
    /// Gate backed by a shared similarity engine
    pub fn new(engine: Arc<NameSimilarityEngine>) -> Self {
        Self { engine }
    }

    /// The underlying engine
    pub fn engine(&self) -> &NameSimilarityEngine {
        &self.engine
    }

    /// Classify a pair. Checks run cheapest first; the first hit wins.
    pub fn assess(&self, a: &str, b: &str) -> SafetyVerdict {
        let na = normalize_term(a);
        let nb = normalize_term(b);

        if na == nb {
            warn!(drug = %na, "Same drug supplied twice, refusing self-interaction check");
            return SafetyVerdict::Unsafe(BlockReason::ExactDuplicate);
        }

        if self.engine.is_known_lookalike_pair(&na, &nb) {
            return SafetyVerdict::Unsafe(BlockReason::KnownLookalike);
        }

        if self.engine.is_known_opposite_pair(&na, &nb) {
            return SafetyVerdict::Unsafe(BlockReason::KnownOpposite);
        }

        let shorter = na.chars().count().min(nb.chars().count());
        if shorter >= MIN_LENGTH_FOR_EDIT_CHECK {
            let distance = self.engine.edit_distance(&na, &nb);
            if distance <= MAX_CONFUSABLE_EDIT_DISTANCE {
                return SafetyVerdict::Unsafe(BlockReason::EditDistance { distance });
            }
        }

        if self.engine.phonetic_similarity(&na, &nb) >= 1.0 {
            return SafetyVerdict::Unsafe(BlockReason::PhoneticMatch);
        }

        SafetyVerdict::Safe
    }

    /// True if the pair must not be compared
    pub fn is_unsafe_pair(&self, a: &str, b: &str) -> bool {
        self.assess(a, b).is_unsafe()
    }

    /// Block result for an unsafe pair, or `None` if the pair is safe
    pub fn check(&self, a: &str, b: &str) -> Option<SafetyBlockResult> {
        match self.assess(a, b) {
            SafetyVerdict::Safe => None,
            SafetyVerdict::Unsafe(reason) => {
                let score = self.engine.combined_similarity(a, b);
                Some(SafetyBlockResult::new(
                    normalize_term(a),
                    normalize_term(b),
                    reason,
                    score,
                ))
            }
        }
    }
}

impl Default for SafetyGate {
    fn default() -> Self {
        Self::new(Arc::new(NameSimilarityEngine::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::tables::{LOOKALIKE_DRUG_PAIRS, OPPOSITE_TERM_PAIRS};

    #[test]
    fn test_exact_duplicate_is_unsafe() {
        let gate = SafetyGate::default();
        assert_eq!(
            gate.assess("Warfarin", " warfarin "),
            SafetyVerdict::Unsafe(BlockReason::ExactDuplicate)
        );
    }

    #[test]
    fn test_edit_distance_with_length_floor() {
        let gate = SafetyGate::default();
        assert_eq!(
            gate.assess("celecoxib", "celecoxid"),
            SafetyVerdict::Unsafe(BlockReason::EditDistance { distance: 1 })
        );
        // Short names are exempt from the edit-distance rule
        assert_eq!(gate.assess("abc", "abd"), SafetyVerdict::Safe);
    }

    #[test]
    fn test_sound_alike_names_are_unsafe() {
        let gate = SafetyGate::default();
        assert_eq!(
            gate.assess("phenobarbital", "fenobarbytal"),
            SafetyVerdict::Unsafe(BlockReason::PhoneticMatch)
        );
        assert_eq!(
            gate.assess("kaletra", "caletra"),
            SafetyVerdict::Unsafe(BlockReason::EditDistance { distance: 1 })
        );
        assert_eq!(
            gate.assess("xyla", "zila"),
            SafetyVerdict::Unsafe(BlockReason::PhoneticMatch)
        );
    }

    #[test]
    fn test_every_table_pair_is_blocked() {
        let gate = SafetyGate::default();
        for (a, b) in LOOKALIKE_DRUG_PAIRS.iter().chain(OPPOSITE_TERM_PAIRS) {
            assert!(gate.is_unsafe_pair(a, b), "{} / {} should be blocked", a, b);
            assert!(gate.is_unsafe_pair(b, a), "{} / {} should be blocked", b, a);
        }
    }

    #[test]
    fn test_distinct_drugs_are_safe() {
        let gate = SafetyGate::default();
        assert!(!gate.is_unsafe_pair("warfarin", "heparin"));
        assert!(!gate.is_unsafe_pair("acetaminophen", "omeprazole"));
        assert!(gate.check("warfarin", "aspirin").is_none());
    }

    #[test]
    fn test_check_builds_block_result() {
        let gate = SafetyGate::default();
        let block = gate.check("Lisinopril", "ATENOLOL").unwrap();
        assert_eq!(block.drug_a, "lisinopril");
        assert_eq!(block.drug_b, "atenolol");
        assert_eq!(block.reason, BlockReason::KnownLookalike);
        assert_eq!(block.similarity_score, 0.0);
    }
}
