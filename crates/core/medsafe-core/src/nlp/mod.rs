//! Name similarity signals for drug and clinical terms
//!
//! [`NameSimilarityEngine`] blends phonetic, edit-distance, token and prefix
//! signals, and consults the static confusion tables in [`tables`]. Everything
//! here is pure; the only state is the phonetic memo.

pub mod phonetic;
pub mod similarity;
pub mod tables;

pub use phonetic::{double_metaphone, PhoneticCode};
pub use similarity::{edit_similarity, levenshtein, prefix_len, token_overlap};

use parking_lot::RwLock;
use std::collections::HashMap;

const PHONETIC_WEIGHT: f64 = 0.4;
const EDIT_WEIGHT: f64 = 0.3;
const TOKEN_WEIGHT: f64 = 0.2;
const PREFIX_WEIGHT: f64 = 0.1;

/// Default number of memoized phonetic encodings
pub const DEFAULT_MEMO_CAPACITY: usize = 4096;

/// Lower-case and trim a term. Whitespace-only input becomes empty.
pub fn normalize_term(term: &str) -> String {
    term.trim().to_lowercase()
}

/// Deterministic similarity classifier for pairs of medical terms
pub struct NameSimilarityEngine {
    memo: RwLock<HashMap<String, PhoneticCode>>,
    memo_capacity: usize,
}

impl NameSimilarityEngine {
    /// Create an engine with the default memo size
    pub fn new() -> Self {
        Self::with_memo_capacity(DEFAULT_MEMO_CAPACITY)
    }

    /// Create an engine that memoizes at most `capacity` encodings
    pub fn with_memo_capacity(capacity: usize) -> Self {
        Self {
            memo: RwLock::new(HashMap::new()),
            memo_capacity: capacity,
        }
    }

    /// Phonetic code for a term, memoized by normalized form
    pub fn encode(&self, term: &str) -> PhoneticCode {
        let key = normalize_term(term);
        if let Some(code) = self.memo.read().get(&key) {
            return code.clone();
        }

        let code = double_metaphone(&key);
        let mut memo = self.memo.write();
        if memo.len() < self.memo_capacity {
            memo.insert(key, code.clone());
        }
        code
    }

    /// Number of memoized encodings
    pub fn memo_len(&self) -> usize {
        self.memo.read().len()
    }

    /// 1.0 if primary codes match, 0.8 if one primary matches the other's
    /// secondary, else 0.0
    pub fn phonetic_similarity(&self, a: &str, b: &str) -> f64 {
        let ca = self.encode(a);
        let cb = self.encode(b);
        if ca.is_empty() || cb.is_empty() {
            return 0.0;
        }
        if ca.primary == cb.primary {
            1.0
        } else if ca.primary == cb.secondary || cb.primary == ca.secondary {
            0.8
        } else {
            0.0
        }
    }

    /// Levenshtein distance between the normalized terms
    pub fn edit_distance(&self, a: &str, b: &str) -> usize {
        levenshtein(&normalize_term(a), &normalize_term(b))
    }

    /// Case-insensitive membership in the opposite-term table
    pub fn is_known_opposite_pair(&self, a: &str, b: &str) -> bool {
        tables::is_opposite(&normalize_term(a), &normalize_term(b))
    }

    /// Case-insensitive membership in the look-alike drug table
    pub fn is_known_lookalike_pair(&self, a: &str, b: &str) -> bool {
        tables::is_lookalike(&normalize_term(a), &normalize_term(b))
    }

    /// Weighted blend of all signals in `[0, 1]`.
    ///
    /// Known opposite or look-alike pairs short-circuit to 0.0. The score is
    /// informational; safety decisions use the discrete checks in
    /// [`SafetyGate`](crate::SafetyGate).
    pub fn combined_similarity(&self, a: &str, b: &str) -> f64 {
        let na = normalize_term(a);
        let nb = normalize_term(b);
        if tables::is_opposite(&na, &nb) || tables::is_lookalike(&na, &nb) {
            return 0.0;
        }
        if na.is_empty() || nb.is_empty() {
            return 0.0;
        }

        let phonetic = self.phonetic_similarity(&na, &nb);
        let edit = edit_similarity(&na, &nb);
        let tokens = token_overlap(&na, &nb);
        let prefix = prefix_len(&na, &nb) as f64 / 4.0;

        (PHONETIC_WEIGHT * phonetic
            + EDIT_WEIGHT * edit
            + TOKEN_WEIGHT * tokens
            + PREFIX_WEIGHT * prefix)
            .clamp(0.0, 1.0)
    }
}

impl Default for NameSimilarityEngine {
    fn default() -> Self {
        Self::new()
    }
}
