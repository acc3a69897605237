//! Bounded memo of pair lookups
//!
//! Keys are unordered pairs. A cached "no interaction" (`Some(None)`) is a
//! real entry, distinct from "never queried" (`None`). When full the cache
//! stops admitting new keys; nothing is evicted. Correctness never depends
//! on what is cached.

use crate::nlp::normalize_term;
use crate::types::InteractionRecord;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Canonical unordered pair of normalized names
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey {
    first: String,
    second: String,
}

impl PairKey {
    /// Normalize both names and order them so `(a, b)` and `(b, a)` collide
    pub fn new(a: &str, b: &str) -> Self {
        let a = normalize_term(a);
        let b = normalize_term(b);
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    /// Lexicographically smaller name
    pub fn first(&self) -> &str {
        &self.first
    }

    /// Lexicographically larger name
    pub fn second(&self) -> &str {
        &self.second
    }
}

/// Point-in-time cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Entries currently held
    pub entries: usize,
    /// Admission limit
    pub capacity: usize,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
}

/// Thread-safe bounded cache of `Option<InteractionRecord>` keyed by pair
pub struct ResultCache {
    entries: RwLock<HashMap<PairKey, Option<InteractionRecord>>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResultCache {
    /// Cache admitting at most `capacity` pairs
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// `None` if the pair was never cached, `Some(None)` for a cached
    /// "no interaction"
    pub fn get(&self, a: &str, b: &str) -> Option<Option<InteractionRecord>> {
        let key = PairKey::new(a, b);
        let found = self.entries.read().get(&key).cloned();
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Store a result under the canonical key. Returns false if the cache is
    /// full and the key is new. Existing keys are always replaced.
    pub fn put(&self, a: &str, b: &str, value: Option<InteractionRecord>) -> bool {
        let key = PairKey::new(a, b);
        let mut entries = self.entries.write();
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            return false;
        }
        entries.insert(key, value);
        true
    }

    /// Entries currently held
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every entry and reset counters
    pub fn clear(&self) {
        self.entries.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Snapshot of size and hit counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
