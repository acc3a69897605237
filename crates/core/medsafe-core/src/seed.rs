//! Static seed dataset parsing
//!
//! The dataset arrives as raw bytes; reading it from disk is the caller's job.

use crate::nlp::normalize_term;
use crate::types::{InteractionRecord, RecordSource, Severity};
use crate::{MedSafeError, Result};
use serde::Deserialize;
use tracing::{debug, warn};

/// Below this many entries a dataset is suspicious but still usable
pub const EXPECTED_MIN_SEED_ENTRIES: usize = 100;

#[derive(Debug, Deserialize)]
struct SeedDocument {
    interactions: Vec<SeedEntry>,
}

/// One row as it appears in the JSON file
#[derive(Debug, Clone, Deserialize)]
pub struct SeedEntry {
    /// First drug
    pub drug_a: String,
    /// Second drug
    pub drug_b: String,
    /// `mild`, `moderate` or `severe`
    pub severity: String,
    /// Interaction category
    #[serde(default)]
    pub category: String,
    /// Mechanism
    #[serde(default)]
    pub mechanism: String,
    /// Recommendation
    #[serde(default)]
    pub recommendation: String,
    /// Evidence level
    #[serde(default)]
    pub evidence_level: String,
    /// Citation
    #[serde(default)]
    pub source: Option<String>,
}

/// Parsed, normalized dataset ready for bulk insert
#[derive(Debug, Clone, Default)]
pub struct SeedDataset {
    /// Records with canonically ordered names
    pub records: Vec<InteractionRecord>,
    /// Entries dropped during parsing (blank names, self-pairs)
    pub skipped: usize,
}

impl SeedDataset {
    /// Parse the JSON document. Names are lower-cased and each pair is
    /// ordered so `drug_a <= drug_b`.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self> {
        let document: SeedDocument = serde_json::from_slice(bytes)
            .map_err(|e| MedSafeError::seed_data(format!("malformed seed dataset: {}", e)))?;

        let mut records = Vec::with_capacity(document.interactions.len());
        let mut skipped = 0;

        for entry in document.interactions {
            match entry.into_record() {
                Some(record) => records.push(record),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!(skipped, "Skipped seed entries with blank or identical drug names");
        }
        if records.len() < EXPECTED_MIN_SEED_ENTRIES {
            warn!(
                entries = records.len(),
                expected = EXPECTED_MIN_SEED_ENTRIES,
                "Seed dataset is smaller than expected"
            );
        }
        debug!(entries = records.len(), "Parsed seed dataset");

        Ok(Self { records, skipped })
    }

    /// Number of usable records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no usable records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl SeedEntry {
    fn into_record(self) -> Option<InteractionRecord> {
        let a = normalize_term(&self.drug_a);
        let b = normalize_term(&self.drug_b);
        if a.is_empty() || b.is_empty() || a == b {
            return None;
        }
        let (drug_a, drug_b) = if a <= b { (a, b) } else { (b, a) };

        Some(InteractionRecord {
            drug_a,
            drug_b,
            severity: Severity::parse_lenient(&self.severity),
            category: self.category,
            mechanism: self.mechanism,
            recommendation: self.recommendation,
            evidence_level: self.evidence_level,
            source: RecordSource::FallbackStore,
            reference: self.source.filter(|s| !s.trim().is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "interactions": [
            {"drug_a": "Warfarin", "drug_b": "Aspirin", "severity": "severe",
             "category": "bleeding_risk", "mechanism": "additive antiplatelet effect",
             "recommendation": "avoid", "evidence_level": "established", "source": "FDA"},
            {"drug_a": "  ", "drug_b": "heparin", "severity": "mild"},
            {"drug_a": "heparin", "drug_b": "HEPARIN", "severity": "mild"},
            {"drug_a": "simvastatin", "drug_b": "clarithromycin", "severity": "catastrophic"}
        ]
    }"#;

    #[test]
    fn test_parses_and_normalizes() {
        let dataset = SeedDataset::from_json_bytes(SAMPLE.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.skipped, 2);

        let first = &dataset.records[0];
        assert_eq!(first.drug_a, "aspirin");
        assert_eq!(first.drug_b, "warfarin");
        assert_eq!(first.severity, Severity::Severe);
        assert_eq!(first.reference.as_deref(), Some("FDA"));
        assert_eq!(first.source, RecordSource::FallbackStore);

        let second = &dataset.records[1];
        assert_eq!(second.drug_a, "clarithromycin");
        assert_eq!(second.severity, Severity::Unknown);
        assert_eq!(second.reference, None);
    }

    #[test]
    fn test_malformed_is_seed_error() {
        let err = SeedDataset::from_json_bytes(b"{\"rows\": []}").unwrap_err();
        assert!(matches!(err, MedSafeError::SeedData(_)));

        let err = SeedDataset::from_json_bytes(b"not json").unwrap_err();
        assert!(matches!(err, MedSafeError::SeedData(_)));
    }

    #[test]
    fn test_small_dataset_is_not_an_error() {
        let dataset = SeedDataset::from_json_bytes(b"{\"interactions\": []}").unwrap();
        assert!(dataset.is_empty());
    }
}
