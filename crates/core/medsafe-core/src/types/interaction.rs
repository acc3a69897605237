//! Interaction and safety-block result types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mechanism tag carried by every safety block
pub const SAFETY_BLOCK_MECHANISM: &str = "lookalike_prevention_safety_block";

/// Clinical severity of a known interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Minor, usually no action needed
    Mild,
    /// Monitor or adjust
    Moderate,
    /// Avoid the combination or manage closely
    Severe,
    /// Severity not recorded
    Unknown,
}

impl Severity {
    /// Parse a dataset/graph severity string. Unrecognised values map to `Unknown`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "mild" | "minor" => Severity::Mild,
            "moderate" => Severity::Moderate,
            "severe" | "major" | "contraindicated" => Severity::Severe,
            _ => Severity::Unknown,
        }
    }

    /// Lower-case label as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
            Severity::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which tier produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordSource {
    /// The optional graph backend
    Graph,
    /// The relational fallback store
    FallbackStore,
    /// Synthesized by the safety gate
    SafetyValidation,
}

impl fmt::Display for RecordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecordSource::Graph => "graph",
            RecordSource::FallbackStore => "fallback-store",
            RecordSource::SafetyValidation => "safety-validation",
        })
    }
}

/// One known drug-pair interaction
///
/// `drug_a`/`drug_b` are normalized and form an unordered pair. Records are
/// never mutated once built; the cache replaces, it does not edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// First drug (normalized)
    pub drug_a: String,
    /// Second drug (normalized)
    pub drug_b: String,
    /// Clinical severity
    pub severity: Severity,
    /// Interaction category, e.g. "bleeding_risk"
    pub category: String,
    /// Pharmacological mechanism
    pub mechanism: String,
    /// What the prescriber should do
    pub recommendation: String,
    /// Strength of evidence
    pub evidence_level: String,
    /// Tier that produced the record
    pub source: RecordSource,
    /// Citation from the dataset, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl InteractionRecord {
    /// Copy of this record retagged with a different provenance
    pub fn with_source(mut self, source: RecordSource) -> Self {
        self.source = source;
        self
    }
}

/// Why the safety gate refused to compare two names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockReason {
    /// Both names normalize to the same string
    ExactDuplicate,
    /// Names are within a couple of edits of each other
    EditDistance {
        /// Levenshtein distance between the normalized names
        distance: usize,
    },
    /// Primary phonetic codes are identical
    PhoneticMatch,
    /// Pair is a documented drug-name confusion
    KnownLookalike,
    /// Pair is a documented opposite-term confusion
    KnownOpposite,
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::ExactDuplicate => {
                f.write_str("names are identical (possible duplicate entry)")
            }
            BlockReason::EditDistance { distance } => {
                write!(f, "names differ by only {} character edit(s)", distance)
            }
            BlockReason::PhoneticMatch => f.write_str("names sound identical"),
            BlockReason::KnownLookalike => {
                f.write_str("documented look-alike/sound-alike drug names")
            }
            BlockReason::KnownOpposite => f.write_str("documented opposite clinical terms"),
        }
    }
}

/// Severity marker that only ever serializes as `critical_safety_error`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockSeverity {
    /// The only variant
    #[default]
    CriticalSafetyError,
}

/// Result synthesized when two names are too similar to compare safely
///
/// Distinct from "no interaction found", which is plain absence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyBlockResult {
    /// First name as supplied (normalized)
    pub drug_a: String,
    /// Second name as supplied (normalized)
    pub drug_b: String,
    /// Always `critical_safety_error`
    pub severity: BlockSeverity,
    /// Human-readable explanation
    pub description: String,
    /// Always [`SAFETY_BLOCK_MECHANISM`]
    pub mechanism: String,
    /// What the caller should do next
    pub recommendation: String,
    /// Which check fired
    pub reason: BlockReason,
    /// Informational blended similarity in `[0, 1]`
    pub similarity_score: f64,
    /// Always `safety-validation`
    pub source: RecordSource,
}

impl SafetyBlockResult {
    /// Build a block for `(drug_a, drug_b)`
    pub fn new(
        drug_a: impl Into<String>,
        drug_b: impl Into<String>,
        reason: BlockReason,
        similarity_score: f64,
    ) -> Self {
        let drug_a = drug_a.into();
        let drug_b = drug_b.into();
        let description = format!(
            "SAFETY BLOCK: '{}' and '{}' cannot be safely compared: {}",
            drug_a, drug_b, reason
        );
        Self {
            drug_a,
            drug_b,
            severity: BlockSeverity::CriticalSafetyError,
            description,
            mechanism: SAFETY_BLOCK_MECHANISM.to_string(),
            recommendation: "Verify the exact spelling of both medications before checking \
                             for interactions"
                .to_string(),
            reason,
            similarity_score,
            source: RecordSource::SafetyValidation,
        }
    }
}

/// One entry in an [`InteractionReport`](super::InteractionReport)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InteractionResult {
    /// Pair was refused by the safety gate
    SafetyBlock(SafetyBlockResult),
    /// A known interaction
    Interaction(InteractionRecord),
}

impl InteractionResult {
    /// True if this is a safety block
    pub fn is_safety_block(&self) -> bool {
        matches!(self, InteractionResult::SafetyBlock(_))
    }

    /// The interaction record, if this is not a block
    pub fn as_interaction(&self) -> Option<&InteractionRecord> {
        match self {
            InteractionResult::Interaction(record) => Some(record),
            InteractionResult::SafetyBlock(_) => None,
        }
    }

    /// The block, if this is one
    pub fn as_safety_block(&self) -> Option<&SafetyBlockResult> {
        match self {
            InteractionResult::SafetyBlock(block) => Some(block),
            InteractionResult::Interaction(_) => None,
        }
    }

    /// Severity label used to discriminate the two shapes on the wire
    pub fn severity_label(&self) -> &'static str {
        match self {
            InteractionResult::SafetyBlock(_) => "critical_safety_error",
            InteractionResult::Interaction(record) => record.severity.as_str(),
        }
    }

    /// The two names this result is about
    pub fn pair(&self) -> (&str, &str) {
        match self {
            InteractionResult::SafetyBlock(block) => (&block.drug_a, &block.drug_b),
            InteractionResult::Interaction(record) => (&record.drug_a, &record.drug_b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> InteractionRecord {
        InteractionRecord {
            drug_a: "heparin".to_string(),
            drug_b: "warfarin".to_string(),
            severity: Severity::Severe,
            category: "bleeding_risk".to_string(),
            mechanism: "additive anticoagulation".to_string(),
            recommendation: "avoid".to_string(),
            evidence_level: "established".to_string(),
            source: RecordSource::FallbackStore,
            reference: None,
        }
    }

    #[test]
    fn test_severity_parsing() {
        assert_eq!(Severity::parse_lenient("SEVERE"), Severity::Severe);
        assert_eq!(Severity::parse_lenient(" major "), Severity::Severe);
        assert_eq!(Severity::parse_lenient("minor"), Severity::Mild);
        assert_eq!(Severity::parse_lenient("bogus"), Severity::Unknown);
    }

    #[test]
    fn test_source_serializes_kebab_case() {
        let json = serde_json::to_string(&RecordSource::FallbackStore).unwrap();
        assert_eq!(json, "\"fallback-store\"");
        let json = serde_json::to_string(&RecordSource::SafetyValidation).unwrap();
        assert_eq!(json, "\"safety-validation\"");
    }

    #[test]
    fn test_safety_block_shape() {
        let block =
            SafetyBlockResult::new("lisinopril", "atenolol", BlockReason::KnownLookalike, 0.0);
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["severity"], "critical_safety_error");
        assert_eq!(value["mechanism"], SAFETY_BLOCK_MECHANISM);
        assert_eq!(value["source"], "safety-validation");
        assert_eq!(value["reason"]["kind"], "known_lookalike");
        assert!(block.description.contains("lisinopril"));
    }

    #[test]
    fn test_untagged_result_discriminates_on_severity() {
        let block = InteractionResult::SafetyBlock(SafetyBlockResult::new(
            "a",
            "b",
            BlockReason::PhoneticMatch,
            0.9,
        ));
        let interaction = InteractionResult::Interaction(record());

        let block_back: InteractionResult =
            serde_json::from_str(&serde_json::to_string(&block).unwrap()).unwrap();
        let interaction_back: InteractionResult =
            serde_json::from_str(&serde_json::to_string(&interaction).unwrap()).unwrap();

        assert!(block_back.is_safety_block());
        assert_eq!(interaction_back.severity_label(), "severe");
        assert_eq!(interaction_back, interaction);
    }
}
