//! Static confusion tables
//!
//! Entries are lower-case. Lookups are order-insensitive.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Clinical terms that describe opposite conditions but read alike
pub const OPPOSITE_TERM_PAIRS: &[(&str, &str)] = &[
    ("hypertension", "hypotension"),
    ("hyperglycemia", "hypoglycemia"),
    ("hyperkalemia", "hypokalemia"),
    ("hypernatremia", "hyponatremia"),
    ("hypercalcemia", "hypocalcemia"),
    ("hyperthyroidism", "hypothyroidism"),
    ("hyperthermia", "hypothermia"),
    ("hypertonia", "hypotonia"),
    ("hyperventilation", "hypoventilation"),
    ("tachycardia", "bradycardia"),
    ("tachypnea", "bradypnea"),
    ("vasoconstriction", "vasodilation"),
    ("agonist", "antagonist"),
];

/// Documented look-alike / sound-alike drug name confusions
pub const LOOKALIKE_DRUG_PAIRS: &[(&str, &str)] = &[
    ("lisinopril", "atenolol"),
    ("lisinopril", "fosinopril"),
    ("hydralazine", "hydroxyzine"),
    ("celebrex", "celexa"),
    ("celexa", "zyprexa"),
    ("zantac", "xanax"),
    ("zyrtec", "zyprexa"),
    ("clonidine", "klonopin"),
    ("clonazepam", "clonidine"),
    ("clonazepam", "lorazepam"),
    ("losartan", "valsartan"),
    ("metformin", "metronidazole"),
    ("tramadol", "trazodone"),
    ("hydrocodone", "oxycodone"),
    ("hydromorphone", "morphine"),
    ("oxycodone", "oxycontin"),
    ("prednisone", "prednisolone"),
    ("glipizide", "glyburide"),
    ("risperidone", "ropinirole"),
    ("sitagliptin", "sumatriptan"),
    ("lamictal", "lamisil"),
    ("lamotrigine", "levetiracetam"),
    ("novolog", "novolin"),
    ("humalog", "humulin"),
    ("vinblastine", "vincristine"),
    ("dopamine", "dobutamine"),
    ("carboplatin", "cisplatin"),
    ("levothyroxine", "liothyronine"),
    ("bupropion", "buspirone"),
    ("alprazolam", "lorazepam"),
    ("cyclosporine", "cycloserine"),
    ("methotrexate", "metolazone"),
];

static OPPOSITE_INDEX: Lazy<HashSet<(String, String)>> =
    Lazy::new(|| build_index(OPPOSITE_TERM_PAIRS));

static LOOKALIKE_INDEX: Lazy<HashSet<(String, String)>> =
    Lazy::new(|| build_index(LOOKALIKE_DRUG_PAIRS));

fn build_index(pairs: &[(&str, &str)]) -> HashSet<(String, String)> {
    pairs.iter().map(|(a, b)| canonical(a, b)).collect()
}

fn canonical(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Exact membership in the opposite-term table, either order.
/// Inputs must already be normalized.
pub fn is_opposite(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && OPPOSITE_INDEX.contains(&canonical(a, b))
}

/// Exact membership in the look-alike table, either order.
/// Inputs must already be normalized.
pub fn is_lookalike(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && LOOKALIKE_INDEX.contains(&canonical(a, b))
}
