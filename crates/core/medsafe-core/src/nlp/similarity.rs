//! String distance and overlap measures used by name matching

use std::collections::HashSet;

/// Character-level edit distance
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];
    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = if ca == *cb { 0 } else { 1 };
            curr[j + 1] = std::cmp::min(
                std::cmp::min(curr[j] + 1, prev[j + 1] + 1),
                prev[j] + cost,
            );
        }
        prev.clone_from_slice(&curr);
    }
    prev[b_chars.len()]
}

/// `1 - distance / longer_length`, in `[0, 1]`
pub fn edit_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let len = a.chars().count().max(b.chars().count()) as f64;
    (1.0 - levenshtein(a, b) as f64 / len).clamp(0.0, 1.0)
}

/// Jaccard overlap of alphanumeric tokens
pub fn token_overlap(a: &str, b: &str) -> f64 {
    let ta = tokens(a);
    let tb = tokens(b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let shared = ta.intersection(&tb).count() as f64;
    let union = ta.union(&tb).count() as f64;
    shared / union
}

fn tokens(s: &str) -> HashSet<&str> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Shared leading characters, capped at 4
pub fn prefix_len(a: &str, b: &str) -> usize {
    let mut n = 0;
    for (ca, cb) in a.chars().zip(b.chars()) {
        if ca != cb {
            break;
        }
        n += 1;
        if n >= 4 {
            break;
        }
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("hypertension", "hypotension"), 2);
        assert_eq!(levenshtein("tachycardia", "bradycardia"), 4);
    }

    #[test]
    fn test_levenshtein_counts_chars_not_bytes() {
        assert_eq!(levenshtein("café", "cafe"), 1);
    }

    #[test]
    fn test_edit_similarity_bounds() {
        assert_eq!(edit_similarity("", ""), 0.0);
        assert_eq!(edit_similarity("warfarin", "warfarin"), 1.0);
        assert_eq!(edit_similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_token_overlap() {
        assert_eq!(token_overlap("insulin glargine", "insulin lispro"), 1.0 / 3.0);
        assert_eq!(token_overlap("aspirin", "aspirin"), 1.0);
        assert_eq!(token_overlap("", "aspirin"), 0.0);
    }

    #[test]
    fn test_prefix_len_caps_at_four() {
        assert_eq!(prefix_len("hydralazine", "hydroxyzine"), 4);
        assert_eq!(prefix_len("clonidine", "klonopin"), 0);
        assert_eq!(prefix_len("ab", "ac"), 1);
    }
}
