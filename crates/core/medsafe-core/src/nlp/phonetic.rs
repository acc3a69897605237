//! Double-metaphone style phonetic encoding
//!
//! A reduced rule set tuned for drug and clinical terms. Primary and
//! secondary codes diverge for ambiguous clusters (CH, soft G, TH, SIO/SIA)
//! so callers can detect "sounds like either" matches.

use serde::{Deserialize, Serialize};

/// Primary and alternate phonetic keys for one term
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhoneticCode {
    /// Most likely pronunciation
    pub primary: String,
    /// Alternate pronunciation (equal to `primary` when unambiguous)
    pub secondary: String,
}

impl PhoneticCode {
    /// True if nothing encodable was found
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }
}

struct CodeBuilder {
    primary: String,
    secondary: String,
}

impl CodeBuilder {
    fn push(&mut self, primary: char, secondary: char) {
        self.primary.push(primary);
        self.secondary.push(secondary);
    }

    fn push_both(&mut self, c: char) {
        self.push(c, c);
    }

    fn push_str_both(&mut self, s: &str) {
        self.primary.push_str(s);
        self.secondary.push_str(s);
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'A' | 'E' | 'I' | 'O' | 'U' | 'Y')
}

fn is_front_vowel(c: char) -> bool {
    matches!(c, 'E' | 'I' | 'Y')
}

/// Encode a term. Non-letters are ignored; the result is deterministic.
pub fn double_metaphone(term: &str) -> PhoneticCode {
    let chars: Vec<char> = term
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let mut out = CodeBuilder {
        primary: String::new(),
        secondary: String::new(),
    };
    if chars.is_empty() {
        return PhoneticCode::default();
    }

    let at = |i: usize| chars.get(i).copied().unwrap_or('\0');
    let mut i = 0;

    // Silent leading letters
    if matches!(
        (at(0), at(1)),
        ('K', 'N') | ('G', 'N') | ('P', 'N') | ('W', 'R') | ('P', 'S')
    ) {
        i = 1;
    } else if at(0) == 'X' {
        out.push_both('S');
        i = 1;
    }

    while i < chars.len() {
        let c = chars[i];
        if i > 0 && c == chars[i - 1] && c != 'C' {
            i += 1;
            continue;
        }

        match c {
            'A' | 'E' | 'I' | 'O' | 'U' | 'Y' => {
                if i == 0 {
                    out.push_both('A');
                }
                i += 1;
            }
            'B' => {
                out.push_both('P');
                i += 1;
            }
            'C' => {
                let next = at(i + 1);
                if next == 'H' {
                    out.push('X', 'K');
                    i += 2;
                } else if next == 'I' && at(i + 2) == 'A' {
                    out.push_both('X');
                    i += 1;
                } else if next == 'K' || next == 'Q' {
                    out.push_both('K');
                    i += 2;
                } else if next == 'C' && is_front_vowel(at(i + 2)) {
                    out.push_str_both("KS");
                    i += 2;
                } else if next == 'C' {
                    out.push_both('K');
                    i += 2;
                } else if is_front_vowel(next) {
                    out.push_both('S');
                    i += 1;
                } else {
                    out.push_both('K');
                    i += 1;
                }
            }
            'D' => {
                if at(i + 1) == 'G' && is_front_vowel(at(i + 2)) {
                    out.push_both('J');
                    i += 2;
                } else {
                    out.push_both('T');
                    i += 1;
                }
            }
            'F' | 'V' => {
                out.push_both('F');
                i += 1;
            }
            'G' => {
                let next = at(i + 1);
                if next == 'H' {
                    if i == 0 {
                        out.push_both('K');
                    }
                    i += 2;
                } else if next == 'N' {
                    i += 1;
                } else if is_front_vowel(next) {
                    out.push('J', 'K');
                    i += 1;
                } else {
                    out.push_both('K');
                    i += 1;
                }
            }
            'H' => {
                if (i == 0 || is_vowel(at(i - 1))) && is_vowel(at(i + 1)) {
                    out.push_both('H');
                }
                i += 1;
            }
            'P' => {
                if at(i + 1) == 'H' {
                    out.push_both('F');
                    i += 2;
                } else {
                    out.push_both('P');
                    i += 1;
                }
            }
            'Q' => {
                out.push_both('K');
                i += 1;
            }
            'S' => {
                let next = at(i + 1);
                if next == 'H' {
                    out.push_both('X');
                    i += 2;
                } else if next == 'C' && at(i + 2) == 'H' {
                    out.push_str_both("SK");
                    i += 3;
                } else if next == 'I' && matches!(at(i + 2), 'O' | 'A') {
                    out.push('X', 'S');
                    i += 1;
                } else {
                    out.push_both('S');
                    i += 1;
                }
            }
            'T' => {
                let next = at(i + 1);
                if next == 'I' && matches!(at(i + 2), 'O' | 'A') {
                    out.push_both('X');
                    i += 1;
                } else if next == 'H' {
                    out.push('0', 'T');
                    i += 2;
                } else if next == 'C' && at(i + 2) == 'H' {
                    // CH carries the sound
                    i += 1;
                } else {
                    out.push_both('T');
                    i += 1;
                }
            }
            'W' => {
                if is_vowel(at(i + 1)) {
                    out.push_both('W');
                }
                i += 1;
            }
            'X' => {
                out.push_str_both("KS");
                i += 1;
            }
            'Z' => {
                out.push_both('S');
                i += 1;
            }
            // J K L M N R
            other => {
                out.push_both(other);
                i += 1;
            }
        }
    }

    PhoneticCode {
        primary: out.primary,
        secondary: out.secondary,
    }
}
