//! The multiword detector: trained on the alpha fragment table so that
//! e.g. `"ilovecats"` can be recognized as `"i" + "love" + "cats"` rather
//! than scored as one opaque fragment.
//!
//! Training order is part of the observable contract (§9: "must be
//! preserved bit-for-bit"): walk the alpha table grouped by length,
//! ascending by observed count, skip the first five *distinct* count
//! tiers, and train on every fragment after that point. Ported from
//! `PcfgGrammar.create_multiword_detector` in `lib_scorer/pcfg_grammar.py`.

use std::collections::HashSet;

use crate::scorer::tables::LengthTable;

pub const MIN_WORD_LEN: usize = 4;
const SKIPPED_TIERS: u32 = 5;

#[derive(Debug, Clone, Default)]
pub struct MultiwordDetector {
    known: HashSet<String>,
}

impl MultiwordDetector {
    pub fn new() -> Self {
        MultiwordDetector { known: HashSet::new() }
    }

    pub fn train(&mut self, word: &str) {
        self.known.insert(word.to_string());
    }

    /// Trains the detector from an alpha count table, reproducing
    /// `create_multiword_detector`'s skip-5-tiers walk exactly.
    pub fn train_from_alpha_table(&mut self, alpha: &LengthTable) {
        for length in alpha.lengths().collect::<Vec<_>>() {
            if length < MIN_WORD_LEN {
                continue;
            }
            // `most_common()` is a stable descending sort by count, so
            // ties keep the table's insertion order; `reversed(...)` then
            // reverses the *whole* result, so ties end up in reverse
            // insertion order, not in insertion order. Reproduce that
            // exactly: stable-sort descending first (our `most_common`),
            // then reverse the whole vector (our `reversed`), rather than
            // sorting ascending directly, which would keep ties in
            // insertion order instead of reversing them.
            let mut entries: Vec<(String, f64)> =
                alpha.by_length(length).map(|(k, v)| (k.to_string(), v)).collect();
            entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
            entries.reverse();

            let mut skipped = 0u32;
            let mut prev_count = 0.0f64;
            for (word, count) in entries {
                if skipped < SKIPPED_TIERS {
                    if count > prev_count {
                        skipped += 1;
                        prev_count = count;
                    }
                } else {
                    self.train(&word);
                }
            }
        }
    }

    /// Greedily splits `word` into known trained fragments, left to
    /// right, preferring the longest match at each position. Returns
    /// `None` if no split covers the whole word, in which case the alpha
    /// detector treats `word` as a single opaque fragment.
    pub fn split(&self, word: &str) -> Option<Vec<String>> {
        if word.len() < MIN_WORD_LEN * 2 {
            return None;
        }
        let chars: Vec<char> = word.chars().collect();
        let mut parts = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            let mut matched = None;
            let max_len = chars.len() - i;
            for len in (MIN_WORD_LEN.min(max_len)..=max_len).rev() {
                let candidate: String = chars[i..i + len].iter().collect();
                if self.known.contains(&candidate.to_lowercase()) {
                    matched = Some(candidate);
                    break;
                }
            }
            match matched {
                Some(part) => {
                    i += part.chars().count();
                    parts.push(part);
                }
                None => return None,
            }
        }
        if parts.len() > 1 {
            Some(parts)
        } else {
            None
        }
    }
}
