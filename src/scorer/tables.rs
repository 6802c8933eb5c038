//! Count tables: the scorer's half of the grammar's training data.
//!
//! The trainer that populates these is out of scope (spec.md §1); what
//! matters here is the shape of the lookup and its failure mode
//! (`TableMiss`, §7). `IndexMap` rather than `HashMap` so that iteration
//! order — and therefore anything derived from it, like multiword
//! training (§9) — is the order entries were inserted, not an unspecified
//! hash order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::TableMiss;

/// A flat probability table keyed by the fragment string itself (used for
/// e-mails, website hosts/prefixes, years, and context-sensitive strings,
/// none of which are indexed by length in the original).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlatTable(IndexMap<String, f64>);

impl FlatTable {
    pub fn new() -> Self {
        FlatTable(IndexMap::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, probability: f64) {
        self.0.insert(key.into(), probability);
    }

    pub fn lookup(&self, key: &str) -> Result<f64, TableMiss> {
        self.0.get(key).copied().ok_or_else(|| TableMiss { fragment: key.to_string(), length: key.len() })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }
}

/// A probability table keyed first by fragment length, then by the
/// fragment itself (used for keyboard walks, alpha strings, alpha case
/// masks, digit strings, and other/special-character strings).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LengthTable(IndexMap<usize, IndexMap<String, f64>>);

impl LengthTable {
    pub fn new() -> Self {
        LengthTable(IndexMap::new())
    }

    pub fn set(&mut self, key: impl Into<String>, probability: f64) {
        let key = key.into();
        self.0.entry(key.len()).or_default().insert(key, probability);
    }

    pub fn lookup(&self, key: &str) -> Result<f64, TableMiss> {
        self.0
            .get(&key.len())
            .and_then(|by_key| by_key.get(key))
            .copied()
            .ok_or_else(|| TableMiss { fragment: key.to_string(), length: key.len() })
    }

    /// Entries for one length, in insertion order — the iteration order
    /// the multiword-detector training rule (§9) depends on.
    pub fn by_length(&self, length: usize) -> impl Iterator<Item = (&str, f64)> {
        self.0
            .get(&length)
            .into_iter()
            .flat_map(|by_key| by_key.iter().map(|(k, &v)| (k.as_str(), v)))
    }

    pub fn lengths(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_table_keys_by_fragment_length() {
        let mut table = LengthTable::new();
        table.set("cat", 0.4);
        table.set("dog", 0.6);
        table.set("ox", 0.1);
        assert_eq!(table.lookup("cat").unwrap(), 0.4);
        assert_eq!(table.lookup("ox").unwrap(), 0.1);
        assert!(table.lookup("missing").is_err());
    }

    #[test]
    fn by_length_preserves_insertion_order() {
        let mut table = LengthTable::new();
        table.set("zzz", 0.1);
        table.set("aaa", 0.2);
        let order: Vec<_> = table.by_length(3).map(|(k, _)| k.to_string()).collect();
        assert_eq!(order, vec!["zzz", "aaa"]);
    }
}
