//! The authoritative in-memory index: a primary `key -> value` map plus
//! a bidirectional `key <-> tag` index. Mutated only by applying
//! already-committed operation batches — never called directly by
//! transaction writers.

use crate::bimap::BiMap;
use crate::codec::Operation;
use std::collections::{HashMap, HashSet};

/// A `(key, value, tags)` triple as handed back to callers. `tags` is
/// sorted for deterministic presentation; the index itself tracks tags
/// as an unordered set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: String,
    pub value: String,
    pub tags: Vec<String>,
}

#[derive(Default)]
pub struct Store {
    primary: HashMap<String, String>,
    tag_index: BiMap<String, String>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a batch of already-committed operations in order.
    /// `Commit` is a no-op here — it is a recovery-time signal only, not
    /// a mutation to apply.
    pub fn apply(&mut self, ops: &[Operation]) {
        for op in ops {
            match op {
                Operation::Set { key, value, .. } => {
                    self.primary.insert(key.clone(), value.clone());
                }
                Operation::Delete { key, .. } => {
                    self.tag_index.remove_key(key);
                    self.primary.remove(key);
                }
                Operation::Tag { key, tag, .. } => {
                    self.tag_index.add(key.clone(), tag.clone());
                }
                Operation::Untag { key, tag, .. } => {
                    self.tag_index.remove(key, tag);
                }
                Operation::Commit { .. } => {}
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<Record> {
        let value = self.primary.get(key)?;
        Some(self.record_for(key, value))
    }

    /// Records whose tag set is a superset of `tags`. An empty filter
    /// returns every record.
    pub fn list(&self, tags: &[String]) -> Vec<Record> {
        let Some((first, rest)) = tags.split_first() else {
            return self
                .primary
                .iter()
                .map(|(key, value)| self.record_for(key, value))
                .collect();
        };

        let mut candidates: HashSet<String> = self.tag_index.keys_of(first);
        for tag in rest {
            if candidates.is_empty() {
                break;
            }
            let keys_for_tag = self.tag_index.keys_of(tag);
            candidates.retain(|k| keys_for_tag.contains(k));
        }

        candidates
            .into_iter()
            .filter_map(|key| self.primary.get(&key).map(|value| self.record_for(&key, value)))
            .collect()
    }

    fn record_for(&self, key: &str, value: &str) -> Record {
        let mut tags: Vec<String> = self.tag_index.values_of(&key.to_string()).into_iter().collect();
        tags.sort();
        Record {
            key: key.to_string(),
            value: value.to_string(),
            tags,
        }
    }
}
