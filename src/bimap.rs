//! A bidirectional multimap: maintains both a key→values and a
//! value→keys view in lock-step, pruning empty buckets on either side.
//!
//! Ported from the reference implementation's `internal/bimap` package,
//! generalized from Go's `comparable` constraint to `Eq + Hash + Clone`.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct BiMap<K, V> {
    forward: HashMap<K, HashSet<V>>,
    backward: HashMap<V, HashSet<K>>,
}

impl<K, V> Default for BiMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self {
            forward: HashMap::new(),
            backward: HashMap::new(),
        }
    }
}

impl<K, V> BiMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a (key, value) pair into both directions. Idempotent.
    pub fn add(&mut self, key: K, value: V) {
        self.forward
            .entry(key.clone())
            .or_default()
            .insert(value.clone());
        self.backward.entry(value).or_default().insert(key);
    }

    /// Removes a (key, value) pair from both directions, pruning the
    /// containing bucket on either side once it becomes empty.
    pub fn remove(&mut self, key: &K, value: &V) {
        if let Some(values) = self.forward.get_mut(key) {
            values.remove(value);
            if values.is_empty() {
                self.forward.remove(key);
            }
        }

        if let Some(keys) = self.backward.get_mut(value) {
            keys.remove(key);
            if keys.is_empty() {
                self.backward.remove(value);
            }
        }
    }

    /// Removes every pair involving `key`, pruning each affected value
    /// bucket. Used when a key is deleted outright.
    pub fn remove_key(&mut self, key: &K) {
        let Some(values) = self.forward.remove(key) else {
            return;
        };

        for value in values {
            if let Some(keys) = self.backward.get_mut(&value) {
                keys.remove(key);
                if keys.is_empty() {
                    self.backward.remove(&value);
                }
            }
        }
    }

    /// Values associated with `key` (the tags of a record).
    pub fn values_of(&self, key: &K) -> HashSet<V> {
        self.forward.get(key).cloned().unwrap_or_default()
    }

    /// Keys associated with `value` (the records bearing a tag).
    pub fn keys_of(&self, value: &V) -> HashSet<K> {
        self.backward.get(value).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_lookup_both_directions() {
        let mut bm: BiMap<String, String> = BiMap::new();
        bm.add("a".to_string(), "find".to_string());
        bm.add("b".to_string(), "find".to_string());

        assert_eq!(
            bm.keys_of(&"find".to_string()),
            HashSet::from(["a".to_string(), "b".to_string()])
        );
        assert_eq!(
            bm.values_of(&"a".to_string()),
            HashSet::from(["find".to_string()])
        );
    }

    #[test]
    fn remove_prunes_empty_buckets() {
        let mut bm: BiMap<String, String> = BiMap::new();
        bm.add("a".to_string(), "find".to_string());
        bm.remove(&"a".to_string(), &"find".to_string());

        assert!(bm.values_of(&"a".to_string()).is_empty());
        assert!(bm.keys_of(&"find".to_string()).is_empty());
    }

    #[test]
    fn remove_key_clears_all_its_values() {
        let mut bm: BiMap<String, String> = BiMap::new();
        bm.add("a".to_string(), "x".to_string());
        bm.add("a".to_string(), "y".to_string());
        bm.add("b".to_string(), "x".to_string());

        bm.remove_key(&"a".to_string());

        assert!(bm.values_of(&"a".to_string()).is_empty());
        assert_eq!(bm.keys_of(&"x".to_string()), HashSet::from(["b".to_string()]));
        assert!(bm.keys_of(&"y".to_string()).is_empty());
    }

    #[test]
    fn bidirectional_consistency_holds_after_mutations() {
        let mut bm: BiMap<String, String> = BiMap::new();
        bm.add("a".to_string(), "t1".to_string());
        bm.add("a".to_string(), "t2".to_string());
        bm.add("b".to_string(), "t1".to_string());
        bm.remove(&"a".to_string(), &"t1".to_string());

        for key in ["a", "b"] {
            for tag in bm.values_of(&key.to_string()) {
                assert!(bm.keys_of(&tag).contains(&key.to_string()));
            }
        }
        for tag in ["t1", "t2"] {
            for key in bm.keys_of(&tag.to_string()) {
                assert!(bm.values_of(&key).contains(&tag.to_string()));
            }
        }
    }
}
