//! Ordered name→entry dictionary with explicit duplicate tracking.
//!
//! Backed by [`indexmap::IndexMap`] so iteration order is insertion order.
//! Unlike a plain map, inserting over an existing key does *not* silently
//! overwrite it — the new value is recorded as a duplicate and the
//! first-seen value stays authoritative.

use indexmap::IndexMap;
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct OrderedDict<K, V> {
    entries: IndexMap<K, V>,
    duplicates: IndexMap<K, Vec<V>>,
}

impl<K, V> Default for OrderedDict<K, V> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
            duplicates: IndexMap::new(),
        }
    }
}

/// Outcome of [`OrderedDict::insert_tracked`].
pub enum Insertion {
    /// No prior entry under this key.
    Fresh,
    /// A prior entry existed; the new value was recorded as a duplicate
    /// and the dictionary's primary entry is unchanged.
    Duplicate,
}

impl<K: Eq + Hash + Clone, V> OrderedDict<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain insert, overwriting any previous value — used when the caller
    /// has already decided duplicates are not possible (e.g. inserting a
    /// freshly generated, known-unique derived artefact).
    pub fn insert(&mut self, key: K, value: V) {
        self.entries.insert(key, value);
    }

    /// Insert tracking duplicates: the first value under `key` wins and
    /// stays retrievable via `get`; later ones are appended to the
    /// duplicates list and returned as [`Insertion::Duplicate`] so the
    /// caller can raise `duplicate-definition`.
    pub fn insert_tracked(&mut self, key: K, value: V) -> Insertion {
        if self.entries.contains_key(&key) {
            self.duplicates.entry(key).or_default().push(value);
            Insertion::Duplicate
        } else {
            self.entries.insert(key, value);
            Insertion::Fresh
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn duplicates_of(&self, key: &K) -> &[V] {
        self.duplicates.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_duplicates(&self, key: &K) -> bool {
        self.duplicates.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_insert_wins_and_later_ones_become_duplicates() {
        let mut dict: OrderedDict<&str, i32> = OrderedDict::new();
        assert!(matches!(dict.insert_tracked("a", 1), Insertion::Fresh));
        assert!(matches!(dict.insert_tracked("a", 2), Insertion::Duplicate));
        assert_eq!(dict.get(&"a"), Some(&1));
        assert_eq!(dict.duplicates_of(&"a"), &[2]);
    }

    #[test]
    fn iteration_preserves_insertion_order() {
        let mut dict: OrderedDict<&str, i32> = OrderedDict::new();
        dict.insert("z", 1);
        dict.insert("a", 2);
        dict.insert("m", 3);
        let keys: Vec<_> = dict.keys().copied().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }
}
