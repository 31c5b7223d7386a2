use indexmap::IndexMap;

use crate::interpreter::{evaluator::core::EvalResult, value::core::Value};

/// Backing store of a `Value::Map`.
///
/// Entries are keyed by the hash of the key value and keep insertion order.
/// Re-binding an existing key updates the value in place and keeps the
/// original position.
#[derive(Debug, Clone, Default)]
pub struct MapValue {
    entries: IndexMap<u64, (Value, Value)>,
}

impl MapValue {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from key/value pairs, in order.
    ///
    /// # Errors
    /// Returns a `TypeError` if a key is not hashable.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Value, Value)>) -> EvalResult<Self> {
        let mut map = Self::new();
        for (key, value) in pairs {
            map.insert(key, value)?;
        }
        Ok(map)
    }

    /// Inserts or replaces the entry for `key`.
    ///
    /// # Errors
    /// Returns a `TypeError` if `key` is not hashable.
    pub fn insert(&mut self, key: Value, value: Value) -> EvalResult<()> {
        let hash = key.hash_key()?;
        self.insert_hashed(hash, key, value);
        Ok(())
    }

    /// Inserts under a key hash computed beforehand, so that hashing a key
    /// that refers to this very map happens outside its lock.
    pub(crate) fn insert_hashed(&mut self, hash: u64, key: Value, value: Value) {
        match self.entries.get_mut(&hash) {
            Some(entry) => entry.1 = value,
            None => {
                self.entries.insert(hash, (key, value));
            },
        }
    }

    /// Looks up the value stored under `key`.
    ///
    /// # Errors
    /// Returns a `TypeError` if `key` is not hashable.
    pub fn get(&self, key: &Value) -> EvalResult<Option<Value>> {
        Ok(self.entries.get(&key.hash_key()?).map(|(_, v)| v.clone()))
    }

    /// Looks up a string key without building a `Value`.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<Value> {
        self.get(&Value::from(key)).ok().flatten()
    }

    /// Removes the entry for `key`, keeping the order of the others.
    ///
    /// # Errors
    /// Returns a `TypeError` if `key` is not hashable.
    pub fn remove(&mut self, key: &Value) -> EvalResult<Option<Value>> {
        Ok(self.remove_hashed(key.hash_key()?))
    }

    pub(crate) fn remove_hashed(&mut self, hash: u64) -> Option<Value> {
        self.entries.shift_remove(&hash).map(|(_, v)| v)
    }

    /// Returns `true` if an entry exists for `key`.
    ///
    /// # Errors
    /// Returns a `TypeError` if `key` is not hashable.
    pub fn contains_key(&self, key: &Value) -> EvalResult<bool> {
        Ok(self.entries.contains_key(&key.hash_key()?))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.values().map(|(k, v)| (k, v))
    }

    /// Iterates over `(key hash, value)` pairs in insertion order.
    pub(crate) fn hashed(&self) -> impl Iterator<Item = (u64, &Value)> {
        self.entries.iter().map(|(hash, (_, v))| (*hash, v))
    }

    /// Keys in insertion order.
    #[must_use]
    pub fn keys(&self) -> Vec<Value> {
        self.entries.values().map(|(k, _)| k.clone()).collect()
    }

    /// Values in insertion order.
    #[must_use]
    pub fn values(&self) -> Vec<Value> {
        self.entries.values().map(|(_, v)| v.clone()).collect()
    }

    /// Returns a map holding the entries of `self` followed by the entries of
    /// `other`; on shared keys `other` wins and `self`'s position is kept.
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        for (hash, entry) in &other.entries {
            match merged.entries.get_mut(hash) {
                Some(existing) => existing.1 = entry.1.clone(),
                None => {
                    merged.entries.insert(*hash, entry.clone());
                },
            }
        }
        merged
    }
}

/// Backing store of a `Value::Set`.
///
/// Elements are keyed by hash and keep insertion order.
#[derive(Debug, Clone, Default)]
pub struct SetValue {
    items: IndexMap<u64, Value>,
}

impl SetValue {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from values; duplicates keep their first position.
    ///
    /// # Errors
    /// Returns a `TypeError` if an element is not hashable.
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> EvalResult<Self> {
        let mut set = Self::new();
        for value in values {
            set.insert(value)?;
        }
        Ok(set)
    }

    /// Adds `value`; returns `true` if it was not already present.
    ///
    /// # Errors
    /// Returns a `TypeError` if `value` is not hashable.
    pub fn insert(&mut self, value: Value) -> EvalResult<bool> {
        let hash = value.hash_key()?;
        Ok(self.insert_hashed(hash, value))
    }

    /// Adds `value` under a hash computed outside the set's lock.
    pub(crate) fn insert_hashed(&mut self, hash: u64, value: Value) -> bool {
        if self.items.contains_key(&hash) {
            return false;
        }
        self.items.insert(hash, value);
        true
    }

    /// Removes `value`; returns `true` if it was present.
    ///
    /// # Errors
    /// Returns a `TypeError` if `value` is not hashable.
    pub fn remove(&mut self, value: &Value) -> EvalResult<bool> {
        Ok(self.remove_hashed(value.hash_key()?))
    }

    pub(crate) fn remove_hashed(&mut self, hash: u64) -> bool {
        self.items.shift_remove(&hash).is_some()
    }

    /// Returns `true` if `value` is an element.
    ///
    /// # Errors
    /// Returns a `TypeError` if `value` is not hashable.
    pub fn contains(&self, value: &Value) -> EvalResult<bool> {
        Ok(self.items.contains_key(&value.hash_key()?))
    }

    /// The element at `index` in insertion order.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<Value> {
        self.items.get_index(index).map(|(_, v)| v.clone())
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the set has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over elements in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.items.values()
    }

    /// Element hashes in insertion order.
    pub(crate) fn hashes(&self) -> impl Iterator<Item = u64> + '_ {
        self.items.keys().copied()
    }

    /// Elements of `self` followed by the new elements of `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut items = self.items.clone();
        for (hash, value) in &other.items {
            items.entry(*hash).or_insert_with(|| value.clone());
        }
        Self { items }
    }

    /// Elements of `self` that are also in `other`.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        self.filtered(|hash| other.items.contains_key(hash))
    }

    /// Elements of `self` that are not in `other`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        self.filtered(|hash| !other.items.contains_key(hash))
    }

    /// Elements in exactly one of the two sets.
    #[must_use]
    pub fn symmetric_difference(&self, other: &Self) -> Self {
        self.difference(other).union(&other.difference(self))
    }

    /// Returns `true` if every element of `self` is in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.items.keys().all(|hash| other.items.contains_key(hash))
    }

    fn filtered(&self, keep: impl Fn(&u64) -> bool) -> Self {
        let items = self.items
                        .iter()
                        .filter(|(hash, _)| keep(hash))
                        .map(|(hash, value)| (*hash, value.clone()))
                        .collect();
        Self { items }
    }
}
