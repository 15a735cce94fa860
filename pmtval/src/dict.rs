//! Persistent dictionary.
use std::{
    collections::hash_map::DefaultHasher,
    fmt,
    hash::{Hash, Hasher},
};

use crate::value::Value;

/// An immutable mapping from [`Value`] keys to [`Value`]s.
///
/// Every update returns a new `Dict` that shares all untouched entries with
/// its source (hash array mapped trie from the `im` crate). The source is never
/// modified, so a `Dict` handed to another thread stays valid and unchanged
/// whatever happens to the dicts derived from it.
///
/// ```rust
/// # use pmtval::{Dict, Value};
/// let empty = Dict::new();
/// let one = empty.insert(Value::symbol("a"), Value::integer(1));
/// assert!(empty.is_empty());
/// assert_eq!(one.get(&Value::symbol("a")), Some(&Value::integer(1)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dict {
    entries: im::HashMap<Value, Value>,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy-on-write insertion, replacing any previous value for `key`.
    #[must_use]
    pub fn insert(&self, key: Value, value: Value) -> Self {
        Self {
            entries: self.entries.update(key, value),
        }
    }

    /// Copy-on-write removal. Removing a missing key returns an equal dict.
    #[must_use]
    pub fn remove(&self, key: &Value) -> Self {
        Self {
            entries: self.entries.without(key),
        }
    }

    /// Entries of `other` win over the entries of `self`.
    #[must_use]
    pub fn merge(&self, other: &Dict) -> Self {
        Self {
            entries: self
                .entries
                .clone()
                .union_with(other.entries.clone(), |_, right| right),
        }
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> + '_ {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> + '_ {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> + '_ {
        self.entries.values()
    }
}

impl Hash for Dict {
    // Order independent: entries are hashed one by one and combined with a
    // commutative operation.
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut combined: u64 = 0;
        for (key, value) in self.entries.iter() {
            let mut entry = DefaultHasher::new();
            key.hash(&mut entry);
            value.hash(&mut entry);
            combined = combined.wrapping_add(entry.finish());
        }
        self.entries.len().hash(state);
        combined.hash(state);
    }
}

impl FromIterator<(Value, Value)> for Dict {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Dict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "({} . {})", key, value)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_leaves_source_untouched() {
        let base = Dict::new().insert(Value::symbol("a"), Value::integer(1));
        let derived = base.insert(Value::symbol("a"), Value::integer(2));
        assert_eq!(base.get(&Value::symbol("a")), Some(&Value::integer(1)));
        assert_eq!(derived.get(&Value::symbol("a")), Some(&Value::integer(2)));
        assert_eq!(derived.len(), 1);
    }

    #[test]
    fn merge_prefers_right_hand_side() {
        let left = Dict::from_iter([
            (Value::symbol("a"), Value::integer(1)),
            (Value::symbol("b"), Value::integer(2)),
        ]);
        let right = Dict::new().insert(Value::symbol("b"), Value::real(2.5));
        let merged = left.merge(&right);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get(&Value::symbol("b")), Some(&Value::real(2.5)));
    }

    #[test]
    fn merge_prefers_right_hand_side_when_it_is_smaller() {
        let left = Dict::from_iter((0..32).map(|i| (Value::integer(i), Value::integer(i))));
        let right = Dict::from_iter([
            (Value::integer(3), Value::symbol("three")),
            (Value::integer(64), Value::Null),
        ]);
        let merged = left.merge(&right);
        assert_eq!(merged.len(), 33);
        assert_eq!(merged.get(&Value::integer(3)), Some(&Value::symbol("three")));
        assert_eq!(merged.get(&Value::integer(4)), Some(&Value::integer(4)));
        assert_eq!(left.get(&Value::integer(3)), Some(&Value::integer(3)));

        let flipped = right.merge(&left);
        assert_eq!(flipped.get(&Value::integer(3)), Some(&Value::integer(3)));
        assert_eq!(flipped.get(&Value::integer(64)), Some(&Value::Null));
    }

    #[test]
    fn hash_ignores_insertion_order() {
        let a = Dict::new()
            .insert(Value::integer(1), Value::Null)
            .insert(Value::integer(2), Value::Null);
        let b = Dict::new()
            .insert(Value::integer(2), Value::Null)
            .insert(Value::integer(1), Value::Null);
        let hash = |d: &Dict| {
            let mut h = DefaultHasher::new();
            d.hash(&mut h);
            h.finish()
        };
        assert_eq!(a, b);
        assert_eq!(hash(&a), hash(&b));
    }
}
