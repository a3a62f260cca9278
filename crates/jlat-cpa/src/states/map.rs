//! Keyed map of abstract states (e.g. static fields by name).

use std::collections::BTreeMap;

use crate::domain::LatticeState;

/// Pointwise lift of a lattice over a map. Backed by a `BTreeMap` so that
/// iteration is deterministic and the container hashes structurally (the
/// interprocedural cache keys on it).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StateMap<K, S> {
    entries: BTreeMap<K, S>,
}

impl<K: Ord, S> Default for StateMap<K, S> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone, S> StateMap<K, S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<&S> {
        self.entries.get(key)
    }

    pub fn set(&mut self, key: K, state: S) {
        self.entries.insert(key, state);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &S)> {
        self.entries.iter()
    }
}

impl<K: Ord + Clone, S: LatticeState> StateMap<K, S> {
    /// Union of keys; values present in both sides are joined, values present
    /// on one side only are kept unchanged.
    pub fn join(&self, other: &Self) -> Self {
        if self == other {
            return self.clone();
        }
        let mut entries = self.entries.clone();
        for (key, right) in &other.entries {
            match entries.get_mut(key) {
                Some(left) => {
                    let joined = left.join(right);
                    *left = joined;
                }
                None => {
                    entries.insert(key.clone(), right.clone());
                }
            }
        }
        Self { entries }
    }

    /// `self ⊑ other`: other's key set is a superset and every shared value
    /// is pointwise ≤.
    pub fn is_less_or_equal(&self, other: &Self) -> bool {
        self.entries.iter().all(|(key, left)| {
            other
                .entries
                .get(key)
                .is_some_and(|right| left.is_less_or_equal(right))
        })
    }
}
