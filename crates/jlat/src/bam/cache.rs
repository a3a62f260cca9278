//! The interprocedural summary cache.

use rustc_hash::FxHashMap;

use jlat_cfa::MethodSignature;
use jlat_cpa::{LatticeState, ReachedSet};

/// One recorded callee analysis: the reduced entry state it started from,
/// the exit states it produced (return exit and/or exception exit), and the
/// block-local reached set.
#[derive(Clone, Debug)]
pub struct BamCacheEntry<S> {
    pub entry_state: S,
    pub exit_states: Vec<S>,
    pub reached: ReachedSet<S>,
}

/// Summary cache keyed by `(callee signature, reduced entry state)`.
///
/// Entries are written once per key and reused for the rest of the run; a
/// lookup also matches when a recorded entry state is equal to or more
/// general than the queried one, so a given key never runs the callee's
/// fixpoint twice.
#[derive(Debug)]
pub struct BamCache<S> {
    entries: FxHashMap<MethodSignature, Vec<BamCacheEntry<S>>>,
    hits: usize,
    misses: usize,
}

impl<S> Default for BamCache<S> {
    fn default() -> Self {
        Self {
            entries: FxHashMap::default(),
            hits: 0,
            misses: 0,
        }
    }
}

impl<S: LatticeState> BamCache<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a summary for `entry` under `signature`, counting the result.
    pub fn lookup(&mut self, signature: &MethodSignature, entry: &S) -> Option<&BamCacheEntry<S>> {
        let found = Self::find(self.entries.get(signature), entry);
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    fn find<'a>(
        recorded: Option<&'a Vec<BamCacheEntry<S>>>,
        entry: &S,
    ) -> Option<&'a BamCacheEntry<S>> {
        let recorded = recorded?;
        // Exact match first, then any recorded entry state covering this one.
        recorded
            .iter()
            .find(|e| e.entry_state == *entry)
            .or_else(|| {
                recorded
                    .iter()
                    .find(|e| entry.is_less_or_equal(&e.entry_state))
            })
    }

    pub fn insert(
        &mut self,
        signature: MethodSignature,
        entry_state: S,
        exit_states: Vec<S>,
        reached: ReachedSet<S>,
    ) {
        self.entries.entry(signature).or_default().push(BamCacheEntry {
            entry_state,
            exit_states,
            reached,
        });
    }

    /// Number of recorded summaries.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub const fn hits(&self) -> usize {
        self.hits
    }

    pub const fn misses(&self) -> usize {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jlat_cfa::{JvmType, MethodDescriptor, NodeId};
    use jlat_cpa::ProgramState;

    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    struct S(NodeId, u32);

    impl LatticeState for S {
        fn join(&self, other: &Self) -> Self {
            S(self.0, self.1.max(other.1))
        }
        fn is_less_or_equal(&self, other: &Self) -> bool {
            self.1 <= other.1
        }
    }

    impl ProgramState for S {
        fn location(&self) -> NodeId {
            self.0
        }
    }

    fn sig(name: &str) -> MethodSignature {
        MethodSignature::new("T", name, MethodDescriptor::new(vec![], JvmType::Void))
    }

    #[test]
    fn test_exact_hit_after_insert() {
        let mut cache = BamCache::new();
        assert!(cache.lookup(&sig("f"), &S(NodeId(0), 1)).is_none());
        cache.insert(sig("f"), S(NodeId(0), 1), vec![S(NodeId(1), 1)], ReachedSet::new());

        let entry = cache.lookup(&sig("f"), &S(NodeId(0), 1)).unwrap();
        assert_eq!(entry.exit_states, vec![S(NodeId(1), 1)]);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_more_general_entry_is_reused() {
        let mut cache = BamCache::new();
        cache.insert(sig("f"), S(NodeId(0), 5), vec![], ReachedSet::new());
        // A more precise query is covered by the recorded summary.
        assert!(cache.lookup(&sig("f"), &S(NodeId(0), 2)).is_some());
        // A more general query is not.
        assert!(cache.lookup(&sig("f"), &S(NodeId(0), 9)).is_none());
    }

    #[test]
    fn test_signatures_are_separate() {
        let mut cache = BamCache::new();
        cache.insert(sig("f"), S(NodeId(0), 1), vec![], ReachedSet::new());
        assert!(cache.lookup(&sig("g"), &S(NodeId(0), 1)).is_none());
        assert_eq!(cache.len(), 1);
    }
}
