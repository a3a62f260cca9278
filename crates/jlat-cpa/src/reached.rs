//! Per-location record of accepted states.

use rustc_hash::FxHashMap;

use jlat_cfa::NodeId;

use crate::domain::ProgramState;

/// Location-indexed store of all states accepted into the fixpoint.
///
/// Entries are only added after the stop operator confirmed they are not
/// already covered, so the set never holds a state strictly dominated by a
/// sibling at the same location once a stop check has run.
#[derive(Clone, Debug)]
pub struct ReachedSet<S> {
    by_location: FxHashMap<NodeId, Vec<S>>,
    len: usize,
}

impl<S> Default for ReachedSet<S> {
    fn default() -> Self {
        Self {
            by_location: FxHashMap::default(),
            len: 0,
        }
    }
}

impl<S: ProgramState> ReachedSet<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, state: S) {
        self.by_location.entry(state.location()).or_default().push(state);
        self.len += 1;
    }

    /// States recorded at the given location.
    pub fn at(&self, location: NodeId) -> &[S] {
        self.by_location
            .get(&location)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Replace `old` at its location with `new`. Returns false if `old` was
    /// not present.
    pub fn replace(&mut self, old: &S, new: S) -> bool {
        let Some(states) = self.by_location.get_mut(&old.location()) else {
            return false;
        };
        let Some(slot) = states.iter_mut().find(|s| *s == old) else {
            return false;
        };
        *slot = new;
        true
    }

    pub fn states(&self) -> impl Iterator<Item = &S> {
        self.by_location.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LatticeState, ProgramState};

    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    struct At(NodeId, u32);

    impl LatticeState for At {
        fn join(&self, other: &Self) -> Self {
            Self(self.0, self.1.max(other.1))
        }
        fn is_less_or_equal(&self, other: &Self) -> bool {
            self.1 <= other.1
        }
    }

    impl ProgramState for At {
        fn location(&self) -> NodeId {
            self.0
        }
    }

    #[test]
    fn test_add_and_query_by_location() {
        let mut reached = ReachedSet::new();
        reached.add(At(NodeId(0), 1));
        reached.add(At(NodeId(0), 2));
        reached.add(At(NodeId(1), 3));

        assert_eq!(reached.len(), 3);
        assert_eq!(reached.at(NodeId(0)).len(), 2);
        assert_eq!(reached.at(NodeId(1)), &[At(NodeId(1), 3)]);
        assert!(reached.at(NodeId(9)).is_empty());
    }

    #[test]
    fn test_replace() {
        let mut reached = ReachedSet::new();
        reached.add(At(NodeId(0), 1));
        assert!(reached.replace(&At(NodeId(0), 1), At(NodeId(0), 5)));
        assert_eq!(reached.at(NodeId(0)), &[At(NodeId(0), 5)]);
        assert!(!reached.replace(&At(NodeId(0), 1), At(NodeId(0), 9)));
        assert_eq!(reached.len(), 1);
    }
}
