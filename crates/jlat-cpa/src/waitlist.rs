//! Exploration frontier of the worklist algorithm.

use std::collections::VecDeque;
use std::hash::Hash;

use rustc_hash::FxHashSet;

/// Frontier of not-yet-processed states. No ordering guarantee beyond what
/// the concrete strategy provides; the algorithm never assumes priority
/// ordering.
pub trait Waitlist<S> {
    /// Enqueue a state. Returns false if the strategy rejected it (e.g. a
    /// structurally equal state is already pending).
    fn add(&mut self, state: S) -> bool;

    fn add_all(&mut self, states: impl IntoIterator<Item = S>) {
        for state in states {
            self.add(state);
        }
    }

    fn pop(&mut self) -> Option<S>;

    fn remove(&mut self, state: &S) -> bool;

    fn contains(&self, state: &S) -> bool;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn len(&self) -> usize;

    fn clear(&mut self);
}

/// FIFO waitlist that never holds two structurally equal pending states.
#[derive(Clone, Debug)]
pub struct UniqueFifoWaitlist<S> {
    queue: VecDeque<S>,
    members: FxHashSet<S>,
}

impl<S> Default for UniqueFifoWaitlist<S> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            members: FxHashSet::default(),
        }
    }
}

impl<S> UniqueFifoWaitlist<S> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: Clone + Eq + Hash> Waitlist<S> for UniqueFifoWaitlist<S> {
    fn add(&mut self, state: S) -> bool {
        if !self.members.insert(state.clone()) {
            return false;
        }
        self.queue.push_back(state);
        true
    }

    fn pop(&mut self) -> Option<S> {
        let state = self.queue.pop_front()?;
        self.members.remove(&state);
        Some(state)
    }

    fn remove(&mut self, state: &S) -> bool {
        if !self.members.remove(state) {
            return false;
        }
        if let Some(pos) = self.queue.iter().position(|s| s == state) {
            self.queue.remove(pos);
        }
        true
    }

    fn contains(&self, state: &S) -> bool {
        self.members.contains(state)
    }

    fn len(&self) -> usize {
        self.queue.len()
    }

    fn clear(&mut self) {
        self.queue.clear();
        self.members.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut wl = UniqueFifoWaitlist::new();
        assert!(wl.add(1));
        assert!(wl.add(2));
        assert!(wl.add(3));
        assert_eq!(wl.pop(), Some(1));
        assert_eq!(wl.pop(), Some(2));
        assert_eq!(wl.pop(), Some(3));
        assert_eq!(wl.pop(), None);
    }

    #[test]
    fn test_rejects_duplicate_pending() {
        let mut wl = UniqueFifoWaitlist::new();
        assert!(wl.add(7));
        assert!(!wl.add(7));
        assert_eq!(wl.len(), 1);
        // Re-adding after pop is allowed.
        assert_eq!(wl.pop(), Some(7));
        assert!(wl.add(7));
    }

    #[test]
    fn test_remove_and_contains() {
        let mut wl = UniqueFifoWaitlist::new();
        wl.add(1);
        wl.add(2);
        assert!(wl.contains(&2));
        assert!(wl.remove(&2));
        assert!(!wl.contains(&2));
        assert!(!wl.remove(&2));
        assert_eq!(wl.pop(), Some(1));
        assert!(wl.is_empty());
    }
}
