//! Abstract operand stack.
//!
//! Slots are abstract values; a category-2 value occupies two adjacent slots,
//! most significant first, and is stored as the same abstraction in both
//! slots so slot accounting stays uniform across push/pop/dup shuffles.

use crate::domain::LatticeState;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StateStack<S> {
    slots: Vec<S>,
}

impl<S> Default for StateStack<S> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<S: Clone> StateStack<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn push(&mut self, state: S) {
        self.slots.push(state);
    }

    /// Push a category-2 value: two slots move together.
    pub fn push_wide(&mut self, state: S) {
        self.slots.push(state.clone());
        self.slots.push(state);
    }

    pub fn pop(&mut self) -> Option<S> {
        self.slots.pop()
    }

    /// Pop a category-2 value: removes two slots, returns the abstraction.
    pub fn pop_wide(&mut self) -> Option<S> {
        let top = self.slots.pop()?;
        self.slots.pop()?;
        Some(top)
    }

    pub fn peek(&self) -> Option<&S> {
        self.slots.last()
    }

    /// Top `n` slots, bottom-most first. `None` on underflow.
    pub fn peek_slots(&self, n: usize) -> Option<&[S]> {
        self.slots.len().checked_sub(n).map(|at| &self.slots[at..])
    }

    /// Remove the top `n` slots. `None` on underflow.
    pub fn pop_slots(&mut self, n: usize) -> Option<Vec<S>> {
        let at = self.slots.len().checked_sub(n)?;
        Some(self.slots.split_off(at))
    }

    /// Push `slots` in bottom-most-first order.
    pub fn push_slots(&mut self, slots: impl IntoIterator<Item = S>) {
        self.slots.extend(slots);
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

impl<S: LatticeState> StateStack<S> {
    /// Pointwise join. Stacks reaching the same location always have the
    /// same depth in verified bytecode; on a depth mismatch the deeper
    /// stack's extra bottom slots are kept unchanged.
    pub fn join(&self, other: &Self) -> Self {
        if self == other {
            return self.clone();
        }
        let (longer, shorter) = if self.slots.len() >= other.slots.len() {
            (&self.slots, &other.slots)
        } else {
            (&other.slots, &self.slots)
        };
        let offset = longer.len() - shorter.len();
        let mut slots = longer[..offset].to_vec();
        slots.extend(
            longer[offset..]
                .iter()
                .zip(shorter)
                .map(|(a, b)| a.join(b)),
        );
        Self { slots }
    }

    /// `self ⊑ other`: equal depth and pointwise ≤.
    pub fn is_less_or_equal(&self, other: &Self) -> bool {
        self.slots.len() == other.slots.len()
            && self
                .slots
                .iter()
                .zip(&other.slots)
                .all(|(a, b)| a.is_less_or_equal(b))
    }
}
