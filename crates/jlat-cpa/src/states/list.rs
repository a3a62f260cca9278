//! Fixed-index list of abstract states (e.g. a local variable array).

use crate::domain::LatticeState;

/// Pointwise lift of a lattice over a vector. Indices are stable; missing
/// trailing entries behave like bottom.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StateList<S> {
    entries: Vec<S>,
}

impl<S> Default for StateList<S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<S: Clone> StateList<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// List of `len` copies of `fill`.
    pub fn filled(len: usize, fill: &S) -> Self {
        Self {
            entries: vec![fill.clone(); len],
        }
    }

    pub fn from_vec(entries: Vec<S>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&S> {
        self.entries.get(index)
    }

    /// Set `index`, growing the list with copies of `fill` if needed.
    pub fn set(&mut self, index: usize, state: S, fill: &S) {
        if index >= self.entries.len() {
            self.entries.resize(index + 1, fill.clone());
        }
        self.entries[index] = state;
    }

    pub fn iter(&self) -> impl Iterator<Item = &S> {
        self.entries.iter()
    }
}

impl<S: LatticeState> StateList<S> {
    /// Pointwise join; the shorter side is padded with `default` before the
    /// overlap is joined, so the result has the longer length.
    pub fn join_with_default(&self, other: &Self, default: &S) -> Self {
        if self == other {
            return self.clone();
        }
        let len = self.entries.len().max(other.entries.len());
        let mut entries = Vec::with_capacity(len);
        for i in 0..len {
            let left = self.entries.get(i).unwrap_or(default);
            let right = other.entries.get(i).unwrap_or(default);
            entries.push(left.join(right));
        }
        Self { entries }
    }

    /// `self ⊑ other`: other holds at least as many entries and every shared
    /// entry is pointwise ≤.
    pub fn is_less_or_equal(&self, other: &Self) -> bool {
        self.entries.len() <= other.entries.len()
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|(a, b)| a.is_less_or_equal(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_domain::Sign;

    #[test]
    fn test_join_pads_shorter_side() {
        let a = StateList::from_vec(vec![Sign::Known(true)]);
        let b = StateList::from_vec(vec![Sign::Known(true), Sign::Known(false)]);
        let j = a.join_with_default(&b, &Sign::Bottom);
        assert_eq!(j.len(), 2);
        assert_eq!(*j.get(0).unwrap(), Sign::Known(true));
        // bottom ⊔ Known(false) keeps the lone entry unchanged
        assert_eq!(*j.get(1).unwrap(), Sign::Known(false));
    }

    #[test]
    fn test_noop_join_returns_unchanged_value() {
        let a = StateList::from_vec(vec![Sign::Top, Sign::Known(true)]);
        let j = a.join_with_default(&a, &Sign::Bottom);
        assert_eq!(j, a);
    }

    #[test]
    fn test_is_less_or_equal_prefix() {
        let short = StateList::from_vec(vec![Sign::Known(true)]);
        let long = StateList::from_vec(vec![Sign::Top, Sign::Known(false)]);
        assert!(short.is_less_or_equal(&long));
        assert!(!long.is_less_or_equal(&short));
    }

    #[test]
    fn test_set_grows_with_fill() {
        let mut list = StateList::new();
        list.set(2, Sign::Known(true), &Sign::Bottom);
        assert_eq!(list.len(), 3);
        assert_eq!(*list.get(0).unwrap(), Sign::Bottom);
        assert_eq!(*list.get(2).unwrap(), Sign::Known(true));
    }
}
