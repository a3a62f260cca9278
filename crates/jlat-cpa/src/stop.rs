//! Stop operators: when a freshly computed successor is already covered.

use crate::domain::LatticeState;

/// Whether `state` is covered by the states already reached at its location.
/// A covered state is discarded instead of entering the waitlist.
pub trait StopOperator<S> {
    fn stop(&self, state: &S, reached: &[S]) -> bool;
}

/// Covered iff `state ≤ join(reached)`. Cheaper and more merge-aggressive:
/// one comparison against the joined summary.
#[derive(Clone, Copy, Debug, Default)]
pub struct StopJoinOperator;

impl<S: LatticeState> StopOperator<S> for StopJoinOperator {
    fn stop(&self, state: &S, reached: &[S]) -> bool {
        let Some((first, rest)) = reached.split_first() else {
            return false;
        };
        let joined = rest.iter().fold(first.clone(), |acc, s| acc.join(s));
        state.is_less_or_equal(&joined)
    }
}

/// Covered iff `state ≤` some individual reached state. No join is computed,
/// which keeps more distinct states and avoids generalizing.
#[derive(Clone, Copy, Debug, Default)]
pub struct StopSepOperator;

impl<S: LatticeState> StopOperator<S> for StopSepOperator {
    fn stop(&self, state: &S, reached: &[S]) -> bool {
        reached.iter().any(|r| state.is_less_or_equal(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LatticeState;

    /// Pair lattice: componentwise max over (u32, u32).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    struct Pair(u32, u32);

    impl LatticeState for Pair {
        fn join(&self, other: &Self) -> Self {
            Self(self.0.max(other.0), self.1.max(other.1))
        }
        fn is_less_or_equal(&self, other: &Self) -> bool {
            self.0 <= other.0 && self.1 <= other.1
        }
    }

    #[test]
    fn test_empty_reached_never_stops() {
        assert!(!StopJoinOperator.stop(&Pair(0, 0), &[]));
        assert!(!StopSepOperator.stop(&Pair(0, 0), &[]));
    }

    #[test]
    fn test_join_covers_more_than_sep() {
        // (1,1) is below the join (1,1) of {(1,0), (0,1)} but below neither
        // individual member.
        let reached = [Pair(1, 0), Pair(0, 1)];
        let state = Pair(1, 1);
        assert!(StopJoinOperator.stop(&state, &reached));
        assert!(!StopSepOperator.stop(&state, &reached));
    }

    #[test]
    fn test_sep_stops_on_individual_cover() {
        let reached = [Pair(3, 3)];
        assert!(StopSepOperator.stop(&Pair(1, 2), &reached));
        assert!(!StopSepOperator.stop(&Pair(4, 0), &reached));
    }
}
