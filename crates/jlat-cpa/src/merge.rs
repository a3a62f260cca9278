//! Merge operators: how a new successor is folded into an existing reached
//! state at the same location.

use crate::domain::LatticeState;

/// Decides what a reached state becomes when a new successor arrives at its
/// location. Returning a value equal to `reached` means "keep both".
pub trait MergeOperator<S> {
    fn merge(&self, successor: &S, reached: &S) -> S;
}

/// Never coalesce: the reached state is returned unchanged and the successor
/// stays a separate state (subject to the stop check).
#[derive(Clone, Copy, Debug, Default)]
pub struct MergeSepOperator;

impl<S: Clone> MergeOperator<S> for MergeSepOperator {
    fn merge(&self, _successor: &S, reached: &S) -> S {
        reached.clone()
    }
}

/// Coalesce by join: the reached state widens to cover the successor.
#[derive(Clone, Copy, Debug, Default)]
pub struct MergeJoinOperator;

impl<S: LatticeState> MergeOperator<S> for MergeJoinOperator {
    fn merge(&self, successor: &S, reached: &S) -> S {
        successor.join(reached)
    }
}
