//! Precision adjustment: the refinement extension point.

use crate::reached::ReachedSet;

/// Maps a successor state and the current precision to possibly adjusted
/// ones, with read access to the reached set. Widening/narrowing and
/// abstraction-refinement strategies plug in here; the core ships only the
/// identity policy.
pub trait PrecisionAdjustment<S, P> {
    fn adjust(&self, state: S, precision: P, reached: &ReachedSet<S>) -> (S, P)
    where
        S: crate::domain::ProgramState;
}

/// Identity adjustment: state and precision pass through unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticPrecisionAdjustment;

impl<S, P> PrecisionAdjustment<S, P> for StaticPrecisionAdjustment {
    fn adjust(&self, state: S, precision: P, _reached: &ReachedSet<S>) -> (S, P)
    where
        S: crate::domain::ProgramState,
    {
        (state, precision)
    }
}

/// Precision for analyses that do not track any: a unit value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoPrecision;
