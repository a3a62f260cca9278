//! Analysis-author contract for lattice-valued content.

use jlat_cpa::LatticeState;

/// One abstract value occupying an operand-stack or local-variable slot.
///
/// `unknown()` is the no-information abstraction: what an untracked heap
/// read produces, what a truncated call returns, and what fresh local slots
/// hold. For a constant-propagation domain that is top; for a taint domain
/// it is the empty taint set.
pub trait AbstractValue: LatticeState {
    fn unknown() -> Self;
}

/// Join of a slice of values; `unknown()` when the slice is empty. The
/// default semantics for arithmetic and calls: every operand may flow into
/// the result.
pub fn join_values<V: AbstractValue>(values: &[V]) -> V {
    values
        .split_first()
        .map_or_else(V::unknown, |(first, rest)| {
            rest.iter().fold(first.clone(), |acc, v| acc.join(v))
        })
}
