//! The BAM rebuild operator.

use jlat_cfa::{Call, MethodCfa};
use jlat_cpa::Result;

use crate::state::JvmState;
use crate::value::AbstractValue;

/// Final adjustment applied to each expanded state before it re-enters the
/// caller's fixpoint. Identity by default; analyses that strip caller
/// context in [`crate::ReduceOperator::reduce_heap`] restore it here.
pub trait RebuildOperator {
    type Value: AbstractValue;

    fn rebuild(
        &self,
        _caller: &JvmState<Self::Value>,
        expanded: JvmState<Self::Value>,
        _call: &Call,
        _caller_cfa: &MethodCfa,
    ) -> Result<JvmState<Self::Value>> {
        Ok(expanded)
    }
}

/// Rebuild operator that changes nothing.
#[derive(Debug)]
pub struct DefaultRebuildOperator<V>(std::marker::PhantomData<V>);

impl<V> DefaultRebuildOperator<V> {
    pub const fn new() -> Self {
        Self(std::marker::PhantomData)
    }
}

impl<V> Default for DefaultRebuildOperator<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: AbstractValue> RebuildOperator for DefaultRebuildOperator<V> {
    type Value = V;
}
