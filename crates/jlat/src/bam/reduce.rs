//! The BAM reduce operator: caller state at a call edge → callee entry state.

use jlat_cfa::{Call, MethodCfa};
use jlat_cpa::{AnalysisError, OffsetHistory, Result, StateList, StateMap};

use crate::state::{JvmFrame, JvmState};
use crate::value::AbstractValue;

/// Builds the callee's block-entry state from the caller's state: fresh
/// locals holding the popped arguments, an empty operand stack, and the
/// heap/static fields passed through the overridable hooks. The result is
/// the cache key (together with the callee signature), so two call sites
/// passing equal abstractions share one summary.
pub trait ReduceOperator {
    type Value: AbstractValue;

    /// Heap carried into the callee. Identity by default; heap-local
    /// analyses narrow it here so unrelated caller heap content does not
    /// fragment the cache.
    fn reduce_heap(&self, heap: &Self::Value) -> Self::Value {
        heap.clone()
    }

    /// Static fields carried into the callee. Identity by default.
    fn reduce_static_fields(
        &self,
        fields: &StateMap<String, Self::Value>,
    ) -> StateMap<String, Self::Value> {
        fields.clone()
    }

    /// Pop the declared argument slots off a copy of the caller's stack, in
    /// reverse declaration order (category-2 arguments as two slots), into
    /// the callee's local variable array (receiver, for instance calls,
    /// into slot 0), and reposition at the callee's entry.
    fn reduce(
        &self,
        caller: &JvmState<Self::Value>,
        call: &Call,
        callee: &MethodCfa,
        call_offset: u32,
    ) -> Result<JvmState<Self::Value>> {
        let unknown = Self::Value::unknown();
        let mut stack = caller.frame.stack.clone();
        let max_locals = callee.max_locals.max(call.total_slot_count());
        let mut locals = StateList::filled(max_locals, &unknown);

        let receiver_slots = usize::from(!call.is_static());
        let mut slot = receiver_slots + call.argument_slots;
        for ty in call.target.descriptor.params.iter().rev() {
            let width = ty.slot_width();
            slot -= width;
            let value = if width == 2 {
                stack.pop_wide()
            } else {
                stack.pop()
            }
            .ok_or_else(|| underflow(call_offset, width, &stack))?;
            if width == 2 {
                locals.set(slot + 1, value.clone(), &unknown);
            }
            locals.set(slot, value, &unknown);
        }
        if receiver_slots == 1 {
            let receiver = stack.pop().ok_or_else(|| underflow(call_offset, 1, &stack))?;
            locals.set(0, receiver, &unknown);
        }

        Ok(JvmState::at(
            callee.entry,
            JvmFrame {
                locals,
                stack: jlat_cpa::StateStack::new(),
            },
            self.reduce_heap(&caller.heap),
            self.reduce_static_fields(&caller.static_fields),
        ))
    }
}

fn underflow<V: AbstractValue>(
    offset: u32,
    needed: usize,
    stack: &jlat_cpa::StateStack<V>,
) -> AnalysisError {
    AnalysisError::StackUnderflow {
        offset,
        needed,
        available: stack.len(),
        history: OffsetHistory::new(),
    }
}

/// Reduce operator with all hooks at their defaults.
#[derive(Debug)]
pub struct DefaultReduceOperator<V>(std::marker::PhantomData<V>);

impl<V> DefaultReduceOperator<V> {
    pub const fn new() -> Self {
        Self(std::marker::PhantomData)
    }
}

impl<V> Default for DefaultReduceOperator<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: AbstractValue> ReduceOperator for DefaultReduceOperator<V> {
    type Value = V;
}
