//! The BAM expand operator: callee exit state → caller continuation state.

use jlat_cfa::{Call, CfaEdge, Instruction, MethodCfa, NodeKind};
use jlat_cpa::{AnalysisError, OffsetHistory, Result, StateMap};

use crate::state::JvmState;
use crate::transfer::call_return_site;
use crate::value::AbstractValue;

/// Maps each exit state a callee summary recorded back into the caller's
/// context. Normal returns continue at the call's intraprocedural successor
/// with the call operands replaced by the returned value; exceptional exits
/// keep the caller's locals, discard its operand stack, and route through
/// the caller's exception table.
pub trait ExpandOperator {
    type Value: AbstractValue;

    /// Caller heap after the call. The callee's summary wins by default.
    fn expand_heap(&self, _caller: &Self::Value, callee: &Self::Value) -> Self::Value {
        callee.clone()
    }

    /// Caller static fields after the call. The callee's view wins by
    /// default.
    fn expand_static_fields(
        &self,
        _caller: &StateMap<String, Self::Value>,
        callee: &StateMap<String, Self::Value>,
    ) -> StateMap<String, Self::Value> {
        callee.clone()
    }

    /// The `width` slots a normal return pushes onto the caller's stack,
    /// bottom-most first. Harvested from the top of the callee's exit stack;
    /// an exit stack too shallow to hold them yields `unknown()` slots.
    fn return_values(&self, exit: &JvmState<Self::Value>, width: usize) -> Vec<Self::Value> {
        exit.frame
            .stack
            .peek_slots(width)
            .map_or_else(|| vec![Self::Value::unknown(); width], <[_]>::to_vec)
    }

    fn expand(
        &self,
        caller: &JvmState<Self::Value>,
        exit: &JvmState<Self::Value>,
        call: &Call,
        caller_cfa: &MethodCfa,
        call_edge: &CfaEdge,
        callee: &MethodCfa,
    ) -> Result<JvmState<Self::Value>> {
        use jlat_cpa::ProgramState;
        let exit_node = exit.location();
        let kind = callee
            .node(exit_node)
            .ok_or(AnalysisError::UnknownNode {
                signature: callee.signature.clone(),
                node: exit_node,
            })?
            .kind;
        match kind {
            NodeKind::ReturnExit => self.expand_return(caller, exit, call, caller_cfa, call_edge, callee),
            NodeKind::ExceptionExit => self.expand_throw(caller, exit, caller_cfa, call_edge),
            NodeKind::Code | NodeKind::Catch { .. } => Err(AnalysisError::InvalidExitNode {
                signature: callee.signature.clone(),
                node: exit_node,
            }),
        }
    }

    fn expand_return(
        &self,
        caller: &JvmState<Self::Value>,
        exit: &JvmState<Self::Value>,
        call: &Call,
        caller_cfa: &MethodCfa,
        call_edge: &CfaEdge,
        callee: &MethodCfa,
    ) -> Result<JvmState<Self::Value>> {
        // A return exit only ever carries a well-formed return value when
        // every edge into it is a return instruction.
        let all_returns = callee
            .entering_edges(callee.return_exit)
            .all(|e| matches!(e.instruction(), Some(Instruction::Return { .. })));
        if !all_returns {
            return Err(AnalysisError::NonReturnExitEdge {
                signature: callee.signature.clone(),
            });
        }

        let mut next = caller.relocated(call_return_site(caller_cfa, call_edge)?);
        let consumed = call.total_slot_count();
        let available = next.frame.stack.len();
        next.frame
            .stack
            .pop_slots(consumed)
            .ok_or(AnalysisError::StackUnderflow {
                offset: call_site_offset(caller_cfa, call_edge),
                needed: consumed,
                available,
                history: OffsetHistory::new(),
            })?;
        next.frame
            .stack
            .push_slots(self.return_values(exit, call.return_width()));
        next.heap = self.expand_heap(&caller.heap, &exit.heap);
        next.static_fields = self.expand_static_fields(&caller.static_fields, &exit.static_fields);
        Ok(next)
    }

    fn expand_throw(
        &self,
        caller: &JvmState<Self::Value>,
        exit: &JvmState<Self::Value>,
        caller_cfa: &MethodCfa,
        call_edge: &CfaEdge,
    ) -> Result<JvmState<Self::Value>> {
        let exception = exit
            .frame
            .stack
            .peek()
            .cloned()
            .unwrap_or_else(Self::Value::unknown);

        let mut next = caller.clone();
        next.frame.stack.clear();
        next.frame.stack.push(exception);
        next.heap = self.expand_heap(&caller.heap, &exit.heap);
        next.static_fields = self.expand_static_fields(&caller.static_fields, &exit.static_fields);

        let offset = call_site_offset(caller_cfa, call_edge);
        let covering = caller_cfa
            .exception_table
            .iter()
            .enumerate()
            .find(|(_, h)| h.covers(offset));
        let target = match covering {
            Some((index, handler)) => {
                let is_catch = caller_cfa.node(handler.handler).is_some_and(|n| n.is_catch());
                if !is_catch {
                    return Err(AnalysisError::MissingCatchNode {
                        signature: caller_cfa.signature.clone(),
                        handler: index,
                        node: handler.handler,
                    });
                }
                handler.handler
            }
            None => caller_cfa.exception_exit,
        };
        next.set_location(target);
        Ok(next)
    }
}

fn call_site_offset(cfa: &MethodCfa, call_edge: &CfaEdge) -> u32 {
    cfa.node(call_edge.source).map_or(0, |n| n.offset)
}

/// Expand operator with all hooks at their defaults.
#[derive(Debug)]
pub struct DefaultExpandOperator<V>(std::marker::PhantomData<V>);

impl<V> DefaultExpandOperator<V> {
    pub const fn new() -> Self {
        Self(std::marker::PhantomData)
    }
}

impl<V> Default for DefaultExpandOperator<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: AbstractValue> ExpandOperator for DefaultExpandOperator<V> {
    type Value = V;
}
