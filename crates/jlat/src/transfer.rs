//! The per-instruction JVM transfer relation.
//!
//! Computes abstract successors for one CFA edge by simulating the
//! instruction's stack effect on a copy of the incoming state. All slot
//! bookkeeping (category-2 doubling included) lives here; value meaning is
//! delegated to the [`JvmSemantics`] hooks. Branches and switches pop their
//! declared operands without evaluating conditions; where control goes is
//! the CFA's concern, not this relation's.

use jlat_cfa::{Call, CfaEdge, EdgeKind, Instruction, MethodCfa, NodeId};
use jlat_cpa::{AnalysisError, OffsetHistory, Result, StateStack, TransferRelation};

use crate::semantics::JvmSemantics;
use crate::state::JvmState;
use crate::value::AbstractValue;

/// Intraprocedural successor of a call site: the target of the unique
/// non-call leaving edge, or the call edge's own target when no parallel
/// successor edge exists.
pub(crate) fn call_return_site(cfa: &MethodCfa, call_edge: &CfaEdge) -> Result<NodeId> {
    let mut non_call = cfa.leaving_edges(call_edge.source).filter(|e| !e.is_call());
    match (non_call.next(), non_call.next()) {
        (Some(edge), None) => Ok(edge.target),
        (None, _) => Ok(call_edge.target),
        (Some(_), Some(_)) => Err(AnalysisError::AmbiguousCallSuccessor {
            signature: cfa.signature.clone(),
            offset: cfa.node(call_edge.source).map_or(0, |n| n.offset),
        }),
    }
}

pub struct JvmTransferRelation<Sem> {
    semantics: Sem,
    history: OffsetHistory,
}

impl<Sem: JvmSemantics> JvmTransferRelation<Sem> {
    pub fn new(semantics: Sem) -> Self {
        Self {
            semantics,
            history: OffsetHistory::new(),
        }
    }

    pub const fn semantics(&self) -> &Sem {
        &self.semantics
    }

    /// Intraprocedural call handling: pop receiver and arguments, ask the
    /// semantics for a summary return value, push it sized by the declared
    /// return type. Also the fallback for depth-truncated BAM calls.
    pub(crate) fn process_call(
        &mut self,
        state: &JvmState<Sem::Value>,
        edge: &CfaEdge,
        call: &Call,
        cfa: &MethodCfa,
    ) -> Result<Vec<JvmState<Sem::Value>>> {
        let offset = cfa.node(edge.source).map_or(0, |n| n.offset);
        self.history.record(offset);

        let mut next = state.clone();
        let operands = self.pop_call_operands(&mut next.frame.stack, call, offset)?;
        let result = self.semantics.invoke(call, &operands);
        self.push_value(&mut next.frame.stack, call.return_width(), result);
        next.set_location(call_return_site(cfa, edge)?);
        Ok(vec![next])
    }

    /// Pop a call's operands off the caller stack: declared arguments in
    /// reverse declaration order (wide values as two slots, most significant
    /// first), then the receiver for instance calls. Returned receiver-first
    /// in declaration order.
    pub(crate) fn pop_call_operands(
        &self,
        stack: &mut StateStack<Sem::Value>,
        call: &Call,
        offset: u32,
    ) -> Result<Vec<Sem::Value>> {
        let mut operands = Vec::with_capacity(call.target.descriptor.params.len() + 1);
        for ty in call.target.descriptor.params.iter().rev() {
            operands.push(self.pop_value(stack, ty.slot_width(), offset)?);
        }
        if !call.is_static() {
            operands.push(self.pop_value(stack, 1, offset)?);
        }
        operands.reverse();
        Ok(operands)
    }

    fn simulate(
        &self,
        state: &mut JvmState<Sem::Value>,
        instruction: &Instruction,
        offset: u32,
    ) -> Result<()> {
        let sem = &self.semantics;
        match instruction {
            Instruction::Const { value, width } => {
                let v = sem.constant(*value, *width);
                self.push_value(&mut state.frame.stack, usize::from(*width), v);
            }
            Instruction::Load { index, width } => {
                let index = usize::from(*index);
                let width = usize::from(*width);
                let value = match state.frame.load(index, width) {
                    Some(value) => value.clone(),
                    None if width == 2 && state.frame.locals.get(index).is_some() => {
                        return Err(AnalysisError::CategoryMismatch {
                            offset,
                            expected: 2,
                            history: self.history.clone(),
                        });
                    }
                    None => {
                        return Err(AnalysisError::MissingLocal {
                            offset,
                            index,
                            history: self.history.clone(),
                        });
                    }
                };
                self.push_value(&mut state.frame.stack, width, value);
            }
            Instruction::Store { index, width } => {
                let width = usize::from(*width);
                let value = self.pop_value(&mut state.frame.stack, width, offset)?;
                state.frame.store(usize::from(*index), width, value);
            }
            Instruction::Pop { slots } => {
                self.pop_raw(&mut state.frame.stack, usize::from(*slots), offset)?;
            }
            Instruction::Dup { slots, depth } => {
                let popped = self.pop_raw(
                    &mut state.frame.stack,
                    usize::from(slots + depth),
                    offset,
                )?;
                let (below, top) = popped.split_at(usize::from(*depth));
                state.frame.stack.push_slots(top.iter().cloned());
                state.frame.stack.push_slots(below.iter().cloned());
                state.frame.stack.push_slots(top.iter().cloned());
            }
            Instruction::Swap => {
                let v1 = self.pop_value(&mut state.frame.stack, 1, offset)?;
                let v2 = self.pop_value(&mut state.frame.stack, 1, offset)?;
                state.frame.stack.push(v1);
                state.frame.stack.push(v2);
            }
            Instruction::Arithmetic {
                op,
                operands,
                width,
            } => {
                let mut values = Vec::with_capacity(usize::from(*operands));
                for _ in 0..*operands {
                    values.push(self.pop_value(&mut state.frame.stack, usize::from(*width), offset)?);
                }
                values.reverse();
                let result = sem.arithmetic(*op, &values);
                let push_width = if matches!(op, jlat_cfa::ArithmeticOp::Cmp) {
                    1
                } else {
                    usize::from(*width)
                };
                self.push_value(&mut state.frame.stack, push_width, result);
            }
            Instruction::Convert {
                from_width,
                to_width,
            } => {
                let value =
                    self.pop_value(&mut state.frame.stack, usize::from(*from_width), offset)?;
                let converted = sem.convert(value, *from_width, *to_width);
                self.push_value(&mut state.frame.stack, usize::from(*to_width), converted);
            }
            Instruction::ArrayLoad { width } => {
                let index = self.pop_value(&mut state.frame.stack, 1, offset)?;
                let array = self.pop_value(&mut state.frame.stack, 1, offset)?;
                let value = sem.array_load(&state.heap, &array, &index);
                self.push_value(&mut state.frame.stack, usize::from(*width), value);
            }
            Instruction::ArrayStore { width } => {
                let value = self.pop_value(&mut state.frame.stack, usize::from(*width), offset)?;
                let index = self.pop_value(&mut state.frame.stack, 1, offset)?;
                let array = self.pop_value(&mut state.frame.stack, 1, offset)?;
                state.heap = sem.array_store(&state.heap, &array, &index, &value);
            }
            Instruction::ArrayLength => {
                let array = self.pop_value(&mut state.frame.stack, 1, offset)?;
                state.frame.stack.push(sem.array_length(&array));
            }
            Instruction::GetField { width } => {
                let object = self.pop_value(&mut state.frame.stack, 1, offset)?;
                let value = sem.field_load(&state.heap, &object);
                self.push_value(&mut state.frame.stack, usize::from(*width), value);
            }
            Instruction::PutField { width } => {
                let value = self.pop_value(&mut state.frame.stack, usize::from(*width), offset)?;
                let object = self.pop_value(&mut state.frame.stack, 1, offset)?;
                state.heap = sem.field_store(&state.heap, &object, &value);
            }
            Instruction::GetStatic { field, width } => {
                let value = state
                    .static_fields
                    .get(field)
                    .cloned()
                    .unwrap_or_else(Sem::Value::unknown);
                self.push_value(&mut state.frame.stack, usize::from(*width), value);
            }
            Instruction::PutStatic { field, width } => {
                let value = self.pop_value(&mut state.frame.stack, usize::from(*width), offset)?;
                state.static_fields.set(field.clone(), value);
            }
            Instruction::New => {
                state.frame.stack.push(sem.new_object());
            }
            Instruction::NewArray { dimensions } => {
                self.pop_raw(&mut state.frame.stack, usize::from(*dimensions), offset)?;
                state.frame.stack.push(sem.new_object());
            }
            Instruction::InstanceOf => {
                self.pop_value(&mut state.frame.stack, 1, offset)?;
                state.frame.stack.push(Sem::Value::unknown());
            }
            Instruction::CheckCast => {}
            Instruction::Monitor => {
                self.pop_value(&mut state.frame.stack, 1, offset)?;
            }
            Instruction::Branch { pops } => {
                self.pop_raw(&mut state.frame.stack, usize::from(*pops), offset)?;
            }
            Instruction::Switch => {
                self.pop_value(&mut state.frame.stack, 1, offset)?;
            }
            // Return values stay on the stack: the caller-side expand step
            // harvests them from the exit state.
            Instruction::Return { .. } => {}
            Instruction::Throw => {
                let exception = self.pop_value(&mut state.frame.stack, 1, offset)?;
                state.frame.stack.clear();
                state.frame.stack.push(exception);
            }
        }
        Ok(())
    }

    fn pop_value(
        &self,
        stack: &mut StateStack<Sem::Value>,
        width: usize,
        offset: u32,
    ) -> Result<Sem::Value> {
        let available = stack.len();
        match width {
            2 => stack
                .pop_wide()
                .ok_or_else(|| AnalysisError::CategoryMismatch {
                    offset,
                    expected: 2,
                    history: self.history.clone(),
                }),
            _ => stack.pop().ok_or_else(|| AnalysisError::StackUnderflow {
                offset,
                needed: 1,
                available,
                history: self.history.clone(),
            }),
        }
    }

    fn pop_raw(
        &self,
        stack: &mut StateStack<Sem::Value>,
        slots: usize,
        offset: u32,
    ) -> Result<Vec<Sem::Value>> {
        let available = stack.len();
        stack
            .pop_slots(slots)
            .ok_or_else(|| AnalysisError::StackUnderflow {
                offset,
                needed: slots,
                available,
                history: self.history.clone(),
            })
    }

    fn push_value(&self, stack: &mut StateStack<Sem::Value>, width: usize, value: Sem::Value) {
        match width {
            0 => {}
            2 => stack.push_wide(value),
            _ => stack.push(value),
        }
    }
}

impl<Sem: JvmSemantics> TransferRelation for JvmTransferRelation<Sem> {
    type State = JvmState<Sem::Value>;

    fn successors(
        &mut self,
        state: &Self::State,
        edge: &CfaEdge,
        cfa: &MethodCfa,
    ) -> Result<Vec<Self::State>> {
        match &edge.kind {
            EdgeKind::Instruction(instruction) => {
                let offset = cfa.node(edge.source).map_or(0, |n| n.offset);
                self.history.record(offset);
                let mut next = state.relocated(edge.target);
                self.simulate(&mut next, instruction, offset)?;
                Ok(vec![next])
            }
            EdgeKind::Call(call) => self.process_call(state, edge, call, cfa),
            EdgeKind::Successor => {
                // A successor edge parallel to a call edge is the return
                // route the expand operator uses; walking it directly would
                // skip the call entirely.
                if cfa.leaving_edges(edge.source).any(CfaEdge::is_call) {
                    Ok(vec![])
                } else {
                    Ok(vec![state.relocated(edge.target)])
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::JvmFrame;
    use crate::value::test_value::Const;
    use jlat_cfa::{
        ArithmeticOp, CfaBuilder, InvokeKind, JvmType, MethodDescriptor, MethodSignature,
    };
    use jlat_cpa::{ProgramState, StateMap};

    /// Constant-propagation semantics used by the tests.
    struct ConstSemantics;

    impl JvmSemantics for ConstSemantics {
        type Value = Const;

        fn constant(&self, value: i64, _width: u8) -> Const {
            Const::Val(value)
        }

        fn arithmetic(&self, op: ArithmeticOp, operands: &[Const]) -> Const {
            match (op, operands) {
                (ArithmeticOp::Add, [Const::Val(a), Const::Val(b)]) => Const::Val(a + b),
                (ArithmeticOp::Sub, [Const::Val(a), Const::Val(b)]) => Const::Val(a - b),
                _ => Const::Top,
            }
        }
    }

    fn state_at(node: NodeId, max_locals: usize) -> JvmState<Const> {
        JvmState::at(node, JvmFrame::new(max_locals), Const::Top, StateMap::new())
    }

    fn straight_cfa(instructions: Vec<Instruction>) -> MethodCfa {
        let sig =
            MethodSignature::new("T", "m", MethodDescriptor::new(vec![JvmType::Int], JvmType::Int));
        let mut b = CfaBuilder::new(sig, true, 2);
        let mut prev = b.entry();
        for (i, instr) in instructions.into_iter().enumerate() {
            let is_return = instr.is_return();
            let next = if is_return {
                b.return_exit()
            } else {
                b.add_node(u32::try_from(i + 1).unwrap())
            };
            b.add_instruction_edge(prev, next, instr);
            prev = next;
        }
        b.finish()
    }

    fn run_straight(
        cfa: &MethodCfa,
        mut state: JvmState<Const>,
    ) -> Result<JvmState<Const>> {
        let mut transfer = JvmTransferRelation::new(ConstSemantics);
        loop {
            let Some(edge) = cfa.leaving_edges(state.location()).next().cloned() else {
                return Ok(state);
            };
            state = transfer
                .successors(&state, &edge, cfa)?
                .pop()
                .expect("straight-line edge has one successor");
        }
    }

    #[test]
    fn test_const_load_add() {
        // iload_0; iconst_1; iadd; ireturn  with entry local0 = 5
        let cfa = straight_cfa(vec![
            Instruction::Load { index: 0, width: 1 },
            Instruction::Const { value: 1, width: 1 },
            Instruction::Arithmetic {
                op: ArithmeticOp::Add,
                operands: 2,
                width: 1,
            },
            Instruction::Return { width: 1 },
        ]);
        let mut state = state_at(cfa.entry, 2);
        state.frame.store(0, 1, Const::Val(5));

        let exit = run_straight(&cfa, state).unwrap();
        assert_eq!(exit.location(), cfa.return_exit);
        assert_eq!(exit.frame.stack.peek(), Some(&Const::Val(6)));
    }

    #[test]
    fn test_wide_arithmetic_slots() {
        // lconst 3; lconst 4; ladd leaves exactly two slots
        let cfa = straight_cfa(vec![
            Instruction::Const { value: 3, width: 2 },
            Instruction::Const { value: 4, width: 2 },
            Instruction::Arithmetic {
                op: ArithmeticOp::Add,
                operands: 2,
                width: 2,
            },
            Instruction::Return { width: 2 },
        ]);
        let exit = run_straight(&cfa, state_at(cfa.entry, 2)).unwrap();
        assert_eq!(exit.frame.stack.len(), 2);
        assert_eq!(exit.frame.stack.peek(), Some(&Const::Val(7)));
    }

    #[test]
    fn test_throw_collapses_stack() {
        let cfa = straight_cfa(vec![
            Instruction::Const { value: 1, width: 1 },
            Instruction::Const { value: 2, width: 1 },
            Instruction::Throw,
        ]);
        // The throw edge in this synthetic CFA targets a plain node; only
        // the stack shape matters here.
        let exit = run_straight(&cfa, state_at(cfa.entry, 2)).unwrap();
        assert_eq!(exit.frame.stack.len(), 1);
        assert_eq!(exit.frame.stack.peek(), Some(&Const::Val(2)));
    }

    #[test]
    fn test_branch_pops_without_evaluating() {
        let cfa = straight_cfa(vec![
            Instruction::Const { value: 1, width: 1 },
            Instruction::Const { value: 2, width: 1 },
            Instruction::Branch { pops: 2 },
        ]);
        let exit = run_straight(&cfa, state_at(cfa.entry, 2)).unwrap();
        assert!(exit.frame.stack.is_empty());
    }

    #[test]
    fn test_static_field_round_trip() {
        let cfa = straight_cfa(vec![
            Instruction::Const { value: 9, width: 1 },
            Instruction::PutStatic {
                field: "F.x".into(),
                width: 1,
            },
            Instruction::GetStatic {
                field: "F.x".into(),
                width: 1,
            },
        ]);
        let exit = run_straight(&cfa, state_at(cfa.entry, 2)).unwrap();
        assert_eq!(exit.frame.stack.peek(), Some(&Const::Val(9)));
    }

    #[test]
    fn test_stack_underflow_reports_history() {
        let cfa = straight_cfa(vec![Instruction::Pop { slots: 1 }]);
        let err = run_straight(&cfa, state_at(cfa.entry, 2)).unwrap_err();
        assert_eq!(err.id(), "STACK_UNDERFLOW");
    }

    #[test]
    fn test_wide_pop_of_single_slot_is_category_mismatch() {
        let cfa = straight_cfa(vec![
            Instruction::Const { value: 1, width: 1 },
            Instruction::Store { index: 0, width: 2 },
        ]);
        let err = run_straight(&cfa, state_at(cfa.entry, 2)).unwrap_err();
        assert_eq!(err.id(), "CATEGORY_MISMATCH");
    }

    #[test]
    fn test_intraprocedural_call_summary() {
        // Default invoke joins the operands into the pushed return value.
        let callee = MethodSignature::new(
            "T",
            "f",
            MethodDescriptor::new(vec![JvmType::Int], JvmType::Int),
        );
        let sig = MethodSignature::new("T", "m", MethodDescriptor::new(vec![], JvmType::Int));
        let mut b = CfaBuilder::new(sig, true, 0);
        let site = b.add_node(1);
        let after = b.add_node(4);
        b.add_instruction_edge(b.entry(), site, Instruction::Const { value: 5, width: 1 });
        b.add_call_edge(site, after, Call::new(callee, InvokeKind::Static));
        let cfa = b.finish();

        let mut transfer = JvmTransferRelation::new(ConstSemantics);
        let mut state = state_at(cfa.entry, 0);
        for _ in 0..2 {
            let edge = cfa.leaving_edges(state.location()).next().cloned().unwrap();
            state = transfer.successors(&state, &edge, &cfa).unwrap().pop().unwrap();
        }
        assert_eq!(state.location(), NodeId(4));
        assert_eq!(state.frame.stack.len(), 1);
        assert_eq!(state.frame.stack.peek(), Some(&Const::Val(5)));
    }
}
