//! Call descriptors attached to interprocedural CFA edges.

use crate::types::MethodSignature;

/// Invocation opcode family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InvokeKind {
    Static,
    Virtual,
    Special,
    Interface,
    Dynamic,
}

/// One resolved call site: the target method plus the facts the engine needs
/// to move argument slots across the call boundary. Target resolution itself
/// (virtual dispatch, interface lookup) happens in the front end that builds
/// the CFA.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Call {
    pub target: MethodSignature,
    pub kind: InvokeKind,
    /// Declared argument slot count, excluding any receiver. Category-2
    /// parameters count as two slots.
    pub argument_slots: usize,
    /// Whether reaching this call depends on a branch condition the front
    /// end could not discharge.
    pub control_flow_dependent: bool,
    /// Whether the resolved target depends on the receiver's runtime type.
    pub runtime_type_dependent: bool,
}

impl Call {
    pub fn new(target: MethodSignature, kind: InvokeKind) -> Self {
        let argument_slots = target.descriptor.argument_slot_count();
        Self {
            target,
            kind,
            argument_slots,
            control_flow_dependent: false,
            runtime_type_dependent: false,
        }
    }

    pub const fn is_static(&self) -> bool {
        matches!(self.kind, InvokeKind::Static | InvokeKind::Dynamic)
    }

    /// Slots the call consumes off the caller's operand stack: declared
    /// arguments plus the receiver slot for instance calls.
    pub const fn total_slot_count(&self) -> usize {
        self.argument_slots + if self.is_static() { 0 } else { 1 }
    }

    /// Slot width of the value the call leaves on the caller's stack.
    pub const fn return_width(&self) -> usize {
        self.target.descriptor.return_width()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JvmType, MethodDescriptor};

    fn sig(params: Vec<JvmType>, ret: JvmType) -> MethodSignature {
        MethodSignature::new("A", "m", MethodDescriptor::new(params, ret))
    }

    #[test]
    fn test_slot_counts() {
        let call = Call::new(
            sig(vec![JvmType::Int, JvmType::Long], JvmType::Long),
            InvokeKind::Virtual,
        );
        assert_eq!(call.argument_slots, 3);
        assert_eq!(call.total_slot_count(), 4);
        assert_eq!(call.return_width(), 2);

        let call = Call::new(sig(vec![JvmType::Int], JvmType::Void), InvokeKind::Static);
        assert_eq!(call.total_slot_count(), 1);
        assert_eq!(call.return_width(), 0);
    }
}
