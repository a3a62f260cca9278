//! JVM value types, slot widths, and method signatures.

use std::fmt;

/// Verification-level JVM type. The sub-int types (boolean, byte, char,
/// short) are folded into `Int`; they are indistinguishable on the operand
/// stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JvmType {
    Int,
    Long,
    Float,
    Double,
    Reference,
    Void,
}

impl JvmType {
    /// Number of stack/variable slots a value of this type occupies.
    /// Category-2 types (long, double) occupy two adjacent slots.
    pub const fn slot_width(self) -> usize {
        match self {
            Self::Long | Self::Double => 2,
            Self::Void => 0,
            Self::Int | Self::Float | Self::Reference => 1,
        }
    }

    /// Whether this is a 64-bit category-2 type.
    pub const fn is_category2(self) -> bool {
        matches!(self, Self::Long | Self::Double)
    }
}

/// Parameter and return types of a method.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodDescriptor {
    pub params: Vec<JvmType>,
    pub ret: JvmType,
}

impl MethodDescriptor {
    pub fn new(params: Vec<JvmType>, ret: JvmType) -> Self {
        Self { params, ret }
    }

    /// Total slot count of the declared parameters (excluding any receiver).
    pub fn argument_slot_count(&self) -> usize {
        self.params.iter().map(|t| t.slot_width()).sum()
    }

    /// Slot width of the return type.
    pub const fn return_width(&self) -> usize {
        self.ret.slot_width()
    }
}

/// Fully qualified method identity: class, name, and descriptor.
///
/// Used as the index key for [`crate::Cfa`] lookups and for interprocedural
/// summary caching, so equality and hashing are structural.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodSignature {
    pub class: String,
    pub name: String,
    pub descriptor: MethodDescriptor,
}

impl MethodSignature {
    pub fn new(
        class: impl Into<String>,
        name: impl Into<String>,
        descriptor: MethodDescriptor,
    ) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
            descriptor,
        }
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}/{}",
            self.class,
            self.name,
            self.descriptor.params.len()
        )
    }
}
