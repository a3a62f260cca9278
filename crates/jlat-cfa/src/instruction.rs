//! Closed union of JVM instruction categories.
//!
//! The transfer relation interprets these structurally: every variant reports
//! how many stack slots it pops and pushes, so generic bookkeeping needs no
//! per-opcode special-casing. Grouping opcodes into categories (rather than
//! carrying all ~200 opcodes) keeps the interpreter's match exhaustive; an
//! opcode with no category simply cannot be represented.

/// Binary/unary arithmetic and logic operation tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Neg,
    Shl,
    Shr,
    Ushr,
    And,
    Or,
    Xor,
    /// lcmp/fcmpl/fcmpg/dcmpl/dcmpg: compares two operands, pushes an int.
    Cmp,
}

/// One JVM instruction, reduced to its abstract stack effect.
///
/// `width` fields are slot widths: 1 for category-1 values, 2 for category-2
/// (long/double). Literal operands that no analysis could ever observe (e.g.
/// branch offsets) are omitted; branch *targets* are edges in the CFA, not
/// part of the instruction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// Constant push (iconst/lconst/ldc/bipush/...). `value` carries the
    /// integral literal where one exists, 0 otherwise (aconst_null, float
    /// constants an analysis does not track).
    Const { value: i64, width: u8 },
    /// Local variable load (iload/lload/aload/...).
    Load { index: u16, width: u8 },
    /// Local variable store (istore/lstore/astore/...).
    Store { index: u16, width: u8 },
    /// pop / pop2.
    Pop { slots: u8 },
    /// dup family: duplicate the top `slots` slots, inserting them `depth`
    /// slots below the original top (dup = {1, 0}, dup_x1 = {1, 1},
    /// dup2_x2 = {2, 2}).
    Dup { slots: u8, depth: u8 },
    Swap,
    /// Arithmetic/logic: pops `operands` values of `width` slots each,
    /// pushes one result. `Cmp` is the exception: it always pushes one
    /// category-1 int.
    Arithmetic {
        op: ArithmeticOp,
        operands: u8,
        width: u8,
    },
    /// Primitive conversion (i2l, d2i, ...).
    Convert { from_width: u8, to_width: u8 },
    /// *aload: pops index and arrayref, pushes an element of `width` slots.
    ArrayLoad { width: u8 },
    /// *astore: pops a value of `width` slots, index, and arrayref.
    ArrayStore { width: u8 },
    ArrayLength,
    /// getfield: pops objectref, pushes `width` slots.
    GetField { width: u8 },
    /// putfield: pops `width` slots and objectref.
    PutField { width: u8 },
    /// getstatic: pushes `width` slots read from the named static field.
    GetStatic { field: String, width: u8 },
    /// putstatic: pops `width` slots into the named static field.
    PutStatic { field: String, width: u8 },
    /// new: pushes an uninitialized object reference.
    New,
    /// newarray/anewarray/multianewarray: pops `dimensions` counts, pushes
    /// an array reference.
    NewArray { dimensions: u8 },
    /// instanceof: pops objectref, pushes an int.
    InstanceOf,
    /// checkcast: no stack-shape change.
    CheckCast,
    /// monitorenter/monitorexit: pops objectref.
    Monitor,
    /// Conditional or unconditional branch: pops its declared operands
    /// (goto = 0, ifnull = 1, if_icmpeq = 2). Conditions are never
    /// evaluated here; both targets are CFA edges.
    Branch { pops: u8 },
    /// tableswitch/lookupswitch: pops the selector.
    Switch,
    /// *return. `width` is the declared stack-pop count (0 for void) and is
    /// what sizes the caller-side return value on expand.
    Return { width: u8 },
    /// athrow: the stack collapses to the single thrown abstraction.
    Throw,
}

impl Instruction {
    /// Slots this instruction pops off the operand stack.
    pub fn stack_pops(&self) -> usize {
        match self {
            Self::Const { .. }
            | Self::Load { .. }
            | Self::New
            | Self::GetStatic { .. } => 0,
            Self::Store { width, .. }
            | Self::PutStatic { width, .. }
            | Self::Return { width } => usize::from(*width),
            Self::Pop { slots } => usize::from(*slots),
            Self::Dup { slots, depth } => usize::from(slots + depth),
            Self::Swap => 2,
            Self::Arithmetic {
                operands, width, ..
            } => usize::from(*operands) * usize::from(*width),
            Self::Convert { from_width, .. } => usize::from(*from_width),
            Self::ArrayLoad { .. } => 2,
            Self::ArrayStore { width } => 2 + usize::from(*width),
            Self::ArrayLength | Self::InstanceOf | Self::Monitor | Self::Switch | Self::Throw => 1,
            Self::GetField { .. } => 1,
            Self::PutField { width } => 1 + usize::from(*width),
            Self::NewArray { dimensions } => usize::from(*dimensions),
            Self::CheckCast => 0,
            Self::Branch { pops } => usize::from(*pops),
        }
    }

    /// Slots this instruction pushes onto the operand stack.
    pub fn stack_pushes(&self) -> usize {
        match self {
            Self::Const { width, .. }
            | Self::Load { width, .. }
            | Self::ArrayLoad { width }
            | Self::GetField { width }
            | Self::GetStatic { width, .. } => usize::from(*width),
            Self::Dup { slots, depth } => usize::from(2 * slots + depth),
            Self::Swap => 2,
            Self::Arithmetic { op, width, .. } => {
                if matches!(op, ArithmeticOp::Cmp) {
                    1
                } else {
                    usize::from(*width)
                }
            }
            Self::Convert { to_width, .. } => usize::from(*to_width),
            Self::ArrayLength | Self::New | Self::NewArray { .. } | Self::InstanceOf => 1,
            Self::Throw => 1,
            Self::Store { .. }
            | Self::Pop { .. }
            | Self::ArrayStore { .. }
            | Self::PutField { .. }
            | Self::PutStatic { .. }
            | Self::CheckCast
            | Self::Monitor
            | Self::Branch { .. }
            | Self::Switch
            | Self::Return { .. } => 0,
        }
    }

    pub const fn is_return(&self) -> bool {
        matches!(self, Self::Return { .. })
    }
}
