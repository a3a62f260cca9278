//! Pluggable value semantics for the JVM transfer relation.

use jlat_cfa::{ArithmeticOp, Call};
use jlat_cpa::LatticeState;

use crate::value::{AbstractValue, join_values};

/// The hooks a concrete analysis overrides to give instructions meaning.
///
/// Every hook has a sound default: results are the join of whatever flowed
/// in, or `unknown()` where nothing is tracked (array elements, instance
/// fields, fresh objects). The transfer relation owns all stack and local
/// bookkeeping; these hooks only ever see and produce values.
pub trait JvmSemantics {
    type Value: AbstractValue;

    /// Value pushed for a constant instruction.
    fn constant(&self, _value: i64, _width: u8) -> Self::Value {
        Self::Value::unknown()
    }

    /// Result of an arithmetic/logic instruction. Operands are in
    /// declaration order (first-pushed first).
    fn arithmetic(&self, _op: ArithmeticOp, operands: &[Self::Value]) -> Self::Value {
        join_values(operands)
    }

    /// Result of a primitive conversion.
    fn convert(&self, value: Self::Value, _from_width: u8, _to_width: u8) -> Self::Value {
        value
    }

    /// Value read from an array element.
    fn array_load(
        &self,
        _heap: &Self::Value,
        _array: &Self::Value,
        _index: &Self::Value,
    ) -> Self::Value {
        Self::Value::unknown()
    }

    /// New heap summary after an array element store.
    fn array_store(
        &self,
        heap: &Self::Value,
        _array: &Self::Value,
        _index: &Self::Value,
        value: &Self::Value,
    ) -> Self::Value {
        heap.join(value)
    }

    /// Length of an array.
    fn array_length(&self, _array: &Self::Value) -> Self::Value {
        Self::Value::unknown()
    }

    /// Value read from an instance field.
    fn field_load(&self, _heap: &Self::Value, _object: &Self::Value) -> Self::Value {
        Self::Value::unknown()
    }

    /// New heap summary after an instance field store.
    fn field_store(
        &self,
        heap: &Self::Value,
        _object: &Self::Value,
        value: &Self::Value,
    ) -> Self::Value {
        heap.join(value)
    }

    /// Reference produced by `new` / `newarray`.
    fn new_object(&self) -> Self::Value {
        Self::Value::unknown()
    }

    /// Return-value abstraction for a call handled without descending into
    /// the callee (the intraprocedural default, and what a depth-truncated
    /// interprocedural call falls back to). Operands are receiver first,
    /// then arguments in declaration order.
    fn invoke(&self, _call: &Call, operands: &[Self::Value]) -> Self::Value {
        join_values(operands)
    }
}

/// Semantics that tracks nothing: every hook keeps its default.
#[derive(Debug)]
pub struct DefaultSemantics<V>(std::marker::PhantomData<V>);

impl<V> DefaultSemantics<V> {
    pub const fn new() -> Self {
        Self(std::marker::PhantomData)
    }
}

impl<V> Default for DefaultSemantics<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Clone for DefaultSemantics<V> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<V: AbstractValue> JvmSemantics for DefaultSemantics<V> {
    type Value = V;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::test_value::Const;

    #[test]
    fn test_default_stores_join_into_heap() {
        let sem: DefaultSemantics<Const> = DefaultSemantics::new();
        let heap = Const::Val(1);
        assert_eq!(
            sem.array_store(&heap, &Const::Top, &Const::Top, &Const::Val(1)),
            Const::Val(1)
        );
        assert_eq!(
            sem.array_store(&heap, &Const::Top, &Const::Top, &Const::Val(2)),
            Const::Top
        );
        assert_eq!(
            sem.field_store(&heap, &Const::Top, &Const::Val(2)),
            Const::Top
        );
    }

    #[test]
    fn test_default_reads_are_unknown() {
        let sem: DefaultSemantics<Const> = DefaultSemantics::new();
        assert_eq!(sem.constant(7, 1), Const::Top);
        assert_eq!(
            sem.array_load(&Const::Val(1), &Const::Top, &Const::Top),
            Const::Top
        );
        assert_eq!(sem.field_load(&Const::Val(1), &Const::Top), Const::Top);
    }
}
