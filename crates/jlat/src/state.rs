//! The composite JVM abstract state.

use jlat_cfa::{MethodCfa, NodeId};
use jlat_cpa::{LatticeState, ProgramState, StateList, StateMap, StateStack};

use crate::value::AbstractValue;

/// One execution frame: local variable array plus operand stack.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct JvmFrame<V> {
    pub locals: StateList<V>,
    pub stack: StateStack<V>,
}

impl<V: AbstractValue> JvmFrame<V> {
    /// Frame with `max_locals` unknown slots and an empty stack.
    pub fn new(max_locals: usize) -> Self {
        Self {
            locals: StateList::filled(max_locals, &V::unknown()),
            stack: StateStack::new(),
        }
    }

    /// Read a local of the given slot width. A category-2 value occupies
    /// slots `index` and `index + 1`.
    pub fn load(&self, index: usize, width: usize) -> Option<&V> {
        if width == 2 && self.locals.get(index + 1).is_none() {
            return None;
        }
        self.locals.get(index)
    }

    /// Write a local of the given slot width; the second slot of a
    /// category-2 value holds the same abstraction.
    pub fn store(&mut self, index: usize, width: usize, value: V) {
        let unknown = V::unknown();
        if width == 2 {
            self.locals.set(index + 1, value.clone(), &unknown);
        }
        self.locals.set(index, value, &unknown);
    }

    fn join(&self, other: &Self) -> Self {
        Self {
            locals: self.locals.join_with_default(&other.locals, &V::unknown()),
            stack: self.stack.join(&other.stack),
        }
    }

    fn is_less_or_equal(&self, other: &Self) -> bool {
        self.locals.is_less_or_equal(&other.locals) && self.stack.is_less_or_equal(&other.stack)
    }
}

/// Abstract state of one JVM execution point: program location, frame, a
/// heap summary, and the static fields.
///
/// The default heap is a single summary abstraction: stores join into it,
/// untracked reads come back as the semantics' default. Analyses that model
/// a real heap keep their content in `V` and override the heap hooks on
/// [`crate::JvmSemantics`] and the BAM operators.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct JvmState<V> {
    location: NodeId,
    pub frame: JvmFrame<V>,
    pub heap: V,
    pub static_fields: StateMap<String, V>,
}

impl<V: AbstractValue> JvmState<V> {
    /// Entry state of a method: unknown locals, empty stack, unknown heap.
    pub fn initial(method: &MethodCfa) -> Self {
        Self {
            location: method.entry,
            frame: JvmFrame::new(method.max_locals),
            heap: V::unknown(),
            static_fields: StateMap::new(),
        }
    }

    pub const fn at(
        location: NodeId,
        frame: JvmFrame<V>,
        heap: V,
        static_fields: StateMap<String, V>,
    ) -> Self {
        Self {
            location,
            frame,
            heap,
            static_fields,
        }
    }

    pub fn set_location(&mut self, location: NodeId) {
        self.location = location;
    }

    /// Copy repositioned at another location.
    pub fn relocated(&self, location: NodeId) -> Self {
        let mut state = self.clone();
        state.location = location;
        state
    }
}

impl<V: AbstractValue> LatticeState for JvmState<V> {
    /// Componentwise join. Only states at the same location are ever joined
    /// by the engine; the left location is kept.
    fn join(&self, other: &Self) -> Self {
        if self == other {
            return self.clone();
        }
        Self {
            location: self.location,
            frame: self.frame.join(&other.frame),
            heap: self.heap.join(&other.heap),
            static_fields: self.static_fields.join(&other.static_fields),
        }
    }

    fn is_less_or_equal(&self, other: &Self) -> bool {
        self.location == other.location
            && self.frame.is_less_or_equal(&other.frame)
            && self.heap.is_less_or_equal(&other.heap)
            && self.static_fields.is_less_or_equal(&other.static_fields)
    }
}

impl<V: AbstractValue> ProgramState for JvmState<V> {
    fn location(&self) -> NodeId {
        self.location
    }
}
