//! Per-method control flow automaton: nodes, edges, exception table.

use rustc_hash::FxHashMap;

use crate::call::Call;
use crate::instruction::Instruction;
use crate::types::MethodSignature;

/// Index of a node within one method's CFA.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Index of an edge within one method's CFA.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u32);

/// Role of a program location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Ordinary location between instructions.
    Code,
    /// The method's unique normal-return exit.
    ReturnExit,
    /// The method's unique exceptional exit.
    ExceptionExit,
    /// Entry of the exception handler with the given exception-table index.
    Catch { handler: usize },
}

/// One program location.
#[derive(Clone, Debug)]
pub struct CfaNode {
    pub id: NodeId,
    /// Bytecode offset of the location (exit nodes reuse the offset of the
    /// instruction that reaches them).
    pub offset: u32,
    pub kind: NodeKind,
    pub leaving: Vec<EdgeId>,
    pub entering: Vec<EdgeId>,
}

impl CfaNode {
    pub const fn is_return_exit(&self) -> bool {
        matches!(self.kind, NodeKind::ReturnExit)
    }

    pub const fn is_exception_exit(&self) -> bool {
        matches!(self.kind, NodeKind::ExceptionExit)
    }

    pub const fn is_exit(&self) -> bool {
        self.is_return_exit() || self.is_exception_exit()
    }

    pub const fn is_catch(&self) -> bool {
        matches!(self.kind, NodeKind::Catch { .. })
    }
}

/// What happens along an edge.
#[derive(Clone, Debug)]
pub enum EdgeKind {
    /// Execute one instruction.
    Instruction(Instruction),
    /// Transfer to a callee; handled interprocedurally.
    Call(Call),
    /// Intraprocedural transfer that executes nothing (e.g. exceptional
    /// routing from a throwing instruction into a handler).
    Successor,
}

/// One CFA edge.
#[derive(Clone, Debug)]
pub struct CfaEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub kind: EdgeKind,
}

impl CfaEdge {
    pub const fn is_call(&self) -> bool {
        matches!(self.kind, EdgeKind::Call(_))
    }

    pub const fn instruction(&self) -> Option<&Instruction> {
        match &self.kind {
            EdgeKind::Instruction(instr) => Some(instr),
            EdgeKind::Call(_) | EdgeKind::Successor => None,
        }
    }

    pub const fn call(&self) -> Option<&Call> {
        match &self.kind {
            EdgeKind::Call(call) => Some(call),
            EdgeKind::Instruction(_) | EdgeKind::Successor => None,
        }
    }
}

/// One exception-table entry. `start..end` is the covered bytecode offset
/// range (end exclusive); `handler` is the catch node entered on a match.
/// Entries are kept in declaration order and searched first-match-wins.
#[derive(Clone, Debug)]
pub struct ExceptionHandler {
    pub start: u32,
    pub end: u32,
    pub handler: NodeId,
}

impl ExceptionHandler {
    pub const fn covers(&self, offset: u32) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// Control flow automaton of a single method.
#[derive(Clone, Debug)]
pub struct MethodCfa {
    pub signature: MethodSignature,
    pub nodes: Vec<CfaNode>,
    pub edges: Vec<CfaEdge>,
    pub entry: NodeId,
    pub return_exit: NodeId,
    pub exception_exit: NodeId,
    /// Exception table in declaration order.
    pub exception_table: Vec<ExceptionHandler>,
    /// Size of the local variable array, in slots.
    pub max_locals: usize,
    /// Whether the method has a receiver in local slot 0.
    pub is_static: bool,
}

impl MethodCfa {
    pub fn node(&self, id: NodeId) -> Option<&CfaNode> {
        self.nodes.get(id.0 as usize)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&CfaEdge> {
        self.edges.get(id.0 as usize)
    }

    /// Edges leaving the given node, in insertion order.
    pub fn leaving_edges(&self, id: NodeId) -> impl Iterator<Item = &CfaEdge> {
        self.node(id)
            .map(|n| n.leaving.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|e| self.edge(*e))
    }

    /// Edges entering the given node, in insertion order.
    pub fn entering_edges(&self, id: NodeId) -> impl Iterator<Item = &CfaEdge> {
        self.node(id)
            .map(|n| n.entering.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|e| self.edge(*e))
    }

    /// First exception-table entry covering `offset`, in declaration order.
    pub fn handler_covering(&self, offset: u32) -> Option<&ExceptionHandler> {
        self.exception_table.iter().find(|h| h.covers(offset))
    }
}

/// All method CFAs of one analyzed program.
#[derive(Clone, Debug, Default)]
pub struct Cfa {
    methods: FxHashMap<MethodSignature, MethodCfa>,
}

impl Cfa {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, method: MethodCfa) {
        self.methods.insert(method.signature.clone(), method);
    }

    pub fn method(&self, signature: &MethodSignature) -> Option<&MethodCfa> {
        self.methods.get(signature)
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodCfa> {
        self.methods.values()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}
