//! Incremental CFA assembly.
//!
//! The bytecode front end (or a test) adds nodes and edges, then `finish`es
//! into an immutable [`MethodCfa`]. Exit nodes are created up front so every
//! method has exactly one return exit and one exception exit.

use crate::call::Call;
use crate::graph::{
    CfaEdge, CfaNode, EdgeId, EdgeKind, ExceptionHandler, MethodCfa, NodeId, NodeKind,
};
use crate::instruction::Instruction;
use crate::types::MethodSignature;

pub struct CfaBuilder {
    signature: MethodSignature,
    nodes: Vec<CfaNode>,
    edges: Vec<CfaEdge>,
    entry: NodeId,
    return_exit: NodeId,
    exception_exit: NodeId,
    exception_table: Vec<ExceptionHandler>,
    max_locals: usize,
    is_static: bool,
}

impl CfaBuilder {
    /// Start a method CFA. Creates the entry node (offset 0) and both exit
    /// nodes; further code nodes come from [`Self::add_node`].
    pub fn new(signature: MethodSignature, is_static: bool, max_locals: usize) -> Self {
        let mut builder = Self {
            signature,
            nodes: Vec::new(),
            edges: Vec::new(),
            entry: NodeId(0),
            return_exit: NodeId(1),
            exception_exit: NodeId(2),
            exception_table: Vec::new(),
            max_locals,
            is_static,
        };
        builder.entry = builder.push_node(0, NodeKind::Code);
        builder.return_exit = builder.push_node(0, NodeKind::ReturnExit);
        builder.exception_exit = builder.push_node(0, NodeKind::ExceptionExit);
        builder
    }

    pub const fn entry(&self) -> NodeId {
        self.entry
    }

    pub const fn return_exit(&self) -> NodeId {
        self.return_exit
    }

    pub const fn exception_exit(&self) -> NodeId {
        self.exception_exit
    }

    /// Add a code node at the given bytecode offset.
    pub fn add_node(&mut self, offset: u32) -> NodeId {
        self.push_node(offset, NodeKind::Code)
    }

    /// Add a catch node for the exception-table entry declared next.
    pub fn add_catch_node(&mut self, offset: u32) -> NodeId {
        let handler = self.exception_table.len();
        self.push_node(offset, NodeKind::Catch { handler })
    }

    /// Declare an exception-table entry covering `start..end` (exclusive)
    /// that routes to `handler`. Declaration order is search order.
    pub fn add_handler(&mut self, start: u32, end: u32, handler: NodeId) {
        self.exception_table.push(ExceptionHandler {
            start,
            end,
            handler,
        });
    }

    pub fn add_instruction_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        instruction: Instruction,
    ) -> EdgeId {
        self.push_edge(source, target, EdgeKind::Instruction(instruction))
    }

    pub fn add_call_edge(&mut self, source: NodeId, target: NodeId, call: Call) -> EdgeId {
        self.push_edge(source, target, EdgeKind::Call(call))
    }

    pub fn add_successor_edge(&mut self, source: NodeId, target: NodeId) -> EdgeId {
        self.push_edge(source, target, EdgeKind::Successor)
    }

    pub fn finish(self) -> MethodCfa {
        MethodCfa {
            signature: self.signature,
            nodes: self.nodes,
            edges: self.edges,
            entry: self.entry,
            return_exit: self.return_exit,
            exception_exit: self.exception_exit,
            exception_table: self.exception_table,
            max_locals: self.max_locals,
            is_static: self.is_static,
        }
    }

    fn push_node(&mut self, offset: u32, kind: NodeKind) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(CfaNode {
            id,
            offset,
            kind,
            leaving: Vec::new(),
            entering: Vec::new(),
        });
        id
    }

    fn push_edge(&mut self, source: NodeId, target: NodeId, kind: EdgeKind) -> EdgeId {
        let id = EdgeId(u32::try_from(self.edges.len()).unwrap_or(u32::MAX));
        self.edges.push(CfaEdge {
            id,
            source,
            target,
            kind,
        });
        self.nodes[source.0 as usize].leaving.push(id);
        self.nodes[target.0 as usize].entering.push(id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JvmType, MethodDescriptor};

    fn sig() -> MethodSignature {
        MethodSignature::new(
            "A",
            "m",
            MethodDescriptor::new(vec![JvmType::Int], JvmType::Int),
        )
    }

    #[test]
    fn test_straight_line_build() {
        let mut b = CfaBuilder::new(sig(), true, 1);
        let n1 = b.add_node(1);
        b.add_instruction_edge(b.entry(), n1, Instruction::Load { index: 0, width: 1 });
        b.add_instruction_edge(n1, b.return_exit(), Instruction::Return { width: 1 });
        let cfa = b.finish();

        assert_eq!(cfa.leaving_edges(cfa.entry).count(), 1);
        let ret = cfa.entering_edges(cfa.return_exit).next().unwrap();
        assert!(ret.instruction().unwrap().is_return());
        assert!(cfa.node(cfa.return_exit).unwrap().is_return_exit());
    }

    #[test]
    fn test_handler_lookup_declaration_order() {
        let mut b = CfaBuilder::new(sig(), true, 1);
        let c1 = b.add_catch_node(20);
        let c2 = b.add_catch_node(30);
        b.add_handler(0, 10, c1);
        b.add_handler(0, 40, c2);
        let cfa = b.finish();

        // Both entries cover offset 5; the first declared wins.
        assert_eq!(cfa.handler_covering(5).unwrap().handler, c1);
        assert_eq!(cfa.handler_covering(15).unwrap().handler, c2);
        assert!(cfa.handler_covering(40).is_none());
    }
}
