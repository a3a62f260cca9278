//! Engine error taxonomy.
//!
//! Three families, reported per analyzed unit rather than per run:
//! structural errors (a CFA that violates the engine's assumptions; fatal,
//! never recovered locally), resource exhaustion (the periodic complexity
//! check tripped; the driver marks the unit unanalyzed and continues), and
//! value-shape errors (a simulated value of the wrong category reached an
//! instruction; carries diagnostics including recent instruction offsets).

use std::collections::VecDeque;

use thiserror::Error;

use jlat_cfa::{MethodSignature, NodeId};

/// Bounded ring of recently simulated instruction offsets, attached to
/// value-shape errors for diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OffsetHistory {
    offsets: VecDeque<u32>,
}

impl OffsetHistory {
    const CAPACITY: usize = 16;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, offset: u32) {
        if self.offsets.len() == Self::CAPACITY {
            self.offsets.pop_front();
        }
        self.offsets.push_back(offset);
    }

    /// Recorded offsets, oldest first.
    pub fn offsets(&self) -> impl Iterator<Item = u32> + '_ {
        self.offsets.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// Analysis engine errors.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("no CFA for method {0}")]
    UnknownMethod(MethodSignature),
    #[error("node {node:?} not present in the CFA of {signature}")]
    UnknownNode {
        signature: MethodSignature,
        node: NodeId,
    },
    #[error("edge entering the return exit of {signature} is not a return instruction")]
    NonReturnExitEdge { signature: MethodSignature },
    #[error(
        "catch node {node:?} of exception-table entry {handler} is missing from the CFA of {signature}"
    )]
    MissingCatchNode {
        signature: MethodSignature,
        handler: usize,
        node: NodeId,
    },
    #[error("callee {signature} exited at {node:?}, which is neither a return nor an exception exit")]
    InvalidExitNode {
        signature: MethodSignature,
        node: NodeId,
    },
    #[error("call site {signature}@{offset} has no unique intraprocedural successor edge")]
    AmbiguousCallSuccessor {
        signature: MethodSignature,
        offset: u32,
    },
    #[error(
        "excessive complexity in {signature}: {processed} states processed, {reached} reached (limits {max_processed}/{max_reached})"
    )]
    ExcessiveComplexity {
        signature: MethodSignature,
        processed: usize,
        reached: usize,
        max_processed: usize,
        max_reached: usize,
    },
    #[error("operand stack underflow at offset {offset}: need {needed} slots, have {available}")]
    StackUnderflow {
        offset: u32,
        needed: usize,
        available: usize,
        history: OffsetHistory,
    },
    #[error("expected a category-{expected} value at offset {offset}")]
    CategoryMismatch {
        offset: u32,
        expected: u8,
        history: OffsetHistory,
    },
    #[error("local variable slot {index} read before any write at offset {offset}")]
    MissingLocal {
        offset: u32,
        index: usize,
        history: OffsetHistory,
    },
}

impl AnalysisError {
    /// Stable machine-readable identifier, independent of display wording.
    pub const fn id(&self) -> &'static str {
        match self {
            Self::UnknownMethod(_) => "UNKNOWN_METHOD",
            Self::UnknownNode { .. } => "UNKNOWN_NODE",
            Self::NonReturnExitEdge { .. } => "NON_RETURN_EXIT_EDGE",
            Self::MissingCatchNode { .. } => "MISSING_CATCH_NODE",
            Self::InvalidExitNode { .. } => "INVALID_EXIT_NODE",
            Self::AmbiguousCallSuccessor { .. } => "AMBIGUOUS_CALL_SUCCESSOR",
            Self::ExcessiveComplexity { .. } => "EXCESSIVE_COMPLEXITY",
            Self::StackUnderflow { .. } => "STACK_UNDERFLOW",
            Self::CategoryMismatch { .. } => "CATEGORY_MISMATCH",
            Self::MissingLocal { .. } => "MISSING_LOCAL",
        }
    }

    /// Whether the driver should treat this as "unit too complex" rather
    /// than a programmer error.
    pub const fn is_resource_exhaustion(&self) -> bool {
        matches!(self, Self::ExcessiveComplexity { .. })
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
