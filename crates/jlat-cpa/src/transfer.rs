//! Transfer relation seam between the worklist algorithm and instruction
//! semantics.

use jlat_cfa::{CfaEdge, MethodCfa};

use crate::domain::ProgramState;
use crate::error::Result;

/// Computes the abstract successor states of one state along one CFA edge.
///
/// Takes `&mut self` so interprocedural implementations can maintain their
/// summary cache while the intraprocedural loop runs.
pub trait TransferRelation {
    type State: ProgramState;

    fn successors(
        &mut self,
        state: &Self::State,
        edge: &CfaEdge,
        cfa: &MethodCfa,
    ) -> Result<Vec<Self::State>>;
}
