//! JVM abstract interpretation on top of the CPA core.
//!
//! This crate supplies what the generic engine in `jlat-cpa` leaves open for
//! stack-machine bytecode: the composite JVM abstract state (location + frame
//! + heap + static fields), the per-instruction transfer relation with its
//! pluggable value semantics, and the BAM (block abstraction memoization)
//! interprocedural layer: reduce/expand/rebuild operators, the summary
//! cache, and the run-construction template a concrete analysis fills in.
//!
//! An analysis author implements [`AbstractValue`] for their lattice content,
//! overrides the [`JvmSemantics`] hooks their domain cares about, and gets a
//! sound interprocedural fixpoint for free.

mod bam;
mod driver;
mod semantics;
mod state;
mod transfer;
mod value;

pub use bam::*;
pub use driver::*;
pub use semantics::*;
pub use state::*;
pub use transfer::*;
pub use value::*;
