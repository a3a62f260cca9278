//! Block abstraction memoization (BAM): interprocedural analysis by
//! per-callee summarization.
//!
//! A call edge is handled by *reducing* the caller state into a callee-local
//! entry state, running (or reusing from the cache) the callee's
//! intraprocedural fixpoint, and *expanding* each recorded exit state back
//! into the caller's context: normal returns continue at the call's
//! intraprocedural successor, exceptional exits route through the caller's
//! exception table.

mod cache;
mod cpa;
mod expand;
mod rebuild;
mod reduce;
mod transfer;

pub use cache::*;
pub use cpa::*;
pub use expand::*;
pub use rebuild::*;
pub use reduce::*;
pub use transfer::*;
