//! Configurable program analysis (CPA) core.
//!
//! A CPA is a fixpoint computation over a method's control flow automaton,
//! parameterized by a lattice-valued abstract domain, a transfer relation,
//! and merge/stop/precision policies. This crate provides the generic
//! machinery: the lattice traits, composite state containers, the waitlist
//! and reached set, the pluggable operators, and the worklist algorithm with
//! its complexity guards. Concrete instruction semantics live in the JVM
//! layer (`jlat`).

mod algorithm;
mod domain;
mod error;
mod merge;
mod precision;
mod reached;
mod states;
mod stop;
mod transfer;
mod waitlist;

pub use algorithm::*;
pub use domain::*;
pub use error::*;
pub use merge::*;
pub use precision::*;
pub use reached::*;
pub use states::*;
pub use stop::*;
pub use transfer::*;
pub use waitlist::*;
