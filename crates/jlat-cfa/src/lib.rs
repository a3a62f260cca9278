//! Control flow automaton (CFA) and instruction model for JVM bytecode analysis.
//!
//! This crate provides the program model the analysis engine consumes: method
//! signatures with type slot widths, a closed union of instruction categories,
//! call descriptors, and per-method node/edge graphs with exception tables.
//! Building these structures from class files is a front-end concern and lives
//! elsewhere; the [`CfaBuilder`] is the assembly surface drivers and tests use.

mod builder;
mod call;
mod graph;
mod instruction;
mod types;

pub use builder::*;
pub use call::*;
pub use graph::*;
pub use instruction::*;
pub use types::*;
