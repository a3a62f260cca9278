//! Composite lattice containers: list, map, and operand-stack lifts.

mod list;
mod map;
mod stack;

pub use list::*;
pub use map::*;
pub use stack::*;
