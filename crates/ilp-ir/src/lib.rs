//! Block descriptor types for instruction-level parallelism analysis.
//!
//! This crate provides pure data types with no analysis logic. Hosts build
//! `Block`s from whatever decoder they use; `ilp-analysis` consumes them.

mod block;
mod flags;
mod instr;
mod operand;
mod register;

pub use block::*;
pub use flags::*;
pub use instr::*;
pub use operand::*;
pub use register::*;
