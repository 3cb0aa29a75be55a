//! Code generation: CPRL AST to symbolic assembly text.
//!
//! The generator walks a [`CheckedProgram`](crate::types::checker::CheckedProgram)
//! and writes one instruction per line. Labels are flush left with a trailing
//! colon; instructions are indented three spaces.

mod compiler;
mod compiler_exprs;
mod compiler_stmts;

pub use compiler::{assign_addresses, param_length, CodeGenerator, GenResult};
