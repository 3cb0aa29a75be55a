//! Type system module for CPRL: type descriptors, the scope table, and the
//! semantic checker.

pub mod checker;
pub mod environment;
pub mod type_repr;

pub use checker::{CheckedProgram, ConstraintChecker};
pub use environment::{DuplicateIdentifier, ScopeLevel, ScopeTable};
pub use type_repr::{ArrayType, Type};
