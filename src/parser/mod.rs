//! Recursive-descent parser for CPRL.
//!
//! The parser builds the scope table as it goes, so every identifier in the
//! resulting AST is already resolved to its declaration.

mod core;
mod declarations;
mod expressions;
mod statements;

#[cfg(test)]
mod tests;

pub use self::core::{ParseResult, Parser};
