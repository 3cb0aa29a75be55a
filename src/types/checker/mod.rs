//! Constraint checker for CPRL.
//!
//! A single depth-first pass over the AST. Every node checks its children
//! first and then itself; expression types are filled in as the walk
//! returns. Violations are collected and checking continues until the error
//! limit is reached.

mod declarations;
mod expressions;
mod statements;

use crate::ast::*;
use crate::config::Config;
use crate::error::{ConstraintError, ErrorCollector};
use crate::span::Span;

/// A program that passed constraint checking.
///
/// Only the checker can build one, so code generation never sees an AST
/// whose expression types have not been resolved.
#[derive(Debug, Clone)]
pub struct CheckedProgram(Program);

impl CheckedProgram {
    pub fn program(&self) -> &Program {
        &self.0
    }

    pub fn program_mut(&mut self) -> &mut Program {
        &mut self.0
    }

    pub fn into_inner(self) -> Program {
        self.0
    }
}

/// The constraint checker verifies the static semantics of CPRL programs.
pub struct ConstraintChecker {
    pub(crate) errors: ErrorCollector<ConstraintError>,
}

impl ConstraintChecker {
    pub fn new(config: &Config) -> Self {
        Self {
            errors: ErrorCollector::new(config.max_errors),
        }
    }

    /// Check a complete program.
    pub fn check(mut self, mut program: Program) -> Result<CheckedProgram, Vec<ConstraintError>> {
        self.check_decls(&program, &program.initial_decls);

        for index in 0..program.subprograms.len() {
            if self.errors.limit_reached() {
                break;
            }
            let mut statements = std::mem::take(&mut program.subprograms[index].statements);
            self.check_subprogram(&program, &program.subprograms[index], &mut statements);
            program.subprograms[index].statements = statements;
        }

        let mut statements = std::mem::take(&mut program.statements);
        self.check_stmts(&program, &mut statements);
        program.statements = statements;

        self.errors.into_result(CheckedProgram(program))
    }

    pub(crate) fn error(&mut self, message: impl Into<String>, span: Span) {
        self.errors.report(ConstraintError::new(message, span));
    }
}
