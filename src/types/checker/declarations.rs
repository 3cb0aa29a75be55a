//! Declaration checks.

use crate::ast::*;
use crate::span::Span;

use super::ConstraintChecker;

impl ConstraintChecker {
    pub(crate) fn check_decls(&mut self, program: &Program, decls: &[DeclId]) {
        for &id in decls {
            let decl = program.decl(id);
            match &decl.kind {
                DeclKind::Const { literal } => {
                    self.check_int_literal(literal, decl.span);
                }
                DeclKind::ArrayType { num_elements } => {
                    if let Literal::Integer(_) = num_elements {
                        match num_elements.int_value() {
                            Some(n) if n > 0 => {}
                            Some(_) => {
                                self.error("Invalid value for number of elements.", decl.span)
                            }
                            None => self.check_int_literal(num_elements, decl.span),
                        }
                    }
                }
                DeclKind::Var { .. } | DeclKind::Param { .. } | DeclKind::Subprogram { .. } => {}
            }
        }
    }

    /// Report an integer literal that does not fit in 32 bits.
    pub(crate) fn check_int_literal(&mut self, literal: &Literal, span: Span) {
        if let Literal::Integer(text) = literal {
            if literal.int_value().is_none() {
                self.error(
                    format!(
                        "The number \"{}\" cannot be converted to an integer in CPRL.",
                        text
                    ),
                    span,
                );
            }
        }
    }

    pub(crate) fn check_subprogram(
        &mut self,
        program: &Program,
        subprogram: &SubprogramDecl,
        statements: &mut [Stmt],
    ) {
        self.check_decls(program, &subprogram.initial_decls);
        self.check_stmts(program, statements);

        if subprogram.is_function() && !contains_return(statements) {
            self.error(
                "Function must have at least one return statement.",
                program.decl(subprogram.decl).span,
            );
        }
    }
}

fn contains_return(statements: &[Stmt]) -> bool {
    statements.iter().any(|stmt| match &stmt.kind {
        StmtKind::Return { .. } => true,
        StmtKind::If {
            then_stmts,
            elsif_parts,
            else_stmts,
            ..
        } => {
            contains_return(then_stmts)
                || elsif_parts.iter().any(|part| contains_return(&part.statements))
                || contains_return(else_stmts)
        }
        StmtKind::Loop { body, .. } => contains_return(body),
        _ => false,
    })
}
