//! Statement checks.

use crate::ast::*;
use crate::types::Type;

use super::ConstraintChecker;

impl ConstraintChecker {
    pub(crate) fn check_stmts(&mut self, program: &Program, statements: &mut [Stmt]) {
        for stmt in statements {
            if self.errors.limit_reached() {
                return;
            }
            self.check_stmt(program, stmt);
        }
    }

    pub(crate) fn check_stmt(&mut self, program: &Program, stmt: &mut Stmt) {
        match &mut stmt.kind {
            StmtKind::Assignment { variable, expr } => {
                self.check_variable(program, variable);
                self.check_expr(program, expr);
                if !variable.ty.matches(&expr.ty) {
                    self.error("Type mismatch for assignment.", stmt.span);
                }
            }

            StmtKind::If {
                condition,
                then_stmts,
                elsif_parts,
                else_stmts,
            } => {
                self.check_condition(program, condition, "An \"if\" condition");
                self.check_stmts(program, then_stmts);
                for part in elsif_parts {
                    self.check_condition(program, &mut part.condition, "An \"elsif\" condition");
                    self.check_stmts(program, &mut part.statements);
                }
                self.check_stmts(program, else_stmts);
            }

            StmtKind::Loop { while_expr, body } => {
                if let Some(condition) = while_expr {
                    self.check_condition(program, condition, "A \"while\" condition");
                }
                self.check_stmts(program, body);
            }

            StmtKind::Exit { when_expr } => {
                if let Some(condition) = when_expr {
                    self.check_condition(program, condition, "An \"exit when\" condition");
                }
            }

            StmtKind::Read(variable) => {
                self.check_variable(program, variable);
                if !matches!(variable.ty, Type::Integer | Type::Char | Type::Unknown) {
                    self.error(
                        "Variable for read must have type Integer or Char.",
                        variable.span,
                    );
                }
            }

            StmtKind::Write(exprs) | StmtKind::Writeln(exprs) => {
                for expr in exprs {
                    self.check_expr(program, expr);
                    if !(expr.ty.is_scalar() || matches!(expr.ty, Type::String | Type::Unknown)) {
                        self.error("Invalid type for output.", expr.span);
                    }
                }
            }

            StmtKind::ProcedureCall {
                subprogram, args, ..
            } => {
                self.check_call(program, *subprogram, args, stmt.span);
            }

            StmtKind::Return { subprogram, expr } => {
                if let Some(expr) = expr.as_mut() {
                    self.check_expr(program, expr);
                }

                let Some(id) = subprogram else {
                    self.error(
                        "Return statement is not nested within a subprogram.",
                        stmt.span,
                    );
                    return;
                };

                let sub = program.subprogram(*id);
                match (sub.kind, expr) {
                    (SubprogramKind::Function, None) => self.error(
                        "Return statement for a function must return a value.",
                        stmt.span,
                    ),
                    (SubprogramKind::Function, Some(expr)) => {
                        let return_type = &program.decl(sub.decl).ty;
                        if !return_type.matches(&expr.ty) {
                            self.error(
                                "Return expression type does not match function return type.",
                                expr.span,
                            );
                        }
                    }
                    (SubprogramKind::Procedure, Some(expr)) => {
                        self.error("A procedure cannot return a value.", expr.span)
                    }
                    (SubprogramKind::Procedure, None) => {}
                }
            }
        }
    }

    /// Check a branch condition; `what` names it in the error message.
    fn check_condition(&mut self, program: &Program, condition: &mut Expr, what: &str) {
        self.check_expr(program, condition);
        if !condition.ty.matches(&Type::Boolean) {
            self.error(
                format!("{} should have type Boolean.", what),
                condition.span,
            );
        }
    }
}
