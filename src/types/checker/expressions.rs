//! Expression checks. Each check resolves the node's type.

use crate::ast::*;
use crate::span::Span;
use crate::types::Type;

use super::ConstraintChecker;

impl ConstraintChecker {
    pub(crate) fn check_expr(&mut self, program: &Program, expr: &mut Expr) {
        match &mut expr.kind {
            ExprKind::ConstValue { literal, decl } => {
                // Named constants were checked at their declaration.
                if decl.is_none() {
                    self.check_int_literal(literal, expr.span);
                }
                expr.ty = literal.ty();
            }

            ExprKind::NamedValue(variable) => {
                self.check_variable(program, variable);
                expr.ty = variable.ty.clone();
            }

            ExprKind::FunctionCall {
                function,
                subprogram,
                args,
            } => {
                self.check_call(program, *subprogram, args, expr.span);
                expr.ty = program.decl(*function).ty.clone();
            }

            ExprKind::Unary { operator, operand } => {
                self.check_expr(program, operand);
                match operator {
                    UnaryOp::Plus | UnaryOp::Negate => {
                        if !operand.ty.matches(&Type::Integer) {
                            self.error(
                                "Expression following unary sign should have type Integer.",
                                operand.span,
                            );
                        }
                        expr.ty = Type::Integer;
                    }
                    UnaryOp::Not => {
                        if !operand.ty.matches(&Type::Boolean) {
                            self.error(
                                "Expression following \"not\" must have type Boolean.",
                                operand.span,
                            );
                        }
                        expr.ty = Type::Boolean;
                    }
                }
            }

            ExprKind::Binary {
                left,
                operator,
                right,
            } => {
                self.check_expr(program, left);
                self.check_expr(program, right);

                match operator.class() {
                    OperatorClass::Adding | OperatorClass::Multiplying => {
                        self.check_operands(
                            left,
                            right,
                            &Type::Integer,
                            "for expression should have type Integer.",
                        );
                        expr.ty = Type::Integer;
                    }
                    OperatorClass::Logical => {
                        self.check_operands(
                            left,
                            right,
                            &Type::Boolean,
                            "for a logical expression should have type Boolean.",
                        );
                        expr.ty = Type::Boolean;
                    }
                    OperatorClass::Relational => {
                        let scalar = |ty: &Type| ty.is_scalar() || *ty == Type::Unknown;
                        if !scalar(&left.ty) || !scalar(&right.ty) || !left.ty.matches(&right.ty) {
                            self.error("Type mismatch for relational expression.", expr.span);
                        }
                        expr.ty = Type::Boolean;
                    }
                }
            }
        }
    }

    fn check_operands(&mut self, left: &Expr, right: &Expr, expected: &Type, message: &str) {
        if !left.ty.matches(expected) {
            self.error(format!("Left operand {}", message), left.span);
        }
        if !right.ty.matches(expected) {
            self.error(format!("Right operand {}", message), right.span);
        }
    }

    /// Check index expressions and narrow the variable's type by one array
    /// level per index.
    pub(crate) fn check_variable(&mut self, program: &Program, variable: &mut Variable) {
        let mut ty = program.decl(variable.decl).ty.clone();

        for index in &mut variable.index_exprs {
            self.check_expr(program, index);
            if !index.ty.matches(&Type::Integer) {
                self.error("Index expression must have type Integer.", index.span);
            }

            ty = match ty.element_type() {
                Some(element) => element.clone(),
                None => {
                    if ty != Type::Unknown {
                        self.error("Index expression not allowed; not an array.", variable.span);
                    }
                    Type::Unknown
                }
            };
        }

        variable.ty = ty;
    }

    /// Check actual parameters against a subprogram's formal parameters.
    pub(crate) fn check_call(
        &mut self,
        program: &Program,
        subprogram: SubprogramId,
        args: &mut [Expr],
        span: Span,
    ) {
        for arg in args.iter_mut() {
            self.check_expr(program, arg);
        }

        let params = &program.subprogram(subprogram).params;
        if params.len() != args.len() {
            self.error("Incorrect number of actual parameters.", span);
            return;
        }

        for (&param, arg) in params.iter().zip(args.iter()) {
            let param = program.decl(param);
            if !param.ty.matches(&arg.ty) {
                self.error("Parameter type mismatch.", arg.span);
            } else if param.is_var_param() && arg.as_variable().is_none() {
                self.error(
                    "Expression for a var parameter must be a variable.",
                    arg.span,
                );
            }
        }
    }
}
