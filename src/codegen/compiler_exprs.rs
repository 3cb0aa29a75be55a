//! Expression code generation.
//!
//! Every expression leaves its value on top of the stack. Boolean
//! expressions can also be emitted in branch form with [`emit_branch`],
//! which jumps on the condition without materializing a value.
//!
//! [`emit_branch`]: CodeGenerator::emit_branch

use crate::ast::*;
use crate::bytecode::constants::{BYTES_PER_INTEGER, FALSE, TRUE};
use crate::bytecode::OpCode;
use crate::error::CodeGenError;
use crate::types::Type;

use super::compiler::{CodeGenerator, GenResult};

impl CodeGenerator {
    pub(crate) fn emit_expr(&mut self, program: &Program, expr: &Expr) -> GenResult<()> {
        match &expr.kind {
            ExprKind::ConstValue { literal, .. } => self.emit_const(literal, &expr.ty, expr)?,

            ExprKind::NamedValue(variable) => {
                self.emit_variable(program, variable)?;
                self.emit_load(&variable.ty, variable.span)?;
            }

            ExprKind::FunctionCall {
                function,
                subprogram,
                args,
            } => {
                // space for the return value
                self.emit_op_arg(OpCode::Alloc, program.decl(*function).ty.size());
                let subprogram = program.subprogram(*subprogram);
                self.emit_actual_params(program, subprogram, args)?;
                self.emit_op_arg(OpCode::Call, &subprogram.label);
            }

            ExprKind::Unary { operator, operand } => {
                self.emit_expr(program, operand)?;
                match operator {
                    UnaryOp::Plus => {}
                    UnaryOp::Negate => self.emit_op(OpCode::Neg),
                    UnaryOp::Not => self.emit_op(OpCode::Not),
                }
            }

            ExprKind::Binary {
                left,
                operator,
                right,
            } => match operator.class() {
                OperatorClass::Adding | OperatorClass::Multiplying => {
                    self.emit_expr(program, left)?;
                    self.emit_expr(program, right)?;
                    self.emit_op(arithmetic_op(*operator));
                }
                OperatorClass::Logical => self.emit_logical(program, left, *operator, right)?,
                OperatorClass::Relational => {
                    let l1 = self.new_label();
                    let l2 = self.new_label();

                    self.emit_branch(program, expr, false, &l1)?;
                    self.emit_op_arg(OpCode::Ldcb, TRUE);
                    self.emit_op_arg(OpCode::Br, &l2);
                    self.emit_label(&l1);
                    self.emit_op_arg(OpCode::Ldcb, FALSE);
                    self.emit_label(&l2);
                }
            },
        }

        Ok(())
    }

    /// Emit a branch to `label` taken when `expr` evaluates to `condition`.
    pub(crate) fn emit_branch(
        &mut self,
        program: &Program,
        expr: &Expr,
        condition: bool,
        label: &str,
    ) -> GenResult<()> {
        if !matches!(expr.ty, Type::Boolean) {
            return Err(CodeGenError::new(
                format!("Branch condition has type {}, not Boolean.", expr.ty),
                expr.span,
            ));
        }

        match &expr.kind {
            ExprKind::Binary {
                left,
                operator,
                right,
            } if operator.is_relational() => {
                self.emit_operand_padded(program, left)?;
                self.emit_operand_padded(program, right)?;
                self.emit_op(OpCode::Cmp);
                self.emit_op_arg(relational_branch(*operator, condition), label);
            }

            ExprKind::Unary {
                operator: UnaryOp::Not,
                operand,
            } => self.emit_branch(program, operand, !condition, label)?,

            _ => {
                self.emit_expr(program, expr)?;
                let op = if condition { OpCode::Bnz } else { OpCode::Bz };
                self.emit_op_arg(op, label);
            }
        }

        Ok(())
    }

    /// `CMP` works on integers, so narrower operands get zero bytes pushed
    /// ahead of them.
    fn emit_operand_padded(&mut self, program: &Program, operand: &Expr) -> GenResult<()> {
        for _ in 0..(BYTES_PER_INTEGER - operand.ty.size()) {
            self.emit_op_arg(OpCode::Ldcb, 0);
        }
        self.emit_expr(program, operand)
    }

    /// Short-circuit evaluation of `and`/`or`.
    fn emit_logical(
        &mut self,
        program: &Program,
        left: &Expr,
        operator: BinaryOp,
        right: &Expr,
    ) -> GenResult<()> {
        let l1 = self.new_label();
        let l2 = self.new_label();

        self.emit_expr(program, left)?;
        match operator {
            BinaryOp::And => {
                // true: go evaluate the right operand; false is the result
                self.emit_op_arg(OpCode::Bnz, &l1);
                self.emit_op_arg(OpCode::Ldcb, FALSE);
            }
            BinaryOp::Or => {
                self.emit_op_arg(OpCode::Bz, &l1);
                self.emit_op_arg(OpCode::Ldcb, TRUE);
            }
            other => {
                return Err(CodeGenError::new(
                    format!("Invalid logical operator {}.", other),
                    left.span.merge(&right.span),
                ))
            }
        }
        self.emit_op_arg(OpCode::Br, &l2);
        self.emit_label(&l1);
        self.emit_expr(program, right)?;
        self.emit_label(&l2);

        Ok(())
    }

    fn emit_const(&mut self, literal: &Literal, ty: &Type, expr: &Expr) -> GenResult<()> {
        match ty {
            Type::Integer => {
                let value = literal.int_value().ok_or_else(|| {
                    CodeGenError::new(format!("Invalid integer constant {}.", literal.text()), expr.span)
                })?;
                self.emit_op_arg(OpCode::LdcInt, value);
            }
            Type::Boolean => {
                let value = if literal.int_value() == Some(1) { TRUE } else { FALSE };
                self.emit_op_arg(OpCode::Ldcb, value);
            }
            Type::Char => self.emit_op_arg(OpCode::Ldcch, literal.text()),
            Type::String => self.emit_op_arg(OpCode::LdcStr, literal.text()),
            _ => {
                return Err(CodeGenError::new(
                    format!("Invalid type {} for constant value.", ty),
                    expr.span,
                ))
            }
        }
        Ok(())
    }

    /// Leave the address of a variable on top of the stack.
    pub(crate) fn emit_variable(&mut self, program: &Program, variable: &Variable) -> GenResult<()> {
        let decl = program.decl(variable.decl);

        if decl.is_var_param() {
            // the parameter slot holds the address of the actual
            self.emit_op_arg(OpCode::LdlAddr, decl.rel_addr());
            self.emit_op(OpCode::LoadW);
        } else if decl.scope_level == crate::types::ScopeLevel::Program {
            self.emit_op_arg(OpCode::LdgAddr, decl.rel_addr());
        } else {
            self.emit_op_arg(OpCode::LdlAddr, decl.rel_addr());
        }

        let mut ty = decl.ty.clone();
        for index in &variable.index_exprs {
            let element = ty.element_type().cloned().ok_or_else(|| {
                CodeGenError::new(format!("Cannot index a value of type {}.", ty), index.span)
            })?;

            self.emit_expr(program, index)?;
            let size = element.size();
            if size != 1 {
                self.emit_op_arg(OpCode::LdcInt, size);
                self.emit_op(OpCode::Mul);
            }
            self.emit_op(OpCode::Add);
            ty = element;
        }

        Ok(())
    }
}

fn arithmetic_op(operator: BinaryOp) -> OpCode {
    match operator {
        BinaryOp::Add => OpCode::Add,
        BinaryOp::Subtract => OpCode::Sub,
        BinaryOp::Multiply => OpCode::Mul,
        BinaryOp::Divide => OpCode::Div,
        _ => OpCode::Mod,
    }
}

/// Branch opcode for a relational operator, taken when the comparison
/// result equals `condition`.
fn relational_branch(operator: BinaryOp, condition: bool) -> OpCode {
    let (when_true, when_false) = match operator {
        BinaryOp::Equal => (OpCode::Bz, OpCode::Bnz),
        BinaryOp::NotEqual => (OpCode::Bnz, OpCode::Bz),
        BinaryOp::Less => (OpCode::Bl, OpCode::Bge),
        BinaryOp::LessEqual => (OpCode::Ble, OpCode::Bg),
        BinaryOp::Greater => (OpCode::Bg, OpCode::Ble),
        _ => (OpCode::Bge, OpCode::Bl),
    };
    if condition {
        when_true
    } else {
        when_false
    }
}

#[cfg(test)]
mod tests {
    use crate::codegen::CodeGenerator;
    use crate::config::Config;
    use crate::lexer::Scanner;
    use crate::parser::Parser;
    use crate::types::ConstraintChecker;
    use pretty_assertions::assert_eq;

    fn generate(source: &str) -> String {
        let config = Config::default();
        let tokens = Scanner::new(source).scan_tokens().unwrap();
        let program = Parser::new(tokens, &config).parse().unwrap();
        let checked = ConstraintChecker::new(&config).check(program).unwrap();
        CodeGenerator::new().generate(checked).unwrap()
    }

    fn lines(text: &[&str]) -> String {
        let mut out = text.join("\n");
        out.push('\n');
        out
    }

    #[test]
    fn test_short_circuit_and() {
        let source = r#"
            var b : Boolean;
            var x : Integer;
            begin
                b := x <> 0 and (10 / x > 1);
            end.
        "#;
        assert_eq!(
            generate(source),
            lines(&[
                "   PROGRAM 5",
                "   LDGADDR 0",
                "   LDGADDR 1",
                "   LOADW",
                "   LDCINT 0",
                "   CMP",
                "   BZ L3",
                "   LDCB 1",
                "   BR L4",
                "L3:",
                "   LDCB 0",
                "L4:",
                "   BNZ L1",
                "   LDCB 0",
                "   BR L2",
                "L1:",
                "   LDCINT 10",
                "   LDGADDR 1",
                "   LOADW",
                "   DIV",
                "   LDCINT 1",
                "   CMP",
                "   BLE L5",
                "   LDCB 1",
                "   BR L6",
                "L5:",
                "   LDCB 0",
                "L6:",
                "L2:",
                "   STOREB",
                "   HALT",
            ])
        );
    }

    #[test]
    fn test_or_shape() {
        let source = "var a, b : Boolean; begin a := a or b; end.";
        assert_eq!(
            generate(source),
            lines(&[
                "   PROGRAM 2",
                "   LDGADDR 0",
                "   LDGADDR 0",
                "   LOADB",
                "   BZ L1",
                "   LDCB 1",
                "   BR L2",
                "L1:",
                "   LDGADDR 1",
                "   LOADB",
                "L2:",
                "   STOREB",
                "   HALT",
            ])
        );
    }

    #[test]
    fn test_false_path_of_and_has_no_call() {
        let source = r#"
            var b : Boolean;
            function f return Boolean is
            begin
                return true;
            end f;
            begin
                b := false and f;
            end.
        "#;
        let asm = generate(source);
        let lines: Vec<&str> = asm.lines().collect();

        let bnz = lines.iter().position(|l| l.starts_with("   BNZ")).unwrap();
        let target = lines[bnz].trim_start_matches("   BNZ ").to_string();
        let target_line = lines
            .iter()
            .position(|l| *l == format!("{}:", target))
            .unwrap();

        assert!(lines[bnz..target_line].iter().all(|l| !l.contains("CALL")));
        assert!(lines[target_line..].iter().any(|l| l.contains("CALL")));
    }

    #[test]
    fn test_calls_only_on_right_operand_paths() {
        let source = r#"
            var count : Integer;
            var b : Boolean;
            function f(flag : Boolean) return Boolean is
            begin
                count := count + 1;
                return flag;
            end f;
            begin
                b := false and f(true);
                b := true or f(true);
            end.
        "#;
        let asm = generate(source);
        let lines: Vec<&str> = asm.lines().collect();
        let at = |text: &str| lines.iter().position(|l| *l == text).unwrap();

        // f is L1 and the main body L2; `and` uses L3/L4, `or` uses L5/L6
        let calls: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, l)| **l == "   CALL L1")
            .map(|(i, _)| i)
            .collect();
        assert_eq!(calls.len(), 2);

        assert_eq!(lines[at("   BNZ L3") + 1], "   LDCB 0");
        assert!(at("   BNZ L3") < at("L3:"));
        assert!(at("L3:") < calls[0] && calls[0] < at("L4:"));

        assert_eq!(lines[at("   BZ L5") + 1], "   LDCB 1");
        assert!(at("   BZ L5") < at("L5:"));
        assert!(at("L5:") < calls[1] && calls[1] < at("L6:"));
    }

    #[test]
    fn test_relational_padding() {
        let source = "var b : Boolean; var c : Char; begin b := c < 'z'; b := b = true; end.";
        assert_eq!(
            generate(source),
            lines(&[
                "   PROGRAM 3",
                "   LDGADDR 0",
                "   LDCB 0",
                "   LDCB 0",
                "   LDGADDR 1",
                "   LOAD2B",
                "   LDCB 0",
                "   LDCB 0",
                "   LDCCH 'z'",
                "   CMP",
                "   BGE L1",
                "   LDCB 1",
                "   BR L2",
                "L1:",
                "   LDCB 0",
                "L2:",
                "   STOREB",
                "   LDGADDR 0",
                "   LDCB 0",
                "   LDCB 0",
                "   LDCB 0",
                "   LDGADDR 0",
                "   LOADB",
                "   LDCB 0",
                "   LDCB 0",
                "   LDCB 0",
                "   LDCB 1",
                "   CMP",
                "   BNZ L3",
                "   LDCB 1",
                "   BR L4",
                "L3:",
                "   LDCB 0",
                "L4:",
                "   STOREB",
                "   HALT",
            ])
        );
    }

    #[test]
    fn test_not_inverts_branch() {
        let source = r#"
            var x : Integer;
            begin
                if not (x > 0) then
                    write x;
                end if;
            end.
        "#;
        let asm = generate(source);
        assert!(asm.contains("   CMP\n   BG L1\n"));
        assert!(!asm.contains("NOT"));
    }

    #[test]
    fn test_not_value() {
        let source = "var b : Boolean; begin b := not b; end.";
        assert_eq!(
            generate(source),
            lines(&[
                "   PROGRAM 1",
                "   LDGADDR 0",
                "   LDGADDR 0",
                "   LOADB",
                "   NOT",
                "   STOREB",
                "   HALT",
            ])
        );
    }

    #[test]
    fn test_negation_and_arithmetic() {
        let source = "var x : Integer; begin x := -x mod 3 + 7 / 2 - 1; end.";
        assert_eq!(
            generate(source),
            lines(&[
                "   PROGRAM 4",
                "   LDGADDR 0",
                "   LDGADDR 0",
                "   LOADW",
                "   LDCINT 3",
                "   MOD",
                "   NEG",
                "   LDCINT 7",
                "   LDCINT 2",
                "   DIV",
                "   ADD",
                "   LDCINT 1",
                "   SUB",
                "   STOREW",
                "   HALT",
            ])
        );
    }

    #[test]
    fn test_array_indexing() {
        let source = r#"
            type Row = array[3] of Integer;
            type Grid = array[2] of Row;
            type Flags = array[4] of Boolean;
            var g : Grid;
            var f : Flags;
            var i : Integer;
            begin
                g[1][i] := 5;
                f[2] := true;
                write g[1][2];
            end.
        "#;
        assert_eq!(
            generate(source),
            lines(&[
                "   PROGRAM 32",
                "   LDGADDR 0",
                "   LDCINT 1",
                "   LDCINT 12",
                "   MUL",
                "   ADD",
                "   LDGADDR 28",
                "   LOADW",
                "   LDCINT 4",
                "   MUL",
                "   ADD",
                "   LDCINT 5",
                "   STOREW",
                "   LDGADDR 24",
                "   LDCINT 2",
                "   ADD",
                "   LDCB 1",
                "   STOREB",
                "   LDGADDR 0",
                "   LDCINT 1",
                "   LDCINT 12",
                "   MUL",
                "   ADD",
                "   LDCINT 2",
                "   LDCINT 4",
                "   MUL",
                "   ADD",
                "   LOADW",
                "   PUTINT",
                "   HALT",
            ])
        );
    }

    #[test]
    fn test_whole_array_assignment() {
        let source = r#"
            type Pair = array[2] of Char;
            var a, b : Pair;
            begin
                a := b;
            end.
        "#;
        assert_eq!(
            generate(source),
            lines(&[
                "   PROGRAM 8",
                "   LDGADDR 0",
                "   LDGADDR 4",
                "   LOAD 4",
                "   STORE 4",
                "   HALT",
            ])
        );
    }
}
