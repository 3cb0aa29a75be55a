//! Statement code generation.

use crate::ast::*;
use crate::bytecode::OpCode;
use crate::error::CodeGenError;
use crate::types::Type;

use super::compiler::{param_length, CodeGenerator, GenResult};

impl CodeGenerator {
    pub(crate) fn emit_stmts(&mut self, program: &Program, stmts: &[Stmt]) -> GenResult<()> {
        for stmt in stmts {
            self.emit_stmt(program, stmt)?;
        }
        Ok(())
    }

    pub(crate) fn emit_stmt(&mut self, program: &Program, stmt: &Stmt) -> GenResult<()> {
        match &stmt.kind {
            StmtKind::Assignment { variable, expr } => {
                self.emit_variable(program, variable)?;
                self.emit_expr(program, expr)?;
                self.emit_store(&variable.ty, stmt.span)?;
            }

            StmtKind::If {
                condition,
                then_stmts,
                elsif_parts,
                else_stmts,
            } => {
                let next = self.new_label();
                let end = self.new_label();

                self.emit_branch(program, condition, false, &next)?;
                self.emit_stmts(program, then_stmts)?;
                if !elsif_parts.is_empty() || !else_stmts.is_empty() {
                    self.emit_op_arg(OpCode::Br, &end);
                }
                self.emit_label(&next);

                for part in elsif_parts {
                    let next = self.new_label();
                    self.emit_branch(program, &part.condition, false, &next)?;
                    self.emit_stmts(program, &part.statements)?;
                    self.emit_op_arg(OpCode::Br, &end);
                    self.emit_label(&next);
                }

                self.emit_stmts(program, else_stmts)?;
                self.emit_label(&end);
            }

            StmtKind::Loop { while_expr, body } => {
                let top = self.new_label();
                let bottom = self.new_label();

                self.emit_label(&top);
                if let Some(condition) = while_expr {
                    self.emit_branch(program, condition, false, &bottom)?;
                }

                self.loop_exits.push(bottom.clone());
                let result = self.emit_stmts(program, body);
                self.loop_exits.pop();
                result?;

                self.emit_op_arg(OpCode::Br, &top);
                self.emit_label(&bottom);
            }

            StmtKind::Exit { when_expr } => {
                let exit = self
                    .loop_exits
                    .last()
                    .cloned()
                    .ok_or_else(|| CodeGenError::new("Exit statement outside of a loop.", stmt.span))?;

                match when_expr {
                    Some(condition) => self.emit_branch(program, condition, true, &exit)?,
                    None => self.emit_op_arg(OpCode::Br, &exit),
                }
            }

            StmtKind::Read(variable) => {
                self.emit_variable(program, variable)?;
                match variable.ty {
                    Type::Integer => self.emit_op(OpCode::GetInt),
                    Type::Char => self.emit_op(OpCode::GetCh),
                    _ => {
                        return Err(CodeGenError::new(
                            format!("Cannot read a value of type {}.", variable.ty),
                            variable.span,
                        ))
                    }
                }
                self.emit_store(&variable.ty, variable.span)?;
            }

            StmtKind::Write(exprs) => self.emit_output(program, exprs)?,

            StmtKind::Writeln(exprs) => {
                self.emit_output(program, exprs)?;
                self.emit_op(OpCode::PutEol);
            }

            StmtKind::ProcedureCall {
                subprogram, args, ..
            } => {
                let subprogram = program.subprogram(*subprogram);
                self.emit_actual_params(program, subprogram, args)?;
                self.emit_op_arg(OpCode::Call, &subprogram.label);
            }

            StmtKind::Return { subprogram, expr } => {
                let subprogram = subprogram
                    .map(|id| program.subprogram(id))
                    .ok_or_else(|| {
                        CodeGenError::new("Return statement outside of a subprogram.", stmt.span)
                    })?;
                let param_length = param_length(program, subprogram);

                if let Some(expr) = expr {
                    // the return value slot sits below the parameters
                    let return_type = &program.decl(subprogram.decl).ty;
                    self.emit_op_arg(OpCode::LdlAddr, -(param_length + return_type.size()));
                    self.emit_expr(program, expr)?;
                    self.emit_store(return_type, expr.span)?;
                }
                self.emit_op_arg(OpCode::Ret, param_length);
            }
        }

        Ok(())
    }

    fn emit_output(&mut self, program: &Program, exprs: &[Expr]) -> GenResult<()> {
        for expr in exprs {
            self.emit_expr(program, expr)?;
            let op = match expr.ty {
                Type::Integer => OpCode::PutInt,
                Type::Boolean => OpCode::PutByte,
                Type::Char => OpCode::PutCh,
                Type::String => OpCode::PutStr,
                _ => {
                    return Err(CodeGenError::new(
                        format!("Invalid type {} for output.", expr.ty),
                        expr.span,
                    ))
                }
            };
            self.emit_op(op);
        }
        Ok(())
    }

    /// Push actual parameters: values, or addresses for var parameters.
    pub(crate) fn emit_actual_params(
        &mut self,
        program: &Program,
        subprogram: &SubprogramDecl,
        args: &[Expr],
    ) -> GenResult<()> {
        for (&param, arg) in subprogram.params.iter().zip(args) {
            if program.decl(param).is_var_param() {
                let variable = arg.as_variable().ok_or_else(|| {
                    CodeGenError::new("Var parameter argument is not a variable.", arg.span)
                })?;
                self.emit_variable(program, variable)?;
            } else {
                self.emit_expr(program, arg)?;
            }
        }
        Ok(())
    }
}
