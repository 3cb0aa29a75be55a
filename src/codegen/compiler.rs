//! Code generator state, program layout, and emit helpers.

use std::fmt::Write;

use crate::ast::*;
use crate::bytecode::constants::BYTES_PER_FRAME;
use crate::bytecode::OpCode;
use crate::error::CodeGenError;
use crate::span::Span;
use crate::types::checker::CheckedProgram;
use crate::types::Type;

/// Result type for code generation.
pub type GenResult<T> = Result<T, CodeGenError>;

const INDENT: &str = "   ";

/// Emits symbolic assembly for a checked program.
pub struct CodeGenerator {
    pub(crate) output: String,
    label_count: usize,
    /// Exit labels of the enclosing loops, innermost last.
    pub(crate) loop_exits: Vec<String>,
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self {
            output: String::new(),
            label_count: 0,
            loop_exits: Vec::new(),
        }
    }

    /// Generate assembly for a whole program.
    pub fn generate(mut self, checked: CheckedProgram) -> GenResult<String> {
        let mut program = checked.into_inner();
        assign_addresses(&mut program);
        for index in 0..program.subprograms.len() {
            program.subprograms[index].label = self.new_label();
        }

        self.emit_program(&program)?;
        Ok(self.output)
    }

    fn emit_program(&mut self, program: &Program) -> GenResult<()> {
        if program.var_length > 0 {
            self.emit_op_arg(OpCode::Program, program.var_length);
        }

        if !program.subprograms.is_empty() {
            // jump over the subprogram bodies
            let main = self.new_label();
            self.emit_op_arg(OpCode::Br, &main);
            for subprogram in &program.subprograms {
                self.emit_subprogram(program, subprogram)?;
            }
            self.emit_label(&main);
        }

        self.emit_stmts(program, &program.statements)?;
        self.emit_op(OpCode::Halt);
        Ok(())
    }

    fn emit_subprogram(&mut self, program: &Program, subprogram: &SubprogramDecl) -> GenResult<()> {
        self.emit_label(&subprogram.label);
        self.emit_op_arg(OpCode::Proc, subprogram.var_length);
        self.emit_stmts(program, &subprogram.statements)?;
        self.emit_op_arg(OpCode::Ret, param_length(program, subprogram));
        Ok(())
    }

    // --- Emit helpers ---

    pub(crate) fn new_label(&mut self) -> String {
        self.label_count += 1;
        format!("L{}", self.label_count)
    }

    pub(crate) fn emit_label(&mut self, label: &str) {
        let _ = writeln!(self.output, "{}:", label);
    }

    pub(crate) fn emit_op(&mut self, op: OpCode) {
        let _ = writeln!(self.output, "{}{}", INDENT, op);
    }

    pub(crate) fn emit_op_arg(&mut self, op: OpCode, arg: impl std::fmt::Display) {
        let _ = writeln!(self.output, "{}{} {}", INDENT, op, arg);
    }

    /// Replace the address on top of the stack with the value stored there.
    pub(crate) fn emit_load(&mut self, ty: &Type, span: Span) -> GenResult<()> {
        match ty.size() {
            4 => self.emit_op(OpCode::LoadW),
            2 => self.emit_op(OpCode::Load2B),
            1 => self.emit_op(OpCode::LoadB),
            n if n > 0 => self.emit_op_arg(OpCode::Load, n),
            _ => {
                return Err(CodeGenError::new(
                    format!("Cannot load a value of type {}.", ty),
                    span,
                ))
            }
        }
        Ok(())
    }

    pub(crate) fn emit_store(&mut self, ty: &Type, span: Span) -> GenResult<()> {
        match ty.size() {
            4 => self.emit_op(OpCode::StoreW),
            2 => self.emit_op(OpCode::Store2B),
            1 => self.emit_op(OpCode::StoreB),
            n if n > 0 => self.emit_op_arg(OpCode::Store, n),
            _ => {
                return Err(CodeGenError::new(
                    format!("Cannot store a value of type {}.", ty),
                    span,
                ))
            }
        }
        Ok(())
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Assign relative addresses to every variable and parameter and record
/// the variable length of the program and of each subprogram.
///
/// Program variables are laid out upward from offset 0. Subprogram locals
/// start after the frame header; parameters sit below it with negative
/// offsets, the last parameter nearest the header.
pub fn assign_addresses(program: &mut Program) {
    let mut addr = 0;
    for &id in &program.initial_decls {
        let decl = &mut program.decls[id];
        if let DeclKind::Var { .. } = decl.kind {
            decl.set_rel_addr(addr);
            addr += decl.size();
        }
    }
    program.var_length = addr;

    for subprogram in &mut program.subprograms {
        let mut addr = BYTES_PER_FRAME;
        for &id in &subprogram.initial_decls {
            let decl = &mut program.decls[id];
            if let DeclKind::Var { .. } = decl.kind {
                decl.set_rel_addr(addr);
                addr += decl.size();
            }
        }
        subprogram.var_length = addr - BYTES_PER_FRAME;

        let mut offset = 0;
        for &id in subprogram.params.iter().rev() {
            let decl = &mut program.decls[id];
            offset -= decl.size();
            decl.set_rel_addr(offset);
        }
    }
}

/// Bytes occupied by a subprogram's parameters.
pub fn param_length(program: &Program, subprogram: &SubprogramDecl) -> i32 {
    subprogram
        .params
        .iter()
        .map(|&id| program.decl(id).size())
        .sum()
}
