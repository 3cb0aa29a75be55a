//! Abstract Syntax Tree for CPRL.
//!
//! Declarations are stored once in a [`DeclTable`] owned by the [`Program`];
//! expressions and statements refer to them by [`DeclId`]. Subprograms live
//! in a table of their own and are referenced by [`SubprogramId`].

pub mod decl;
pub mod expr;
pub mod stmt;

pub use decl::{
    DeclId, DeclKind, DeclTable, Declaration, Literal, SubprogramDecl, SubprogramId,
    SubprogramKind,
};
pub use expr::{BinaryOp, Expr, ExprKind, OperatorClass, UnaryOp, Variable};
pub use stmt::{ElsifPart, Stmt, StmtKind};

use crate::span::Span;

/// The root of the AST: a whole CPRL program.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub decls: DeclTable,
    /// Constant, variable, and array type declarations at program level
    pub initial_decls: Vec<DeclId>,
    pub subprograms: Vec<SubprogramDecl>,
    pub statements: Vec<Stmt>,
    /// Bytes of program-level variables, set by the code generator.
    pub var_length: i32,
    pub span: Span,
}

impl Program {
    pub fn decl(&self, id: DeclId) -> &Declaration {
        &self.decls[id]
    }

    pub fn subprogram(&self, id: SubprogramId) -> &SubprogramDecl {
        &self.subprograms[id.0]
    }

    pub fn subprogram_mut(&mut self, id: SubprogramId) -> &mut SubprogramDecl {
        &mut self.subprograms[id.0]
    }
}
