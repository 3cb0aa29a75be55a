//! Statement AST nodes.

use crate::ast::decl::{DeclId, SubprogramId};
use crate::ast::expr::{Expr, Variable};
use crate::span::Span;

/// A statement in the AST.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Statement variants.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// x := expr;
    Assignment { variable: Variable, expr: Expr },

    /// if c then ... elsif c then ... else ... end if;
    If {
        condition: Expr,
        then_stmts: Vec<Stmt>,
        elsif_parts: Vec<ElsifPart>,
        else_stmts: Vec<Stmt>,
    },

    /// [while c] loop ... end loop;
    Loop {
        while_expr: Option<Expr>,
        body: Vec<Stmt>,
    },

    /// exit [when c];
    Exit { when_expr: Option<Expr> },

    /// read x;
    Read(Variable),

    /// write e1, e2;
    Write(Vec<Expr>),

    /// writeln e1, e2;
    Writeln(Vec<Expr>),

    /// p(a, b);
    ProcedureCall {
        procedure: DeclId,
        subprogram: SubprogramId,
        args: Vec<Expr>,
    },

    /// return [expr];
    ///
    /// `subprogram` is `None` when the statement is not inside any
    /// subprogram, which the checker reports.
    Return {
        subprogram: Option<SubprogramId>,
        expr: Option<Expr>,
    },
}

/// An `elsif` clause of an if statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ElsifPart {
    pub condition: Expr,
    pub statements: Vec<Stmt>,
    pub span: Span,
}
