//! Expression AST nodes.

use std::fmt;

use crate::ast::decl::{DeclId, Literal, SubprogramId};
use crate::span::Span;
use crate::types::Type;

/// An expression in the AST.
///
/// `ty` starts out as whatever the parser could tell and is fixed up by the
/// constraint checker before code generation.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: Type,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, ty: Type, span: Span) -> Self {
        Self { kind, ty, span }
    }

    /// Whether this expression is a bare variable reference, i.e. something
    /// that can be passed to a var parameter.
    pub fn as_variable(&self) -> Option<&Variable> {
        match &self.kind {
            ExprKind::NamedValue(var) => Some(var),
            _ => None,
        }
    }
}

/// All expression variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// A literal, or a named constant replaced by its literal. `decl` is
    /// set when the value came from a constant declaration.
    ConstValue {
        literal: Literal,
        decl: Option<DeclId>,
    },

    /// The value of a variable.
    NamedValue(Variable),

    /// Function call: f(a, b)
    FunctionCall {
        function: DeclId,
        subprogram: SubprogramId,
        args: Vec<Expr>,
    },

    /// Unary operation: -x, not b
    Unary {
        operator: UnaryOp,
        operand: Box<Expr>,
    },

    /// Binary operation: a + b
    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
    },
}

/// A reference to a variable or parameter, with zero or more array indexes.
///
/// `ty` is the type after every index is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub decl: DeclId,
    pub index_exprs: Vec<Expr>,
    pub ty: Type,
    pub span: Span,
}

impl Variable {
    pub fn new(decl: DeclId, ty: Type, span: Span) -> Self {
        Self {
            decl,
            index_exprs: Vec::new(),
            ty,
            span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorClass {
    Adding,
    Multiplying,
    Relational,
    Logical,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Mod,

    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    And,
    Or,
}

impl BinaryOp {
    pub fn class(&self) -> OperatorClass {
        match self {
            BinaryOp::Add | BinaryOp::Subtract => OperatorClass::Adding,
            BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Mod => OperatorClass::Multiplying,
            BinaryOp::Equal
            | BinaryOp::NotEqual
            | BinaryOp::Less
            | BinaryOp::LessEqual
            | BinaryOp::Greater
            | BinaryOp::GreaterEqual => OperatorClass::Relational,
            BinaryOp::And | BinaryOp::Or => OperatorClass::Logical,
        }
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self.class(),
            OperatorClass::Adding | OperatorClass::Multiplying
        )
    }

    pub fn is_relational(&self) -> bool {
        self.class() == OperatorClass::Relational
    }

    pub fn is_logical(&self) -> bool {
        self.class() == OperatorClass::Logical
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Mod => "mod",
            BinaryOp::Equal => "=",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        };
        write!(f, "{}", s)
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Negate,
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Plus => write!(f, "+"),
            UnaryOp::Negate => write!(f, "-"),
            UnaryOp::Not => write!(f, "not"),
        }
    }
}
