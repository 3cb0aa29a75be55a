//! Declarations.

use std::ops::{Index, IndexMut};

use crate::ast::stmt::Stmt;
use crate::lexer::decode_literal;
use crate::span::Span;
use crate::types::{ScopeLevel, Type};

/// Index of a declaration in the [`DeclTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclId(pub usize);

/// Index of a subprogram in [`Program::subprograms`](crate::ast::Program).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubprogramId(pub usize);

/// A literal as it appears in the source.
///
/// Integer, char, and string literals keep their source text; char and
/// string text includes the quotes and any escapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Integer(String),
    Boolean(bool),
    Char(String),
    String(String),
}

impl Literal {
    pub fn ty(&self) -> Type {
        match self {
            Literal::Integer(_) => Type::Integer,
            Literal::Boolean(_) => Type::Boolean,
            Literal::Char(_) => Type::Char,
            Literal::String(_) => Type::String,
        }
    }

    /// Integer value of a scalar literal. `None` for strings and for
    /// integer text that does not fit in 32 bits.
    pub fn int_value(&self) -> Option<i32> {
        match self {
            Literal::Integer(text) => text.parse().ok(),
            Literal::Boolean(b) => Some(*b as i32),
            Literal::Char(text) => decode_literal(text).chars().next().map(|c| c as i32),
            Literal::String(_) => None,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Literal::Integer(text) | Literal::Char(text) | Literal::String(text) => text,
            Literal::Boolean(true) => "true",
            Literal::Boolean(false) => "false",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubprogramKind {
    Procedure,
    Function,
}

/// What a declared identifier names.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    Const {
        literal: Literal,
    },
    /// A single variable. `rel_addr` is assigned by the code generator.
    Var {
        rel_addr: i32,
    },
    /// A formal parameter. Offsets are negative, relative to the frame base.
    Param {
        is_var: bool,
        rel_addr: i32,
    },
    /// Array type alias; the element count exactly as written.
    ArrayType {
        num_elements: Literal,
    },
    Subprogram {
        kind: SubprogramKind,
        id: SubprogramId,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub span: Span,
    /// Declared type. For functions this is the return type.
    pub ty: Type,
    pub scope_level: ScopeLevel,
    pub kind: DeclKind,
}

impl Declaration {
    pub fn new(
        name: impl Into<String>,
        span: Span,
        ty: Type,
        scope_level: ScopeLevel,
        kind: DeclKind,
    ) -> Self {
        Self {
            name: name.into(),
            span,
            ty,
            scope_level,
            kind,
        }
    }

    /// Variables and parameters; anything that has an address.
    pub fn is_variable(&self) -> bool {
        matches!(self.kind, DeclKind::Var { .. } | DeclKind::Param { .. })
    }

    pub fn is_var_param(&self) -> bool {
        matches!(self.kind, DeclKind::Param { is_var: true, .. })
    }

    pub fn rel_addr(&self) -> i32 {
        match self.kind {
            DeclKind::Var { rel_addr } | DeclKind::Param { rel_addr, .. } => rel_addr,
            _ => 0,
        }
    }

    pub fn set_rel_addr(&mut self, addr: i32) {
        match &mut self.kind {
            DeclKind::Var { rel_addr } | DeclKind::Param { rel_addr, .. } => *rel_addr = addr,
            _ => {}
        }
    }

    /// Bytes the declaration occupies in a frame. A var parameter holds an
    /// address regardless of its declared type.
    pub fn size(&self) -> i32 {
        if self.is_var_param() {
            Type::Address.size()
        } else {
            self.ty.size()
        }
    }
}

/// Arena of every declaration in a program.
#[derive(Debug, Clone, Default)]
pub struct DeclTable {
    decls: Vec<Declaration>,
}

impl DeclTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, decl: Declaration) -> DeclId {
        self.decls.push(decl);
        DeclId(self.decls.len() - 1)
    }

    pub fn get(&self, id: DeclId) -> Option<&Declaration> {
        self.decls.get(id.0)
    }

    pub fn get_mut(&mut self, id: DeclId) -> Option<&mut Declaration> {
        self.decls.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

impl Index<DeclId> for DeclTable {
    type Output = Declaration;

    fn index(&self, id: DeclId) -> &Declaration {
        &self.decls[id.0]
    }
}

impl IndexMut<DeclId> for DeclTable {
    fn index_mut(&mut self, id: DeclId) -> &mut Declaration {
        &mut self.decls[id.0]
    }
}

/// A procedure or function declaration with its body.
#[derive(Debug, Clone, PartialEq)]
pub struct SubprogramDecl {
    /// The declaration that names this subprogram.
    pub decl: DeclId,
    pub kind: SubprogramKind,
    pub params: Vec<DeclId>,
    pub initial_decls: Vec<DeclId>,
    pub statements: Vec<Stmt>,
    /// Entry label, allocated by the code generator.
    pub label: String,
    /// Bytes of local variables, set by the code generator.
    pub var_length: i32,
    pub span: Span,
}

impl SubprogramDecl {
    pub fn new(decl: DeclId, kind: SubprogramKind, span: Span) -> Self {
        Self {
            decl,
            kind,
            params: Vec::new(),
            initial_decls: Vec::new(),
            statements: Vec::new(),
            label: String::new(),
            var_length: 0,
            span,
        }
    }

    pub fn is_function(&self) -> bool {
        self.kind == SubprogramKind::Function
    }
}
