//! Tokens of the symbolic assembly language.

use std::fmt;

use crate::bytecode::OpCode;
use crate::span::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsmTokenKind {
    /// `name:` at the start of an instruction. Stored without the colon.
    LabelDef(String),
    Identifier(String),
    OpCode(OpCode),
    /// The `DEFINT` pseudo-op
    DefInt,
    IntLiteral(String),
    /// Source text including quotes and escapes
    CharLiteral(String),
    StringLiteral(String),
    Eof,
}

impl AsmTokenKind {
    /// Tokens that can start an instruction.
    pub fn starts_instruction(&self) -> bool {
        matches!(
            self,
            AsmTokenKind::LabelDef(_) | AsmTokenKind::OpCode(_) | AsmTokenKind::DefInt
        )
    }
}

impl fmt::Display for AsmTokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsmTokenKind::LabelDef(name) => write!(f, "{}:", name),
            AsmTokenKind::Identifier(name) => write!(f, "{}", name),
            AsmTokenKind::OpCode(op) => write!(f, "{}", op),
            AsmTokenKind::DefInt => write!(f, "DEFINT"),
            AsmTokenKind::IntLiteral(text)
            | AsmTokenKind::CharLiteral(text)
            | AsmTokenKind::StringLiteral(text) => write!(f, "{}", text),
            AsmTokenKind::Eof => write!(f, "End-of-File"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsmToken {
    pub kind: AsmTokenKind,
    pub span: Span,
}

impl AsmToken {
    pub fn new(kind: AsmTokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}
