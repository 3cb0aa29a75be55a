//! Assembler instruction model.

use std::fmt;

use crate::bytecode::constants::{BYTES_PER_CHAR, BYTES_PER_INTEGER, BYTES_PER_OPCODE};
use crate::bytecode::OpCode;
use crate::span::Span;

/// Argument of an instruction that takes a four-byte integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntArg {
    Literal(i32),
    /// A name bound by `DEFINT`
    Identifier(String),
}

/// Opcode together with its argument, one variant per operand shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstructionKind {
    NoArg(OpCode),
    /// LDCB, SHL, SHR. The range is checked during resolution.
    Byte(OpCode, i32),
    Int(OpCode, IntArg),
    /// Branches and CALL, with the target label
    Branch(OpCode, String),
    /// LDCCH
    Char(u16),
    /// LDCSTR
    Str(String),
    /// Pseudo-op binding a name to the next stack offset.
    DefInt(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub labels: Vec<String>,
    pub kind: InstructionKind,
    /// Byte address within the program, set during address assignment.
    pub address: i32,
    pub span: Span,
}

impl Instruction {
    pub fn new(labels: Vec<String>, kind: InstructionKind, span: Span) -> Self {
        Self {
            labels,
            kind,
            address: 0,
            span,
        }
    }

    /// An unlabeled instruction without a source position.
    pub fn bare(kind: InstructionKind) -> Self {
        Self::new(Vec::new(), kind, Span::default())
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    /// The opcode, or `None` for `DEFINT`.
    pub fn opcode(&self) -> Option<OpCode> {
        match &self.kind {
            InstructionKind::NoArg(op)
            | InstructionKind::Byte(op, _)
            | InstructionKind::Int(op, _)
            | InstructionKind::Branch(op, _) => Some(*op),
            InstructionKind::Char(_) => Some(OpCode::Ldcch),
            InstructionKind::Str(_) => Some(OpCode::LdcStr),
            InstructionKind::DefInt(_) => None,
        }
    }

    pub fn is(&self, op: OpCode) -> bool {
        self.opcode() == Some(op)
    }

    pub fn is_labeled(&self) -> bool {
        !self.labels.is_empty()
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Number of bytes this instruction occupies in the object code.
    pub fn size(&self) -> i32 {
        match &self.kind {
            InstructionKind::DefInt(_) => 0,
            InstructionKind::Str(s) => {
                BYTES_PER_OPCODE + BYTES_PER_INTEGER + BYTES_PER_CHAR * s.encode_utf16().count() as i32
            }
            _ => {
                let op = self.opcode().unwrap_or(OpCode::Halt);
                BYTES_PER_OPCODE + op.operand_size()
            }
        }
    }

    /// The value pushed by an integer constant load, in any of its forms.
    pub fn int_constant(&self) -> Option<i32> {
        match &self.kind {
            InstructionKind::Int(OpCode::LdcInt, IntArg::Literal(value)) => Some(*value),
            InstructionKind::NoArg(OpCode::LdcInt0) => Some(0),
            InstructionKind::NoArg(OpCode::LdcInt1) => Some(1),
            _ => None,
        }
    }

    /// Target label of a branch or call.
    pub fn target(&self) -> Option<&str> {
        match &self.kind {
            InstructionKind::Branch(_, label) => Some(label),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for label in &self.labels {
            writeln!(f, "{}:", label)?;
        }
        write!(f, "   ")?;
        match &self.kind {
            InstructionKind::NoArg(op) => write!(f, "{}", op),
            InstructionKind::Byte(op, value) => write!(f, "{} {}", op, value),
            InstructionKind::Int(op, IntArg::Literal(value)) => write!(f, "{} {}", op, value),
            InstructionKind::Int(op, IntArg::Identifier(name)) => write!(f, "{} {}", op, name),
            InstructionKind::Branch(op, label) => write!(f, "{} {}", op, label),
            InstructionKind::Char(code) => {
                let c = char::from_u32(u32::from(*code)).unwrap_or(char::REPLACEMENT_CHARACTER);
                write!(f, "{} '{}'", OpCode::Ldcch, escape(c))
            }
            InstructionKind::Str(s) => {
                let body: String = s.chars().map(escape).collect();
                write!(f, "{} \"{}\"", OpCode::LdcStr, body)
            }
            InstructionKind::DefInt(name) => write!(f, "DEFINT {}", name),
        }
    }
}

/// Source spelling of a literal character.
fn escape(c: char) -> String {
    match c {
        '\u{8}' => "\\b".to_string(),
        '\t' => "\\t".to_string(),
        '\n' => "\\n".to_string(),
        '\u{c}' => "\\f".to_string(),
        '\r' => "\\r".to_string(),
        '"' => "\\\"".to_string(),
        '\'' => "\\'".to_string(),
        '\\' => "\\\\".to_string(),
        c => c.to_string(),
    }
}

/// Render a list of instructions as assembly text, one instruction per line.
pub fn listing(instructions: &[Instruction]) -> String {
    let mut out = String::new();
    for instruction in instructions {
        out.push_str(&instruction.to_string());
        out.push('\n');
    }
    out
}
