//! Error types for all toolchain phases.

use crate::span::Span;
use thiserror::Error;

/// Source scanner errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexerError {
    #[error("Invalid character '{0}' at {1}")]
    UnexpectedChar(char, Span),

    #[error("End of file reached before closing quote for Char or String literal at {0}")]
    UnterminatedLiteral(Span),

    #[error("Char and String literals can not extend past end of line at {0}")]
    LiteralPastEndOfLine(Span),

    #[error("Illegal escape character '\\{0}' at {1}")]
    InvalidEscape(char, Span),

    #[error("Invalid Char literal at {0}")]
    InvalidCharLiteral(Span),
}

impl LexerError {
    pub fn unexpected_char(c: char, span: Span) -> Self {
        Self::UnexpectedChar(c, span)
    }

    pub fn unterminated_literal(span: Span) -> Self {
        Self::UnterminatedLiteral(span)
    }

    pub fn invalid_escape(c: char, span: Span) -> Self {
        Self::InvalidEscape(c, span)
    }

    pub fn span(&self) -> Span {
        match self {
            Self::UnexpectedChar(_, span) => *span,
            Self::UnterminatedLiteral(span) => *span,
            Self::LiteralPastEndOfLine(span) => *span,
            Self::InvalidEscape(_, span) => *span,
            Self::InvalidCharLiteral(span) => *span,
        }
    }
}

/// Parser errors: syntax errors and identifier resolution errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParserError {
    #[error("Expecting \"{expected}\" but found \"{found}\" instead at {span}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("Identifier \"{0}\" is already defined in the current scope at {1}")]
    DuplicateIdentifier(String, Span),

    #[error("Identifier \"{0}\" has not been declared at {1}")]
    UndeclaredIdentifier(String, Span),

    #[error("{message} at {span}")]
    General { message: String, span: Span },
}

impl ParserError {
    pub fn unexpected_token(
        expected: impl Into<String>,
        found: impl Into<String>,
        span: Span,
    ) -> Self {
        Self::UnexpectedToken {
            expected: expected.into(),
            found: found.into(),
            span,
        }
    }

    pub fn duplicate_identifier(name: impl Into<String>, span: Span) -> Self {
        Self::DuplicateIdentifier(name.into(), span)
    }

    pub fn undeclared_identifier(name: impl Into<String>, span: Span) -> Self {
        Self::UndeclaredIdentifier(name.into(), span)
    }

    pub fn general(message: impl Into<String>, span: Span) -> Self {
        Self::General {
            message: message.into(),
            span,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::UnexpectedToken { span, .. } => *span,
            Self::DuplicateIdentifier(_, span) => *span,
            Self::UndeclaredIdentifier(_, span) => *span,
            Self::General { span, .. } => *span,
        }
    }
}

/// Semantic (contextual constraint) errors found by the checker.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConstraintError {
    #[error("{message} at {span}")]
    General { message: String, span: Span },
}

impl ConstraintError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self::General {
            message: message.into(),
            span,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::General { message, .. } => message,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::General { span, .. } => *span,
        }
    }
}

/// Diagnostics collected while compiling a source unit.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lexer(#[from] LexerError),

    #[error(transparent)]
    Parser(#[from] ParserError),

    #[error(transparent)]
    Constraint(#[from] ConstraintError),
}

impl CompileError {
    pub fn span(&self) -> Span {
        match self {
            Self::Lexer(e) => e.span(),
            Self::Parser(e) => e.span(),
            Self::Constraint(e) => e.span(),
        }
    }
}

/// A code generation failure. These are never caused by user input: they
/// mean an invalid tree slipped past constraint checking.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodeGenError {
    #[error("Internal error: {message} at {span}")]
    Internal { message: String, span: Span },
}

impl CodeGenError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self::Internal {
            message: message.into(),
            span,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Internal { span, .. } => *span,
        }
    }
}

/// Assembler errors for scanning, parsing, address assignment, and resolution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AsmError {
    #[error("{message} at {span}")]
    Scan { message: String, span: Span },

    #[error("{message} at {span}")]
    Syntax { message: String, span: Span },

    #[error("{message} at {span}")]
    Constraint { message: String, span: Span },
}

impl AsmError {
    pub fn scan(message: impl Into<String>, span: Span) -> Self {
        Self::Scan {
            message: message.into(),
            span,
        }
    }

    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::Syntax {
            message: message.into(),
            span,
        }
    }

    pub fn constraint(message: impl Into<String>, span: Span) -> Self {
        Self::Constraint {
            message: message.into(),
            span,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Scan { message, .. } => message,
            Self::Syntax { message, .. } => message,
            Self::Constraint { message, .. } => message,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Scan { span, .. } => *span,
            Self::Syntax { span, .. } => *span,
            Self::Constraint { span, .. } => *span,
        }
    }
}

/// Serialization errors. Resolution guarantees these cannot happen for a
/// program that passed all assembler passes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("Unresolved {kind} \"{name}\" at address {address}")]
    Unresolved {
        kind: &'static str,
        name: String,
        address: i32,
    },

    #[error("Argument {value} for {opcode} does not fit in one byte at address {address}")]
    ByteOutOfRange {
        opcode: String,
        value: i32,
        address: i32,
    },
}

/// Runtime faults raised by the virtual machine.
#[derive(Debug, Error)]
pub enum VmError {
    #[error("Divide by zero")]
    DivideByZero { pc: usize },

    #[error("Out of memory")]
    OutOfMemory,

    #[error("Memory access out of bounds at address {address}")]
    MemoryAccess { address: i64 },

    #[error("Invalid machine instruction {opcode} at address {address}")]
    InvalidOpcode { opcode: u8, address: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VmError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

/// Errors decoding object code for a listing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DisassemblyError {
    #[error("Invalid opcode {opcode} at address {address}")]
    InvalidOpcode { opcode: u8, address: usize },

    #[error("Truncated instruction at address {address}")]
    Truncated { address: usize },
}

/// A unified error type for all phases.
#[derive(Debug, Error)]
pub enum CprlError {
    #[error("Compilation failed with {} error(s)", .0.len())]
    Compile(Vec<CompileError>),

    #[error(transparent)]
    CodeGen(#[from] CodeGenError),

    #[error("Assembly failed with {} error(s)", .0.len())]
    Assembly(Vec<AsmError>),

    #[error("Encoding error: {0}")]
    Encode(#[from] EncodeError),

    #[error("*** FAULT: {0} ***")]
    Vm(#[from] VmError),

    #[error("Disassembly error: {0}")]
    Disassembly(#[from] DisassemblyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<Vec<CompileError>> for CprlError {
    fn from(errors: Vec<CompileError>) -> Self {
        Self::Compile(errors)
    }
}

impl From<Vec<AsmError>> for CprlError {
    fn from(errors: Vec<AsmError>) -> Self {
        Self::Assembly(errors)
    }
}

impl CprlError {
    /// Individual diagnostics, one per line of user-facing output.
    pub fn diagnostics(&self) -> Vec<String> {
        match self {
            Self::Compile(errors) => errors.iter().map(|e| e.to_string()).collect(),
            Self::Assembly(errors) => errors.iter().map(|e| e.to_string()).collect(),
            other => vec![other.to_string()],
        }
    }
}

/// Collects recoverable diagnostics up to a fixed limit.
///
/// Phases keep going after a reported error until `limit_reached` turns true.
#[derive(Debug, Clone)]
pub struct ErrorCollector<E> {
    errors: Vec<E>,
    max_errors: usize,
}

impl<E> ErrorCollector<E> {
    pub fn new(max_errors: usize) -> Self {
        Self {
            errors: Vec::new(),
            max_errors,
        }
    }

    pub fn report(&mut self, error: impl Into<E>) {
        if !self.limit_reached() {
            self.errors.push(error.into());
        }
    }

    pub fn limit_reached(&self) -> bool {
        self.errors.len() >= self.max_errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[E] {
        &self.errors
    }

    /// Append everything from another collector, respecting this one's limit.
    pub fn absorb<F: Into<E>>(&mut self, other: ErrorCollector<F>) {
        for error in other.errors {
            self.report(error);
        }
    }

    pub fn into_errors(self) -> Vec<E> {
        self.errors
    }

    pub fn into_result<T>(self, value: T) -> Result<T, Vec<E>> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_stops_at_limit() {
        let mut errors: ErrorCollector<ConstraintError> = ErrorCollector::new(2);
        errors.report(ConstraintError::new("one", Span::default()));
        assert!(!errors.limit_reached());
        errors.report(ConstraintError::new("two", Span::default()));
        errors.report(ConstraintError::new("three", Span::default()));
        assert!(errors.limit_reached());
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_into_result() {
        let errors: ErrorCollector<AsmError> = ErrorCollector::new(5);
        assert_eq!(errors.into_result(7), Ok(7));

        let mut errors: ErrorCollector<AsmError> = ErrorCollector::new(5);
        errors.report(AsmError::syntax("bad", Span::new(0, 1, 1, 1)));
        let result = errors.into_result(());
        assert_eq!(result.unwrap_err()[0].message(), "bad");
    }

    #[test]
    fn test_compile_error_from_phases() {
        let err: CompileError =
            ParserError::undeclared_identifier("x", Span::new(0, 1, 3, 4)).into();
        assert_eq!(err.span().line, 3);
        assert_eq!(
            err.to_string(),
            "Identifier \"x\" has not been declared at line 3, column 4"
        );
    }

    #[test]
    fn test_fault_display() {
        let err: CprlError = VmError::DivideByZero { pc: 12 }.into();
        assert_eq!(err.to_string(), "*** FAULT: Divide by zero ***");
    }
}
