//! Token definitions for the CPRL scanner.

use std::fmt;

use crate::span::Span;

/// All token types in CPRL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    // Literals. Text is kept as written so that range checks and escape
    // handling happen where the value is used.
    IntLiteral(String),
    /// Char literal including its quotes, e.g. `'a'` or `'\n'`
    CharLiteral(String),
    /// String literal including its quotes
    StringLiteral(String),

    Identifier(String),

    // Reserved words
    And,
    Array,
    Begin,
    Boolean,
    Char,
    Const,
    Else,
    Elsif,
    End,
    Exit,
    False,
    Function,
    If,
    Integer,
    Is,
    Loop,
    Mod,
    Not,
    Of,
    Or,
    Procedure,
    Read,
    Return,
    Then,
    True,
    Type,
    Var,
    When,
    While,
    Write,
    Writeln,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Assign,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Comma,
    Colon,
    Semicolon,
    Dot,

    Eof,
}

impl TokenKind {
    /// Check if this identifier is a reserved word and return the corresponding kind.
    pub fn keyword(ident: &str) -> Option<TokenKind> {
        match ident {
            "and" => Some(TokenKind::And),
            "array" => Some(TokenKind::Array),
            "begin" => Some(TokenKind::Begin),
            "Boolean" => Some(TokenKind::Boolean),
            "Char" => Some(TokenKind::Char),
            "const" => Some(TokenKind::Const),
            "else" => Some(TokenKind::Else),
            "elsif" => Some(TokenKind::Elsif),
            "end" => Some(TokenKind::End),
            "exit" => Some(TokenKind::Exit),
            "false" => Some(TokenKind::False),
            "function" => Some(TokenKind::Function),
            "if" => Some(TokenKind::If),
            "Integer" => Some(TokenKind::Integer),
            "is" => Some(TokenKind::Is),
            "loop" => Some(TokenKind::Loop),
            "mod" => Some(TokenKind::Mod),
            "not" => Some(TokenKind::Not),
            "of" => Some(TokenKind::Of),
            "or" => Some(TokenKind::Or),
            "procedure" => Some(TokenKind::Procedure),
            "read" => Some(TokenKind::Read),
            "return" => Some(TokenKind::Return),
            "then" => Some(TokenKind::Then),
            "true" => Some(TokenKind::True),
            "type" => Some(TokenKind::Type),
            "var" => Some(TokenKind::Var),
            "when" => Some(TokenKind::When),
            "while" => Some(TokenKind::While),
            "write" => Some(TokenKind::Write),
            "writeln" => Some(TokenKind::Writeln),
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::IntLiteral(_)
                | TokenKind::CharLiteral(_)
                | TokenKind::StringLiteral(_)
                | TokenKind::True
                | TokenKind::False
        )
    }

    pub fn is_initial_decl_starter(&self) -> bool {
        matches!(self, TokenKind::Const | TokenKind::Var | TokenKind::Type)
    }

    pub fn is_subprogram_decl_starter(&self) -> bool {
        matches!(self, TokenKind::Procedure | TokenKind::Function)
    }

    pub fn is_stmt_starter(&self) -> bool {
        matches!(
            self,
            TokenKind::Exit
                | TokenKind::Identifier(_)
                | TokenKind::If
                | TokenKind::Loop
                | TokenKind::While
                | TokenKind::Read
                | TokenKind::Write
                | TokenKind::Writeln
                | TokenKind::Return
        )
    }

    pub fn is_relational_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::Equal
                | TokenKind::NotEqual
                | TokenKind::Less
                | TokenKind::LessEqual
                | TokenKind::Greater
                | TokenKind::GreaterEqual
        )
    }

    pub fn is_expr_starter(&self) -> bool {
        self.is_literal()
            || matches!(
                self,
                TokenKind::Identifier(_)
                    | TokenKind::LeftParen
                    | TokenKind::Plus
                    | TokenKind::Minus
                    | TokenKind::Not
            )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::IntLiteral(s) => write!(f, "{}", s),
            TokenKind::CharLiteral(s) => write!(f, "{}", s),
            TokenKind::StringLiteral(s) => write!(f, "{}", s),
            TokenKind::Identifier(s) => write!(f, "{}", s),
            TokenKind::And => write!(f, "and"),
            TokenKind::Array => write!(f, "array"),
            TokenKind::Begin => write!(f, "begin"),
            TokenKind::Boolean => write!(f, "Boolean"),
            TokenKind::Char => write!(f, "Char"),
            TokenKind::Const => write!(f, "const"),
            TokenKind::Else => write!(f, "else"),
            TokenKind::Elsif => write!(f, "elsif"),
            TokenKind::End => write!(f, "end"),
            TokenKind::Exit => write!(f, "exit"),
            TokenKind::False => write!(f, "false"),
            TokenKind::Function => write!(f, "function"),
            TokenKind::If => write!(f, "if"),
            TokenKind::Integer => write!(f, "Integer"),
            TokenKind::Is => write!(f, "is"),
            TokenKind::Loop => write!(f, "loop"),
            TokenKind::Mod => write!(f, "mod"),
            TokenKind::Not => write!(f, "not"),
            TokenKind::Of => write!(f, "of"),
            TokenKind::Or => write!(f, "or"),
            TokenKind::Procedure => write!(f, "procedure"),
            TokenKind::Read => write!(f, "read"),
            TokenKind::Return => write!(f, "return"),
            TokenKind::Then => write!(f, "then"),
            TokenKind::True => write!(f, "true"),
            TokenKind::Type => write!(f, "type"),
            TokenKind::Var => write!(f, "var"),
            TokenKind::When => write!(f, "when"),
            TokenKind::While => write!(f, "while"),
            TokenKind::Write => write!(f, "write"),
            TokenKind::Writeln => write!(f, "writeln"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Equal => write!(f, "="),
            TokenKind::NotEqual => write!(f, "!="),
            TokenKind::Less => write!(f, "<"),
            TokenKind::LessEqual => write!(f, "<="),
            TokenKind::Greater => write!(f, ">"),
            TokenKind::GreaterEqual => write!(f, ">="),
            TokenKind::Assign => write!(f, ":="),
            TokenKind::LeftParen => write!(f, "("),
            TokenKind::RightParen => write!(f, ")"),
            TokenKind::LeftBracket => write!(f, "["),
            TokenKind::RightBracket => write!(f, "]"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::Semicolon => write!(f, ";"),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Eof => write!(f, "End-of-File"),
        }
    }
}

/// A token with its kind and source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn eof(position: usize, line: usize, column: usize) -> Self {
        Self {
            kind: TokenKind::Eof,
            span: Span::new(position, position, line, column),
        }
    }
}

/// Decode the escape character following a backslash.
///
/// Shared by the CPRL scanner and the assembly scanner.
pub fn unescape(c: char) -> Option<char> {
    match c {
        'b' => Some('\u{8}'),
        't' => Some('\t'),
        'n' => Some('\n'),
        'f' => Some('\u{c}'),
        'r' => Some('\r'),
        '"' => Some('"'),
        '\'' => Some('\''),
        '\\' => Some('\\'),
        _ => None,
    }
}

/// Decode the body of a quoted literal (quotes included) into its characters.
///
/// The scanner has already validated the escapes, so unknown escapes are kept verbatim.
pub fn decode_literal(text: &str) -> String {
    let inner = if text.len() >= 2 {
        &text[1..text.len() - 1]
    } else {
        text
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(e) => match unescape(e) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('\\');
                        out.push(e);
                    }
                },
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
