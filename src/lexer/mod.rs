//! Lexer module for CPRL source code.

pub mod scanner;
pub mod token;

pub use scanner::Scanner;
pub use token::{decode_literal, unescape, Token, TokenKind};
