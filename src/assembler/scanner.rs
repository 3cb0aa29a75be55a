//! Scanner for symbolic assembly text.
//!
//! Comments run from `;` to the end of the line. Mnemonics are matched
//! case-insensitively; everything else is case-sensitive.

use std::str::FromStr;

use crate::assembler::token::{AsmToken, AsmTokenKind};
use crate::bytecode::OpCode;
use crate::error::AsmError;
use crate::lexer::unescape;
use crate::span::Span;

pub struct AsmScanner<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
    line: usize,
    column: usize,
    start_pos: usize,
    start_line: usize,
    start_column: usize,
}

impl<'a> AsmScanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.char_indices().peekable(),
            current_pos: 0,
            line: 1,
            column: 1,
            start_pos: 0,
            start_line: 1,
            start_column: 1,
        }
    }

    /// Scan the whole input. The first scan error ends the assembly.
    pub fn scan_tokens(&mut self) -> Result<Vec<AsmToken>, AsmError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.scan_token()?;
            let is_eof = token.kind == AsmTokenKind::Eof;
            tokens.push(token);
            if is_eof {
                return Ok(tokens);
            }
        }
    }

    pub fn scan_token(&mut self) -> Result<AsmToken, AsmError> {
        self.skip_whitespace_and_comments();
        self.mark_start();

        let Some((_, c)) = self.advance() else {
            return Ok(self.make_token(AsmTokenKind::Eof));
        };

        match c {
            '\'' => self.scan_char_literal(),
            '"' => self.scan_string_literal(),
            '-' => match self.peek() {
                Some(d) if d.is_ascii_digit() => Ok(self.scan_integer('-')),
                _ => Err(AsmError::scan(
                    "Expecting an integer literal",
                    self.current_span(),
                )),
            },
            c if c.is_ascii_digit() => Ok(self.scan_integer(c)),
            c if c.is_alphabetic() => Ok(self.scan_word(c)),
            c => Err(AsmError::scan(
                format!("Invalid character '{}'", c.escape_default()),
                self.current_span(),
            )),
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                '\n' => {
                    self.advance();
                    self.line += 1;
                    self.column = 1;
                }
                ';' => {
                    while !matches!(self.peek(), None | Some('\n')) {
                        self.advance();
                    }
                }
                c if c.is_whitespace() => {
                    self.advance();
                }
                _ => return,
            }
        }
    }

    fn scan_integer(&mut self, first: char) -> AsmToken {
        let mut text = String::from(first);
        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            text.push(c);
            self.advance();
        }
        self.make_token(AsmTokenKind::IntLiteral(text))
    }

    /// Label definition, opcode, `DEFINT`, or identifier.
    fn scan_word(&mut self, first: char) -> AsmToken {
        let mut text = String::from(first);
        while let Some(c) = self.peek().filter(|c| c.is_alphanumeric() || *c == '_') {
            text.push(c);
            self.advance();
        }

        if self.peek() == Some(':') {
            self.advance();
            return self.make_token(AsmTokenKind::LabelDef(text));
        }

        let kind = if text.eq_ignore_ascii_case("DEFINT") {
            AsmTokenKind::DefInt
        } else if let Ok(op) = OpCode::from_str(&text) {
            AsmTokenKind::OpCode(op)
        } else {
            AsmTokenKind::Identifier(text)
        };
        self.make_token(kind)
    }

    /// The opening quote has been consumed.
    fn scan_char_literal(&mut self) -> Result<AsmToken, AsmError> {
        let mut text = String::from('\'');
        match self.peek() {
            Some('\'') => {
                self.advance();
                return Err(AsmError::scan(
                    "Char literal must contain exactly one character",
                    self.current_span(),
                ));
            }
            _ => self.scan_literal_char(&mut text)?,
        }

        if self.peek() == Some('\'') {
            self.advance();
            text.push('\'');
            Ok(self.make_token(AsmTokenKind::CharLiteral(text)))
        } else {
            Err(AsmError::scan(
                "Char literal not closed properly",
                self.current_span(),
            ))
        }
    }

    fn scan_string_literal(&mut self) -> Result<AsmToken, AsmError> {
        let mut text = String::from('"');
        while self.peek() != Some('"') {
            self.scan_literal_char(&mut text)?;
        }
        self.advance();
        text.push('"');
        Ok(self.make_token(AsmTokenKind::StringLiteral(text)))
    }

    /// Copy one literal character, or an escape pair, into `text`.
    fn scan_literal_char(&mut self, text: &mut String) -> Result<(), AsmError> {
        match self.peek() {
            None => Err(AsmError::scan(
                "End of file reached before closing quote for Char or String literal.",
                self.current_span(),
            )),
            Some('\n' | '\r') => Err(AsmError::scan(
                "Char and String literals can not extend past end of line.",
                self.current_span(),
            )),
            Some(c) if c as u32 > 0xFFFF => Err(AsmError::scan(
                "Character not in Unicode Basic Multilingual Plane (BMP)",
                self.current_span(),
            )),
            Some('\\') => {
                self.advance();
                match self.peek() {
                    Some(e) if unescape(e).is_some() => {
                        self.advance();
                        text.push('\\');
                        text.push(e);
                        Ok(())
                    }
                    Some(e) => Err(AsmError::scan(
                        format!("Illegal escape character '\\{}'", e.escape_default()),
                        self.current_span(),
                    )),
                    None => Err(AsmError::scan("Unexpected end of file", self.current_span())),
                }
            }
            Some(c) => {
                self.advance();
                text.push(c);
                Ok(())
            }
        }
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let (pos, c) = self.chars.next()?;
        self.current_pos = pos + c.len_utf8();
        self.column += 1;
        Some((pos, c))
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn mark_start(&mut self) {
        self.start_pos = self.current_pos;
        self.start_line = self.line;
        self.start_column = self.column;
    }

    fn current_span(&self) -> Span {
        Span::new(
            self.start_pos,
            self.current_pos,
            self.start_line,
            self.start_column,
        )
    }

    fn make_token(&self, kind: AsmTokenKind) -> AsmToken {
        AsmToken::new(kind, self.current_span())
    }
}
