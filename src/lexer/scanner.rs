//! Scanner for CPRL source code.

use crate::error::LexerError;
use crate::lexer::token::{unescape, Token, TokenKind};
use crate::span::Span;

/// The scanner transforms source code into a stream of tokens.
pub struct Scanner<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
    line: usize,
    column: usize,
    start_pos: usize,
    start_line: usize,
    start_column: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            current_pos: 0,
            line: 1,
            column: 1,
            start_pos: 0,
            start_line: 1,
            start_column: 1,
        }
    }

    /// Scan all tokens from the source. Stops at the first lexical error.
    pub fn scan_tokens(&mut self) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();

        loop {
            let token = self.scan_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }

    /// Scan the next token.
    pub fn scan_token(&mut self) -> Result<Token, LexerError> {
        self.skip_whitespace_and_comments();
        self.mark_start();

        let Some((_, c)) = self.advance() else {
            return Ok(Token::eof(self.current_pos, self.line, self.column));
        };

        match c {
            '(' => Ok(self.make_token(TokenKind::LeftParen)),
            ')' => Ok(self.make_token(TokenKind::RightParen)),
            '[' => Ok(self.make_token(TokenKind::LeftBracket)),
            ']' => Ok(self.make_token(TokenKind::RightBracket)),
            ',' => Ok(self.make_token(TokenKind::Comma)),
            ';' => Ok(self.make_token(TokenKind::Semicolon)),
            '.' => Ok(self.make_token(TokenKind::Dot)),
            '+' => Ok(self.make_token(TokenKind::Plus)),
            '-' => Ok(self.make_token(TokenKind::Minus)),
            '*' => Ok(self.make_token(TokenKind::Star)),
            '/' => Ok(self.make_token(TokenKind::Slash)),
            '=' => Ok(self.make_token(TokenKind::Equal)),

            ':' => {
                if self.match_char('=') {
                    Ok(self.make_token(TokenKind::Assign))
                } else {
                    Ok(self.make_token(TokenKind::Colon))
                }
            }
            '!' => {
                if self.match_char('=') {
                    Ok(self.make_token(TokenKind::NotEqual))
                } else {
                    Err(LexerError::unexpected_char('!', self.current_span()))
                }
            }
            '<' => {
                if self.match_char('=') {
                    Ok(self.make_token(TokenKind::LessEqual))
                } else if self.match_char('>') {
                    Ok(self.make_token(TokenKind::NotEqual))
                } else {
                    Ok(self.make_token(TokenKind::Less))
                }
            }
            '>' => {
                if self.match_char('=') {
                    Ok(self.make_token(TokenKind::GreaterEqual))
                } else {
                    Ok(self.make_token(TokenKind::Greater))
                }
            }

            '\'' => self.scan_char_literal(),
            '"' => self.scan_string_literal(),

            c if c.is_ascii_digit() => Ok(self.scan_number(c)),
            c if c.is_ascii_alphabetic() => Ok(self.scan_identifier(c)),

            _ => Err(LexerError::unexpected_char(c, self.current_span())),
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r') => {
                    self.advance();
                }
                Some('\n') => {
                    self.advance();
                    self.line += 1;
                    self.column = 1;
                }
                Some('/') if self.peek_next() == Some('/') => {
                    while self.peek().is_some() && self.peek() != Some('\n') {
                        self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    fn scan_number(&mut self, first: char) -> Token {
        let mut value = String::from(first);

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                value.push(c);
                self.advance();
            } else {
                break;
            }
        }

        self.make_token(TokenKind::IntLiteral(value))
    }

    fn scan_identifier(&mut self, first: char) -> Token {
        let mut value = String::from(first);

        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                value.push(c);
                self.advance();
            } else {
                break;
            }
        }

        let kind = TokenKind::keyword(&value).unwrap_or(TokenKind::Identifier(value));
        self.make_token(kind)
    }

    /// Scans a char literal. The opening quote has been consumed.
    fn scan_char_literal(&mut self) -> Result<Token, LexerError> {
        let mut text = String::from('\'');

        match self.peek() {
            None => return Err(LexerError::unterminated_literal(self.current_span())),
            Some('\n' | '\r') => {
                return Err(LexerError::LiteralPastEndOfLine(self.current_span()));
            }
            Some('\'') => {
                // '' is empty and ''' has nothing to escape the middle quote
                self.advance();
                return Err(LexerError::InvalidCharLiteral(self.current_span()));
            }
            Some('\\') => {
                self.advance();
                text.push('\\');
                text.push(self.scan_escape()?);
            }
            Some(c) => {
                self.advance();
                text.push(c);
            }
        }

        if self.match_char('\'') {
            text.push('\'');
            Ok(self.make_token(TokenKind::CharLiteral(text)))
        } else {
            Err(LexerError::InvalidCharLiteral(self.current_span()))
        }
    }

    /// Scans a string literal. The opening quote has been consumed.
    fn scan_string_literal(&mut self) -> Result<Token, LexerError> {
        let mut text = String::from('"');

        loop {
            match self.peek() {
                None => return Err(LexerError::unterminated_literal(self.current_span())),
                Some('\n' | '\r') => {
                    return Err(LexerError::LiteralPastEndOfLine(self.current_span()));
                }
                Some('"') => {
                    self.advance();
                    text.push('"');
                    return Ok(self.make_token(TokenKind::StringLiteral(text)));
                }
                Some('\\') => {
                    self.advance();
                    text.push('\\');
                    text.push(self.scan_escape()?);
                }
                Some(c) => {
                    self.advance();
                    text.push(c);
                }
            }
        }
    }

    /// Validates the character after a backslash and returns it unchanged.
    fn scan_escape(&mut self) -> Result<char, LexerError> {
        match self.peek() {
            Some(c) if unescape(c).is_some() => {
                self.advance();
                Ok(c)
            }
            Some('\n' | '\r') => Err(LexerError::LiteralPastEndOfLine(self.current_span())),
            Some(c) => {
                self.advance();
                Err(LexerError::invalid_escape(c, self.current_span()))
            }
            None => Err(LexerError::unterminated_literal(self.current_span())),
        }
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        if let Some((pos, c)) = self.chars.next() {
            self.current_pos = pos + c.len_utf8();
            self.column += 1;
            Some((pos, c))
        } else {
            None
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_next(&self) -> Option<char> {
        let mut iter = self.source[self.current_pos..].chars();
        iter.next();
        iter.next()
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
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

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.current_span())
    }
}
