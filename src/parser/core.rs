//! Core parser struct and helper methods.

use crate::ast::*;
use crate::config::Config;
use crate::error::{CompileError, ErrorCollector, ParserError};
use crate::lexer::{Token, TokenKind};
use crate::span::Span;
use crate::types::ScopeTable;

pub type ParseResult<T> = Result<T, ParserError>;

/// The parser for CPRL.
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) current: usize,
    pub(crate) scopes: ScopeTable<DeclId>,
    pub(crate) program: Program,
    pub(crate) errors: ErrorCollector<CompileError>,
    /// Number of loops enclosing the current statement
    pub(crate) loop_depth: usize,
    pub(crate) current_subprogram: Option<SubprogramId>,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>, config: &Config) -> Self {
        if tokens.last().map(|t| &t.kind) != Some(&TokenKind::Eof) {
            let end = tokens.last().map(|t| t.span).unwrap_or_default();
            tokens.push(Token::eof(end.end, end.line, end.column));
        }

        Self {
            tokens,
            current: 0,
            scopes: ScopeTable::new(),
            program: Program::default(),
            errors: ErrorCollector::new(config.max_errors),
            loop_depth: 0,
            current_subprogram: None,
        }
    }

    /// Parse a complete program.
    ///
    /// Errors are collected and parsing continues after each one until the
    /// error limit is reached.
    pub fn parse(mut self) -> Result<Program, Vec<CompileError>> {
        let start = self.current_span();
        if let Err(e) = self.program_unit() {
            self.error(e);
        }
        self.program.span = start.merge(&self.previous_span());

        let Parser {
            program, errors, ..
        } = self;
        errors.into_result(program)
    }

    /// program = initialDecls subprogramDecls "begin" statements "end" "." .
    fn program_unit(&mut self) -> ParseResult<()> {
        self.program.initial_decls = self.initial_decls();
        self.subprogram_decls();

        self.expect(&TokenKind::Begin)?;
        self.program.statements = self.statements();
        self.expect(&TokenKind::End)?;
        self.expect(&TokenKind::Dot)?;

        if !self.is_at_end() {
            return Err(ParserError::unexpected_token(
                TokenKind::Eof.to_string(),
                self.peek().kind.to_string(),
                self.current_span(),
            ));
        }
        Ok(())
    }

    // ===== Error handling =====

    /// Record an error. Once the limit is reached the rest of the input is skipped.
    pub(crate) fn error(&mut self, error: impl Into<CompileError>) {
        self.errors.report(error);
        if self.errors.limit_reached() {
            self.current = self.tokens.len() - 1;
        }
    }

    /// Skip tokens until one satisfies `is_follower` or the input ends.
    pub(crate) fn recover(&mut self, is_follower: fn(&TokenKind) -> bool) {
        while !self.is_at_end() && !is_follower(&self.peek().kind) {
            self.advance();
        }
    }

    // ===== Scope =====

    pub(crate) fn lookup(&self, name: &str) -> Option<DeclId> {
        self.scopes.lookup(name).copied()
    }

    /// Add a declaration to the program and bind it in the current scope.
    pub(crate) fn declare(&mut self, decl: Declaration) -> DeclId {
        let name = decl.name.clone();
        let span = decl.span;
        let id = self.program.decls.add(decl);
        if let Err(dup) = self.scopes.add(name, id) {
            self.error(ParserError::duplicate_identifier(dup.0, span));
        }
        id
    }

    // ===== Token manipulation =====

    pub(crate) fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.tokens[self.current.max(1) - 1].clone()
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        if self.is_at_end() {
            false
        } else {
            std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
        }
    }

    pub(crate) fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: &TokenKind) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParserError::unexpected_token(
                kind.to_string(),
                self.peek().kind.to_string(),
                self.current_span(),
            ))
        }
    }

    pub(crate) fn expect_identifier(&mut self) -> ParseResult<(String, Span)> {
        match &self.peek().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                let span = self.advance().span;
                Ok((name, span))
            }
            _ => Err(ParserError::unexpected_token(
                "identifier",
                self.peek().kind.to_string(),
                self.current_span(),
            )),
        }
    }

    pub(crate) fn current_span(&self) -> Span {
        self.peek().span
    }

    pub(crate) fn previous_span(&self) -> Span {
        self.previous().span
    }
}
