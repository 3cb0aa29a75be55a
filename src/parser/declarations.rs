//! Declaration parsing: constants, variables, array types, and subprograms.

use std::rc::Rc;

use super::core::{ParseResult, Parser};
use crate::ast::*;
use crate::error::ParserError;
use crate::lexer::TokenKind;
use crate::types::{ArrayType, ScopeLevel, Type};

fn is_decl_follower(kind: &TokenKind) -> bool {
    kind.is_initial_decl_starter() || kind.is_subprogram_decl_starter() || *kind == TokenKind::Begin
}

fn is_subprogram_follower(kind: &TokenKind) -> bool {
    kind.is_subprogram_decl_starter() || *kind == TokenKind::Begin
}

impl Parser {
    /// initialDecls = ( constDecl | arrayTypeDecl | varDecl )* .
    pub(crate) fn initial_decls(&mut self) -> Vec<DeclId> {
        let mut decls = Vec::new();

        while self.peek().kind.is_initial_decl_starter() {
            let result = match self.peek().kind {
                TokenKind::Const => self.const_decl().map(|id| vec![id]),
                TokenKind::Var => self.var_decl(),
                _ => self.array_type_decl().map(|id| vec![id]),
            };

            match result {
                Ok(ids) => decls.extend(ids),
                Err(e) => {
                    self.error(e);
                    self.recover(is_decl_follower);
                }
            }
        }

        decls
    }

    /// constDecl = "const" constId ":=" literal ";" .
    fn const_decl(&mut self) -> ParseResult<DeclId> {
        self.expect(&TokenKind::Const)?;
        let (name, span) = self.expect_identifier()?;
        self.expect(&TokenKind::Assign)?;
        let literal = self.literal()?;
        self.expect(&TokenKind::Semicolon)?;

        let level = self.scopes.current_level();
        Ok(self.declare(Declaration::new(
            name,
            span,
            literal.ty(),
            level,
            DeclKind::Const { literal },
        )))
    }

    /// varDecl = "var" identifiers ":" typeName ";" .
    fn var_decl(&mut self) -> ParseResult<Vec<DeclId>> {
        self.expect(&TokenKind::Var)?;

        let mut names = vec![self.expect_identifier()?];
        while self.match_token(&TokenKind::Comma) {
            names.push(self.expect_identifier()?);
        }

        self.expect(&TokenKind::Colon)?;
        let ty = self.type_name()?;
        self.expect(&TokenKind::Semicolon)?;

        let level = self.scopes.current_level();
        let ids = names
            .into_iter()
            .map(|(name, span)| {
                self.declare(Declaration::new(
                    name,
                    span,
                    ty.clone(),
                    level,
                    DeclKind::Var { rel_addr: 0 },
                ))
            })
            .collect();
        Ok(ids)
    }

    /// arrayTypeDecl = "type" typeId "=" "array" "[" intConstValue "]" "of" typeName ";" .
    fn array_type_decl(&mut self) -> ParseResult<DeclId> {
        self.expect(&TokenKind::Type)?;
        let (name, span) = self.expect_identifier()?;
        self.expect(&TokenKind::Equal)?;
        self.expect(&TokenKind::Array)?;
        self.expect(&TokenKind::LeftBracket)?;
        let num_elements = self.int_const_value()?;
        self.expect(&TokenKind::RightBracket)?;
        self.expect(&TokenKind::Of)?;
        let element_type = self.type_name()?;
        self.expect(&TokenKind::Semicolon)?;

        let count = num_elements.int_value().unwrap_or(0);
        let ty = Type::Array(Rc::new(ArrayType::new(name.clone(), count, element_type)));
        let level = self.scopes.current_level();
        Ok(self.declare(Declaration::new(
            name,
            span,
            ty,
            level,
            DeclKind::ArrayType { num_elements },
        )))
    }

    /// An integer literal or the name of an integer constant.
    fn int_const_value(&mut self) -> ParseResult<Literal> {
        let token = self.advance();
        match token.kind {
            TokenKind::IntLiteral(text) => Ok(Literal::Integer(text)),
            TokenKind::Identifier(name) => {
                let id = self
                    .lookup(&name)
                    .ok_or_else(|| ParserError::undeclared_identifier(&name, token.span))?;
                match &self.program.decls[id].kind {
                    DeclKind::Const {
                        literal: literal @ Literal::Integer(_),
                    } => Ok(literal.clone()),
                    _ => Err(ParserError::general(
                        format!("Identifier \"{}\" is not an integer constant.", name),
                        token.span,
                    )),
                }
            }
            other => Err(ParserError::unexpected_token(
                "integer constant",
                other.to_string(),
                token.span,
            )),
        }
    }

    /// literal = intLiteral | charLiteral | stringLiteral | "true" | "false" .
    pub(crate) fn literal(&mut self) -> ParseResult<Literal> {
        let literal = match &self.peek().kind {
            TokenKind::IntLiteral(text) => Literal::Integer(text.clone()),
            TokenKind::CharLiteral(text) => Literal::Char(text.clone()),
            TokenKind::StringLiteral(text) => Literal::String(text.clone()),
            TokenKind::True => Literal::Boolean(true),
            TokenKind::False => Literal::Boolean(false),
            _ => {
                return Err(ParserError::general(
                    "Invalid literal expression.",
                    self.current_span(),
                ))
            }
        };
        self.advance();
        Ok(literal)
    }

    /// typeName = "Integer" | "Boolean" | "Char" | typeId .
    pub(crate) fn type_name(&mut self) -> ParseResult<Type> {
        let token = self.advance();
        match token.kind {
            TokenKind::Integer => Ok(Type::Integer),
            TokenKind::Boolean => Ok(Type::Boolean),
            TokenKind::Char => Ok(Type::Char),
            TokenKind::Identifier(name) => {
                let id = self
                    .lookup(&name)
                    .ok_or_else(|| ParserError::undeclared_identifier(&name, token.span))?;
                let decl = &self.program.decls[id];
                match decl.kind {
                    DeclKind::ArrayType { .. } => Ok(decl.ty.clone()),
                    _ => Err(ParserError::general(
                        format!("Identifier \"{}\" is not a valid type name.", name),
                        token.span,
                    )),
                }
            }
            _ => Err(ParserError::general("Invalid type name.", token.span)),
        }
    }

    /// subprogramDecls = ( procedureDecl | functionDecl )* .
    pub(crate) fn subprogram_decls(&mut self) {
        while self.peek().kind.is_subprogram_decl_starter() {
            let kind = if self.check(&TokenKind::Procedure) {
                SubprogramKind::Procedure
            } else {
                SubprogramKind::Function
            };

            if let Err(e) = self.subprogram_decl(kind) {
                self.error(e);
                self.recover(is_subprogram_follower);
            }
        }
    }

    fn subprogram_decl(&mut self, kind: SubprogramKind) -> ParseResult<()> {
        let keyword = self.advance();
        let (name, span) = self.expect_identifier()?;

        let id = SubprogramId(self.program.subprograms.len());
        let decl = self.declare(Declaration::new(
            name.clone(),
            span,
            Type::None,
            ScopeLevel::Program,
            DeclKind::Subprogram { kind, id },
        ));
        self.program
            .subprograms
            .push(SubprogramDecl::new(decl, kind, keyword.span.merge(&span)));

        self.scopes.open_scope();
        let enclosing = self.current_subprogram.replace(id);
        let result = self.subprogram_rest(id, &name);
        self.current_subprogram = enclosing;
        self.scopes.close_scope();

        result
    }

    /// Everything after the subprogram name:
    ///
    /// ( formalParameters )? ( "return" typeName )? "is" initialDecls
    /// "begin" statements "end" subprogramId ";"
    fn subprogram_rest(&mut self, id: SubprogramId, name: &str) -> ParseResult<()> {
        if self.check(&TokenKind::LeftParen) {
            let params = self.formal_parameters()?;
            self.program.subprogram_mut(id).params = params;
        }

        if self.program.subprogram(id).is_function() {
            self.expect(&TokenKind::Return)?;
            let return_type = self.type_name()?;
            let decl = self.program.subprogram(id).decl;
            self.program.decls[decl].ty = return_type;
        }

        self.expect(&TokenKind::Is)?;
        let initial_decls = self.initial_decls();
        self.program.subprogram_mut(id).initial_decls = initial_decls;

        self.expect(&TokenKind::Begin)?;
        let statements = self.statements();
        self.program.subprogram_mut(id).statements = statements;
        self.expect(&TokenKind::End)?;

        let (end_name, end_span) = self.expect_identifier()?;
        if end_name != name {
            let message = if self.program.subprogram(id).is_function() {
                "Function name mismatch."
            } else {
                "Procedure name mismatch."
            };
            self.error(ParserError::general(message, end_span));
        }
        self.expect(&TokenKind::Semicolon)?;

        Ok(())
    }

    /// formalParameters = "(" parameterDecl ( "," parameterDecl )* ")" .
    fn formal_parameters(&mut self) -> ParseResult<Vec<DeclId>> {
        self.expect(&TokenKind::LeftParen)?;

        let mut params = vec![self.parameter_decl()?];
        while self.match_token(&TokenKind::Comma) {
            params.push(self.parameter_decl()?);
        }

        self.expect(&TokenKind::RightParen)?;
        Ok(params)
    }

    /// parameterDecl = ( "var" )? paramId ":" typeName .
    fn parameter_decl(&mut self) -> ParseResult<DeclId> {
        let is_var = self.match_token(&TokenKind::Var);
        let (name, span) = self.expect_identifier()?;
        self.expect(&TokenKind::Colon)?;
        let ty = self.type_name()?;

        Ok(self.declare(Declaration::new(
            name,
            span,
            ty,
            ScopeLevel::Subprogram,
            DeclKind::Param {
                is_var,
                rel_addr: 0,
            },
        )))
    }
}
