//! Statement parsing.

use super::core::{ParseResult, Parser};
use crate::ast::*;
use crate::error::ParserError;
use crate::lexer::TokenKind;

impl Parser {
    /// statements = ( statement )* .
    pub(crate) fn statements(&mut self) -> Vec<Stmt> {
        let mut stmts = Vec::new();

        while self.peek().kind.is_stmt_starter() {
            let start = self.current;
            match self.statement() {
                Ok(stmt) => stmts.push(stmt),
                Err(e) => {
                    self.error(e);
                    self.recover_statement();
                    if self.current == start {
                        self.advance();
                    }
                }
            }
        }

        stmts
    }

    /// Skip past the next ";" or up to the end of the enclosing statement list.
    fn recover_statement(&mut self) {
        while !self.is_at_end() {
            match self.peek().kind {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::End | TokenKind::Else | TokenKind::Elsif => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        match &self.peek().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                let span = self.current_span();
                let id = self
                    .lookup(&name)
                    .ok_or_else(|| ParserError::undeclared_identifier(&name, span))?;

                match self.program.decls[id].kind {
                    DeclKind::Var { .. } | DeclKind::Param { .. } => self.assignment_stmt(),
                    DeclKind::Subprogram {
                        kind: SubprogramKind::Procedure,
                        ..
                    } => self.procedure_call_stmt(),
                    _ => Err(ParserError::general(
                        format!("Identifier \"{}\" cannot start a statement.", name),
                        span,
                    )),
                }
            }
            TokenKind::If => self.if_stmt(),
            TokenKind::While | TokenKind::Loop => self.loop_stmt(),
            TokenKind::Exit => self.exit_stmt(),
            TokenKind::Read => self.read_stmt(),
            TokenKind::Write => self.write_stmt(),
            TokenKind::Writeln => self.writeln_stmt(),
            TokenKind::Return => self.return_stmt(),
            other => Err(ParserError::unexpected_token(
                "statement",
                other.to_string(),
                self.current_span(),
            )),
        }
    }

    /// assignmentStmt = variable ":=" expression ";" .
    fn assignment_stmt(&mut self) -> ParseResult<Stmt> {
        let variable = self.variable()?;
        self.expect(&TokenKind::Assign)?;
        let expr = self.expression()?;
        self.expect(&TokenKind::Semicolon)?;

        let span = variable.span.merge(&expr.span);
        Ok(Stmt::new(StmtKind::Assignment { variable, expr }, span))
    }

    /// procedureCallStmt = procId ( actualParameters )? ";" .
    fn procedure_call_stmt(&mut self) -> ParseResult<Stmt> {
        let (name, span) = self.expect_identifier()?;
        let procedure = self
            .lookup(&name)
            .ok_or_else(|| ParserError::undeclared_identifier(&name, span))?;
        let subprogram = match self.program.decls[procedure].kind {
            DeclKind::Subprogram { id, .. } => id,
            _ => {
                return Err(ParserError::general(
                    format!("Identifier \"{}\" is not a procedure.", name),
                    span,
                ))
            }
        };

        let args = if self.check(&TokenKind::LeftParen) {
            self.actual_parameters()?
        } else {
            Vec::new()
        };
        self.expect(&TokenKind::Semicolon)?;

        Ok(Stmt::new(
            StmtKind::ProcedureCall {
                procedure,
                subprogram,
                args,
            },
            span.merge(&self.previous_span()),
        ))
    }

    /// ifStmt = "if" expression "then" statements ( "elsif" expression "then" statements )*
    ///          ( "else" statements )? "end" "if" ";" .
    fn if_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.expect(&TokenKind::If)?.span;
        let condition = self.expression()?;
        self.expect(&TokenKind::Then)?;
        let then_stmts = self.statements();

        let mut elsif_parts = Vec::new();
        while self.check(&TokenKind::Elsif) {
            let span = self.advance().span;
            let condition = self.expression()?;
            self.expect(&TokenKind::Then)?;
            let statements = self.statements();
            elsif_parts.push(ElsifPart {
                condition,
                statements,
                span,
            });
        }

        let else_stmts = if self.match_token(&TokenKind::Else) {
            self.statements()
        } else {
            Vec::new()
        };

        self.expect(&TokenKind::End)?;
        self.expect(&TokenKind::If)?;
        self.expect(&TokenKind::Semicolon)?;

        Ok(Stmt::new(
            StmtKind::If {
                condition,
                then_stmts,
                elsif_parts,
                else_stmts,
            },
            start.merge(&self.previous_span()),
        ))
    }

    /// loopStmt = ( "while" expression )? "loop" statements "end" "loop" ";" .
    fn loop_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span();
        let while_expr = if self.match_token(&TokenKind::While) {
            Some(self.expression()?)
        } else {
            None
        };
        self.expect(&TokenKind::Loop)?;

        self.loop_depth += 1;
        let body = self.statements();
        self.loop_depth -= 1;

        self.expect(&TokenKind::End)?;
        self.expect(&TokenKind::Loop)?;
        self.expect(&TokenKind::Semicolon)?;

        Ok(Stmt::new(
            StmtKind::Loop { while_expr, body },
            start.merge(&self.previous_span()),
        ))
    }

    /// exitStmt = "exit" ( "when" expression )? ";" .
    fn exit_stmt(&mut self) -> ParseResult<Stmt> {
        let span = self.expect(&TokenKind::Exit)?.span;
        if self.loop_depth == 0 {
            self.error(ParserError::general(
                "Exit statement is not nested within a loop.",
                span,
            ));
        }

        let when_expr = if self.match_token(&TokenKind::When) {
            Some(self.expression()?)
        } else {
            None
        };
        self.expect(&TokenKind::Semicolon)?;

        Ok(Stmt::new(StmtKind::Exit { when_expr }, span))
    }

    /// readStmt = "read" variable ";" .
    fn read_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.expect(&TokenKind::Read)?.span;
        let variable = self.variable()?;
        self.expect(&TokenKind::Semicolon)?;

        let span = start.merge(&variable.span);
        Ok(Stmt::new(StmtKind::Read(variable), span))
    }

    /// writeStmt = "write" expressions ";" .
    fn write_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.expect(&TokenKind::Write)?.span;
        let exprs = self.expressions()?;
        self.expect(&TokenKind::Semicolon)?;

        Ok(Stmt::new(
            StmtKind::Write(exprs),
            start.merge(&self.previous_span()),
        ))
    }

    /// writelnStmt = "writeln" ( expressions )? ";" .
    fn writeln_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.expect(&TokenKind::Writeln)?.span;
        let exprs = if self.peek().kind.is_expr_starter() {
            self.expressions()?
        } else {
            Vec::new()
        };
        self.expect(&TokenKind::Semicolon)?;

        Ok(Stmt::new(
            StmtKind::Writeln(exprs),
            start.merge(&self.previous_span()),
        ))
    }

    /// returnStmt = "return" ( expression )? ";" .
    fn return_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.expect(&TokenKind::Return)?.span;
        let expr = if self.peek().kind.is_expr_starter() {
            Some(self.expression()?)
        } else {
            None
        };
        self.expect(&TokenKind::Semicolon)?;

        Ok(Stmt::new(
            StmtKind::Return {
                subprogram: self.current_subprogram,
                expr,
            },
            start,
        ))
    }

    /// expressions = expression ( "," expression )* .
    fn expressions(&mut self) -> ParseResult<Vec<Expr>> {
        let mut exprs = vec![self.expression()?];
        while self.match_token(&TokenKind::Comma) {
            exprs.push(self.expression()?);
        }
        Ok(exprs)
    }
}
