//! Expression parsing.

use super::core::{ParseResult, Parser};
use crate::ast::*;
use crate::error::ParserError;
use crate::lexer::TokenKind;
use crate::types::Type;

impl Parser {
    /// expression = relation ( ( "and" | "or" ) relation )* .
    pub(crate) fn expression(&mut self) -> ParseResult<Expr> {
        let mut expr = self.relation()?;

        loop {
            let operator = match self.peek().kind {
                TokenKind::And => BinaryOp::And,
                TokenKind::Or => BinaryOp::Or,
                _ => break,
            };
            self.advance();
            let right = self.relation()?;
            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    /// relation = simpleExpr ( relationalOp simpleExpr )? .
    fn relation(&mut self) -> ParseResult<Expr> {
        let left = self.simple_expr()?;

        let operator = match self.peek().kind {
            TokenKind::Equal => BinaryOp::Equal,
            TokenKind::NotEqual => BinaryOp::NotEqual,
            TokenKind::Less => BinaryOp::Less,
            TokenKind::LessEqual => BinaryOp::LessEqual,
            TokenKind::Greater => BinaryOp::Greater,
            TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.simple_expr()?;

        Ok(binary(left, operator, right))
    }

    /// simpleExpr = ( "+" | "-" )? term ( ( "+" | "-" ) term )* .
    fn simple_expr(&mut self) -> ParseResult<Expr> {
        let sign = match self.peek().kind {
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Negate),
            _ => None,
        };

        let mut expr = match sign {
            Some(operator) => {
                let start = self.advance().span;
                let operand = self.term()?;
                let span = start.merge(&operand.span);
                Expr::new(
                    ExprKind::Unary {
                        operator,
                        operand: Box::new(operand),
                    },
                    Type::Integer,
                    span,
                )
            }
            None => self.term()?,
        };

        loop {
            let operator = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.term()?;
            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    /// term = factor ( ( "*" | "/" | "mod" ) factor )* .
    fn term(&mut self) -> ParseResult<Expr> {
        let mut expr = self.factor()?;

        loop {
            let operator = match self.peek().kind {
                TokenKind::Star => BinaryOp::Multiply,
                TokenKind::Slash => BinaryOp::Divide,
                TokenKind::Mod => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.factor()?;
            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    /// factor = "not" factor | constValue | namedValue | functionCall | "(" expression ")" .
    fn factor(&mut self) -> ParseResult<Expr> {
        let span = self.current_span();

        match &self.peek().kind {
            TokenKind::Not => {
                self.advance();
                let operand = self.factor()?;
                let span = span.merge(&operand.span);
                Ok(Expr::new(
                    ExprKind::Unary {
                        operator: UnaryOp::Not,
                        operand: Box::new(operand),
                    },
                    Type::Boolean,
                    span,
                ))
            }
            kind if kind.is_literal() => {
                let literal = self.literal()?;
                let ty = literal.ty();
                Ok(Expr::new(
                    ExprKind::ConstValue {
                        literal,
                        decl: None,
                    },
                    ty,
                    span,
                ))
            }
            TokenKind::Identifier(name) => {
                let name = name.clone();
                let id = self
                    .lookup(&name)
                    .ok_or_else(|| ParserError::undeclared_identifier(&name, span))?;

                let decl = &self.program.decls[id];
                match &decl.kind {
                    DeclKind::Const { literal } => {
                        let expr = Expr::new(
                            ExprKind::ConstValue {
                                literal: literal.clone(),
                                decl: Some(id),
                            },
                            decl.ty.clone(),
                            span,
                        );
                        self.advance();
                        Ok(expr)
                    }
                    DeclKind::Var { .. } | DeclKind::Param { .. } => {
                        let variable = self.variable()?;
                        let ty = variable.ty.clone();
                        let span = variable.span;
                        Ok(Expr::new(ExprKind::NamedValue(variable), ty, span))
                    }
                    DeclKind::Subprogram {
                        kind: SubprogramKind::Function,
                        id: subprogram,
                    } => {
                        let subprogram = *subprogram;
                        self.function_call(id, subprogram)
                    }
                    _ => Err(ParserError::general(
                        format!("Identifier \"{}\" is not valid as an expression.", name),
                        span,
                    )),
                }
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.expect(&TokenKind::RightParen)?;
                Ok(expr)
            }
            _ => Err(ParserError::general("Invalid expression.", span)),
        }
    }

    /// functionCall = funcId ( actualParameters )? .
    fn function_call(&mut self, function: DeclId, subprogram: SubprogramId) -> ParseResult<Expr> {
        let start = self.advance().span;
        let args = if self.check(&TokenKind::LeftParen) {
            self.actual_parameters()?
        } else {
            Vec::new()
        };

        let ty = self.program.decls[function].ty.clone();
        Ok(Expr::new(
            ExprKind::FunctionCall {
                function,
                subprogram,
                args,
            },
            ty,
            start.merge(&self.previous_span()),
        ))
    }

    /// actualParameters = "(" expressions ")" .
    pub(crate) fn actual_parameters(&mut self) -> ParseResult<Vec<Expr>> {
        self.expect(&TokenKind::LeftParen)?;
        let mut args = vec![self.expression()?];
        while self.match_token(&TokenKind::Comma) {
            args.push(self.expression()?);
        }
        self.expect(&TokenKind::RightParen)?;
        Ok(args)
    }

    /// variable = ( varId | paramId ) ( "[" expression "]" )* .
    pub(crate) fn variable(&mut self) -> ParseResult<Variable> {
        let (name, span) = self.expect_identifier()?;
        let id = self
            .lookup(&name)
            .ok_or_else(|| ParserError::undeclared_identifier(&name, span))?;

        let decl = &self.program.decls[id];
        if !decl.is_variable() {
            return Err(ParserError::general(
                format!("Identifier \"{}\" is not a variable.", name),
                span,
            ));
        }

        let mut variable = Variable::new(id, decl.ty.clone(), span);
        while self.match_token(&TokenKind::LeftBracket) {
            let index = self.expression()?;
            self.expect(&TokenKind::RightBracket)?;
            variable.index_exprs.push(index);
        }
        variable.span = span.merge(&self.previous_span());

        Ok(variable)
    }
}

fn binary(left: Expr, operator: BinaryOp, right: Expr) -> Expr {
    let span = left.span.merge(&right.span);
    let ty = if operator.is_arithmetic() {
        Type::Integer
    } else {
        Type::Boolean
    };
    Expr::new(
        ExprKind::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        },
        ty,
        span,
    )
}
