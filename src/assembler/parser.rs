//! Parser for symbolic assembly.
//!
//! ```text
//! program     = instruction* EOF ;
//! instruction = labelDef* ( opcode argument? | "DEFINT" identifier ) ;
//! ```
//!
//! The argument shape is fixed by the opcode. A malformed instruction is
//! reported and skipped; parsing resumes at the next label or opcode.

use crate::assembler::instruction::{IntArg, Instruction, InstructionKind};
use crate::assembler::token::{AsmToken, AsmTokenKind};
use crate::bytecode::{OpCode, OperandKind};
use crate::error::{AsmError, ErrorCollector};
use crate::lexer::decode_literal;
use crate::span::Span;

type AsmResult<T> = Result<T, AsmError>;

pub struct AsmParser {
    tokens: Vec<AsmToken>,
    current: usize,
    errors: ErrorCollector<AsmError>,
}

impl AsmParser {
    pub fn new(mut tokens: Vec<AsmToken>, max_errors: usize) -> Self {
        if tokens.last().map(|t| &t.kind) != Some(&AsmTokenKind::Eof) {
            let span = tokens.last().map(|t| t.span).unwrap_or_default();
            tokens.push(AsmToken::new(AsmTokenKind::Eof, span));
        }
        Self {
            tokens,
            current: 0,
            errors: ErrorCollector::new(max_errors),
        }
    }

    pub fn parse(mut self) -> Result<Vec<Instruction>, Vec<AsmError>> {
        let mut instructions = Vec::new();

        while !self.is_at_end() && !self.errors.limit_reached() {
            match self.instruction() {
                Ok(instruction) => instructions.push(instruction),
                Err(error) => {
                    self.errors.report(error);
                    self.synchronize();
                }
            }
        }

        self.errors.into_result(instructions)
    }

    fn instruction(&mut self) -> AsmResult<Instruction> {
        let mut labels = Vec::new();
        while let AsmTokenKind::LabelDef(name) = &self.peek().kind {
            labels.push(name.clone());
            self.advance();
        }

        let token = self.advance();
        let kind = match token.kind {
            AsmTokenKind::OpCode(op) => self.argument(op)?,
            AsmTokenKind::DefInt => match self.advance() {
                AsmToken {
                    kind: AsmTokenKind::Identifier(name),
                    ..
                } => InstructionKind::DefInt(name),
                other => return Err(invalid_argument("an identifier", other.span)),
            },
            other => {
                return Err(AsmError::syntax(
                    format!("Expecting an opcode but found \"{}\" instead", other),
                    token.span,
                ))
            }
        };

        Ok(Instruction::new(
            labels,
            kind,
            token.span.merge(&self.previous().span),
        ))
    }

    fn argument(&mut self, op: OpCode) -> AsmResult<InstructionKind> {
        match op.operand_kind() {
            OperandKind::None => Ok(InstructionKind::NoArg(op)),

            OperandKind::Byte => {
                let (value, _) = self.int_literal("an integer literal")?;
                Ok(InstructionKind::Byte(op, value))
            }

            OperandKind::Int => {
                if let AsmTokenKind::Identifier(name) = &self.peek().kind {
                    let name = name.clone();
                    self.advance();
                    return Ok(InstructionKind::Int(op, IntArg::Identifier(name)));
                }
                let (value, _) = self.int_literal("an integer literal or identifier")?;
                Ok(InstructionKind::Int(op, IntArg::Literal(value)))
            }

            OperandKind::Displacement => match self.advance() {
                AsmToken {
                    kind: AsmTokenKind::Identifier(label),
                    ..
                } => Ok(InstructionKind::Branch(op, label)),
                other => Err(invalid_argument("a label", other.span)),
            },

            OperandKind::Char => match self.advance() {
                AsmToken {
                    kind: AsmTokenKind::CharLiteral(text),
                    span,
                } => {
                    let mut units = decode_literal(&text).encode_utf16().collect::<Vec<_>>();
                    match (units.pop(), units.is_empty()) {
                        (Some(code), true) => Ok(InstructionKind::Char(code)),
                        _ => Err(AsmError::syntax(
                            format!("Invalid char literal {}", text),
                            span,
                        )),
                    }
                }
                other => Err(invalid_argument("a char literal", other.span)),
            },

            OperandKind::String => match self.advance() {
                AsmToken {
                    kind: AsmTokenKind::StringLiteral(text),
                    ..
                } => Ok(InstructionKind::Str(decode_literal(&text))),
                other => Err(invalid_argument("a string literal", other.span)),
            },
        }
    }

    fn int_literal(&mut self, shape: &str) -> AsmResult<(i32, Span)> {
        let token = self.advance();
        match token.kind {
            AsmTokenKind::IntLiteral(text) => text
                .parse::<i32>()
                .map(|value| (value, token.span))
                .map_err(|_| {
                    AsmError::syntax(
                        format!("Integer literal {} is out of range", text),
                        token.span,
                    )
                }),
            _ => Err(invalid_argument(shape, token.span)),
        }
    }

    /// Skip to the start of the next instruction.
    fn synchronize(&mut self) {
        while !self.is_at_end() && !self.peek().kind.starts_instruction() {
            self.advance();
        }
    }

    fn advance(&mut self) -> AsmToken {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn peek(&self) -> &AsmToken {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn previous(&self) -> &AsmToken {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == AsmTokenKind::Eof
    }
}

fn invalid_argument(shape: &str, span: Span) -> AsmError {
    AsmError::syntax(
        format!("Invalid type for argument -- should be {}", shape),
        span,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::scanner::AsmScanner;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Result<Vec<Instruction>, Vec<AsmError>> {
        let tokens = AsmScanner::new(source).scan_tokens().unwrap();
        AsmParser::new(tokens, 10).parse()
    }

    fn kinds(source: &str) -> Vec<InstructionKind> {
        parse(source).unwrap().into_iter().map(|i| i.kind).collect()
    }

    #[test]
    fn test_argument_shapes() {
        assert_eq!(
            kinds("LDCB 1 LDCINT -5 LDLADDR x BR L1 LDCCH 'a' LDCSTR \"hi\" DEFINT x PUTEOL"),
            vec![
                InstructionKind::Byte(OpCode::Ldcb, 1),
                InstructionKind::Int(OpCode::LdcInt, IntArg::Literal(-5)),
                InstructionKind::Int(OpCode::LdlAddr, IntArg::Identifier("x".into())),
                InstructionKind::Branch(OpCode::Br, "L1".into()),
                InstructionKind::Char(u16::from(b'a')),
                InstructionKind::Str("hi".into()),
                InstructionKind::DefInt("x".into()),
                InstructionKind::NoArg(OpCode::PutEol),
            ]
        );
    }

    #[test]
    fn test_labels_attach_to_next_instruction() {
        let instructions = parse("L1:\nL2:\n   HALT\nL3: ADD").unwrap();
        assert_eq!(instructions[0].labels, vec!["L1".to_string(), "L2".to_string()]);
        assert_eq!(instructions[1].labels, vec!["L3".to_string()]);
    }

    #[test]
    fn test_escaped_literals_are_decoded() {
        assert_eq!(
            kinds("LDCCH '\\t' LDCSTR \"a\\nb\""),
            vec![
                InstructionKind::Char(u16::from(b'\t')),
                InstructionKind::Str("a\nb".into()),
            ]
        );
    }

    #[test]
    fn test_wrong_argument_shape() {
        let errors = parse("BR 12\nLDCINT 'c'\nLDCCH 5\nHALT").unwrap_err();
        let messages: Vec<&str> = errors.iter().map(|e| e.message()).collect();
        assert_eq!(
            messages,
            vec![
                "Invalid type for argument -- should be a label",
                "Invalid type for argument -- should be an integer literal or identifier",
                "Invalid type for argument -- should be a char literal",
            ]
        );
        assert_eq!(errors[1].span().line, 2);
    }

    #[test]
    fn test_missing_opcode() {
        let errors = parse("L1: 42").unwrap_err();
        assert_eq!(
            errors[0].message(),
            "Expecting an opcode but found \"42\" instead"
        );
    }

    #[test]
    fn test_out_of_range_literal() {
        let errors = parse("LDCINT 99999999999").unwrap_err();
        assert_eq!(
            errors[0].message(),
            "Integer literal 99999999999 is out of range"
        );
    }
}
