//! Object code disassembler for debugging.

use std::fmt::Write;

use crate::bytecode::instruction::{OpCode, OperandKind};
use crate::error::DisassemblyError;

/// Disassemble object code into one line per instruction.
///
/// Each line has the form `"{addr:>4}:  {MNEMONIC} {arg}"`. Branch operands
/// are shown as the raw displacement stored in the object code.
pub fn disassemble(code: &[u8]) -> Result<String, DisassemblyError> {
    let mut output = String::new();
    let mut offset = 0;

    while offset < code.len() {
        offset = disassemble_instruction(code, offset, &mut output)?;
    }

    Ok(output)
}

/// Disassemble the instruction at `offset`, returning the offset of the next one.
pub fn disassemble_instruction(
    code: &[u8],
    offset: usize,
    output: &mut String,
) -> Result<usize, DisassemblyError> {
    let byte = *code
        .get(offset)
        .ok_or(DisassemblyError::Truncated { address: offset })?;
    let opcode = OpCode::from_u8(byte).ok_or(DisassemblyError::InvalidOpcode {
        opcode: byte,
        address: offset,
    })?;

    let mut reader = OperandReader {
        code,
        address: offset,
        pos: offset + 1,
    };

    let operand = match opcode.operand_kind() {
        OperandKind::None => None,
        OperandKind::Byte => Some((reader.bytes::<1>()?[0] as i8).to_string()),
        OperandKind::Int | OperandKind::Displacement => {
            Some(i32::from_be_bytes(reader.bytes::<4>()?).to_string())
        }
        OperandKind::Char => {
            let c = reader.char()?;
            Some(format!("'{}'", c.escape_default()))
        }
        OperandKind::String => {
            let length = i32::from_be_bytes(reader.bytes::<4>()?);
            let mut text = String::new();
            for _ in 0..length.max(0) {
                text.push(reader.char()?);
            }
            Some(format!("\"{}\"", text.escape_default()))
        }
    };

    // Writing to a String cannot fail.
    let _ = match operand {
        Some(arg) => writeln!(output, "{:>4}:  {} {}", offset, opcode, arg),
        None => writeln!(output, "{:>4}:  {}", offset, opcode),
    };

    Ok(reader.pos)
}

struct OperandReader<'a> {
    code: &'a [u8],
    address: usize,
    pos: usize,
}

impl OperandReader<'_> {
    fn bytes<const N: usize>(&mut self) -> Result<[u8; N], DisassemblyError> {
        let slice = self
            .code
            .get(self.pos..self.pos + N)
            .ok_or(DisassemblyError::Truncated {
                address: self.address,
            })?;
        let mut buf = [0u8; N];
        buf.copy_from_slice(slice);
        self.pos += N;
        Ok(buf)
    }

    fn char(&mut self) -> Result<char, DisassemblyError> {
        let code = u16::from_be_bytes(self.bytes::<2>()?);
        Ok(char::from_u32(code as u32).unwrap_or(char::REPLACEMENT_CHARACTER))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_simple_instructions() {
        let code = [OpCode::LdcInt1 as u8, OpCode::PutInt as u8, OpCode::Halt as u8];
        let listing = disassemble(&code).unwrap();
        assert_eq!(listing, "   0:  LDCINT1\n   1:  PUTINT\n   2:  HALT\n");
    }

    #[test]
    fn test_operands() {
        let mut code = vec![OpCode::LdcInt as u8];
        code.extend_from_slice(&(-42i32).to_be_bytes());
        code.push(OpCode::Shl as u8);
        code.push(3);
        code.push(OpCode::Br as u8);
        code.extend_from_slice(&(-6i32).to_be_bytes());

        let listing = disassemble(&code).unwrap();
        assert_eq!(
            listing,
            "   0:  LDCINT -42\n   5:  SHL 3\n   7:  BR -6\n"
        );
    }

    #[test]
    fn test_char_and_string() {
        let mut code = vec![OpCode::Ldcch as u8, 0, b'x', OpCode::LdcStr as u8];
        code.extend_from_slice(&2i32.to_be_bytes());
        code.extend_from_slice(&[0, b'h', 0, b'i']);
        code.push(OpCode::Ldcch as u8);
        code.extend_from_slice(&[0, b'\n']);

        let listing = disassemble(&code).unwrap();
        assert_eq!(
            listing,
            "   0:  LDCCH 'x'\n   3:  LDCSTR \"hi\"\n  12:  LDCCH '\\n'\n"
        );
    }

    #[test]
    fn test_invalid_opcode() {
        let err = disassemble(&[OpCode::Halt as u8, 200]).unwrap_err();
        assert!(matches!(
            err,
            DisassemblyError::InvalidOpcode {
                opcode: 200,
                address: 1
            }
        ));
    }

    #[test]
    fn test_truncated_operand() {
        let err = disassemble(&[OpCode::LdcInt as u8, 0, 0]).unwrap_err();
        assert!(matches!(err, DisassemblyError::Truncated { address: 0 }));
    }
}
