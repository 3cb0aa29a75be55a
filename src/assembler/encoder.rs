//! Serialization of resolved instructions into object code.

use crate::assembler::instruction::{IntArg, Instruction, InstructionKind};
use crate::assembler::resolve::ResolutionContext;
use crate::error::EncodeError;

/// Encode instructions whose addresses have been assigned and whose
/// references all resolve in `context`.
pub fn encode(
    instructions: &[Instruction],
    context: &ResolutionContext,
) -> Result<Vec<u8>, EncodeError> {
    let capacity = instructions.iter().map(|i| i.size() as usize).sum();
    let mut code = Vec::with_capacity(capacity);

    for instruction in instructions {
        let Some(op) = instruction.opcode() else {
            // DEFINT
            continue;
        };
        code.push(u8::from(op));

        match &instruction.kind {
            InstructionKind::NoArg(_) | InstructionKind::DefInt(_) => {}

            InstructionKind::Byte(op, value) => {
                let byte = i8::try_from(*value).map_err(|_| EncodeError::ByteOutOfRange {
                    opcode: op.to_string(),
                    value: *value,
                    address: instruction.address,
                })?;
                code.push(byte as u8);
            }

            InstructionKind::Int(_, IntArg::Literal(value)) => {
                code.extend_from_slice(&value.to_be_bytes());
            }

            InstructionKind::Int(_, IntArg::Identifier(name)) => {
                let offset = context.identifier_offset(name).ok_or_else(|| {
                    EncodeError::Unresolved {
                        kind: "identifier",
                        name: name.clone(),
                        address: instruction.address,
                    }
                })?;
                code.extend_from_slice(&offset.to_be_bytes());
            }

            InstructionKind::Branch(_, label) => {
                let displacement = context.displacement(instruction, label).ok_or_else(|| {
                    EncodeError::Unresolved {
                        kind: "label",
                        name: label.clone(),
                        address: instruction.address,
                    }
                })?;
                code.extend_from_slice(&displacement.to_be_bytes());
            }

            InstructionKind::Char(unit) => code.extend_from_slice(&unit.to_be_bytes()),

            InstructionKind::Str(s) => {
                let units: Vec<u16> = s.encode_utf16().collect();
                code.extend_from_slice(&(units.len() as i32).to_be_bytes());
                for unit in units {
                    code.extend_from_slice(&unit.to_be_bytes());
                }
            }
        }
    }

    Ok(code)
}
