//! Address assignment and symbol resolution for one assembly unit.

use indexmap::IndexMap;
use tracing::debug;

use crate::assembler::instruction::{IntArg, Instruction, InstructionKind};
use crate::bytecode::constants::{BYTES_PER_FRAME, BYTES_PER_INTEGER};
use crate::error::{AsmError, ErrorCollector};

type SymbolMap = IndexMap<String, i32, ahash::RandomState>;

/// Label and `DEFINT` tables for a single assembly run.
///
/// Maps keep definition order so listings and debug output are stable.
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    labels: SymbolMap,
    identifiers: SymbolMap,
    next_offset: i32,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self {
            labels: SymbolMap::default(),
            identifiers: SymbolMap::default(),
            next_offset: BYTES_PER_FRAME,
        }
    }

    /// Give every instruction its byte address and bind labels and
    /// `DEFINT` identifiers.
    pub fn assign_addresses(
        &mut self,
        instructions: &mut [Instruction],
        errors: &mut ErrorCollector<AsmError>,
    ) {
        let mut address = 0;

        for instruction in instructions.iter_mut() {
            instruction.address = address;

            for label in &instruction.labels {
                if self.labels.contains_key(label) {
                    errors.report(AsmError::constraint(
                        "This label has already been defined.",
                        instruction.span,
                    ));
                } else {
                    self.labels.insert(label.clone(), address);
                }
            }

            if let InstructionKind::DefInt(name) = &instruction.kind {
                if self.identifiers.contains_key(name) {
                    errors.report(AsmError::constraint(
                        "This identifier has already been defined.",
                        instruction.span,
                    ));
                } else {
                    self.identifiers.insert(name.clone(), self.next_offset);
                    self.next_offset += BYTES_PER_INTEGER;
                }
            }

            address += instruction.size();
        }

        debug!(
            bytes = address,
            labels = self.labels.len(),
            identifiers = self.identifiers.len(),
            "addresses assigned"
        );
    }

    /// Verify that every referenced label and identifier is bound and that
    /// byte arguments fit in a byte.
    pub fn check_constraints(
        &self,
        instructions: &[Instruction],
        errors: &mut ErrorCollector<AsmError>,
    ) {
        for instruction in instructions {
            match &instruction.kind {
                InstructionKind::Branch(_, label) if !self.labels.contains_key(label) => {
                    errors.report(AsmError::constraint(
                        format!("label \"{}\" has not been defined.", label),
                        instruction.span,
                    ));
                }
                InstructionKind::Int(_, IntArg::Identifier(name))
                    if !self.identifiers.contains_key(name) =>
                {
                    errors.report(AsmError::constraint(
                        format!("identifier \"{}\" has not been defined.", name),
                        instruction.span,
                    ));
                }
                InstructionKind::Byte(op, value) if i8::try_from(*value).is_err() => {
                    errors.report(AsmError::constraint(
                        format!("Argument {} for {} does not fit in one byte.", value, op),
                        instruction.span,
                    ));
                }
                _ => {}
            }
        }
    }

    pub fn label_address(&self, label: &str) -> Option<i32> {
        self.labels.get(label).copied()
    }

    pub fn identifier_offset(&self, name: &str) -> Option<i32> {
        self.identifiers.get(name).copied()
    }

    /// Distance from the instruction to the label, in bytes.
    pub fn displacement(&self, instruction: &Instruction, label: &str) -> Option<i32> {
        self.label_address(label)
            .map(|target| target - instruction.address)
    }

    /// Labels in definition order with their addresses.
    pub fn labels(&self) -> impl Iterator<Item = (&str, i32)> {
        self.labels.iter().map(|(name, addr)| (name.as_str(), *addr))
    }
}

impl Default for ResolutionContext {
    fn default() -> Self {
        Self::new()
    }
}
