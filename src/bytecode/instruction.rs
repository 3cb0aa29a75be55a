//! Opcodes of the CPRL virtual machine.
//!
//! Byte values are part of the object file format and must not change.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::bytecode::constants::{BYTES_PER_CHAR, BYTES_PER_INTEGER};

/// Shape of the operand that follows an opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    None,
    /// One signed byte
    Byte,
    /// Four-byte big-endian signed integer
    Int,
    /// Four-byte displacement to a label
    Displacement,
    /// Two-byte character code
    Char,
    /// Four-byte length followed by that many two-byte characters
    String,
}

#[derive(
    Display,
    EnumString,
    IntoStaticStr,
    EnumIter,
    TryFromPrimitive,
    IntoPrimitive,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[repr(u8)]
pub enum OpCode {
    Halt = 0,

    // Load
    Load = 10,
    LoadB = 11,
    Load2B = 12,
    LoadW = 13,
    Ldcb = 14,
    Ldcch = 15,
    LdcInt = 16,
    LdcStr = 17,
    LdlAddr = 18,
    LdgAddr = 19,
    Ldcb0 = 20,
    Ldcb1 = 21,
    LdcInt0 = 22,
    LdcInt1 = 23,

    // Store
    Store = 30,
    StoreB = 31,
    Store2B = 32,
    StoreW = 33,

    // Compare and branch
    Cmp = 40,
    Br = 41,
    Bnz = 42,
    Bz = 43,
    Bg = 44,
    Bge = 45,
    Bl = 46,
    Ble = 47,

    // Shift
    Shl = 50,
    Shr = 51,

    // Logical
    Not = 60,

    // Arithmetic
    Add = 70,
    Sub = 71,
    Mul = 72,
    Div = 73,
    Mod = 74,
    Neg = 75,
    Inc = 76,
    Dec = 77,

    // I/O
    GetCh = 80,
    GetInt = 81,
    PutByte = 82,
    PutCh = 83,
    PutInt = 84,
    PutEol = 85,
    PutStr = 86,

    // Program, subprogram, and stack management
    Program = 90,
    Proc = 91,
    Call = 92,
    Ret = 93,
    Alloc = 94,
}

impl OpCode {
    pub fn from_u8(byte: u8) -> Option<OpCode> {
        OpCode::try_from(byte).ok()
    }

    pub fn mnemonic(self) -> &'static str {
        self.into()
    }

    pub fn operand_kind(self) -> OperandKind {
        match self {
            OpCode::Ldcb | OpCode::Shl | OpCode::Shr => OperandKind::Byte,

            OpCode::LdcInt
            | OpCode::Load
            | OpCode::Store
            | OpCode::Alloc
            | OpCode::LdlAddr
            | OpCode::LdgAddr
            | OpCode::Proc
            | OpCode::Program
            | OpCode::Ret => OperandKind::Int,

            OpCode::Br
            | OpCode::Bg
            | OpCode::Bge
            | OpCode::Bl
            | OpCode::Ble
            | OpCode::Bnz
            | OpCode::Bz
            | OpCode::Call => OperandKind::Displacement,

            OpCode::Ldcch => OperandKind::Char,
            OpCode::LdcStr => OperandKind::String,

            OpCode::Halt
            | OpCode::LoadB
            | OpCode::Load2B
            | OpCode::LoadW
            | OpCode::Ldcb0
            | OpCode::Ldcb1
            | OpCode::LdcInt0
            | OpCode::LdcInt1
            | OpCode::StoreB
            | OpCode::Store2B
            | OpCode::StoreW
            | OpCode::Cmp
            | OpCode::Not
            | OpCode::Add
            | OpCode::Sub
            | OpCode::Mul
            | OpCode::Div
            | OpCode::Mod
            | OpCode::Neg
            | OpCode::Inc
            | OpCode::Dec
            | OpCode::GetCh
            | OpCode::GetInt
            | OpCode::PutByte
            | OpCode::PutCh
            | OpCode::PutInt
            | OpCode::PutEol
            | OpCode::PutStr => OperandKind::None,
        }
    }

    /// Number of operand bytes, not counting the payload of a string literal.
    pub fn operand_size(self) -> i32 {
        match self.operand_kind() {
            OperandKind::None => 0,
            OperandKind::Byte => 1,
            OperandKind::Char => BYTES_PER_CHAR,
            OperandKind::Int | OperandKind::Displacement | OperandKind::String => {
                BYTES_PER_INTEGER
            }
        }
    }

    pub fn is_branch(self) -> bool {
        self.operand_kind() == OperandKind::Displacement && self != OpCode::Call
    }

    pub fn is_conditional_branch(self) -> bool {
        self.is_branch() && self != OpCode::Br
    }

    /// The conditional branch taken exactly when `self` is not.
    pub fn negated_branch(self) -> Option<OpCode> {
        match self {
            OpCode::Bz => Some(OpCode::Bnz),
            OpCode::Bnz => Some(OpCode::Bz),
            OpCode::Bl => Some(OpCode::Bge),
            OpCode::Bge => Some(OpCode::Bl),
            OpCode::Bg => Some(OpCode::Ble),
            OpCode::Ble => Some(OpCode::Bg),
            _ => None,
        }
    }

    /// Whether a conditional branch is taken for the given comparison byte.
    pub fn branch_taken(self, value: i8) -> bool {
        match self {
            OpCode::Br => true,
            OpCode::Bg => value > 0,
            OpCode::Bge => value >= 0,
            OpCode::Bl => value < 0,
            OpCode::Ble => value <= 0,
            OpCode::Bnz => value != 0,
            OpCode::Bz => value == 0,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_opcode_roundtrip() {
        for op in OpCode::iter() {
            let byte: u8 = op.into();
            assert_eq!(OpCode::from_u8(byte), Some(op));
        }
    }

    #[test]
    fn test_invalid_opcode() {
        assert!(OpCode::from_u8(1).is_none());
        assert!(OpCode::from_u8(255).is_none());
    }

    #[test]
    fn test_fixed_byte_values() {
        assert_eq!(u8::from(OpCode::Halt), 0);
        assert_eq!(u8::from(OpCode::LdcInt), 16);
        assert_eq!(u8::from(OpCode::Br), 41);
        assert_eq!(u8::from(OpCode::PutStr), 86);
        assert_eq!(u8::from(OpCode::Alloc), 94);
    }

    #[test]
    fn test_mnemonics() {
        assert_eq!(OpCode::Load2B.mnemonic(), "LOAD2B");
        assert_eq!(OpCode::LdcInt0.to_string(), "LDCINT0");
        assert_eq!(OpCode::from_str("ldladdr").unwrap(), OpCode::LdlAddr);
        assert_eq!(OpCode::from_str("PutEol").unwrap(), OpCode::PutEol);
        assert!(OpCode::from_str("DEFINT").is_err());
    }

    #[test]
    fn test_operand_sizes() {
        assert_eq!(OpCode::Add.operand_size(), 0);
        assert_eq!(OpCode::Ldcb.operand_size(), 1);
        assert_eq!(OpCode::Ldcch.operand_size(), 2);
        assert_eq!(OpCode::Call.operand_size(), 4);
        assert_eq!(OpCode::LdcStr.operand_size(), 4);
    }

    #[test]
    fn test_negated_branches_are_complementary() {
        for op in OpCode::iter().filter(|op| op.is_conditional_branch()) {
            let negated = op.negated_branch().unwrap();
            for value in [-1i8, 0, 1] {
                assert_ne!(op.branch_taken(value), negated.branch_taken(value));
            }
        }
    }
}
