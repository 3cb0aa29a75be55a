//! CPRL object code: the instruction set, machine constants, and a
//! disassembler for inspecting `.obj` files.
//!
//! # Architecture
//!
//! - `instruction`: opcode definitions and operand shapes
//! - `constants`: byte sizes shared by the code generator, assembler, and VM
//! - `disassembler`: human-readable listing of object code

pub mod constants;
pub mod disassembler;
pub mod instruction;

pub use disassembler::disassemble;
pub use instruction::{OpCode, OperandKind};
