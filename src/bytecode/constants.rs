//! Sizes shared by the code generator, the assembler, and the virtual machine.

pub const BYTES_PER_OPCODE: i32 = 1;
pub const BYTES_PER_INTEGER: i32 = 4;
pub const BYTES_PER_ADDRESS: i32 = 4;
pub const BYTES_PER_CHAR: i32 = 2;
pub const BYTES_PER_BOOLEAN: i32 = 1;

/// Frame header: dynamic link followed by the return address.
pub const BYTES_PER_FRAME: i32 = 2 * BYTES_PER_ADDRESS;

/// Boolean values as stored in memory.
pub const FALSE: u8 = 0;
pub const TRUE: u8 = 1;
