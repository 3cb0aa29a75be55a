//! Stack-based virtual machine for CPRL object code.
//!
//! Memory is one byte array. Code is loaded at address 0 and the stack
//! starts right after it, growing toward higher addresses. All multi-byte
//! values are big-endian.

#[allow(clippy::module_inception)]
pub mod vm;
mod vm_io;
mod vm_memory;

pub use vm::Vm;
