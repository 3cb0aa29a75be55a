//! Memory access, stack operations, and operand fetch.

use crate::bytecode::constants::{BYTES_PER_CHAR, BYTES_PER_INTEGER};
use crate::error::VmError;

use super::vm::Vm;

/// `base + offset`, or a fault if the result is not a machine address.
pub(crate) fn displace(base: i32, offset: i64) -> Result<i32, VmError> {
    let address = i64::from(base) + offset;
    i32::try_from(address).map_err(|_| VmError::MemoryAccess { address })
}

impl Vm {
    /// Index range for `len` bytes at `address`, or a fault if any byte
    /// lies outside memory.
    pub(crate) fn range(&self, address: i32, len: i32) -> Result<std::ops::Range<usize>, VmError> {
        let end = i64::from(address) + i64::from(len);
        if address < 0 || len < 0 || end > self.memory.len() as i64 {
            return Err(VmError::MemoryAccess {
                address: i64::from(address),
            });
        }
        Ok(address as usize..end as usize)
    }

    pub(crate) fn read_byte(&self, address: i32) -> Result<u8, VmError> {
        let range = self.range(address, 1)?;
        Ok(self.memory[range.start])
    }

    pub(crate) fn read_int(&self, address: i32) -> Result<i32, VmError> {
        let range = self.range(address, BYTES_PER_INTEGER)?;
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.memory[range]);
        Ok(i32::from_be_bytes(bytes))
    }

    pub(crate) fn read_char(&self, address: i32) -> Result<u16, VmError> {
        let range = self.range(address, BYTES_PER_CHAR)?;
        Ok(u16::from_be_bytes([
            self.memory[range.start],
            self.memory[range.start + 1],
        ]))
    }

    // --- Stack ---

    /// Reserve `n` bytes on top of the stack without initializing them.
    pub(crate) fn grow(&mut self, n: i32) -> Result<(), VmError> {
        let sp = i64::from(self.sp) + i64::from(n);
        if sp >= self.memory.len() as i64 {
            return Err(VmError::OutOfMemory);
        }
        self.set_sp(sp)
    }

    /// Move the stack pointer, keeping it between one below address 0 and
    /// the end of memory.
    pub(crate) fn set_sp(&mut self, sp: i64) -> Result<(), VmError> {
        if sp < -1 || sp >= self.memory.len() as i64 {
            return Err(VmError::MemoryAccess { address: sp });
        }
        self.sp = sp as i32;
        Ok(())
    }

    pub(crate) fn push_bytes(&mut self, bytes: &[u8]) -> Result<(), VmError> {
        self.grow(bytes.len() as i32)?;
        let start = self.sp - bytes.len() as i32 + 1;
        let range = self.range(start, bytes.len() as i32)?;
        self.memory[range].copy_from_slice(bytes);
        Ok(())
    }

    /// Remove the top `n` bytes, returning them in memory order.
    pub(crate) fn pop_bytes(&mut self, n: i32) -> Result<Vec<u8>, VmError> {
        let start = displace(self.sp, 1 - i64::from(n))?;
        let range = self.range(start, n)?;
        let bytes = self.memory[range].to_vec();
        self.sp = start - 1;
        Ok(bytes)
    }

    pub(crate) fn push_byte(&mut self, byte: u8) -> Result<(), VmError> {
        self.push_bytes(&[byte])
    }

    pub(crate) fn pop_byte(&mut self) -> Result<u8, VmError> {
        let byte = self.read_byte(self.sp)?;
        self.sp -= 1;
        Ok(byte)
    }

    pub(crate) fn push_int(&mut self, value: i32) -> Result<(), VmError> {
        self.push_bytes(&value.to_be_bytes())
    }

    pub(crate) fn pop_int(&mut self) -> Result<i32, VmError> {
        let value = self.read_int(self.sp - BYTES_PER_INTEGER + 1)?;
        self.sp -= BYTES_PER_INTEGER;
        Ok(value)
    }

    pub(crate) fn push_char(&mut self, value: u16) -> Result<(), VmError> {
        self.push_bytes(&value.to_be_bytes())
    }

    pub(crate) fn pop_char(&mut self) -> Result<u16, VmError> {
        let value = self.read_char(self.sp - BYTES_PER_CHAR + 1)?;
        self.sp -= BYTES_PER_CHAR;
        Ok(value)
    }

    // --- Operand fetch ---

    pub(crate) fn fetch_byte(&mut self) -> Result<u8, VmError> {
        let byte = self.read_byte(self.pc)?;
        self.pc += 1;
        Ok(byte)
    }

    pub(crate) fn fetch_int(&mut self) -> Result<i32, VmError> {
        let value = self.read_int(self.pc)?;
        self.pc += BYTES_PER_INTEGER;
        Ok(value)
    }

    pub(crate) fn fetch_char(&mut self) -> Result<u16, VmError> {
        let value = self.read_char(self.pc)?;
        self.pc += BYTES_PER_CHAR;
        Ok(value)
    }
}
