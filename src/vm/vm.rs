//! The virtual machine: registers, program loading, and the fetch loop.

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::io::{BufRead, Write};

use tracing::{debug, trace};

use crate::bytecode::constants::{BYTES_PER_ADDRESS, BYTES_PER_FRAME};
use crate::bytecode::OpCode;
use crate::config::Config;
use crate::error::VmError;

use super::vm_memory::displace;

/// The CPRL virtual machine.
pub struct Vm {
    pub(crate) memory: Vec<u8>,
    /// Address of the next instruction byte
    pub(crate) pc: i32,
    /// Base of the current frame
    pub(crate) bp: i32,
    /// Address of the top byte of the stack
    pub(crate) sp: i32,
    /// Stack base, one past the end of the loaded code
    pub(crate) sb: i32,
    /// Characters read from input but not yet consumed
    pub(crate) input: VecDeque<char>,
    running: bool,
    debug: bool,
}

impl Vm {
    pub fn new(config: &Config) -> Self {
        Self::with_memory_size(config.memory_size).with_debug(config.debug)
    }

    pub fn with_memory_size(memory_size: usize) -> Self {
        Self {
            memory: vec![0; memory_size],
            pc: 0,
            bp: 0,
            sp: -1,
            sb: 0,
            input: VecDeque::new(),
            running: false,
            debug: false,
        }
    }

    /// Trace every executed instruction.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Copy object code to address 0 and set up an empty stack after it.
    pub fn load(&mut self, code: &[u8]) -> Result<(), VmError> {
        if code.len() > self.memory.len() {
            return Err(VmError::OutOfMemory);
        }
        self.memory[..code.len()].copy_from_slice(code);

        self.pc = 0;
        self.sb = code.len() as i32;
        self.bp = self.sb;
        self.sp = self.bp - 1;
        self.input.clear();

        debug!(bytes = code.len(), memory = self.memory.len(), "program loaded");
        Ok(())
    }

    /// Execute the loaded program until HALT or a fault.
    pub fn run<R: BufRead, W: Write>(&mut self, input: &mut R, output: &mut W) -> Result<(), VmError> {
        self.running = true;
        let result = self.execute(input, output);
        self.running = false;

        // output written before a fault still reaches the caller
        output.flush()?;
        result
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    fn execute<R: BufRead, W: Write>(&mut self, input: &mut R, output: &mut W) -> Result<(), VmError> {
        while self.running {
            let op_addr = self.pc;
            let byte = self.fetch_byte()?;
            let op = OpCode::from_u8(byte).ok_or(VmError::InvalidOpcode {
                opcode: byte,
                address: op_addr as usize,
            })?;

            if self.debug {
                trace!(pc = op_addr, op = %op, bp = self.bp, sp = self.sp, "execute");
            }

            self.step(op, op_addr, input, output)?;
        }
        Ok(())
    }

    /// Execute one instruction whose opcode byte has been fetched.
    fn step<R: BufRead, W: Write>(
        &mut self,
        op: OpCode,
        op_addr: i32,
        input: &mut R,
        output: &mut W,
    ) -> Result<(), VmError> {
        match op {
            OpCode::Halt => self.running = false,

            // Load
            OpCode::Load => {
                let n = self.fetch_int()?;
                self.load_bytes(n)?;
            }
            OpCode::LoadB => self.load_bytes(1)?,
            OpCode::Load2B => self.load_bytes(2)?,
            OpCode::LoadW => self.load_bytes(4)?,
            OpCode::Ldcb => {
                let byte = self.fetch_byte()?;
                self.push_byte(byte)?;
            }
            OpCode::Ldcb0 => self.push_byte(0)?,
            OpCode::Ldcb1 => self.push_byte(1)?,
            OpCode::Ldcch => {
                let c = self.fetch_char()?;
                self.push_char(c)?;
            }
            OpCode::LdcInt => {
                let value = self.fetch_int()?;
                self.push_int(value)?;
            }
            OpCode::LdcInt0 => self.push_int(0)?,
            OpCode::LdcInt1 => self.push_int(1)?,
            OpCode::LdcStr => {
                let length = self.fetch_int()?;
                self.push_int(length)?;
                self.push_int(self.pc)?;
                self.pc = self.pc.wrapping_add(length.wrapping_mul(2));
            }
            OpCode::LdlAddr => {
                let disp = self.fetch_int()?;
                self.push_int(self.bp.wrapping_add(disp))?;
            }
            OpCode::LdgAddr => {
                let disp = self.fetch_int()?;
                self.push_int(self.sb.wrapping_add(disp))?;
            }

            // Store
            OpCode::Store => {
                let n = self.fetch_int()?;
                self.store_bytes(n)?;
            }
            OpCode::StoreB => self.store_bytes(1)?,
            OpCode::Store2B => self.store_bytes(2)?,
            OpCode::StoreW => self.store_bytes(4)?,

            // Compare and branch
            OpCode::Cmp => {
                let op2 = self.pop_int()?;
                let op1 = self.pop_int()?;
                let result: i8 = match op1.cmp(&op2) {
                    std::cmp::Ordering::Equal => 0,
                    std::cmp::Ordering::Greater => 1,
                    std::cmp::Ordering::Less => -1,
                };
                self.push_byte(result as u8)?;
            }
            OpCode::Br => {
                let disp = self.fetch_int()?;
                self.pc = op_addr.wrapping_add(disp);
            }
            OpCode::Bnz | OpCode::Bz | OpCode::Bg | OpCode::Bge | OpCode::Bl | OpCode::Ble => {
                let disp = self.fetch_int()?;
                let value = self.pop_byte()? as i8;
                if op.branch_taken(value) {
                    self.pc = op_addr.wrapping_add(disp);
                }
            }

            // Shift
            OpCode::Shl | OpCode::Shr => {
                let amount = (self.fetch_byte()? as i8 as i32 & 0x1F) as u32;
                let value = self.pop_int()?;
                let result = if op == OpCode::Shl {
                    value.wrapping_shl(amount)
                } else {
                    value.wrapping_shr(amount)
                };
                self.push_int(result)?;
            }

            // Logical
            OpCode::Not => {
                let value = self.pop_byte()?;
                self.push_byte(u8::from(value == 0))?;
            }

            // Arithmetic
            OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div | OpCode::Mod => {
                let op2 = self.pop_int()?;
                let op1 = self.pop_int()?;
                let result = match op {
                    OpCode::Add => op1.wrapping_add(op2),
                    OpCode::Sub => op1.wrapping_sub(op2),
                    OpCode::Mul => op1.wrapping_mul(op2),
                    _ if op2 == 0 => {
                        return Err(VmError::DivideByZero {
                            pc: op_addr as usize,
                        })
                    }
                    OpCode::Div => op1.wrapping_div(op2),
                    _ => op1.wrapping_rem(op2),
                };
                self.push_int(result)?;
            }
            OpCode::Neg => {
                let value = self.pop_int()?;
                self.push_int(value.wrapping_neg())?;
            }
            OpCode::Inc => {
                let value = self.pop_int()?;
                self.push_int(value.wrapping_add(1))?;
            }
            OpCode::Dec => {
                let value = self.pop_int()?;
                self.push_int(value.wrapping_sub(1))?;
            }

            // I/O
            OpCode::GetCh => self.get_ch(input)?,
            OpCode::GetInt => self.get_int(input)?,
            OpCode::PutByte => self.put_byte(output)?,
            OpCode::PutCh => self.put_ch(output)?,
            OpCode::PutInt => self.put_int(output)?,
            OpCode::PutEol => writeln!(output)?,
            OpCode::PutStr => self.put_str(output)?,

            // Program, subprogram, and stack management
            OpCode::Program => {
                let var_length = self.fetch_int()?;
                self.bp = self.sb;
                self.sp = self.bp - 1;
                self.grow(var_length)?;
            }
            OpCode::Proc | OpCode::Alloc => {
                let n = self.fetch_int()?;
                self.grow(n)?;
            }
            OpCode::Call => {
                let disp = self.fetch_int()?;
                self.push_int(self.bp)?;
                self.push_int(self.pc)?;
                self.bp = self.sp - BYTES_PER_FRAME + 1;
                self.pc = op_addr.wrapping_add(disp);
            }
            OpCode::Ret => {
                let param_length = self.fetch_int()?;
                let frame = self.bp;
                let dynamic_link = self.read_int(frame)?;
                let return_address =
                    self.read_int(displace(frame, i64::from(BYTES_PER_ADDRESS))?)?;
                self.set_sp(i64::from(frame) - i64::from(param_length) - 1)?;
                self.bp = dynamic_link;
                self.pc = return_address;
            }
        }

        Ok(())
    }

    /// Replace the address on top of the stack with `n` bytes read from it.
    fn load_bytes(&mut self, n: i32) -> Result<(), VmError> {
        let address = self.pop_int()?;
        let range = self.range(address, n)?;
        let bytes = self.memory[range].to_vec();
        self.push_bytes(&bytes)
    }

    /// Pop `n` bytes and then an address, and write the bytes there.
    fn store_bytes(&mut self, n: i32) -> Result<(), VmError> {
        let bytes = self.pop_bytes(n)?;
        let address = self.pop_int()?;
        let range = self.range(address, n)?;
        self.memory[range].copy_from_slice(&bytes);
        Ok(())
    }

    /// Registers and the live stack, one byte per line.
    pub fn dump_state(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "pc = {}, bp = {}, sp = {}, sb = {}",
            self.pc, self.bp, self.sp, self.sb
        );
        for address in self.sb.max(0)..=self.sp {
            let Ok(byte) = self.read_byte(address) else {
                break;
            };
            let marker = if address == self.bp { "  <- bp" } else { "" };
            let _ = writeln!(out, "{:>6}: {:>4}{}", address, byte as i8, marker);
        }
        out
    }
}
