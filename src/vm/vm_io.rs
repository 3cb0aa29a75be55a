//! Input and output instructions.

use std::io::{BufRead, Write};

use crate::bytecode::constants::BYTES_PER_CHAR;
use crate::error::VmError;

use super::vm::Vm;
use super::vm_memory::displace;

impl Vm {
    /// Next input character, reading another line when the buffer is empty.
    fn next_char<R: BufRead>(&mut self, input: &mut R) -> Result<Option<char>, VmError> {
        if self.input.is_empty() {
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.input.extend(line.chars());
        }
        Ok(self.input.pop_front())
    }

    fn peek_char<R: BufRead>(&mut self, input: &mut R) -> Result<Option<char>, VmError> {
        let c = self.next_char(input)?;
        if let Some(c) = c {
            self.input.push_front(c);
        }
        Ok(c)
    }

    pub(crate) fn get_ch<R: BufRead>(&mut self, input: &mut R) -> Result<(), VmError> {
        let c = self
            .next_char(input)?
            .ok_or_else(|| VmError::invalid_input("EOF"))?;
        // characters outside the BMP keep their first UTF-16 unit
        let mut units = [0u16; 2];
        let unit = c.encode_utf16(&mut units)[0];
        self.push_char(unit)
    }

    /// Read a whitespace-delimited integer token.
    pub(crate) fn get_int<R: BufRead>(&mut self, input: &mut R) -> Result<(), VmError> {
        while let Some(c) = self.peek_char(input)? {
            if !c.is_whitespace() {
                break;
            }
            self.input.pop_front();
        }

        let mut token = String::new();
        while let Some(c) = self.peek_char(input)? {
            if c.is_whitespace() {
                break;
            }
            token.push(c);
            self.input.pop_front();
        }

        if token.is_empty() {
            return Err(VmError::invalid_input("EOF"));
        }
        let value = token.parse::<i32>().map_err(|_| {
            VmError::invalid_input(format!("\"{}\" is not a valid integer", token))
        })?;
        self.push_int(value)
    }

    pub(crate) fn put_byte<W: Write>(&mut self, output: &mut W) -> Result<(), VmError> {
        let byte = self.pop_byte()? as i8;
        write!(output, "{}", byte)?;
        Ok(())
    }

    pub(crate) fn put_ch<W: Write>(&mut self, output: &mut W) -> Result<(), VmError> {
        let unit = self.pop_char()?;
        write!(output, "{}", decode_unit(unit))?;
        Ok(())
    }

    pub(crate) fn put_int<W: Write>(&mut self, output: &mut W) -> Result<(), VmError> {
        let value = self.pop_int()?;
        write!(output, "{}", value)?;
        Ok(())
    }

    /// Pops the address of the first character, then the length.
    pub(crate) fn put_str<W: Write>(&mut self, output: &mut W) -> Result<(), VmError> {
        let address = self.pop_int()?;
        let length = self.pop_int()?;

        let units = (0..length)
            .map(|i| {
                let offset = i64::from(i) * i64::from(BYTES_PER_CHAR);
                self.read_char(displace(address, offset)?)
            })
            .collect::<Result<Vec<u16>, _>>()?;
        let text: String = char::decode_utf16(units)
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect();
        write!(output, "{}", text)?;
        Ok(())
    }
}

fn decode_unit(unit: u16) -> char {
    char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER)
}
