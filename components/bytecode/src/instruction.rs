//! Argument codec and stream assembly.
//!
//! Instruction arguments are packed little-endian with no alignment, so all
//! access goes through byte-wise readers and writers.

use crate::opcode::Opcode;

/// Reads an unsigned byte argument at `offset`.
pub fn read_u8(code: &[u8], offset: usize) -> Option<u8> {
    code.get(offset).copied()
}

/// Reads a signed byte argument at `offset`.
pub fn read_i8(code: &[u8], offset: usize) -> Option<i8> {
    code.get(offset).map(|byte| *byte as i8)
}

/// Reads a little-endian unsigned word argument at `offset`.
pub fn read_u16(code: &[u8], offset: usize) -> Option<u16> {
    let end = offset.checked_add(2)?;
    let bytes = code.get(offset..end)?;
    Some(u16::from_le_bytes(bytes.try_into().ok()?))
}

/// Reads a little-endian unsigned long argument at `offset`.
pub fn read_u32(code: &[u8], offset: usize) -> Option<u32> {
    let end = offset.checked_add(4)?;
    let bytes = code.get(offset..end)?;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}

/// Overwrites an unsigned byte argument in place.
///
/// Returns `false` when `offset` is out of range, leaving `code` untouched.
pub fn write_u8(code: &mut [u8], offset: usize, value: u8) -> bool {
    match code.get_mut(offset) {
        Some(slot) => {
            *slot = value;
            true
        }
        None => false,
    }
}

/// Overwrites a little-endian unsigned word argument in place.
pub fn write_u16(code: &mut [u8], offset: usize, value: u16) -> bool {
    let Some(end) = offset.checked_add(2) else {
        return false;
    };
    match code.get_mut(offset..end) {
        Some(slot) => {
            slot.copy_from_slice(&value.to_le_bytes());
            true
        }
        None => false,
    }
}

/// Overwrites a little-endian unsigned long argument in place.
pub fn write_u32(code: &mut [u8], offset: usize, value: u32) -> bool {
    let Some(end) = offset.checked_add(4) else {
        return false;
    };
    match code.get_mut(offset..end) {
        Some(slot) => {
            slot.copy_from_slice(&value.to_le_bytes());
            true
        }
        None => false,
    }
}

/// Builder for packed instruction streams.
///
/// The assembler appends opcode and argument bytes in order and hands the
/// finished stream back as a plain byte vector. It does not validate that
/// argument counts match opcode encodings.
///
/// # Example
///
/// ```
/// use bytecode::{Assembler, Opcode};
///
/// let code = Assembler::new()
///     .op(Opcode::LoadcI)
///     .i8_arg(5)
///     .op(Opcode::Ret)
///     .finish();
/// assert_eq!(code, vec![Opcode::LoadcI.byte(), 5, Opcode::Ret.byte()]);
/// ```
#[derive(Debug, Default)]
pub struct Assembler {
    bytes: Vec<u8>,
}

impl Assembler {
    /// Creates an empty assembler.
    pub fn new() -> Self {
        Assembler { bytes: Vec::new() }
    }

    /// Appends an opcode byte.
    #[must_use]
    pub fn op(mut self, opcode: Opcode) -> Self {
        self.bytes.push(opcode.byte());
        self
    }

    /// Appends an unsigned byte argument.
    #[must_use]
    pub fn u8_arg(mut self, value: u8) -> Self {
        self.bytes.push(value);
        self
    }

    /// Appends a signed byte argument.
    #[must_use]
    pub fn i8_arg(mut self, value: i8) -> Self {
        self.bytes.push(value as u8);
        self
    }

    /// Appends a little-endian unsigned word argument.
    #[must_use]
    pub fn u16_arg(mut self, value: u16) -> Self {
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Appends a little-endian unsigned long argument.
    #[must_use]
    pub fn u32_arg(mut self, value: u32) -> Self {
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Appends raw bytes verbatim.
    #[must_use]
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Current stream length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether nothing has been emitted yet.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Consumes the assembler and returns the packed stream.
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}
