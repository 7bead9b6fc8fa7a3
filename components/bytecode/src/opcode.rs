//! Opcode table for the packed instruction stream.
//!
//! Each entry documents its encoding as `(argument bytes): [pops] -> [pushes]`,
//! where pops and pushes refer to the temporary region of the current frame.

use std::fmt;

/// One opcode of the execution core.
///
/// Opcodes occupy a single byte in the instruction stream, immediately
/// followed by their argument bytes (if any) in little-endian order.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// (0): \[0\] -> \[0\]
    Nop = 0,

    /// (0): \[1\] -> \[0\]
    Pop,
    /// (0): \[2\] -> \[0\]
    Pop2,

    /// (0): \[2\] -> \[2\]
    Swap,

    /// (0): \[1\] -> \[2\]
    Dup,
    /// (0): \[2\] -> \[3\]
    DupX1,
    /// (0): \[3\] -> \[4\]
    DupX2,

    /// (0): \[0\] -> \[1\]
    LoadcU,
    /// (1): \[0\] -> \[1\]
    LoadcB,
    /// (1): \[0\] -> \[1\]
    LoadcI,
    /// (1): \[0\] -> \[1\]
    LoadcR,
    /// (1): \[0\] -> \[1\]
    Loadc,
    /// (2): \[0\] -> \[1\]
    LoadcW,
    /// (4): \[0\] -> \[1\]
    LoadcL,

    /// (0): \[0\] -> \[1\]
    LoadS,
    /// (0): \[0\] -> \[1\]
    Load0,
    /// (0): \[0\] -> \[1\]
    Load1,
    /// (0): \[0\] -> \[1\]
    Load2,
    /// (0): \[0\] -> \[1\]
    Load3,
    /// (1): \[0\] -> \[1\]
    Load,

    /// (0): \[0\] -> \[1\]
    NewArray,
    /// (1): \[0\] -> \[1\]
    NewArrayC,
    /// (0): \[1\] -> \[1\]
    NewArrayL,

    /// (0): \[1\] -> \[0\]
    StoreS,
    /// (0): \[1\] -> \[0\]
    Store0,
    /// (0): \[1\] -> \[0\]
    Store1,
    /// (0): \[1\] -> \[0\]
    Store2,
    /// (0): \[1\] -> \[0\]
    Store3,
    /// (1): \[1\] -> \[0\]
    Store,

    /// (0): \[1\] -> \[0\], leaves the frame with the popped temporary
    Ret,
    /// (0): \[0\] -> \[0\], leaves the frame with Undefined
    RetU,
}

/// Lookup table kept in byte order so `from_byte` stays a bounds check.
const OPCODES: [Opcode; Opcode::COUNT] = [
    Opcode::Nop,
    Opcode::Pop,
    Opcode::Pop2,
    Opcode::Swap,
    Opcode::Dup,
    Opcode::DupX1,
    Opcode::DupX2,
    Opcode::LoadcU,
    Opcode::LoadcB,
    Opcode::LoadcI,
    Opcode::LoadcR,
    Opcode::Loadc,
    Opcode::LoadcW,
    Opcode::LoadcL,
    Opcode::LoadS,
    Opcode::Load0,
    Opcode::Load1,
    Opcode::Load2,
    Opcode::Load3,
    Opcode::Load,
    Opcode::NewArray,
    Opcode::NewArrayC,
    Opcode::NewArrayL,
    Opcode::StoreS,
    Opcode::Store0,
    Opcode::Store1,
    Opcode::Store2,
    Opcode::Store3,
    Opcode::Store,
    Opcode::Ret,
    Opcode::RetU,
];

impl Opcode {
    /// Number of defined opcodes.
    pub const COUNT: usize = 31;

    /// Decodes a single instruction byte.
    ///
    /// Returns `None` for bytes outside the defined opcode range.
    pub fn from_byte(byte: u8) -> Option<Opcode> {
        OPCODES.get(byte as usize).copied()
    }

    /// The byte this opcode occupies in an instruction stream.
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Number of argument bytes following the opcode byte.
    pub const fn arg_width(self) -> usize {
        match self {
            Opcode::LoadcB
            | Opcode::LoadcI
            | Opcode::LoadcR
            | Opcode::Loadc
            | Opcode::Load
            | Opcode::NewArrayC
            | Opcode::Store => 1,
            Opcode::LoadcW => 2,
            Opcode::LoadcL => 4,
            _ => 0,
        }
    }

    /// Total encoded width, opcode byte included.
    pub const fn width(self) -> usize {
        1 + self.arg_width()
    }

    /// Assembly-style mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Nop => "NOP",
            Opcode::Pop => "POP",
            Opcode::Pop2 => "POP2",
            Opcode::Swap => "SWAP",
            Opcode::Dup => "DUP",
            Opcode::DupX1 => "DUP_X1",
            Opcode::DupX2 => "DUP_X2",
            Opcode::LoadcU => "LOADC_U",
            Opcode::LoadcB => "LOADC_B",
            Opcode::LoadcI => "LOADC_I",
            Opcode::LoadcR => "LOADC_R",
            Opcode::Loadc => "LOADC",
            Opcode::LoadcW => "LOADCW",
            Opcode::LoadcL => "LOADCL",
            Opcode::LoadS => "LOAD_S",
            Opcode::Load0 => "LOAD_0",
            Opcode::Load1 => "LOAD_1",
            Opcode::Load2 => "LOAD_2",
            Opcode::Load3 => "LOAD_3",
            Opcode::Load => "LOAD",
            Opcode::NewArray => "NEW_ARRAY",
            Opcode::NewArrayC => "NEW_ARRAY_C",
            Opcode::NewArrayL => "NEW_ARRAY_L",
            Opcode::StoreS => "STORE_S",
            Opcode::Store0 => "STORE_0",
            Opcode::Store1 => "STORE_1",
            Opcode::Store2 => "STORE_2",
            Opcode::Store3 => "STORE_3",
            Opcode::Store => "STORE",
            Opcode::Ret => "RET",
            Opcode::RetU => "RET_U",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
