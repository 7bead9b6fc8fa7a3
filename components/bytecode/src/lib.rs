//! # Bytecode
//!
//! Instruction set definition and wire codec for the Karst execution core.
//!
//! ## Features
//!
//! - Single-byte opcodes with packed little-endian arguments
//! - Bounds-checked argument readers and in-place writers
//! - [`Assembler`] for building instruction streams in tests and tools
//!
//! Instruction streams are plain byte vectors. Decoding is table-driven and
//! total: every byte either maps to an [`Opcode`] or is reported as invalid
//! by the consumer.
//!
//! # Example
//!
//! ```
//! use bytecode::{Assembler, Opcode};
//!
//! let code = Assembler::new()
//!     .op(Opcode::LoadcU)
//!     .op(Opcode::Ret)
//!     .finish();
//!
//! assert_eq!(Opcode::from_byte(code[0]), Some(Opcode::LoadcU));
//! assert_eq!(Opcode::LoadcU.width(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod instruction;
pub mod opcode;

pub use instruction::Assembler;
pub use opcode::Opcode;
