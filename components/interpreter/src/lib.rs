//! # Interpreter
//!
//! Stack-based execution core for compiled chunks:
//! - Shared value stack holding the vars, receiver, and temporaries of every
//!   active frame
//! - Bounded call stack that rejects overflow instead of aborting
//! - Single-loop byte dispatch driven by [`core_data::Callable`]
//! - Checked error slot on [`RuntimeState`]; failures never panic
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//!
//! use bytecode::{Assembler, Opcode};
//! use core_data::{Chunk, Constant, Heap, Value};
//! use interpreter::RuntimeState;
//!
//! let heap = Heap::new();
//! let code = Assembler::new()
//!     .op(Opcode::Loadc)
//!     .u8_arg(0)
//!     .op(Opcode::Ret)
//!     .finish();
//! let chunk = Chunk::new(&heap, Vec::new(), &[Constant::from(42)], &code, 0, 1);
//! let function = Value::from(heap.create_function(Rc::new(chunk), 0, "answer"));
//!
//! let mut state = RuntimeState::new();
//! let result = interpreter::call(&mut state, &function, &[]);
//! assert_eq!(result, Value::Integer(42));
//! assert!(!state.has_error());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod call_stack;
pub mod state;
pub mod value_stack;
pub mod vm;

// Re-export main types at crate root
pub use call_stack::{CallInfo, CallStack, CALL_INFO_COUNT};
pub use state::RuntimeState;
pub use value_stack::{ValueStack, DEFAULT_VALUE_COUNT};
pub use vm::{call, execute, invoke};
