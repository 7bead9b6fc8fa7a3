//! # Core Data
//!
//! Value model, heap, and program representation for the Karst execution
//! core.
//!
//! ## Features
//!
//! - Tagged [`Value`] union: inline scalars, reference-counted heap handles
//! - [`Heap`] allocation tracking with cycle-breaking teardown
//! - Move-only [`Chunk`] program units with a constant pool materialized
//!   once at construction
//! - [`Callable`] instances sharing a chunk while owning their upvalues
//! - Total scalar conversions that report [`CastError`] for heap kinds
//!
//! # Example
//!
//! ```
//! use core_data::{Heap, Value};
//!
//! let heap = Heap::new();
//! let greeting = Value::from(heap.create_string("hello"));
//! let copy = greeting.clone();
//!
//! assert_eq!(copy.ref_count(), Some(2));
//! assert_eq!(copy.to_string(), "hello");
//! assert_eq!(heap.live_blocks(), 1);
//!
//! drop(greeting);
//! drop(copy);
//! assert_eq!(heap.live_blocks(), 0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod callable;
pub mod chunk;
pub mod constant;
pub mod error;
pub mod heap;
pub mod objects;
pub mod value;

pub use callable::Callable;
pub use chunk::Chunk;
pub use constant::Constant;
pub use error::CastError;
pub use heap::{BlockData, Handle, Heap, WeakHeap};
pub use objects::{
    ArrayData, ArrayRef, DeriveMode, FunctionData, FunctionRef, IteratorData, IteratorRef,
    ObjectData, ObjectRef, Property, StringData, StringRef, UserdataData, UserdataRef,
};
pub use value::{DataType, Value};
