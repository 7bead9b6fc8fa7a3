//! Executable program units.

use std::fmt;
use std::rc::Rc;

use crate::constant::Constant;
use crate::heap::{Heap, WeakHeap};
use crate::value::Value;

/// One compiled unit of bytecode bound to the heap it runs against.
///
/// A chunk owns its instruction bytes, its nested chunks, and a constant pool
/// that is materialized exactly once at construction: every string constant
/// becomes one heap block for the chunk's whole lifetime, so repeated loads
/// of the same constant share a single block.
///
/// The heap reference is non-owning. Chunks keep working after teardown
/// (string constants are unaffected by it), but [`Chunk::heap`] then reports
/// the heap as gone.
///
/// Chunks move but never copy.
pub struct Chunk {
    heap: WeakHeap,
    nested: Vec<Rc<Chunk>>,
    constants: Vec<Value>,
    instructions: Vec<u8>,
    vars_count: usize,
    temps_count: usize,
}

impl Chunk {
    /// Builds a chunk, taking ownership of `nested` and materializing
    /// `constants` on `heap`.
    pub fn new(
        heap: &Heap,
        nested: Vec<Chunk>,
        constants: &[Constant],
        instructions: &[u8],
        vars_count: usize,
        temps_count: usize,
    ) -> Chunk {
        Chunk {
            heap: heap.downgrade(),
            nested: nested.into_iter().map(Rc::new).collect(),
            constants: constants
                .iter()
                .map(|constant| constant.make_value(heap))
                .collect(),
            instructions: instructions.to_vec(),
            vars_count,
            temps_count,
        }
    }

    /// The heap this chunk's constants live on, if it is still alive.
    pub fn heap(&self) -> Option<Heap> {
        self.heap.upgrade()
    }

    /// The nested chunk at `index`.
    pub fn nested(&self, index: usize) -> Option<&Rc<Chunk>> {
        self.nested.get(index)
    }

    /// Number of nested chunks.
    pub fn nested_count(&self) -> usize {
        self.nested.len()
    }

    /// The materialized constant at `index`.
    pub fn constant(&self, index: usize) -> Option<&Value> {
        self.constants.get(index)
    }

    /// Number of constants in the pool.
    pub fn constants_count(&self) -> usize {
        self.constants.len()
    }

    /// The packed instruction stream.
    pub fn instructions(&self) -> &[u8] {
        &self.instructions
    }

    /// Number of instruction bytes.
    pub fn instructions_len(&self) -> usize {
        self.instructions.len()
    }

    /// Number of declared variable slots.
    pub fn vars_count(&self) -> usize {
        self.vars_count
    }

    /// Number of declared temporary slots.
    pub fn temps_count(&self) -> usize {
        self.temps_count
    }

    /// Frame slots this chunk needs, receiver slot not included.
    pub fn stack_count(&self) -> usize {
        self.vars_count + self.temps_count
    }
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("nested", &self.nested.len())
            .field("constants", &self.constants.len())
            .field("instructions", &self.instructions.len())
            .field("vars_count", &self.vars_count)
            .field("temps_count", &self.temps_count)
            .finish()
    }
}
