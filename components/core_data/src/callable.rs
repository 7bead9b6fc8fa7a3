//! Invocable instances binding a chunk to captured state.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::heap::{defer_release, Heap};
use crate::chunk::Chunk;
use crate::value::Value;

/// A chunk paired with its captured upvalues and named locals.
///
/// Several callables may share one chunk while owning independent upvalue
/// arrays. The named-local map is reflection state for hosts and debuggers;
/// instruction dispatch never consults it.
pub struct Callable {
    chunk: Rc<Chunk>,
    ups: Vec<Value>,
    locals: HashMap<String, Value>,
}

impl Callable {
    /// Creates a callable over `chunk` with `ups_count` upvalue slots, all
    /// initially Undefined.
    pub fn new(chunk: Rc<Chunk>, ups_count: usize) -> Callable {
        Callable {
            chunk,
            ups: vec![Value::Undefined; ups_count],
            locals: HashMap::new(),
        }
    }

    /// The chunk this callable executes.
    pub fn chunk(&self) -> &Rc<Chunk> {
        &self.chunk
    }

    /// The heap the chunk is bound to, if it is still alive.
    pub fn heap(&self) -> Option<Heap> {
        self.chunk.heap()
    }

    /// The chunk's materialized constant at `index`.
    pub fn constant(&self, index: usize) -> Option<&Value> {
        self.chunk.constant(index)
    }

    /// Number of constants in the chunk's pool.
    pub fn constants_count(&self) -> usize {
        self.chunk.constants_count()
    }

    /// The chunk's nested chunk at `index`.
    pub fn nested(&self, index: usize) -> Option<&Rc<Chunk>> {
        self.chunk.nested(index)
    }

    /// Number of nested chunks.
    pub fn nested_count(&self) -> usize {
        self.chunk.nested_count()
    }

    /// The chunk's packed instruction stream.
    pub fn instructions(&self) -> &[u8] {
        self.chunk.instructions()
    }

    /// Number of declared variable slots.
    pub fn vars_count(&self) -> usize {
        self.chunk.vars_count()
    }

    /// Number of declared temporary slots.
    pub fn temps_count(&self) -> usize {
        self.chunk.temps_count()
    }

    /// Frame slots the chunk needs, receiver slot not included.
    pub fn stack_count(&self) -> usize {
        self.chunk.stack_count()
    }

    /// Number of upvalue slots.
    pub fn ups_count(&self) -> usize {
        self.ups.len()
    }

    /// View of the captured upvalues.
    pub fn ups(&self) -> &[Value] {
        &self.ups
    }

    /// Copies values from `source` into the upvalue slots, element by
    /// element, stopping at the shorter side.
    pub fn set_ups(&mut self, source: &[Value]) {
        for (slot, value) in self.ups.iter_mut().zip(source) {
            *slot = value.clone();
        }
    }

    /// Copies the upvalue slots into `target`, element by element, stopping
    /// at the shorter side.
    pub fn get_ups(&self, target: &mut [Value]) {
        for (slot, value) in target.iter_mut().zip(&self.ups) {
            *slot = value.clone();
        }
    }

    /// Records a named local, replacing any previous value under `name`.
    pub fn set_local(&mut self, name: impl Into<String>, value: Value) {
        self.locals.insert(name.into(), value);
    }

    /// The named local under `name`, or Undefined when absent.
    pub fn local(&self, name: &str) -> Value {
        self.locals.get(name).cloned().unwrap_or(Value::Undefined)
    }

    /// Number of recorded named locals.
    pub fn locals_count(&self) -> usize {
        self.locals.len()
    }

    pub(crate) fn release_values(&mut self) {
        if self.ups.is_empty() && self.locals.is_empty() {
            return;
        }
        defer_release(
            self.ups
                .drain(..)
                .chain(self.locals.drain().map(|(_, value)| value)),
        );
    }
}

impl Drop for Callable {
    fn drop(&mut self) {
        self.release_values();
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("chunk", &self.chunk)
            .field("ups", &self.ups.len())
            .field("locals", &self.locals.len())
            .finish()
    }
}
