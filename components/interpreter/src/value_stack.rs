//! Frame-shared value storage.

use std::fmt;
use std::mem;

use core_data::Value;

/// Slots the stack reserves up front; growth proceeds in multiples of this.
pub const DEFAULT_VALUE_COUNT: usize = 8192;

/// The shared slot stack all call frames live on.
///
/// Frames are half-open slot ranges addressed by offset from the stack
/// bottom. [`ValueStack::push`] opens a frame and returns its base offset;
/// [`ValueStack::pop`] is the only operation that destroys frame slots, so
/// every exit path of a frame, error exits included, must run it.
pub struct ValueStack {
    values: Vec<Value>,
}

impl ValueStack {
    /// Creates a stack with the default capacity reserved.
    pub fn new() -> ValueStack {
        ValueStack {
            values: Vec::with_capacity(DEFAULT_VALUE_COUNT),
        }
    }

    /// Offset one past the highest live slot.
    pub fn current_offset(&self) -> usize {
        self.values.len()
    }

    /// Number of live slots.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no slots are live.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Slots currently allocated.
    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    /// Opens a frame of `len + 1` slots (the extra slot holds the receiver)
    /// and returns its base offset.
    ///
    /// The topmost `excluded_count` live slots are folded into the frame in
    /// place and its first `args_count` slots keep their values; every other
    /// frame slot reads Undefined afterwards. Growth reserves whole default
    /// blocks until the frame fits, preserving existing slots.
    ///
    /// # Panics
    ///
    /// Panics if `excluded_count` exceeds the number of live slots.
    pub fn push(&mut self, excluded_count: usize, args_count: usize, len: usize) -> usize {
        let len = len + 1;
        assert!(
            excluded_count <= self.values.len(),
            "cannot exclude {excluded_count} of {} slots",
            self.values.len()
        );
        let base = self.values.len() - excluded_count;
        let needed = base + len;
        if needed > self.values.capacity() {
            let mut target = self.values.capacity();
            while target < needed {
                target += DEFAULT_VALUE_COUNT;
            }
            self.values.reserve_exact(target - self.values.len());
        }
        // Folded slots past the argument region are stale; reset them
        // before they become visible to the new frame.
        let clear_from = base + args_count;
        if clear_from < self.values.len() {
            for slot in &mut self.values[clear_from..] {
                *slot = Value::Undefined;
            }
        }
        self.values.resize(needed, Value::Undefined);
        base
    }

    /// Closes the frame based at `bottom_offset`, destroying every slot at
    /// or above it.
    pub fn pop(&mut self, bottom_offset: usize) {
        self.values.truncate(bottom_offset);
    }

    /// The slot at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is not a live slot.
    pub fn get(&self, offset: usize) -> &Value {
        &self.values[offset]
    }

    /// Overwrites the slot at `offset`, destroying its previous value.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is not a live slot.
    pub fn set(&mut self, offset: usize, value: Value) {
        self.values[offset] = value;
    }

    /// Moves the slot at `offset` out, leaving Undefined behind.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is not a live slot.
    pub fn take(&mut self, offset: usize) -> Value {
        mem::take(&mut self.values[offset])
    }

    /// Exchanges two slots without touching reference counts.
    ///
    /// # Panics
    ///
    /// Panics if either offset is not a live slot.
    pub fn swap(&mut self, a: usize, b: usize) {
        self.values.swap(a, b);
    }
}

impl Default for ValueStack {
    fn default() -> ValueStack {
        ValueStack::new()
    }
}

impl fmt::Debug for ValueStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueStack")
            .field("len", &self.values.len())
            .field("capacity", &self.values.capacity())
            .finish()
    }
}
