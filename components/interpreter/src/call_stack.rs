//! Fixed-depth call bookkeeping.

use std::fmt;

use arrayvec::ArrayVec;
use core_data::Value;

/// Maximum call depth.
pub const CALL_INFO_COUNT: usize = 8192;

/// One call frame record.
#[derive(Debug, Clone)]
pub struct CallInfo {
    /// The function being executed, `None` for native entry frames.
    pub callable: Option<Value>,
    /// Value stack offset of the frame base.
    pub bottom: usize,
    /// Instruction offset to resume at.
    pub offset: usize,
}

/// Bounded stack of call records.
///
/// Capacity is fixed at [`CALL_INFO_COUNT`]. A push either commits fully or,
/// at capacity, reports failure without changing anything, so a rejected
/// call never leaves a half-recorded frame behind.
pub struct CallStack {
    frames: Box<ArrayVec<CallInfo, CALL_INFO_COUNT>>,
}

impl CallStack {
    /// Creates an empty call stack.
    pub fn new() -> CallStack {
        CallStack {
            frames: Box::new(ArrayVec::new()),
        }
    }

    /// Records a frame.
    ///
    /// Returns `false` without mutating when the stack is full.
    pub fn push(&mut self, callable: Option<Value>, bottom: usize, offset: usize) -> bool {
        if self.frames.is_full() {
            return false;
        }
        self.frames.push(CallInfo {
            callable,
            bottom,
            offset,
        });
        true
    }

    /// Records a native entry frame.
    ///
    /// Returns `false` without mutating when the stack is full.
    pub fn push_native(&mut self) -> bool {
        self.push(None, 0, 0)
    }

    /// Removes and returns the most recent frame.
    pub fn pop(&mut self) -> Option<CallInfo> {
        self.frames.pop()
    }

    /// The most recent frame, if any.
    pub fn last(&self) -> Option<&CallInfo> {
        self.frames.last()
    }

    /// Current call depth.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether no calls are recorded.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Whether the next push would be rejected.
    pub fn is_full(&self) -> bool {
        self.frames.is_full()
    }

    /// Maximum depth.
    pub const fn capacity() -> usize {
        CALL_INFO_COUNT
    }
}

impl Default for CallStack {
    fn default() -> CallStack {
        CallStack::new()
    }
}

impl fmt::Debug for CallStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallStack")
            .field("len", &self.frames.len())
            .finish()
    }
}
