//! Shared execution state: the two stacks and the sticky error slot.

use std::fmt;

use core_data::Value;

use crate::call_stack::CallStack;
use crate::value_stack::ValueStack;

/// Everything a running program threads through dispatch.
///
/// Errors are checked, not thrown: failing operations store an error value
/// here and raise the flag, and the flag stays up until a host calls
/// [`RuntimeState::clear_error`]. The error value participates in reference
/// counting like any other value.
pub struct RuntimeState {
    calls: CallStack,
    values: ValueStack,
    error: Value,
    error_set: bool,
}

impl RuntimeState {
    /// Creates a fresh state with empty stacks and no error.
    pub fn new() -> RuntimeState {
        RuntimeState {
            calls: CallStack::new(),
            values: ValueStack::new(),
            error: Value::Undefined,
            error_set: false,
        }
    }

    /// The call stack.
    pub fn calls(&self) -> &CallStack {
        &self.calls
    }

    /// Mutable access to the call stack.
    pub fn calls_mut(&mut self) -> &mut CallStack {
        &mut self.calls
    }

    /// The value stack.
    pub fn values(&self) -> &ValueStack {
        &self.values
    }

    /// Mutable access to the value stack.
    pub fn values_mut(&mut self) -> &mut ValueStack {
        &mut self.values
    }

    /// Whether the error flag is raised.
    pub fn has_error(&self) -> bool {
        self.error_set
    }

    /// Stores `error` and raises the flag, replacing any previous error.
    pub fn set_error(&mut self, error: Value) {
        self.error = error;
        self.error_set = true;
    }

    /// The stored error value. Undefined while no error is set.
    pub fn get_error(&self) -> &Value {
        &self.error
    }

    /// Drops the stored error and lowers the flag.
    pub fn clear_error(&mut self) {
        self.error = Value::Undefined;
        self.error_set = false;
    }
}

impl Default for RuntimeState {
    fn default() -> RuntimeState {
        RuntimeState::new()
    }
}

impl fmt::Debug for RuntimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeState")
            .field("calls", &self.calls)
            .field("values", &self.values)
            .field("error_set", &self.error_set)
            .finish()
    }
}
