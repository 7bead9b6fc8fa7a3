//! Bytecode dispatch.
//!
//! [`execute`] runs one callable to completion inside a fresh frame on the
//! shared stacks. Failures never unwind through Rust panics: the offending
//! operation stores an error in the state, the frame is torn down, and the
//! sentinel Undefined comes back.

use bytecode::instruction;
use bytecode::Opcode;
use core_data::{Callable, Heap, Value};

use crate::state::RuntimeState;

/// Per-invocation slot arithmetic.
///
/// `base` is the frame's first variable slot, `self_slot` holds the
/// receiver, and temporaries grow upward from `temps_base`. All offsets stay
/// inside the frame opened by `execute`, so slot access cannot alias other
/// frames.
struct Frame<'a> {
    callable: &'a Callable,
    heap: Heap,
    base: usize,
    self_slot: usize,
    temps_base: usize,
    temps_top: usize,
}

impl Frame<'_> {
    fn fail(&self, state: &mut RuntimeState, message: String) {
        state.set_error(Value::from(self.heap.create_string(message)));
    }

    fn require_temps(&self, state: &mut RuntimeState, needed: usize, offset: usize) -> bool {
        if self.temps_top < needed {
            self.fail(
                state,
                format!("temporary stack underflow at offset {offset}"),
            );
            return false;
        }
        true
    }

    fn require_room(&self, state: &mut RuntimeState, offset: usize) -> bool {
        if self.temps_top >= self.callable.temps_count() {
            self.fail(state, format!("temporary stack overflow at offset {offset}"));
            return false;
        }
        true
    }

    fn push_temp(&mut self, state: &mut RuntimeState, value: Value, offset: usize) -> bool {
        if !self.require_room(state, offset) {
            return false;
        }
        state.values_mut().set(self.temps_base + self.temps_top, value);
        self.temps_top += 1;
        true
    }

    /// Offset of the temporary `depth` slots below the top; depth 1 is the
    /// top itself.
    fn temp_offset(&self, depth: usize) -> usize {
        self.temps_base + self.temps_top - depth
    }

    fn var_slot(&self, state: &mut RuntimeState, index: usize, offset: usize) -> Option<usize> {
        if index >= self.callable.vars_count() {
            self.fail(
                state,
                format!("invalid variable slot {index} at offset {offset}"),
            );
            return None;
        }
        Some(self.base + index)
    }

    fn constant(&self, state: &mut RuntimeState, index: usize, offset: usize) -> Option<Value> {
        match self.callable.constant(index) {
            Some(value) => Some(value.clone()),
            None => {
                self.fail(
                    state,
                    format!("invalid constant index {index} at offset {offset}"),
                );
                None
            }
        }
    }
}

fn truncated(opcode: Opcode, offset: usize) -> String {
    format!("truncated {opcode} arguments at offset {offset}")
}

/// Runs `callable` to completion and returns its result.
///
/// A frame of `stack_count() + 1` slots is opened on the value stack:
/// arguments are copied into the leading variable slots (extra arguments are
/// dropped, missing ones read Undefined), the receiver lands in its own slot
/// after the variables, and temporaries occupy the rest. Both exits, normal
/// and error, tear the frame down and release every slot it held.
///
/// On failure the error slot is set and Undefined comes back: overflowing
/// the call stack, running a malformed stream (invalid opcode, constant
/// index, or variable slot, truncated arguments, temporary over- or
/// underflow), or a failing conversion all land there. When the callable's
/// heap has been torn down no error message can be allocated, so the stored
/// error is Undefined with the flag raised.
pub fn execute(
    state: &mut RuntimeState,
    callable: &Callable,
    receiver: Option<&Value>,
    args: &[Value],
) -> Value {
    let Some(heap) = callable.heap() else {
        state.set_error(Value::Undefined);
        return Value::Undefined;
    };

    if !state.calls_mut().push_native() {
        state.set_error(Value::from(heap.create_string("call stack overflow")));
        return Value::Undefined;
    }

    let vars_count = callable.vars_count();
    let frame_bottom = state.values().current_offset();
    let base = state.values_mut().push(0, args.len(), callable.stack_count());
    let self_slot = base + vars_count;

    for (index, arg) in args.iter().take(vars_count).enumerate() {
        state.values_mut().set(base + index, arg.clone());
    }
    if let Some(receiver) = receiver {
        state.values_mut().set(self_slot, receiver.clone());
    }

    let code = callable.instructions();
    let mut frame = Frame {
        callable,
        heap,
        base,
        self_slot,
        temps_base: self_slot + 1,
        temps_top: 0,
    };

    let mut offset = 0;
    let result = 'dispatch: loop {
        let Some(&byte) = code.get(offset) else {
            // Falling off the stream returns Undefined.
            break 'dispatch Some(Value::Undefined);
        };
        let Some(opcode) = Opcode::from_byte(byte) else {
            frame.fail(state, format!("invalid opcode {byte:#04x} at offset {offset}"));
            break 'dispatch None;
        };

        match opcode {
            Opcode::Nop => {}

            Opcode::Pop => {
                if !frame.require_temps(state, 1, offset) {
                    break 'dispatch None;
                }
                frame.temps_top -= 1;
            }

            Opcode::Pop2 => {
                if !frame.require_temps(state, 2, offset) {
                    break 'dispatch None;
                }
                frame.temps_top -= 2;
            }

            Opcode::Swap => {
                if !frame.require_temps(state, 2, offset) {
                    break 'dispatch None;
                }
                state
                    .values_mut()
                    .swap(frame.temp_offset(1), frame.temp_offset(2));
            }

            Opcode::Dup => {
                if !frame.require_temps(state, 1, offset) {
                    break 'dispatch None;
                }
                let value = state.values().get(frame.temp_offset(1)).clone();
                if !frame.push_temp(state, value, offset) {
                    break 'dispatch None;
                }
            }

            Opcode::DupX1 => {
                if !frame.require_temps(state, 2, offset) || !frame.require_room(state, offset) {
                    break 'dispatch None;
                }
                // [a, b] becomes [b, a, b].
                let top = frame.temps_base + frame.temps_top;
                let duplicate = state.values().get(top - 1).clone();
                state.values_mut().set(top, duplicate);
                state.values_mut().swap(top - 1, top - 2);
                frame.temps_top += 1;
            }

            Opcode::DupX2 => {
                if !frame.require_temps(state, 3, offset) || !frame.require_room(state, offset) {
                    break 'dispatch None;
                }
                // [a, b, c] becomes [c, a, b, c].
                let top = frame.temps_base + frame.temps_top;
                let duplicate = state.values().get(top - 1).clone();
                state.values_mut().set(top, duplicate);
                state.values_mut().swap(top - 1, top - 2);
                state.values_mut().swap(top - 2, top - 3);
                frame.temps_top += 1;
            }

            Opcode::LoadcU => {
                if !frame.push_temp(state, Value::Undefined, offset) {
                    break 'dispatch None;
                }
            }

            Opcode::LoadcB => {
                let Some(arg) = instruction::read_u8(code, offset + 1) else {
                    frame.fail(state, truncated(opcode, offset));
                    break 'dispatch None;
                };
                if !frame.push_temp(state, Value::Boolean(arg != 0), offset) {
                    break 'dispatch None;
                }
            }

            Opcode::LoadcI => {
                let Some(arg) = instruction::read_i8(code, offset + 1) else {
                    frame.fail(state, truncated(opcode, offset));
                    break 'dispatch None;
                };
                if !frame.push_temp(state, Value::Integer(i64::from(arg)), offset) {
                    break 'dispatch None;
                }
            }

            Opcode::LoadcR => {
                let Some(arg) = instruction::read_i8(code, offset + 1) else {
                    frame.fail(state, truncated(opcode, offset));
                    break 'dispatch None;
                };
                if !frame.push_temp(state, Value::Real(f64::from(arg)), offset) {
                    break 'dispatch None;
                }
            }

            Opcode::Loadc | Opcode::LoadcW | Opcode::LoadcL => {
                let index = match opcode {
                    Opcode::Loadc => instruction::read_u8(code, offset + 1).map(usize::from),
                    Opcode::LoadcW => instruction::read_u16(code, offset + 1).map(usize::from),
                    _ => instruction::read_u32(code, offset + 1).map(|index| index as usize),
                };
                let Some(index) = index else {
                    frame.fail(state, truncated(opcode, offset));
                    break 'dispatch None;
                };
                let Some(value) = frame.constant(state, index, offset) else {
                    break 'dispatch None;
                };
                if !frame.push_temp(state, value, offset) {
                    break 'dispatch None;
                }
            }

            Opcode::LoadS => {
                let value = state.values().get(frame.self_slot).clone();
                if !frame.push_temp(state, value, offset) {
                    break 'dispatch None;
                }
            }

            Opcode::Load0 | Opcode::Load1 | Opcode::Load2 | Opcode::Load3 => {
                let index = usize::from(byte - Opcode::Load0.byte());
                let Some(slot) = frame.var_slot(state, index, offset) else {
                    break 'dispatch None;
                };
                let value = state.values().get(slot).clone();
                if !frame.push_temp(state, value, offset) {
                    break 'dispatch None;
                }
            }

            Opcode::Load => {
                let Some(arg) = instruction::read_u8(code, offset + 1) else {
                    frame.fail(state, truncated(opcode, offset));
                    break 'dispatch None;
                };
                let Some(slot) = frame.var_slot(state, usize::from(arg), offset) else {
                    break 'dispatch None;
                };
                let value = state.values().get(slot).clone();
                if !frame.push_temp(state, value, offset) {
                    break 'dispatch None;
                }
            }

            Opcode::NewArray => {
                let value = Value::from(frame.heap.create_array());
                if !frame.push_temp(state, value, offset) {
                    break 'dispatch None;
                }
            }

            Opcode::NewArrayC => {
                let Some(arg) = instruction::read_u8(code, offset + 1) else {
                    frame.fail(state, truncated(opcode, offset));
                    break 'dispatch None;
                };
                let value = Value::from(frame.heap.create_array_len(usize::from(arg)));
                if !frame.push_temp(state, value, offset) {
                    break 'dispatch None;
                }
            }

            Opcode::NewArrayL => {
                if !frame.require_temps(state, 1, offset) {
                    break 'dispatch None;
                }
                let top = frame.temp_offset(1);
                let length = match state.values().get(top).try_integer() {
                    Ok(length) if length >= 0 => length as usize,
                    Ok(length) => {
                        frame.fail(
                            state,
                            format!("invalid array length {length} at offset {offset}"),
                        );
                        break 'dispatch None;
                    }
                    Err(error) => {
                        frame.fail(state, format!("{error} at offset {offset}"));
                        break 'dispatch None;
                    }
                };
                let value = Value::from(frame.heap.create_array_len(length));
                state.values_mut().set(top, value);
            }

            Opcode::StoreS => {
                if !frame.require_temps(state, 1, offset) {
                    break 'dispatch None;
                }
                let value = state.values().get(frame.temp_offset(1)).clone();
                frame.temps_top -= 1;
                state.values_mut().set(frame.self_slot, value);
            }

            Opcode::Store0 | Opcode::Store1 | Opcode::Store2 | Opcode::Store3 => {
                if !frame.require_temps(state, 1, offset) {
                    break 'dispatch None;
                }
                let index = usize::from(byte - Opcode::Store0.byte());
                let Some(slot) = frame.var_slot(state, index, offset) else {
                    break 'dispatch None;
                };
                let value = state.values().get(frame.temp_offset(1)).clone();
                frame.temps_top -= 1;
                state.values_mut().set(slot, value);
            }

            Opcode::Store => {
                let Some(arg) = instruction::read_u8(code, offset + 1) else {
                    frame.fail(state, truncated(opcode, offset));
                    break 'dispatch None;
                };
                if !frame.require_temps(state, 1, offset) {
                    break 'dispatch None;
                }
                let Some(slot) = frame.var_slot(state, usize::from(arg), offset) else {
                    break 'dispatch None;
                };
                let value = state.values().get(frame.temp_offset(1)).clone();
                frame.temps_top -= 1;
                state.values_mut().set(slot, value);
            }

            Opcode::Ret => {
                if !frame.require_temps(state, 1, offset) {
                    break 'dispatch None;
                }
                frame.temps_top -= 1;
                let value = state.values_mut().take(frame.temps_base + frame.temps_top);
                break 'dispatch Some(value);
            }

            Opcode::RetU => {
                break 'dispatch Some(Value::Undefined);
            }
        }

        offset += opcode.width();
    };

    // Both exits close the frame; pop is the only slot destruction path.
    state.values_mut().pop(frame_bottom);
    state.calls_mut().pop();
    result.unwrap_or(Value::Undefined)
}

/// Calls `function` with `args` and no receiver.
///
/// A value that is not a Function becomes the stored error itself and the
/// sentinel Undefined is returned.
pub fn call(state: &mut RuntimeState, function: &Value, args: &[Value]) -> Value {
    match function.as_function() {
        Some(handle) => {
            let data = handle.borrow();
            execute(state, data.callable(), None, args)
        }
        None => {
            state.set_error(function.clone());
            Value::Undefined
        }
    }
}

/// Calls `function` with an explicit receiver.
///
/// A value that is not a Function becomes the stored error itself and the
/// sentinel Undefined is returned.
pub fn invoke(
    state: &mut RuntimeState,
    function: &Value,
    receiver: &Value,
    args: &[Value],
) -> Value {
    match function.as_function() {
        Some(handle) => {
            let data = handle.borrow();
            execute(state, data.callable(), Some(receiver), args)
        }
        None => {
            state.set_error(function.clone());
            Value::Undefined
        }
    }
}
