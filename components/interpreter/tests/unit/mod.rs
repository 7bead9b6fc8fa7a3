//! Unit tests for interpreter components

use std::rc::Rc;

use bytecode::{Assembler, Opcode};
use core_data::{Chunk, Constant, Heap, Value};
use interpreter::{call, invoke, RuntimeState};

fn program(
    heap: &Heap,
    constants: &[Constant],
    code: &[u8],
    vars: usize,
    temps: usize,
) -> Value {
    let chunk = Chunk::new(heap, Vec::new(), constants, code, vars, temps);
    Value::from(heap.create_function(Rc::new(chunk), 0, "test"))
}

fn run(
    heap: &Heap,
    constants: &[Constant],
    code: Vec<u8>,
    vars: usize,
    temps: usize,
) -> (RuntimeState, Value) {
    run_with(heap, constants, code, vars, temps, &[])
}

fn run_with(
    heap: &Heap,
    constants: &[Constant],
    code: Vec<u8>,
    vars: usize,
    temps: usize,
    args: &[Value],
) -> (RuntimeState, Value) {
    let function = program(heap, constants, &code, vars, temps);
    let mut state = RuntimeState::new();
    let result = call(&mut state, &function, args);
    (state, result)
}

fn error_text(state: &RuntimeState) -> String {
    state.get_error().to_string()
}

// ============================================================================
// Execution Basics
// ============================================================================

#[test]
fn test_empty_function_returns_undefined() {
    let heap = Heap::new();
    let (state, result) = run(&heap, &[], Vec::new(), 0, 0);
    assert!(result.is_undefined());
    assert!(!state.has_error());
}

#[test]
fn test_nop_streams_fall_through() {
    let heap = Heap::new();
    let code = Assembler::new()
        .op(Opcode::Nop)
        .op(Opcode::Nop)
        .op(Opcode::Nop)
        .finish();
    let (state, result) = run(&heap, &[], code, 0, 0);
    assert!(result.is_undefined());
    assert!(!state.has_error());
}

#[test]
fn test_stream_end_discards_pending_temporaries() {
    let heap = Heap::new();
    let code = Assembler::new().op(Opcode::LoadcI).i8_arg(9).finish();
    let (state, result) = run(&heap, &[], code, 0, 1);
    assert!(result.is_undefined());
    assert!(!state.has_error());
}

#[test]
fn test_ret_u_ignores_pending_temporaries() {
    let heap = Heap::new();
    let code = Assembler::new()
        .op(Opcode::LoadcI)
        .i8_arg(9)
        .op(Opcode::RetU)
        .finish();
    let (state, result) = run(&heap, &[], code, 0, 1);
    assert!(result.is_undefined());
    assert!(!state.has_error());
}

// ============================================================================
// Constant Loading
// ============================================================================

#[test]
fn test_loadc_u_pushes_undefined() {
    let heap = Heap::new();
    let code = Assembler::new().op(Opcode::LoadcU).op(Opcode::Ret).finish();
    let (state, result) = run(&heap, &[], code, 0, 1);
    assert!(result.is_undefined());
    assert!(!state.has_error());
}

#[test]
fn test_loadc_b_decodes_zero_and_nonzero() {
    let heap = Heap::new();
    let code = Assembler::new()
        .op(Opcode::LoadcB)
        .u8_arg(0)
        .op(Opcode::Ret)
        .finish();
    let (_, result) = run(&heap, &[], code, 0, 1);
    assert_eq!(result, Value::Boolean(false));

    let code = Assembler::new()
        .op(Opcode::LoadcB)
        .u8_arg(7)
        .op(Opcode::Ret)
        .finish();
    let (_, result) = run(&heap, &[], code, 0, 1);
    assert_eq!(result, Value::Boolean(true));
}

#[test]
fn test_loadc_i_sign_extends_its_byte() {
    let heap = Heap::new();
    let code = Assembler::new()
        .op(Opcode::LoadcI)
        .i8_arg(-5)
        .op(Opcode::Ret)
        .finish();
    let (_, result) = run(&heap, &[], code, 0, 1);
    assert_eq!(result, Value::Integer(-5));
}

#[test]
fn test_loadc_r_widens_to_real() {
    let heap = Heap::new();
    let code = Assembler::new()
        .op(Opcode::LoadcR)
        .i8_arg(-2)
        .op(Opcode::Ret)
        .finish();
    let (_, result) = run(&heap, &[], code, 0, 1);
    assert_eq!(result, Value::Real(-2.0));
}

#[test]
fn test_loadc_widths_address_the_same_pool() {
    let heap = Heap::new();
    let constants = [Constant::from(10), Constant::from(20), Constant::from(30)];

    let code = Assembler::new()
        .op(Opcode::Loadc)
        .u8_arg(2)
        .op(Opcode::Ret)
        .finish();
    let (_, result) = run(&heap, &constants, code, 0, 1);
    assert_eq!(result, Value::Integer(30));

    let code = Assembler::new()
        .op(Opcode::LoadcW)
        .u16_arg(1)
        .op(Opcode::Ret)
        .finish();
    let (_, result) = run(&heap, &constants, code, 0, 1);
    assert_eq!(result, Value::Integer(20));

    let code = Assembler::new()
        .op(Opcode::LoadcL)
        .u32_arg(0)
        .op(Opcode::Ret)
        .finish();
    let (_, result) = run(&heap, &constants, code, 0, 1);
    assert_eq!(result, Value::Integer(10));
}

#[test]
fn test_string_constants_load_as_shared_handles() {
    let heap = Heap::new();
    let constants = [Constant::from("shared")];
    let code = Assembler::new()
        .op(Opcode::Loadc)
        .u8_arg(0)
        .op(Opcode::Loadc)
        .u8_arg(0)
        .op(Opcode::Ret)
        .finish();
    let function = program(&heap, &constants, &code, 0, 2);
    let mut state = RuntimeState::new();
    let result = call(&mut state, &function, &[]);

    let string = result.as_string().expect("string result");
    assert_eq!(string.borrow().as_str(), "shared");
    // One handle in the chunk pool, one in the returned value.
    assert_eq!(result.ref_count(), Some(2));
}

// ============================================================================
// Temporaries
// ============================================================================

#[test]
fn test_pop_discards_the_top() {
    let heap = Heap::new();
    let code = Assembler::new()
        .op(Opcode::LoadcI)
        .i8_arg(1)
        .op(Opcode::LoadcI)
        .i8_arg(2)
        .op(Opcode::Pop)
        .op(Opcode::Ret)
        .finish();
    let (_, result) = run(&heap, &[], code, 0, 2);
    assert_eq!(result, Value::Integer(1));
}

#[test]
fn test_pop2_discards_the_top_two() {
    let heap = Heap::new();
    let code = Assembler::new()
        .op(Opcode::LoadcI)
        .i8_arg(1)
        .op(Opcode::LoadcI)
        .i8_arg(2)
        .op(Opcode::LoadcI)
        .i8_arg(3)
        .op(Opcode::Pop2)
        .op(Opcode::Ret)
        .finish();
    let (_, result) = run(&heap, &[], code, 0, 3);
    assert_eq!(result, Value::Integer(1));
}

#[test]
fn test_swap_exchanges_the_top_pair() {
    let heap = Heap::new();
    let code = Assembler::new()
        .op(Opcode::LoadcI)
        .i8_arg(1)
        .op(Opcode::LoadcI)
        .i8_arg(2)
        .op(Opcode::Swap)
        .op(Opcode::Ret)
        .finish();
    let (_, result) = run(&heap, &[], code, 0, 2);
    assert_eq!(result, Value::Integer(1));
}

#[test]
fn test_dup_copies_the_top() {
    let heap = Heap::new();
    let code = Assembler::new()
        .op(Opcode::LoadcI)
        .i8_arg(6)
        .op(Opcode::Dup)
        .op(Opcode::Pop)
        .op(Opcode::Ret)
        .finish();
    let (_, result) = run(&heap, &[], code, 0, 2);
    assert_eq!(result, Value::Integer(6), "the original survives popping the copy");
}

#[test]
fn test_dup_x1_inserts_a_copy_below_the_pair() {
    let heap = Heap::new();
    let code = Assembler::new()
        .op(Opcode::LoadcI)
        .i8_arg(1)
        .op(Opcode::LoadcI)
        .i8_arg(2)
        .op(Opcode::DupX1)
        .op(Opcode::Pop)
        .op(Opcode::Pop)
        .op(Opcode::Ret)
        .finish();
    // [1, 2] becomes [2, 1, 2]; two pops expose the inserted copy.
    let (_, result) = run(&heap, &[], code, 0, 3);
    assert_eq!(result, Value::Integer(2));
}

#[test]
fn test_dup_x2_inserts_a_copy_below_the_triple() {
    let heap = Heap::new();
    let code = Assembler::new()
        .op(Opcode::LoadcI)
        .i8_arg(1)
        .op(Opcode::LoadcI)
        .i8_arg(2)
        .op(Opcode::LoadcI)
        .i8_arg(3)
        .op(Opcode::DupX2)
        .op(Opcode::Pop)
        .op(Opcode::Pop)
        .op(Opcode::Pop)
        .op(Opcode::Ret)
        .finish();
    // [1, 2, 3] becomes [3, 1, 2, 3]; three pops expose the inserted copy.
    let (_, result) = run(&heap, &[], code, 0, 4);
    assert_eq!(result, Value::Integer(3));
}

// ============================================================================
// Variables and Receiver
// ============================================================================

#[test]
fn test_arguments_land_in_variable_slots() {
    let heap = Heap::new();
    let code = Assembler::new().op(Opcode::Load1).op(Opcode::Ret).finish();
    let args = [Value::Integer(10), Value::Integer(20)];
    let (_, result) = run_with(&heap, &[], code, 2, 1, &args);
    assert_eq!(result, Value::Integer(20));
}

#[test]
fn test_missing_arguments_read_undefined() {
    let heap = Heap::new();
    let code = Assembler::new().op(Opcode::Load1).op(Opcode::Ret).finish();
    let args = [Value::Integer(10)];
    let (_, result) = run_with(&heap, &[], code, 2, 1, &args);
    assert!(result.is_undefined());
}

#[test]
fn test_extra_arguments_are_dropped() {
    let heap = Heap::new();
    let code = Assembler::new().op(Opcode::Load0).op(Opcode::Ret).finish();
    let args = [Value::Integer(1), Value::Integer(2), Value::Integer(3)];
    let (state, result) = run_with(&heap, &[], code, 1, 1, &args);
    assert_eq!(result, Value::Integer(1));
    assert!(!state.has_error());
}

#[test]
fn test_short_load_variants_address_their_slots() {
    let heap = Heap::new();
    let args = [
        Value::Integer(10),
        Value::Integer(20),
        Value::Integer(30),
        Value::Integer(40),
    ];
    for (opcode, expected) in [
        (Opcode::Load0, 10),
        (Opcode::Load1, 20),
        (Opcode::Load2, 30),
        (Opcode::Load3, 40),
    ] {
        let code = Assembler::new().op(opcode).op(Opcode::Ret).finish();
        let (_, result) = run_with(&heap, &[], code, 4, 1, &args);
        assert_eq!(result, Value::Integer(expected));
    }
}

#[test]
fn test_store_variants_address_their_slots() {
    let heap = Heap::new();
    let stores = Assembler::new()
        .op(Opcode::LoadcI)
        .i8_arg(1)
        .op(Opcode::Store0)
        .op(Opcode::LoadcI)
        .i8_arg(2)
        .op(Opcode::Store1)
        .op(Opcode::LoadcI)
        .i8_arg(3)
        .op(Opcode::Store2)
        .op(Opcode::LoadcI)
        .i8_arg(4)
        .op(Opcode::Store3)
        .op(Opcode::LoadcI)
        .i8_arg(5)
        .op(Opcode::Store)
        .u8_arg(4)
        .finish();
    for index in 0..5u8 {
        let code = Assembler::new()
            .raw(&stores)
            .op(Opcode::Load)
            .u8_arg(index)
            .op(Opcode::Ret)
            .finish();
        let (state, result) = run(&heap, &[], code, 5, 1);
        assert!(!state.has_error());
        assert_eq!(result, Value::Integer(i64::from(index) + 1));
    }
}

#[test]
fn test_store_and_load_round_trip_heap_values() {
    let heap = Heap::new();
    let constants = [Constant::from("kept")];
    let code = Assembler::new()
        .op(Opcode::Loadc)
        .u8_arg(0)
        .op(Opcode::Store0)
        .op(Opcode::Load0)
        .op(Opcode::Ret)
        .finish();
    let (state, result) = run(&heap, &constants, code, 1, 2);
    assert!(!state.has_error());
    let string = result.as_string().expect("string result");
    assert_eq!(string.borrow().as_str(), "kept");
    assert_eq!(result.ref_count(), Some(2));
}

#[test]
fn test_load_s_pushes_the_receiver() {
    let heap = Heap::new();
    let code = Assembler::new().op(Opcode::LoadS).op(Opcode::Ret).finish();
    let function = program(&heap, &[], &code, 0, 1);
    let mut state = RuntimeState::new();
    let result = invoke(&mut state, &function, &Value::Integer(99), &[]);
    assert_eq!(result, Value::Integer(99));
}

#[test]
fn test_store_s_overwrites_the_receiver_slot() {
    let heap = Heap::new();
    let code = Assembler::new()
        .op(Opcode::LoadcI)
        .i8_arg(5)
        .op(Opcode::StoreS)
        .op(Opcode::LoadS)
        .op(Opcode::Ret)
        .finish();
    let function = program(&heap, &[], &code, 0, 1);
    let mut state = RuntimeState::new();
    let result = invoke(&mut state, &function, &Value::Integer(1), &[]);
    assert_eq!(result, Value::Integer(5));
}

#[test]
fn test_call_leaves_the_receiver_undefined() {
    let heap = Heap::new();
    let code = Assembler::new().op(Opcode::LoadS).op(Opcode::Ret).finish();
    let (_, result) = run(&heap, &[], code, 0, 1);
    assert!(result.is_undefined());
}

// ============================================================================
// Array Creation
// ============================================================================

#[test]
fn test_new_array_pushes_an_empty_array() {
    let heap = Heap::new();
    let code = Assembler::new().op(Opcode::NewArray).op(Opcode::Ret).finish();
    let (_, result) = run(&heap, &[], code, 0, 1);
    let array = result.as_array().expect("array result");
    assert!(array.borrow().is_empty());
}

#[test]
fn test_new_array_c_sets_the_length() {
    let heap = Heap::new();
    let code = Assembler::new()
        .op(Opcode::NewArrayC)
        .u8_arg(4)
        .op(Opcode::Ret)
        .finish();
    let (_, result) = run(&heap, &[], code, 0, 1);
    let array = result.as_array().expect("array result");
    assert_eq!(array.borrow().len(), 4);
    assert!(array.borrow().get(3).expect("slot").is_undefined());
}

#[test]
fn test_new_array_l_consumes_the_length() {
    let heap = Heap::new();
    let code = Assembler::new()
        .op(Opcode::LoadcI)
        .i8_arg(3)
        .op(Opcode::NewArrayL)
        .op(Opcode::Ret)
        .finish();
    let (_, result) = run(&heap, &[], code, 0, 1);
    let array = result.as_array().expect("array result");
    assert_eq!(array.borrow().len(), 3);
}

#[test]
fn test_new_array_l_converts_real_lengths() {
    let heap = Heap::new();
    let code = Assembler::new()
        .op(Opcode::LoadcR)
        .i8_arg(2)
        .op(Opcode::NewArrayL)
        .op(Opcode::Ret)
        .finish();
    let (_, result) = run(&heap, &[], code, 0, 1);
    let array = result.as_array().expect("array result");
    assert_eq!(array.borrow().len(), 2);
}

// ============================================================================
// Malformed Streams
// ============================================================================

#[test]
fn test_invalid_opcode_is_reported() {
    let heap = Heap::new();
    let (state, result) = run(&heap, &[], vec![0xee], 0, 0);
    assert!(result.is_undefined());
    assert_eq!(error_text(&state), "invalid opcode 0xee at offset 0");
}

#[test]
fn test_invalid_variable_slot_is_reported() {
    let heap = Heap::new();
    let code = Assembler::new().op(Opcode::Load0).op(Opcode::Ret).finish();
    let (state, _) = run(&heap, &[], code, 0, 1);
    assert_eq!(error_text(&state), "invalid variable slot 0 at offset 0");
}

#[test]
fn test_invalid_constant_index_is_reported() {
    let heap = Heap::new();
    let code = Assembler::new()
        .op(Opcode::Loadc)
        .u8_arg(5)
        .op(Opcode::Ret)
        .finish();
    let (state, _) = run(&heap, &[], code, 0, 1);
    assert_eq!(error_text(&state), "invalid constant index 5 at offset 0");
}

#[test]
fn test_temporary_overflow_is_reported() {
    let heap = Heap::new();
    let code = Assembler::new()
        .op(Opcode::LoadcI)
        .i8_arg(1)
        .op(Opcode::LoadcI)
        .i8_arg(2)
        .finish();
    let (state, _) = run(&heap, &[], code, 0, 1);
    assert_eq!(error_text(&state), "temporary stack overflow at offset 2");
}

#[test]
fn test_temporary_underflow_is_reported() {
    let heap = Heap::new();
    let code = Assembler::new().op(Opcode::Pop).finish();
    let (state, _) = run(&heap, &[], code, 0, 1);
    assert_eq!(error_text(&state), "temporary stack underflow at offset 0");
}

#[test]
fn test_truncated_arguments_are_reported() {
    let heap = Heap::new();
    let (state, _) = run(&heap, &[], vec![Opcode::LoadcW.byte(), 0x01], 0, 1);
    assert_eq!(error_text(&state), "truncated LOADCW arguments at offset 0");
}

#[test]
fn test_negative_array_length_is_reported() {
    let heap = Heap::new();
    let code = Assembler::new()
        .op(Opcode::LoadcI)
        .i8_arg(-1)
        .op(Opcode::NewArrayL)
        .finish();
    let (state, _) = run(&heap, &[], code, 0, 1);
    assert_eq!(error_text(&state), "invalid array length -1 at offset 2");
}

#[test]
fn test_array_length_cast_failure_is_reported() {
    let heap = Heap::new();
    let constants = [Constant::from("not a number")];
    let code = Assembler::new()
        .op(Opcode::Loadc)
        .u8_arg(0)
        .op(Opcode::NewArrayL)
        .op(Opcode::Ret)
        .finish();
    let (state, result) = run(&heap, &constants, code, 0, 1);
    assert!(result.is_undefined());
    assert_eq!(
        error_text(&state),
        "cannot convert string to integer at offset 2"
    );
}
