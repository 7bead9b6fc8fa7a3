//! Contract tests for the core data component.
//!
//! These tests pin the lifecycle guarantees the interpreter and hosts build
//! on: reference count arithmetic, slot initialization, constant pooling,
//! and heap teardown.

use std::rc::Rc;

use core_data::{Chunk, Constant, DataType, Heap, Value};

/// Copying a value bumps its block's reference count by exactly one, and
/// destroying a copy takes it back down by exactly one.
#[test]
fn test_copy_and_destroy_are_count_exact() {
    let heap = Heap::new();
    let value = Value::from(heap.create_string("counted"));
    assert_eq!(value.ref_count(), Some(1), "creation hands out one reference");

    let copies: Vec<Value> = (0..5).map(|_| value.clone()).collect();
    assert_eq!(value.ref_count(), Some(6), "five copies add five references");

    drop(copies);
    assert_eq!(value.ref_count(), Some(1), "destroying copies releases them all");

    drop(value);
    assert_eq!(heap.live_blocks(), 0, "the last reference frees the block");
}

/// Moving a value steals the reference instead of copying it: the count is
/// unchanged and the source reads Undefined.
#[test]
fn test_move_steals_the_reference() {
    let heap = Heap::new();
    let mut source = Value::from(heap.create_string("moved"));

    let target = source.take();
    assert_eq!(target.ref_count(), Some(1), "the move must not touch the count");
    assert!(source.is_undefined(), "a moved-from value reads Undefined");

    let mut a = target;
    let mut b = Value::Integer(1);
    Value::swap(&mut a, &mut b);
    assert_eq!(b.ref_count(), Some(1), "swap exchanges without count traffic");
}

/// Every freshly created slot reads Undefined before anything is stored in
/// it: array elements, upvalues, and default values alike.
#[test]
fn test_fresh_slots_read_undefined() {
    let heap = Heap::new();

    let array = heap.create_array_len(4);
    assert!(
        array.borrow().elements().iter().all(Value::is_undefined),
        "array slots must start Undefined"
    );

    let chunk = Rc::new(Chunk::new(&heap, Vec::new(), &[], &[], 0, 0));
    let function = heap.create_function(chunk, 3, "fresh");
    assert!(
        function.borrow().callable().ups().iter().all(Value::is_undefined),
        "upvalue slots must start Undefined"
    );

    assert!(Value::default().is_undefined(), "the default value is Undefined");
}

/// A chunk materializes each string constant exactly once; every load of
/// that constant shares the one block.
#[test]
fn test_string_constants_pool_per_chunk() {
    let heap = Heap::new();
    let chunk = Chunk::new(
        &heap,
        Vec::new(),
        &[Constant::from("pooled"), Constant::from("pooled")],
        &[],
        0,
        0,
    );

    assert_eq!(
        heap.live_blocks(),
        2,
        "distinct pool entries allocate distinct blocks even for equal text"
    );

    let first = chunk.constant(0).cloned().expect("constant 0");
    let again = chunk.constant(0).cloned().expect("constant 0");
    assert_eq!(first, again, "repeated loads share one block");
    assert_eq!(
        first.ref_count(),
        Some(3),
        "pool entry plus two loads hold three references"
    );
    assert_eq!(heap.live_blocks(), 2, "loading never allocates");
}

/// Failed scalar conversions must not disturb the value they were applied
/// to.
#[test]
fn test_failed_cast_leaves_value_intact() {
    let heap = Heap::new();
    let value = Value::from(heap.create_array_from(vec![Value::Integer(1)]));

    let error = value.try_integer().expect_err("arrays do not convert");
    assert_eq!(error.from_type(), DataType::Array);
    assert_eq!(value.ref_count(), Some(1), "the failed cast took no reference");
    assert_eq!(
        value.as_array().map(|a| a.borrow().len()),
        Some(1),
        "the payload is untouched"
    );
}

/// Dropping the last host heap handle tears the heap down and reclaims
/// reference cycles that counting alone cannot.
#[test]
fn test_teardown_reclaims_unreachable_cycles() {
    let heap = Heap::new();

    let a = heap.create_array();
    let b = heap.create_array();
    a.borrow_mut().push(Value::from(b.clone()));
    b.borrow_mut().push(Value::from(a.clone()));

    let object = heap.create_object();
    object.borrow_mut().insert("selfref", Value::from(object.clone()), false);

    drop(a);
    drop(b);
    drop(object);
    assert_eq!(heap.live_blocks(), 3, "cycles keep all three blocks alive");

    drop(heap);
    // No assertion possible afterwards: the contract is that teardown runs
    // release on every block, so this test passing means no leak-induced
    // panic and no use-after-free in safe code.
}

/// Chunks reference the heap without owning it: the host dropping its last
/// heap handle triggers teardown even while chunks and functions survive.
#[test]
fn test_chunks_do_not_keep_the_heap_alive() {
    let heap = Heap::new();
    let chunk = Rc::new(Chunk::new(&heap, Vec::new(), &[Constant::from("text")], &[], 0, 0));
    let function = heap.create_function(Rc::clone(&chunk), 1, "closure");
    function
        .borrow_mut()
        .callable_mut()
        .set_ups(&[Value::from(function.clone())]);
    drop(function);

    drop(heap);
    assert!(chunk.heap().is_none(), "teardown ran despite the live chunk");
    assert!(
        function_capture_released(&chunk),
        "the self-capturing function was reclaimed by teardown"
    );
}

fn function_capture_released(chunk: &Rc<Chunk>) -> bool {
    // The string constant survives teardown; its count tells us whether any
    // other structure still holds it.
    chunk
        .constant(0)
        .map(|constant| constant.ref_count() == Some(1))
        .unwrap_or(false)
}

/// Handles stay safe after teardown: containers read as emptied rather than
/// dangling.
#[test]
fn test_handles_survive_teardown_emptied() {
    let heap = Heap::new();
    let array = heap.create_array_from(vec![Value::Integer(1), Value::Integer(2)]);
    let text = heap.create_string("still here");

    drop(heap);

    assert_eq!(array.borrow().len(), 0, "teardown released the elements");
    assert_eq!(text.borrow().as_str(), "still here", "strings keep their contents");
    assert_eq!(array.heap(), None, "the owning heap is reported gone");
}
