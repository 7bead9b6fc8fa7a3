//! Heap ownership, allocation tracking, and teardown.
//!
//! Every non-scalar payload lives in a reference-counted block registered
//! with the [`Heap`] that allocated it. Copying a [`Handle`] bumps the block's
//! count; dropping the last handle frees the block. The heap itself keeps
//! only weak references, so it can observe and tear down blocks without
//! extending their lifetime.

use std::any::Any;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::callable::Callable;
use crate::chunk::Chunk;
use crate::objects::{
    ArrayData, ArrayRef, DeriveMode, FunctionData, FunctionRef, IteratorData, IteratorRef,
    ObjectData, ObjectRef, StringData, StringRef, UserdataData, UserdataRef,
};
use crate::value::Value;

thread_local! {
    static PENDING_RELEASE: RefCell<Vec<Value>> = const { RefCell::new(Vec::new()) };
    static RELEASE_ACTIVE: Cell<bool> = const { Cell::new(false) };
}

/// Queues values owned by a dying container and drains the queue iteratively.
///
/// Containers nest arbitrarily deep, so destroying them through nested drops
/// could exhaust the native stack. Every container funnels its contents
/// through this worklist instead; only the outermost call drains it.
pub(crate) fn defer_release<I>(values: I)
where
    I: IntoIterator<Item = Value>,
{
    PENDING_RELEASE.with(|pending| pending.borrow_mut().extend(values));
    RELEASE_ACTIVE.with(|active| {
        if active.get() {
            return;
        }
        active.set(true);
        while let Some(value) = PENDING_RELEASE.with(|pending| pending.borrow_mut().pop()) {
            drop(value);
        }
        active.set(false);
    });
}

/// Behavior every heap payload kind provides.
///
/// `release_contents` drops the values a payload owns. The heap invokes it on
/// all surviving blocks during teardown, which breaks reference cycles that
/// plain reference counting cannot reclaim.
pub trait BlockData: 'static {
    /// Releases owned values. Payloads that own none keep the default no-op.
    fn release_contents(&mut self) {}
}

/// Reference-counted cell holding one heap payload.
struct MemoryBlock<T: BlockData> {
    heap: Weak<HeapShared>,
    data: RefCell<T>,
}

/// Type-erased view the heap registry keeps of each block.
trait ErasedBlock {
    fn release_contents(&self);
}

impl<T: BlockData> ErasedBlock for MemoryBlock<T> {
    fn release_contents(&self) {
        self.data.borrow_mut().release_contents();
    }
}

impl<T: BlockData> Drop for MemoryBlock<T> {
    fn drop(&mut self) {
        if let Some(shared) = self.heap.upgrade() {
            shared.live.set(shared.live.get() - 1);
        }
    }
}

/// Shared handle to a heap payload.
///
/// Cloning is the copy operation of the data model: it bumps the block's
/// reference count without touching the payload. Equality is block identity,
/// never payload contents.
pub struct Handle<T: BlockData> {
    block: Rc<MemoryBlock<T>>,
}

impl<T: BlockData> Handle<T> {
    /// Immutably borrows the payload.
    ///
    /// # Panics
    ///
    /// Panics if the payload is mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, T> {
        self.block.data.borrow()
    }

    /// Mutably borrows the payload.
    ///
    /// # Panics
    ///
    /// Panics if the payload is already borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.block.data.borrow_mut()
    }

    /// Number of handles currently sharing this block.
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.block)
    }

    /// The heap this block was allocated from, if it is still alive.
    pub fn heap(&self) -> Option<Heap> {
        self.block.heap.upgrade().map(|shared| Heap { shared })
    }

    /// Whether two handles designate the same block.
    pub fn ptr_eq(a: &Handle<T>, b: &Handle<T>) -> bool {
        Rc::ptr_eq(&a.block, &b.block)
    }
}

impl<T: BlockData> Clone for Handle<T> {
    fn clone(&self) -> Handle<T> {
        Handle {
            block: Rc::clone(&self.block),
        }
    }
}

impl<T: BlockData> PartialEq for Handle<T> {
    fn eq(&self, other: &Handle<T>) -> bool {
        Handle::ptr_eq(self, other)
    }
}

impl<T: BlockData> Eq for Handle<T> {}

impl<T: BlockData + fmt::Debug> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.block.data.try_borrow() {
            Ok(data) => fmt::Debug::fmt(&*data, f),
            Err(_) => f.write_str("<borrowed>"),
        }
    }
}

/// Dead registry entries are swept once they outnumber live blocks and the
/// registry is at least this large.
const REGISTRY_COMPACT_FLOOR: usize = 64;

struct HeapShared {
    registry: RefCell<Vec<Weak<dyn ErasedBlock>>>,
    live: Cell<usize>,
    allocated: Cell<usize>,
}

impl Drop for HeapShared {
    fn drop(&mut self) {
        // Force-release the contents of every surviving block so cycles
        // between blocks cannot keep payloads alive past the heap.
        let registry = self.registry.take();
        for entry in registry {
            if let Some(block) = entry.upgrade() {
                block.release_contents();
            }
        }
    }
}

/// Owner and allocator of every heap object.
///
/// A `Heap` is a cheaply cloneable handle onto shared allocator state; all
/// clones observe the same counters. Blocks hold weak back-references, so
/// dropping the last `Heap` clone tears the heap down even while payload
/// handles survive: teardown releases the contents of every remaining block,
/// and the emptied blocks are freed as their last handles drop.
///
/// # Example
///
/// ```
/// use core_data::Heap;
///
/// let heap = Heap::new();
/// let text = heap.create_string("karst");
///
/// assert_eq!(heap.live_blocks(), 1);
/// assert_eq!(heap.allocated_blocks(), 1);
///
/// drop(text);
/// assert_eq!(heap.live_blocks(), 0);
/// assert_eq!(heap.allocated_blocks(), 1);
/// ```
#[derive(Clone)]
pub struct Heap {
    shared: Rc<HeapShared>,
}

impl Heap {
    /// Creates an empty heap.
    pub fn new() -> Heap {
        Heap {
            shared: Rc::new(HeapShared {
                registry: RefCell::new(Vec::new()),
                live: Cell::new(0),
                allocated: Cell::new(0),
            }),
        }
    }

    fn allocate<T: BlockData>(&self, data: T) -> Handle<T> {
        let block = Rc::new(MemoryBlock {
            heap: Rc::downgrade(&self.shared),
            data: RefCell::new(data),
        });
        let weak_block = Rc::downgrade(&block);
        let entry: Weak<dyn ErasedBlock> = weak_block;
        let mut registry = self.shared.registry.borrow_mut();
        if registry.len() >= REGISTRY_COMPACT_FLOOR && registry.len() >= self.shared.live.get() * 2
        {
            registry.retain(|entry| entry.strong_count() > 0);
        }
        registry.push(entry);
        drop(registry);
        self.shared.live.set(self.shared.live.get() + 1);
        self.shared.allocated.set(self.shared.allocated.get() + 1);
        Handle { block }
    }

    /// Allocates a string block initialized from `contents`.
    pub fn create_string(&self, contents: impl Into<String>) -> StringRef {
        self.allocate(StringData::new(contents.into()))
    }

    /// Allocates an empty array block.
    pub fn create_array(&self) -> ArrayRef {
        self.allocate(ArrayData::new())
    }

    /// Allocates an array block holding `len` Undefined elements.
    pub fn create_array_len(&self, len: usize) -> ArrayRef {
        self.allocate(ArrayData::with_len(len))
    }

    /// Allocates an array block taking ownership of `values`.
    pub fn create_array_from(&self, values: Vec<Value>) -> ArrayRef {
        self.allocate(ArrayData::from_values(values))
    }

    /// Allocates an empty object block.
    pub fn create_object(&self) -> ObjectRef {
        self.allocate(ObjectData::new())
    }

    /// Allocates an object block derived from `base` as parent or class.
    pub fn create_object_derived(&self, base: Value, mode: DeriveMode) -> ObjectRef {
        self.allocate(ObjectData::derived(base, mode))
    }

    /// Allocates a function block binding `chunk` with `ups_count` upvalue
    /// slots, all initially Undefined.
    pub fn create_function(
        &self,
        chunk: Rc<Chunk>,
        ups_count: usize,
        name: impl Into<String>,
    ) -> FunctionRef {
        self.allocate(FunctionData::new(name.into(), Callable::new(chunk, ups_count)))
    }

    /// Allocates an iterator block around an opaque payload.
    pub fn create_iterator(&self, payload: Box<dyn Any>) -> IteratorRef {
        self.allocate(IteratorData::new(payload))
    }

    /// Allocates a userdata block around an opaque payload.
    pub fn create_userdata(&self, payload: Box<dyn Any>) -> UserdataRef {
        self.allocate(UserdataData::new(payload))
    }

    /// Creates a non-owning reference to this heap.
    pub fn downgrade(&self) -> WeakHeap {
        WeakHeap {
            shared: Rc::downgrade(&self.shared),
        }
    }

    /// Number of blocks currently alive.
    pub fn live_blocks(&self) -> usize {
        self.shared.live.get()
    }

    /// Total number of blocks allocated over the heap's lifetime.
    pub fn allocated_blocks(&self) -> usize {
        self.shared.allocated.get()
    }
}

impl Default for Heap {
    fn default() -> Heap {
        Heap::new()
    }
}

/// Non-owning heap reference.
///
/// Program structures such as chunks hold the heap this way so that the last
/// host-held [`Heap`] dropping always triggers teardown, no matter how many
/// blocks and chunks still point back at it.
#[derive(Clone)]
pub struct WeakHeap {
    shared: Weak<HeapShared>,
}

impl WeakHeap {
    /// The heap, if it has not been torn down.
    pub fn upgrade(&self) -> Option<Heap> {
        self.shared.upgrade().map(|shared| Heap { shared })
    }
}

impl fmt::Debug for WeakHeap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(heap) => heap.fmt(f),
            None => f.write_str("Heap(torn down)"),
        }
    }
}

impl PartialEq for Heap {
    fn eq(&self, other: &Heap) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Eq for Heap {}

impl fmt::Debug for Heap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Heap")
            .field("live", &self.live_blocks())
            .field("allocated", &self.allocated_blocks())
            .finish()
    }
}
