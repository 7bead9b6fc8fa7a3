//! Heap payload kinds: strings, arrays, objects, functions, and opaque
//! host-defined blocks.

use std::any::Any;
use std::collections::hash_map;
use std::collections::HashMap;
use std::fmt;
use std::mem;

use crate::callable::Callable;
use crate::heap::{defer_release, BlockData, Handle};
use crate::value::Value;

/// Handle to a heap-allocated string.
pub type StringRef = Handle<StringData>;
/// Handle to a heap-allocated array.
pub type ArrayRef = Handle<ArrayData>;
/// Handle to a heap-allocated object.
pub type ObjectRef = Handle<ObjectData>;
/// Handle to a heap-allocated function.
pub type FunctionRef = Handle<FunctionData>;
/// Handle to a heap-allocated iterator.
pub type IteratorRef = Handle<IteratorData>;
/// Handle to a heap-allocated userdata block.
pub type UserdataRef = Handle<UserdataData>;

/// Mutable string payload.
#[derive(Debug)]
pub struct StringData {
    contents: String,
}

impl StringData {
    pub(crate) fn new(contents: String) -> StringData {
        StringData { contents }
    }

    /// The current contents.
    pub fn as_str(&self) -> &str {
        &self.contents
    }

    /// Replaces the contents.
    pub fn set(&mut self, contents: impl Into<String>) {
        self.contents = contents.into();
    }

    /// Appends to the contents.
    pub fn push_str(&mut self, suffix: &str) {
        self.contents.push_str(suffix);
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    /// Whether the string is empty.
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

impl BlockData for StringData {}

/// Growable sequence of values.
#[derive(Debug, Default)]
pub struct ArrayData {
    elements: Vec<Value>,
}

impl ArrayData {
    pub(crate) fn new() -> ArrayData {
        ArrayData { elements: Vec::new() }
    }

    pub(crate) fn with_len(len: usize) -> ArrayData {
        ArrayData {
            elements: vec![Value::Undefined; len],
        }
    }

    pub(crate) fn from_values(values: Vec<Value>) -> ArrayData {
        ArrayData { elements: values }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The element at `index`.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.elements.get(index)
    }

    /// Overwrites the element at `index`, dropping the previous one.
    ///
    /// Returns `false` when `index` is out of range.
    pub fn set(&mut self, index: usize, value: Value) -> bool {
        match self.elements.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// First element, if any.
    pub fn first(&self) -> Option<&Value> {
        self.elements.first()
    }

    /// Last element, if any.
    pub fn last(&self) -> Option<&Value> {
        self.elements.last()
    }

    /// Appends an element.
    pub fn push(&mut self, value: Value) {
        self.elements.push(value);
    }

    /// Removes and returns the last element.
    pub fn pop(&mut self) -> Option<Value> {
        self.elements.pop()
    }

    /// Inserts at `index`, shifting later elements.
    ///
    /// Returns `false` when `index` is past the end.
    pub fn insert(&mut self, index: usize, value: Value) -> bool {
        if index > self.elements.len() {
            return false;
        }
        self.elements.insert(index, value);
        true
    }

    /// Removes and returns the element at `index`, shifting later elements.
    pub fn remove(&mut self, index: usize) -> Option<Value> {
        if index >= self.elements.len() {
            return None;
        }
        Some(self.elements.remove(index))
    }

    /// Grows or shrinks to `len`, filling new slots with Undefined.
    pub fn resize(&mut self, len: usize) {
        if len < self.elements.len() {
            defer_release(self.elements.drain(len..));
        } else {
            self.elements.resize(len, Value::Undefined);
        }
    }

    /// Drops every element.
    pub fn clear(&mut self) {
        self.release_values();
    }

    /// View of the elements.
    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    fn release_values(&mut self) {
        if !self.elements.is_empty() {
            defer_release(self.elements.drain(..));
        }
    }
}

impl BlockData for ArrayData {
    fn release_contents(&mut self) {
        self.release_values();
    }
}

impl Drop for ArrayData {
    fn drop(&mut self) {
        self.release_values();
    }
}

/// A named slot inside an object.
#[derive(Debug, Clone)]
pub struct Property {
    value: Value,
    is_const: bool,
}

impl Property {
    /// Creates a property holding `value`.
    pub fn new(value: Value, is_const: bool) -> Property {
        Property { value, is_const }
    }

    /// The stored value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Mutable access to the stored value.
    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    /// Whether `insert` may overwrite this property.
    pub fn is_const(&self) -> bool {
        self.is_const
    }

    /// Consumes the property, yielding its value.
    pub fn into_value(self) -> Value {
        self.value
    }
}

/// How a derived object relates to its base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeriveMode {
    /// The base becomes the new object's parent.
    Parent,
    /// The base becomes the new object's class.
    Class,
}

/// Property map with optional parent and class links.
#[derive(Debug, Default)]
pub struct ObjectData {
    properties: HashMap<String, Property>,
    parent: Value,
    class: Value,
}

impl ObjectData {
    pub(crate) fn new() -> ObjectData {
        ObjectData::default()
    }

    pub(crate) fn derived(base: Value, mode: DeriveMode) -> ObjectData {
        let mut object = ObjectData::default();
        match mode {
            DeriveMode::Parent => object.parent = base,
            DeriveMode::Class => object.class = base,
        }
        object
    }

    /// Looks up a property by name.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// Mutable lookup by name.
    pub fn property_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.get_mut(name)
    }

    /// Inserts or replaces a property.
    ///
    /// Returns `false` without modifying anything when the existing property
    /// is const.
    pub fn insert(&mut self, name: impl Into<String>, value: Value, is_const: bool) -> bool {
        match self.properties.entry(name.into()) {
            hash_map::Entry::Occupied(mut occupied) => {
                if occupied.get().is_const() {
                    return false;
                }
                occupied.insert(Property::new(value, is_const));
                true
            }
            hash_map::Entry::Vacant(vacant) => {
                vacant.insert(Property::new(value, is_const));
                true
            }
        }
    }

    /// Removes a property by name.
    pub fn remove(&mut self, name: &str) -> Option<Property> {
        self.properties.remove(name)
    }

    /// The parent link, Undefined when absent.
    pub fn parent(&self) -> &Value {
        &self.parent
    }

    /// The class link, Undefined when absent.
    pub fn class(&self) -> &Value {
        &self.class
    }

    /// Number of own properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the object has no own properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Iterates over own properties in unspecified order.
    pub fn iter(&self) -> hash_map::Iter<'_, String, Property> {
        self.properties.iter()
    }

    fn release_values(&mut self) {
        if self.properties.is_empty() && self.parent.is_undefined() && self.class.is_undefined() {
            return;
        }
        let parent = mem::take(&mut self.parent);
        let class = mem::take(&mut self.class);
        defer_release(
            self.properties
                .drain()
                .map(|(_, property)| property.into_value())
                .chain([parent, class]),
        );
    }
}

impl BlockData for ObjectData {
    fn release_contents(&mut self) {
        self.release_values();
    }
}

impl Drop for ObjectData {
    fn drop(&mut self) {
        self.release_values();
    }
}

/// Function payload: a display name plus the callable it wraps.
pub struct FunctionData {
    name: String,
    callable: Callable,
}

impl FunctionData {
    pub(crate) fn new(name: String, callable: Callable) -> FunctionData {
        FunctionData { name, callable }
    }

    /// Display name given at creation.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The callable this function wraps.
    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    /// Mutable access to the callable, for binding upvalues.
    pub fn callable_mut(&mut self) -> &mut Callable {
        &mut self.callable
    }
}

impl BlockData for FunctionData {
    fn release_contents(&mut self) {
        self.callable.release_values();
    }
}

impl fmt::Debug for FunctionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionData")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Iteration state owned by the host.
pub struct IteratorData {
    payload: Box<dyn Any>,
}

impl IteratorData {
    pub(crate) fn new(payload: Box<dyn Any>) -> IteratorData {
        IteratorData { payload }
    }

    /// The opaque payload.
    pub fn payload(&self) -> &dyn Any {
        self.payload.as_ref()
    }

    /// Mutable access to the opaque payload.
    pub fn payload_mut(&mut self) -> &mut dyn Any {
        self.payload.as_mut()
    }
}

impl BlockData for IteratorData {}

impl fmt::Debug for IteratorData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IteratorData(..)")
    }
}

/// Arbitrary host-defined payload.
pub struct UserdataData {
    payload: Box<dyn Any>,
}

impl UserdataData {
    pub(crate) fn new(payload: Box<dyn Any>) -> UserdataData {
        UserdataData { payload }
    }

    /// The opaque payload.
    pub fn payload(&self) -> &dyn Any {
        self.payload.as_ref()
    }

    /// Mutable access to the opaque payload.
    pub fn payload_mut(&mut self) -> &mut dyn Any {
        self.payload.as_mut()
    }
}

impl BlockData for UserdataData {}

impl fmt::Debug for UserdataData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UserdataData(..)")
    }
}
