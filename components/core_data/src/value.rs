//! The tagged value union and its scalar conversions.

use std::fmt;
use std::mem;

use crate::error::CastError;
use crate::heap::Heap;
use crate::objects::{ArrayRef, FunctionRef, IteratorRef, ObjectRef, StringRef, UserdataRef};

/// Discriminant of a [`Value`].
///
/// The first four kinds are scalars stored inline; the rest are handles to
/// heap blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// No value.
    Undefined,
    /// 64-bit signed integer.
    Integer,
    /// 64-bit floating point number.
    Real,
    /// Truth value.
    Boolean,
    /// Heap string.
    String,
    /// Heap array.
    Array,
    /// Heap object.
    Object,
    /// Heap function.
    Function,
    /// Heap iterator.
    Iterator,
    /// Heap userdata.
    Userdata,
}

impl DataType {
    /// Whether values of this kind are stored inline.
    pub const fn is_scalar(self) -> bool {
        matches!(
            self,
            DataType::Undefined | DataType::Integer | DataType::Real | DataType::Boolean
        )
    }

    /// Lowercase kind name, as used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            DataType::Undefined => "undefined",
            DataType::Integer => "integer",
            DataType::Real => "real",
            DataType::Boolean => "boolean",
            DataType::String => "string",
            DataType::Array => "array",
            DataType::Object => "object",
            DataType::Function => "function",
            DataType::Iterator => "iterator",
            DataType::Userdata => "userdata",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single dynamically typed value.
///
/// Scalars live inline; the remaining kinds hold reference-counted handles
/// into a [`Heap`]. `clone` is the copy operation: inline bits for scalars,
/// a reference count bump for handles. Dropping a handle value releases its
/// reference.
///
/// # Example
///
/// ```
/// use core_data::{DataType, Heap, Value};
///
/// let heap = Heap::new();
/// let text = Value::from(heap.create_string("karst"));
/// assert_eq!(text.data_type(), DataType::String);
/// assert_eq!(text.ref_count(), Some(1));
///
/// let copy = text.clone();
/// assert_eq!(text.ref_count(), Some(2));
/// drop(copy);
/// assert_eq!(text.ref_count(), Some(1));
/// ```
#[derive(Clone)]
pub enum Value {
    /// No value.
    Undefined,
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit floating point number.
    Real(f64),
    /// Truth value.
    Boolean(bool),
    /// Heap string handle.
    String(StringRef),
    /// Heap array handle.
    Array(ArrayRef),
    /// Heap object handle.
    Object(ObjectRef),
    /// Heap function handle.
    Function(FunctionRef),
    /// Heap iterator handle.
    Iterator(IteratorRef),
    /// Heap userdata handle.
    Userdata(UserdataRef),
}

impl Value {
    /// The kind of this value.
    pub const fn data_type(&self) -> DataType {
        match self {
            Value::Undefined => DataType::Undefined,
            Value::Integer(_) => DataType::Integer,
            Value::Real(_) => DataType::Real,
            Value::Boolean(_) => DataType::Boolean,
            Value::String(_) => DataType::String,
            Value::Array(_) => DataType::Array,
            Value::Object(_) => DataType::Object,
            Value::Function(_) => DataType::Function,
            Value::Iterator(_) => DataType::Iterator,
            Value::Userdata(_) => DataType::Userdata,
        }
    }

    /// Whether this is the Undefined value.
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Whether this value is stored inline.
    pub const fn is_scalar(&self) -> bool {
        self.data_type().is_scalar()
    }

    /// The integer payload, if this is an Integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// The floating point payload, if this is a Real.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(value) => Some(*value),
            _ => None,
        }
    }

    /// The truth payload, if this is a Boolean.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    /// The string handle, if this is a String.
    pub fn as_string(&self) -> Option<&StringRef> {
        match self {
            Value::String(handle) => Some(handle),
            _ => None,
        }
    }

    /// The array handle, if this is an Array.
    pub fn as_array(&self) -> Option<&ArrayRef> {
        match self {
            Value::Array(handle) => Some(handle),
            _ => None,
        }
    }

    /// The object handle, if this is an Object.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(handle) => Some(handle),
            _ => None,
        }
    }

    /// The function handle, if this is a Function.
    pub fn as_function(&self) -> Option<&FunctionRef> {
        match self {
            Value::Function(handle) => Some(handle),
            _ => None,
        }
    }

    /// The iterator handle, if this is an Iterator.
    pub fn as_iterator(&self) -> Option<&IteratorRef> {
        match self {
            Value::Iterator(handle) => Some(handle),
            _ => None,
        }
    }

    /// The userdata handle, if this is a Userdata.
    pub fn as_userdata(&self) -> Option<&UserdataRef> {
        match self {
            Value::Userdata(handle) => Some(handle),
            _ => None,
        }
    }

    /// The heap the payload lives on. `None` for scalars and for handles
    /// whose heap has been torn down.
    pub fn heap(&self) -> Option<Heap> {
        match self {
            Value::String(handle) => handle.heap(),
            Value::Array(handle) => handle.heap(),
            Value::Object(handle) => handle.heap(),
            Value::Function(handle) => handle.heap(),
            Value::Iterator(handle) => handle.heap(),
            Value::Userdata(handle) => handle.heap(),
            _ => None,
        }
    }

    /// Number of values sharing the payload. `None` for scalars.
    pub fn ref_count(&self) -> Option<usize> {
        match self {
            Value::String(handle) => Some(handle.ref_count()),
            Value::Array(handle) => Some(handle.ref_count()),
            Value::Object(handle) => Some(handle.ref_count()),
            Value::Function(handle) => Some(handle.ref_count()),
            Value::Iterator(handle) => Some(handle.ref_count()),
            Value::Userdata(handle) => Some(handle.ref_count()),
            _ => None,
        }
    }

    /// Exchanges two values without touching reference counts.
    pub fn swap(a: &mut Value, b: &mut Value) {
        mem::swap(a, b);
    }

    /// Moves this value out, leaving Undefined behind.
    pub fn take(&mut self) -> Value {
        mem::take(self)
    }

    /// Converts to an integer.
    ///
    /// Undefined becomes 0, Booleans become 0 or 1, and Reals truncate with
    /// saturation (NaN becomes 0). Heap kinds fail.
    pub fn try_integer(&self) -> Result<i64, CastError> {
        match self {
            Value::Undefined => Ok(0),
            Value::Integer(value) => Ok(*value),
            Value::Real(value) => Ok(*value as i64),
            Value::Boolean(value) => Ok(i64::from(*value)),
            other => Err(CastError::new(other.data_type(), DataType::Integer)),
        }
    }

    /// Converts to a floating point number.
    ///
    /// Undefined becomes 0.0 and Booleans become 0.0 or 1.0. Heap kinds fail.
    pub fn try_real(&self) -> Result<f64, CastError> {
        match self {
            Value::Undefined => Ok(0.0),
            Value::Integer(value) => Ok(*value as f64),
            Value::Real(value) => Ok(*value),
            Value::Boolean(value) => Ok(f64::from(u8::from(*value))),
            other => Err(CastError::new(other.data_type(), DataType::Real)),
        }
    }

    /// Converts to a truth value.
    ///
    /// Undefined is false, numbers are true when nonzero (NaN is false).
    /// Heap kinds fail.
    pub fn try_boolean(&self) -> Result<bool, CastError> {
        match self {
            Value::Undefined => Ok(false),
            Value::Integer(value) => Ok(*value != 0),
            Value::Real(value) => Ok(*value != 0.0 && !value.is_nan()),
            Value::Boolean(value) => Ok(*value),
            other => Err(CastError::new(other.data_type(), DataType::Boolean)),
        }
    }
}

impl Default for Value {
    fn default() -> Value {
        Value::Undefined
    }
}

/// Scalars compare by payload; handles compare by block identity.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::Iterator(a), Value::Iterator(b)) => a == b,
            (Value::Userdata(a), Value::Userdata(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("Undefined"),
            Value::Integer(value) => f.debug_tuple("Integer").field(value).finish(),
            Value::Real(value) => f.debug_tuple("Real").field(value).finish(),
            Value::Boolean(value) => f.debug_tuple("Boolean").field(value).finish(),
            Value::String(handle) => f.debug_tuple("String").field(handle).finish(),
            // Containers can reference themselves, so their contents are
            // never printed.
            Value::Array(_) => f.write_str("Array(..)"),
            Value::Object(_) => f.write_str("Object(..)"),
            Value::Function(handle) => f.debug_tuple("Function").field(handle).finish(),
            Value::Iterator(_) => f.write_str("Iterator(..)"),
            Value::Userdata(_) => f.write_str("Userdata(..)"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Integer(value) => write!(f, "{value}"),
            Value::Real(value) => f.write_str(ryu::Buffer::new().format(*value)),
            Value::Boolean(value) => write!(f, "{value}"),
            Value::String(handle) => f.write_str(handle.borrow().as_str()),
            Value::Array(_) => f.write_str("[array]"),
            Value::Object(_) => f.write_str("[object]"),
            Value::Function(handle) => write!(f, "[function {}]", handle.borrow().name()),
            Value::Iterator(_) => f.write_str("[iterator]"),
            Value::Userdata(_) => f.write_str("[userdata]"),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Value {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Value {
        Value::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Value {
        Value::Real(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Value {
        Value::Boolean(value)
    }
}

impl From<StringRef> for Value {
    fn from(handle: StringRef) -> Value {
        Value::String(handle)
    }
}

impl From<ArrayRef> for Value {
    fn from(handle: ArrayRef) -> Value {
        Value::Array(handle)
    }
}

impl From<ObjectRef> for Value {
    fn from(handle: ObjectRef) -> Value {
        Value::Object(handle)
    }
}

impl From<FunctionRef> for Value {
    fn from(handle: FunctionRef) -> Value {
        Value::Function(handle)
    }
}

impl From<IteratorRef> for Value {
    fn from(handle: IteratorRef) -> Value {
        Value::Iterator(handle)
    }
}

impl From<UserdataRef> for Value {
    fn from(handle: UserdataRef) -> Value {
        Value::Userdata(handle)
    }
}
