//! Compile-time constants and their materialization into runtime values.

use std::cmp::Ordering;

use crate::heap::Heap;
use crate::value::Value;

/// A scalar or string literal carried by a chunk's constant pool.
///
/// Constants are plain data: strings live inline here and only become heap
/// blocks when [`Constant::make_value`] materializes them.
///
/// The total order ranks by kind first (declaration order below), then by
/// payload within a kind, with reals ordered by their total order so pools
/// can be sorted and deduplicated.
#[derive(Debug, Clone)]
pub enum Constant {
    /// No value.
    Undefined,
    /// Integer literal.
    Integer(i64),
    /// Floating point literal.
    Real(f64),
    /// Truth literal.
    Boolean(bool),
    /// String literal, not yet heap-allocated.
    String(String),
}

impl Constant {
    fn rank(&self) -> u8 {
        match self {
            Constant::Undefined => 0,
            Constant::Integer(_) => 1,
            Constant::Real(_) => 2,
            Constant::Boolean(_) => 3,
            Constant::String(_) => 4,
        }
    }

    /// Materializes this constant as a runtime value.
    ///
    /// Scalars convert directly; a string allocates one block on `heap` per
    /// call.
    pub fn make_value(&self, heap: &Heap) -> Value {
        match self {
            Constant::Undefined => Value::Undefined,
            Constant::Integer(value) => Value::Integer(*value),
            Constant::Real(value) => Value::Real(*value),
            Constant::Boolean(value) => Value::Boolean(*value),
            Constant::String(contents) => Value::from(heap.create_string(contents.as_str())),
        }
    }
}

impl Default for Constant {
    fn default() -> Constant {
        Constant::Undefined
    }
}

impl PartialEq for Constant {
    fn eq(&self, other: &Constant) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Constant {}

impl PartialOrd for Constant {
    fn partial_cmp(&self, other: &Constant) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Constant {
    fn cmp(&self, other: &Constant) -> Ordering {
        match (self, other) {
            (Constant::Undefined, Constant::Undefined) => Ordering::Equal,
            (Constant::Integer(a), Constant::Integer(b)) => a.cmp(b),
            (Constant::Real(a), Constant::Real(b)) => a.total_cmp(b),
            (Constant::Boolean(a), Constant::Boolean(b)) => a.cmp(b),
            (Constant::String(a), Constant::String(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl From<i64> for Constant {
    fn from(value: i64) -> Constant {
        Constant::Integer(value)
    }
}

impl From<i32> for Constant {
    fn from(value: i32) -> Constant {
        Constant::Integer(i64::from(value))
    }
}

impl From<f64> for Constant {
    fn from(value: f64) -> Constant {
        Constant::Real(value)
    }
}

impl From<bool> for Constant {
    fn from(value: bool) -> Constant {
        Constant::Boolean(value)
    }
}

impl From<&str> for Constant {
    fn from(value: &str) -> Constant {
        Constant::String(String::from(value))
    }
}

impl From<String> for Constant {
    fn from(value: String) -> Constant {
        Constant::String(value)
    }
}
