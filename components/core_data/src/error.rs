//! Conversion failures surfaced by the value layer.

use thiserror::Error;

use crate::value::DataType;

/// A value could not be converted to the scalar kind an operation requires.
///
/// Scalar-to-scalar conversions are total and never produce this error; it
/// only appears when a heap-backed value reaches a context that needs a
/// scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot convert {from} to {target}")]
pub struct CastError {
    from: DataType,
    target: DataType,
}

impl CastError {
    pub(crate) fn new(from: DataType, target: DataType) -> CastError {
        CastError { from, target }
    }

    /// Kind of the value that failed to convert.
    pub fn from_type(&self) -> DataType {
        self.from
    }

    /// Kind the conversion was targeting.
    pub fn target_type(&self) -> DataType {
        self.target
    }
}
