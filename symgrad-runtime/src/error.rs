use symgrad_core::OpKind;
use thiserror::Error;

/// Error type for graph execution.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum RuntimeError {
    #[error("Shape mismatch: expected {expected:?}, got {actual:?} during operation {operation}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
        operation: String,
    },

    #[error("Cannot broadcast shapes: {shape1:?} and {shape2:?}")]
    BroadcastError {
        shape1: Vec<usize>,
        shape2: Vec<usize>,
    },

    #[error("Tensor creation error: data length {data_len} does not match shape {shape:?}")]
    TensorCreationError { data_len: usize, shape: Vec<usize> },

    #[error("Index {index} out of bounds for axis {axis} of size {size}")]
    IndexOutOfBounds { index: i64, axis: usize, size: usize },

    #[error("Axis {axis} out of range for rank {rank}")]
    InvalidAxis { axis: i64, rank: usize },

    #[error("{op} expected a {expected}, got a {actual}")]
    TypeMismatch {
        op: OpKind,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{op} is missing attribute '{name}'")]
    MissingAttribute { op: OpKind, name: &'static str },

    #[error("Invalid argument for {op}: {message}")]
    InvalidArgument { op: OpKind, message: String },

    #[error("No kernel for operator {0}")]
    UnsupportedKernel(OpKind),

    #[error("Value '{0}' is not bound")]
    UnboundValue(String),

    #[error("No value named '{0}'")]
    UnknownValue(String),

    #[error("Loop body '{0}' not found")]
    BodyNotFound(String),

    #[error("Pop from empty retention stack {0}")]
    StackUnderflow(i64),
}
