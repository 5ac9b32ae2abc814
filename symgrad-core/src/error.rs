use crate::ir::OpKind;
use crate::types::DType;
use thiserror::Error;

/// Which side of a node an arity or index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Port {
    Input,
    Output,
}

impl std::fmt::Display for Port {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Port::Input => write!(f, "inputs"),
            Port::Output => write!(f, "outputs"),
        }
    }
}

/// Error type for graph construction and gradient generation.
///
/// Every variant is terminal for the pass that raised it: the graph may already
/// contain part of the gradient nodes and must be discarded by the caller.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum GradientError {
    #[error("Gradient not supported: {0}")]
    Unsupported(OpKind),

    #[error("Arity mismatch for {op}: expected {expected} {port}, got {actual}")]
    ArityMismatch {
        op: OpKind,
        port: Port,
        expected: usize,
        actual: usize,
    },

    #[error("Index {index} out of range for {port} of {op} (len {len})")]
    IndexOutOfRange {
        op: OpKind,
        port: Port,
        index: usize,
        len: usize,
    },

    #[error("Gradient of value '{0}' is not bound")]
    MissingGradient(String),

    #[error("{op} gradient does not support dtype {actual:?}, expected {expected:?}")]
    UnsupportedDType {
        op: OpKind,
        expected: DType,
        actual: Option<DType>,
    },

    #[error("{op} gradient with axis {axis} is not supported")]
    UnsupportedAxis { op: OpKind, axis: i64 },

    #[error("{0} gradient requires a kernel_shape attribute")]
    MissingKernelShape(OpKind),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Inconsistent loop arity: {0}")]
    LoopArity(String),

    #[error("Invalid graph: {0}")]
    InvalidGraph(String),
}
