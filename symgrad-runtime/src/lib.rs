//! Reference CPU execution of symgrad graphs.
//!
//! The [`Interpreter`] runs forward and gradient graphs, including loops and
//! the retention stacks their reverse iterations read from.
//! [`grad_check`] compares emitted gradients with finite differences.

pub mod error;
pub mod grad_check;
pub mod interpreter;
pub mod ops;
pub mod tensor;
pub mod utils;

pub use error::RuntimeError;
pub use interpreter::{Interpreter, RtValue};
pub use tensor::Tensor;
