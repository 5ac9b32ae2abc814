//! CPU kernels used by the [`Interpreter`](crate::interpreter::Interpreter).
//!
//! Kernels are free functions over [`Tensor`](crate::tensor::Tensor)s and
//! return a fresh tensor. Attributes are passed as plain arguments.

pub mod activation;
pub mod elementwise;
pub mod indexing;
pub mod linalg;
pub mod reduction;
pub mod sequence;
pub mod shape;
