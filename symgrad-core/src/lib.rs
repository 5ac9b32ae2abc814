pub mod autograd;
pub mod error;
pub mod ir;
pub mod types;
pub mod utils;

pub use autograd::{add_gradient_nodes, BackpropResult, GradientOptions};
pub use error::GradientError;
pub use ir::{Graph, NodeId, OpKind, ValueId};
pub use types::{DType, Literal, Type};
