//! # Graph IR (`ir`)
//!
//! Arena-backed computation graph consumed and extended by the gradient
//! subsystem.
//!
//! - [`Graph`] owns [`Value`]s and [`Node`]s, addressed by [`ValueId`] and
//!   [`NodeId`]. Graphs are append-only.
//! - A control-flow [`Node`] (`Loop`) owns its body as a nested [`Graph`].
//! - [`GraphBuilder`] creates named intermediate nodes for one piece of
//!   emitted code.

pub mod attributes;
pub mod builder;
pub mod graph;
pub mod node;
pub mod op_kind;
pub mod value;

pub use attributes::Attributes;
pub use builder::GraphBuilder;
pub use graph::Graph;
pub use node::{Node, NodeId};
pub use op_kind::OpKind;
pub use value::{Value, ValueId, ValueKind};
