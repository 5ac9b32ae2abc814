//! Reverse-mode differentiation of [`Graph`](crate::ir::Graph)s.
//!
//! The entry point is [`add_gradient_nodes`], which appends the gradient
//! computation to a graph. Gradients are themselves graph values, so the
//! result can be run, optimized or differentiated again like any graph.
//!
//! - [`context`]: the per-node [`GradientContext`] handed to rules, the
//!   [`GradientMap`] side table and the per-pass [`GradientPass`].
//! - [`registry`]: the rule table and the per-node dispatcher.
//! - [`driver`]: whole-graph traversal.

pub mod context;
pub mod driver;
pub mod registry;
pub(crate) mod rules;

pub use context::{GradientContext, GradientMap, GradientPass};
pub use driver::{add_gradient_nodes, add_gradient_nodes_for, BackpropResult, GradientOptions};
pub use registry::{add_gradient_for_node, gradient_func, Arity, GradFn, GradientFunc};
