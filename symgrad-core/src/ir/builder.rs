use crate::ir::{Graph, NodeId, OpKind, ValueId};
use crate::types::Literal;

/// Scoped graph-mutation helper.
///
/// Every value and node created through a builder is named after the
/// builder's `category` and the value it works for, which keeps emitted
/// gradient code traceable back to the forward value it differentiates.
pub struct GraphBuilder<'g> {
    graph: &'g mut Graph,
    category: String,
    target: String,
}

impl<'g> GraphBuilder<'g> {
    pub fn new(graph: &'g mut Graph, category: impl Into<String>, target: ValueId) -> Self {
        let target = graph.value(target).name().to_string();
        GraphBuilder {
            graph,
            category: category.into(),
            target,
        }
    }

    pub fn graph(&mut self) -> &mut Graph {
        self.graph
    }

    pub fn gen_name(&mut self) -> String {
        let prefix = format!("{}_{}", self.category, self.target);
        self.graph.gen_name(&prefix)
    }

    /// Emits a single-output node and returns its (fresh, untyped) output.
    pub fn op(&mut self, kind: OpKind, inputs: &[ValueId]) -> ValueId {
        let name = self.gen_name();
        let out = self.graph.add_temp(name.clone());
        self.graph.add_node(kind, inputs, &[out], name);
        out
    }

    /// Emits a node with caller-provided outputs (possibly none).
    pub fn multi_op(&mut self, kind: OpKind, inputs: &[ValueId], outputs: &[ValueId]) -> NodeId {
        let name = self.gen_name();
        self.graph.add_node(kind, inputs, outputs, name)
    }

    pub fn constant(&mut self, literal: Literal) -> ValueId {
        let name = self.gen_name();
        self.graph.add_constant(name, literal)
    }
}
