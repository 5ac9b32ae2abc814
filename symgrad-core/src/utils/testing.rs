use crate::autograd::{add_gradient_for_node, GradientMap, GradientPass};
use crate::error::GradientError;
use crate::ir::{Graph, Node, NodeId, OpKind, ValueId};
use crate::types::Type;

/// A graph holding a single forward node, with one seed input per output.
pub struct OpFixture {
    pub graph: Graph,
    pub node: NodeId,
    pub inputs: Vec<ValueId>,
    pub outputs: Vec<ValueId>,
    pub seeds: Vec<ValueId>,
}

/// Builds `kind(x0, x1, ...) -> (y0, y1, ...)`.
///
/// Inputs are named `x{i}` and typed by `input_types`. Outputs are named
/// `y{i}` and take the type of the first input. Seeds are graph inputs named
/// `gy{i}` of the same type as the output they are bound to.
pub fn op_fixture(kind: OpKind, input_types: &[Type], num_outputs: usize) -> OpFixture {
    let mut graph = Graph::new("fixture");
    let inputs: Vec<ValueId> = input_types
        .iter()
        .enumerate()
        .map(|(i, ty)| graph.add_input_value(format!("x{}", i), ty.clone()))
        .collect();
    let out_ty = input_types.first().cloned().unwrap_or_default();
    let outputs: Vec<ValueId> = (0..num_outputs)
        .map(|i| graph.add_output_value(format!("y{}", i), out_ty.clone()))
        .collect();
    let node = graph.add_node(kind, &inputs, &outputs, kind.name());
    let seeds = (0..num_outputs)
        .map(|i| graph.add_input_value(format!("gy{}", i), out_ty.clone()))
        .collect();
    OpFixture {
        graph,
        node,
        inputs,
        outputs,
        seeds,
    }
}

impl OpFixture {
    /// Runs the rule of the fixture node with every output gradient bound to
    /// its seed.
    pub fn differentiate(&mut self, retain_in_stack: bool) -> Result<GradientMap, GradientError> {
        let mut grads = GradientMap::new();
        for (&y, &seed) in self.outputs.iter().zip(&self.seeds) {
            grads.bind(y, seed);
        }
        let mut pass = GradientPass::new();
        add_gradient_for_node(&mut self.graph, &mut grads, &mut pass, self.node, retain_in_stack)?;
        Ok(grads)
    }
}

/// The node producing `value`, if any.
pub fn producer(graph: &Graph, value: ValueId) -> Option<&Node> {
    graph.value(value).producer().map(|id| graph.node(id))
}

pub fn producer_kind(graph: &Graph, value: ValueId) -> Option<OpKind> {
    producer(graph, value).map(|n| n.kind())
}

pub fn nodes_of_kind(graph: &Graph, kind: OpKind) -> Vec<NodeId> {
    graph
        .nodes()
        .filter(|(_, n)| n.kind() == kind)
        .map(|(id, _)| id)
        .collect()
}
