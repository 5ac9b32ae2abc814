use crate::error::{GradientError, Port};
use crate::ir::{Attributes, Graph, GraphBuilder, Node, NodeId, OpKind, ValueId};
use log::trace;
use std::collections::HashMap;

/// Gradient bindings of one graph for one differentiation pass.
///
/// Maps a forward value to the value holding its gradient. A binding is never
/// removed individually; accumulation replaces it with the value of an `Add`.
/// Clearing the whole table resets a graph so it can be differentiated again.
#[derive(Debug, Clone, Default)]
pub struct GradientMap {
    grads: HashMap<ValueId, ValueId>,
}

impl GradientMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, value: ValueId) -> Option<ValueId> {
        self.grads.get(&value).copied()
    }

    pub fn contains(&self, value: ValueId) -> bool {
        self.grads.contains_key(&value)
    }

    /// Binds (or rebinds) the gradient of `value`.
    pub fn bind(&mut self, value: ValueId, grad: ValueId) {
        self.grads.insert(value, grad);
    }

    pub fn len(&self) -> usize {
        self.grads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grads.is_empty()
    }

    pub fn clear(&mut self) {
        self.grads.clear();
    }
}

/// State shared by every node differentiated in one pass, including the nodes
/// of loop bodies reached recursively.
#[derive(Debug, Default)]
pub struct GradientPass {
    last_stack_id: i64,
}

impl GradientPass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the id pairing one stack push with one stack pop.
    pub fn next_stack_id(&mut self) -> i64 {
        self.last_stack_id += 1;
        self.last_stack_id
    }

    /// Number of retentions emitted so far.
    pub fn num_retained(&self) -> usize {
        self.last_stack_id as usize
    }
}

/// Per-node helper handed to a gradient rule.
///
/// Gives access to the forward inputs (`x`), outputs (`y`) and output
/// gradients (`gy`) of one node, and emits the gradient nodes into the graph
/// that owns it. When `retain_in_stack` is set, every forward value a rule
/// reads through `x`/`y` is re-materialized by a push/pop pair so the reverse
/// loop iteration sees the value of the matching forward iteration.
pub struct GradientContext<'a> {
    graph: &'a mut Graph,
    grads: &'a mut GradientMap,
    pass: &'a mut GradientPass,
    node: NodeId,
    name: String,
    retain_in_stack: bool,
}

impl<'a> GradientContext<'a> {
    pub fn new(
        graph: &'a mut Graph,
        grads: &'a mut GradientMap,
        pass: &'a mut GradientPass,
        node: NodeId,
        retain_in_stack: bool,
    ) -> Self {
        let name = format!("{}Grad", graph.node(node).kind().name());
        GradientContext {
            graph,
            grads,
            pass,
            node,
            name,
            retain_in_stack,
        }
    }

    pub fn graph(&self) -> &Graph {
        self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        self.graph
    }

    pub fn grads(&self) -> &GradientMap {
        self.grads
    }

    pub fn pass_mut(&mut self) -> &mut GradientPass {
        self.pass
    }

    pub fn node_id(&self) -> NodeId {
        self.node
    }

    pub fn node(&self) -> &Node {
        self.graph.node(self.node)
    }

    pub fn kind(&self) -> OpKind {
        self.node().kind()
    }

    pub fn retain_in_stack(&self) -> bool {
        self.retain_in_stack
    }

    pub fn num_inputs(&self) -> usize {
        self.node().inputs().len()
    }

    pub fn num_outputs(&self) -> usize {
        self.node().outputs().len()
    }

    /// The i-th forward input, without retention.
    pub fn input(&self, i: usize) -> Result<ValueId, GradientError> {
        let inputs = self.node().inputs();
        inputs
            .get(i)
            .copied()
            .ok_or(GradientError::IndexOutOfRange {
                op: self.kind(),
                port: Port::Input,
                index: i,
                len: inputs.len(),
            })
    }

    /// The i-th forward output, without retention.
    pub fn output(&self, i: usize) -> Result<ValueId, GradientError> {
        let outputs = self.node().outputs();
        outputs
            .get(i)
            .copied()
            .ok_or(GradientError::IndexOutOfRange {
                op: self.kind(),
                port: Port::Output,
                index: i,
                len: outputs.len(),
            })
    }

    pub fn x(&mut self, i: usize) -> Result<ValueId, GradientError> {
        let v = self.input(i)?;
        Ok(self.retain(v))
    }

    pub fn y(&mut self, i: usize) -> Result<ValueId, GradientError> {
        let v = self.output(i)?;
        Ok(self.retain(v))
    }

    /// Gradient already bound to the i-th output.
    pub fn gy(&self, i: usize) -> Result<ValueId, GradientError> {
        let y = self.output(i)?;
        self.grads
            .get(y)
            .ok_or_else(|| GradientError::MissingGradient(self.graph.value(y).name().to_string()))
    }

    /// Makes `v` available to the backward code of the current iteration.
    ///
    /// Without retention this is the identity. With retention a push of `v`
    /// and a pop of a fresh value of the same type are emitted, both tagged
    /// with a new stack id, and the popped value is returned.
    pub fn retain(&mut self, v: ValueId) -> ValueId {
        if !self.retain_in_stack || self.graph.value(v).is_null() {
            return v;
        }
        let id = self.pass.next_stack_id();
        let ty = self.graph.value(v).ty().clone();
        let category = format!("{}Retain{}", self.name, id);
        let mut gb = GraphBuilder::new(self.graph, category, v);
        let push = gb.multi_op(OpKind::BackpropStackPush, &[v], &[]);
        let retained = gb.op(OpKind::BackpropStackPop, &[]);
        let graph = gb.graph();
        graph.node_mut(push).attrs_mut().stack_id = id;
        graph.set_type(retained, ty);
        if let Some(pop) = graph.value(retained).producer() {
            graph.node_mut(pop).attrs_mut().stack_id = id;
        }
        trace!("{}: retained '{}' with stack id {}", self.name, graph.value(v).name(), id);
        retained
    }

    /// Binds `gx` as (a contribution to) the gradient of input `xi`.
    ///
    /// A second contribution is summed with the existing one by an `Add` node
    /// and the input is rebound to the sum.
    pub fn set_grad(&mut self, xi: usize, gx: ValueId) -> Result<(), GradientError> {
        let x = self.input(xi)?;
        match self.grads.get(x) {
            Some(prev) => {
                let mut gb = GraphBuilder::new(self.graph, "AccumGrad", prev);
                let sum = gb.op(OpKind::Add, &[prev, gx]);
                self.grads.bind(x, sum);
            }
            None => self.grads.bind(x, gx),
        }
        Ok(())
    }

    /// Allocates a placeholder that a backward node will produce, and binds it
    /// as a gradient contribution of input `xi`.
    pub fn add_grad_value(&mut self, xi: usize) -> Result<ValueId, GradientError> {
        let x = self.input(xi)?;
        let prefix = format!("grad@{}", self.graph.value(x).name());
        let name = self.graph.gen_name(&prefix);
        let gv = self.graph.add_temp(name);
        self.set_grad(xi, gv)?;
        Ok(gv)
    }

    /// Emits `kind(inputs)` whose only output is a new gradient contribution of
    /// input `xi`. Returns that output so its producer can be configured.
    pub fn grad_op(
        &mut self,
        kind: OpKind,
        xi: usize,
        inputs: &[ValueId],
    ) -> Result<ValueId, GradientError> {
        let gv = self.add_grad_value(xi)?;
        let name = self.name.clone();
        self.graph.add_node(kind, inputs, &[gv], name);
        Ok(gv)
    }

    /// Builder for intermediate nodes of the gradient of input `xi`.
    pub fn builder(&mut self, xi: usize) -> Result<GraphBuilder<'_>, GradientError> {
        let x = self.input(xi)?;
        let category = self.name.clone();
        Ok(GraphBuilder::new(self.graph, category, x))
    }

    /// Attributes of the node producing `v`, typically a value returned by
    /// [`GradientContext::grad_op`].
    pub fn attrs_mut(&mut self, v: ValueId) -> Result<&mut Attributes, GradientError> {
        self.graph.producer_attrs_mut(v)
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
