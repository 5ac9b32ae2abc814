use crate::error::GradientError;
use crate::ir::{Attributes, Node, NodeId, OpKind, Value, ValueId, ValueKind};
use crate::types::{Literal, Type};
use std::collections::HashSet;

/// An append-only computation graph.
///
/// Values and nodes live in arenas indexed by [`ValueId`] and [`NodeId`].
/// Nothing is ever removed, so handles stay valid for the lifetime of the graph.
/// Handles from one graph must not be used with another (a loop body is a
/// separate graph with its own arenas).
#[derive(Debug, Clone, Default)]
pub struct Graph {
    name: String,
    values: Vec<Value>,
    nodes: Vec<Node>,
    input_values: Vec<ValueId>,
    output_values: Vec<ValueId>,
    gensym: usize,
}

impl Graph {
    pub fn new(name: impl Into<String>) -> Self {
        Graph {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // --- Values ---

    pub fn add_value(&mut self, name: impl Into<String>, ty: Type, kind: ValueKind) -> ValueId {
        let id = ValueId(self.values.len());
        self.values.push(Value::new(name.into(), ty, kind));
        id
    }

    /// Adds a temporary value of unknown type.
    pub fn add_temp(&mut self, name: impl Into<String>) -> ValueId {
        self.add_value(name, Type::Unknown, ValueKind::Temporary)
    }

    /// Adds a value standing for an absent optional operand.
    pub fn add_null_value(&mut self) -> ValueId {
        let name = self.gen_name("null");
        self.add_value(name, Type::Unknown, ValueKind::Null)
    }

    pub fn add_input_value(&mut self, name: impl Into<String>, ty: Type) -> ValueId {
        let id = self.add_value(name, ty, ValueKind::Input);
        self.input_values.push(id);
        id
    }

    pub fn add_output_value(&mut self, name: impl Into<String>, ty: Type) -> ValueId {
        let id = self.add_value(name, ty, ValueKind::Output);
        self.output_values.push(id);
        id
    }

    /// Adds a `Constant` node and returns its output.
    pub fn add_constant(&mut self, name: impl Into<String>, literal: Literal) -> ValueId {
        let name = name.into();
        let out = self.add_value(name.clone(), literal.ty(), ValueKind::Temporary);
        let node = self.add_node(OpKind::Constant, &[], &[out], name);
        self.nodes[node.0].attrs.value = Some(literal);
        out
    }

    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id.0]
    }

    pub fn set_type(&mut self, id: ValueId, ty: Type) {
        self.values[id.0].ty = ty;
    }

    pub fn values(&self) -> impl Iterator<Item = (ValueId, &Value)> {
        self.values.iter().enumerate().map(|(i, v)| (ValueId(i), v))
    }

    pub fn num_values(&self) -> usize {
        self.values.len()
    }

    /// Resolves a value by name. Generated names are unique within a graph.
    pub fn find_value(&self, name: &str) -> Option<ValueId> {
        self.values
            .iter()
            .position(|v| v.name == name)
            .map(ValueId)
    }

    pub fn input_values(&self) -> &[ValueId] {
        &self.input_values
    }

    pub fn output_values(&self) -> &[ValueId] {
        &self.output_values
    }

    /// Appends an existing value to the graph's input list.
    pub fn push_input_value(&mut self, id: ValueId) {
        self.values[id.0].kind = ValueKind::Input;
        self.input_values.push(id);
    }

    /// Appends an existing value to the graph's output list.
    pub fn push_output_value(&mut self, id: ValueId) {
        self.values[id.0].kind = ValueKind::Output;
        self.output_values.push(id);
    }

    // --- Nodes ---

    /// Adds a node and links it as producer of `outputs` and user of `inputs`.
    pub fn add_node(
        &mut self,
        kind: OpKind,
        inputs: &[ValueId],
        outputs: &[ValueId],
        name: impl Into<String>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        for &input in inputs {
            self.values[input.0].users.push(id);
        }
        for &output in outputs {
            self.values[output.0].producer = Some(id);
        }
        self.nodes.push(Node {
            kind,
            name: name.into(),
            inputs: inputs.to_vec(),
            outputs: outputs.to_vec(),
            attrs: Attributes::default(),
            body: None,
        });
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Appends `value` to the inputs of an existing node.
    pub fn add_node_input(&mut self, node: NodeId, value: ValueId) {
        self.values[value.0].users.push(node);
        self.nodes[node.0].inputs.push(value);
    }

    /// Inserts `value` into the outputs of an existing node at `index`.
    pub fn insert_node_output(&mut self, node: NodeId, index: usize, value: ValueId) {
        self.values[value.0].producer = Some(node);
        self.nodes[node.0].outputs.insert(index, value);
    }

    /// Attributes of the node producing `value`.
    pub fn producer_attrs_mut(&mut self, value: ValueId) -> Result<&mut Attributes, GradientError> {
        match self.values[value.0].producer {
            Some(node) => Ok(&mut self.nodes[node.0].attrs),
            None => Err(GradientError::InvalidGraph(format!(
                "value '{}' has no producer",
                self.values[value.0].name
            ))),
        }
    }

    /// Returns a fresh name derived from `prefix`, unique within this graph.
    pub fn gen_name(&mut self, prefix: &str) -> String {
        self.gensym += 1;
        format!("{}_gensym_{}", prefix, self.gensym)
    }

    /// Nodes that (transitively) produce `roots`, in forward topological order.
    ///
    /// Only producers inside this graph are followed. Graph inputs, constants
    /// and values with no producer end the walk.
    pub fn topological_order(&self, roots: &[ValueId]) -> Vec<NodeId> {
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut order = Vec::new();
        // Iterative post-order DFS; the bool marks "children already pushed".
        let mut stack: Vec<(NodeId, bool)> = roots
            .iter()
            .rev()
            .filter_map(|&v| self.values[v.0].producer)
            .map(|n| (n, false))
            .collect();

        while let Some((node, expanded)) = stack.pop() {
            if expanded {
                order.push(node);
                continue;
            }
            if !visited.insert(node) {
                continue;
            }
            stack.push((node, true));
            for &input in self.nodes[node.0].inputs.iter().rev() {
                if let Some(producer) = self.values[input.0].producer {
                    if !visited.contains(&producer) {
                        stack.push((producer, false));
                    }
                }
            }
        }
        order
    }
}

#[cfg(test)]
#[path = "graph_test.rs"]
mod tests;
