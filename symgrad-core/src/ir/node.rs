use crate::ir::{Attributes, Graph, OpKind, ValueId};
use std::fmt;

/// Handle to a node in the arena of the graph that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

/// An operator instance.
///
/// Input and output lists are only edited through [`Graph`] so that producer
/// and user links stay consistent.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) kind: OpKind,
    pub(crate) name: String,
    pub(crate) inputs: Vec<ValueId>,
    pub(crate) outputs: Vec<ValueId>,
    pub(crate) attrs: Attributes,
    pub(crate) body: Option<Graph>,
}

impl Node {
    pub fn kind(&self) -> OpKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[ValueId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[ValueId] {
        &self.outputs
    }

    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    pub fn attrs_mut(&mut self) -> &mut Attributes {
        &mut self.attrs
    }

    /// Nested graph of control-flow nodes.
    pub fn body(&self) -> Option<&Graph> {
        self.body.as_ref()
    }

    pub fn body_mut(&mut self) -> Option<&mut Graph> {
        self.body.as_mut()
    }

    pub fn set_body(&mut self, body: Graph) {
        self.body = Some(body);
    }

    /// Detaches the body so it can be mutated alongside the enclosing graph.
    /// Callers put it back with [`Node::set_body`].
    pub fn take_body(&mut self) -> Option<Graph> {
        self.body.take()
    }
}
