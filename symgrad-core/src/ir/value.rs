use crate::ir::NodeId;
use crate::types::Type;
use std::fmt;

/// Handle to a value in the arena of the graph that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub(crate) usize);

impl ValueId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({})", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Graph input, bound by the caller.
    Input,
    /// Graph output.
    Output,
    /// Intermediate edge produced by a node.
    Temporary,
    /// Absent optional operand (e.g. the condition of a reverse loop).
    Null,
}

/// A typed tensor-valued edge.
#[derive(Debug, Clone)]
pub struct Value {
    pub(crate) name: String,
    pub(crate) ty: Type,
    pub(crate) kind: ValueKind,
    pub(crate) producer: Option<NodeId>,
    pub(crate) users: Vec<NodeId>,
}

impl Value {
    pub(crate) fn new(name: String, ty: Type, kind: ValueKind) -> Self {
        Value {
            name,
            ty,
            kind,
            producer: None,
            users: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn is_null(&self) -> bool {
        self.kind == ValueKind::Null
    }

    pub fn producer(&self) -> Option<NodeId> {
        self.producer
    }

    /// Nodes consuming this value, in the order they were added.
    pub fn users(&self) -> &[NodeId] {
        &self.users
    }
}
