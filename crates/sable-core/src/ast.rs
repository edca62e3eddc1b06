use std::fmt;

use lasso::Spur;

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// An atom or an ordinary call.
    Plain,
    /// A parenthesized form that is never atomic, even without children:
    /// `(f)`, `()`, a parameter list.
    Group,
}

/// A node of the expression tree.
///
/// Evaluation writes the result back into the node and discards its children,
/// so callers evaluate a `clone()` whenever the tree is a reusable template
/// (function bodies, macro bodies, loop bodies).
#[derive(Debug, Clone)]
pub struct Node {
    value: Value,
    children: Vec<Node>,
    shape: Shape,
}

impl Node {
    pub fn atom(value: Value) -> Self {
        Node {
            value,
            children: Vec::new(),
            shape: Shape::Plain,
        }
    }

    /// A parenthesized form with `head` as its value.
    pub fn form(head: Value, children: Vec<Node>) -> Self {
        Node {
            value: head,
            children,
            shape: Shape::Group,
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn set_value(&mut self, value: Value) {
        self.value = value;
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [Node] {
        &mut self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn is_group(&self) -> bool {
        self.shape == Shape::Group
    }

    pub fn is_atom(&self) -> bool {
        self.children.is_empty() && self.shape == Shape::Plain
    }

    /// An atom whose value is no longer an identifier.
    pub fn is_resolved(&self) -> bool {
        self.is_atom() && !matches!(self.value, Value::Id(_))
    }

    /// Replace this node by its evaluated value.
    pub fn collapse(&mut self, value: Value) {
        self.value = value;
        self.children.clear();
        self.shape = Shape::Plain;
    }

    /// Replace every identifier node named in `bindings`, value and children,
    /// by a copy of the bound subtree. Inserted subtrees are not searched again.
    pub fn substitute(&mut self, bindings: &[(Spur, Node)]) {
        if let Value::Id(id) = self.value {
            if let Some((_, replacement)) = bindings.iter().find(|(name, _)| *name == id) {
                *self = replacement.clone();
                return;
            }
        }
        for child in &mut self.children {
            child.substitute(bindings);
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_atom() {
            return write!(f, "{}", self.value);
        }
        if self.children.is_empty() && self.value.is_nil() {
            return write!(f, "()");
        }
        write!(f, "({}", self.value)?;
        for child in &self.children {
            write!(f, " {child}")?;
        }
        write!(f, ")")
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Node::atom(value)
    }
}
