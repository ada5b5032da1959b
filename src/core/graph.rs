use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Attribute key holding the base-class names of a class, as written.
pub const BASE_CLASSES: &str = "base_classes";
/// Attribute key holding the ordered parameter names of a function or method.
pub const PARAMETERS: &str = "parameters";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Copy, PartialOrd, Ord)]
pub enum NodeKind {
    Module,
    Class,
    Function,
    Method,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Module => "Module",
            NodeKind::Class => "Class",
            NodeKind::Function => "Function",
            NodeKind::Method => "Method",
        }
    }

    pub fn all() -> &'static [NodeKind] {
        &[
            NodeKind::Module,
            NodeKind::Class,
            NodeKind::Function,
            NodeKind::Method,
        ]
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Copy, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Relation {
    Imports,
    Inherits,
    Calls,
}

impl Relation {
    pub fn as_str(self) -> &'static str {
        match self {
            Relation::Imports => "IMPORTS",
            Relation::Inherits => "INHERITS",
            Relation::Calls => "CALLS",
        }
    }

    pub fn all() -> &'static [Relation] {
        &[Relation::Imports, Relation::Inherits, Relation::Calls]
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-dependent, open attribute mapping attached to a node.
pub type NodeAttributes = BTreeMap<String, Vec<String>>;

/// A declared structural entity. Never mutated once appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub qualified_name: String,
    pub source_unit: String,
    pub source_line: usize,
    pub attributes: NodeAttributes,
}

impl Node {
    pub fn new(
        kind: NodeKind,
        qualified_name: String,
        source_unit: String,
        source_line: usize,
    ) -> Self {
        Self {
            kind,
            qualified_name,
            source_unit,
            source_line,
            attributes: NodeAttributes::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, values: Vec<String>) -> Self {
        self.attributes.insert(key.to_string(), values);
        self
    }

    pub fn base_classes(&self) -> &[String] {
        self.attribute(BASE_CLASSES)
    }

    pub fn parameters(&self) -> &[String] {
        self.attribute(PARAMETERS)
    }

    fn attribute(&self, key: &str) -> &[String] {
        self.attributes.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// A directed, typed hypothesis between two names.
///
/// `target` is not guaranteed to name any [`Node`]; matching it against the
/// declared nodes is left to the consumer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub relation: Relation,
    pub source_unit: String,
    pub source_line: Option<usize>,
}

impl Edge {
    pub fn new(source: String, target: String, relation: Relation, source_unit: String) -> Self {
        Self {
            source,
            target,
            relation,
            source_unit,
            source_line: None,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.source_line = Some(line);
        self
    }
}

/// Append-only accumulator for the facts emitted during analysis.
///
/// There is no validation and no deduplication: a qualified name may appear
/// several times and an edge may be emitted more than once. Both sequences
/// keep insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphModel {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_node(
        &mut self,
        kind: NodeKind,
        qualified_name: impl Into<String>,
        source_unit: impl Into<String>,
        source_line: usize,
        attributes: NodeAttributes,
    ) {
        let mut node = Node::new(kind, qualified_name.into(), source_unit.into(), source_line);
        node.attributes = attributes;
        self.nodes.push(node);
    }

    pub fn append_edge(
        &mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        relation: Relation,
        source_unit: impl Into<String>,
        source_line: Option<usize>,
    ) {
        let mut edge = Edge::new(source.into(), target.into(), relation, source_unit.into());
        edge.source_line = source_line;
        self.edges.push(edge);
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Move every fact of `other` to the end of this model, preserving order.
    pub fn extend(&mut self, other: GraphModel) {
        self.nodes.extend(other.nodes);
        self.edges.extend(other.edges);
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Node>, Vec<Edge>) {
        (self.nodes, self.edges)
    }
}
