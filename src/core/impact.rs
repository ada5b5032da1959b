//! Graph sink: materializes the emitted facts into a queryable graph.
//!
//! Nodes are merged by qualified name, each source unit becomes a `Module`
//! vertex, and edges are kept only when both endpoints are known and the
//! target is not an external (builtin or standard-library) name.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use super::graph::{GraphModel, NodeKind, Relation};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vertex {
    pub name: String,
    pub kind: NodeKind,
    pub source_unit: String,
    pub source_line: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub relation: Relation,
    pub source_unit: String,
    pub source_line: Option<usize>,
}

pub type DependencyGraph = DiGraph<Vertex, Link>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RejectReason {
    UnknownSource,
    UnknownTarget,
    ExternalTarget,
    Duplicate,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectReason::UnknownSource => "unknown source",
            RejectReason::UnknownTarget => "unknown target",
            RejectReason::ExternalTarget => "external target",
            RejectReason::Duplicate => "duplicate",
        }
    }
}

/// Names treated as outside the analyzed code base.
#[derive(Debug, Clone)]
pub struct ExternalNames {
    modules: HashSet<String>,
    functions: HashSet<String>,
}

const BUILTIN_MODULES: &[&str] = &[
    "typing",
    "sqlite3",
    "smtplib",
    "email",
    "os",
    "pathlib",
    "collections",
    "sys",
    "json",
    "datetime",
    "re",
    "math",
    "random",
    "itertools",
];

const BUILTIN_FUNCTIONS: &[&str] = &[
    "join", "split", "keys", "values", "items", "get", "set", "append", "extend", "pop",
    "remove", "insert", "sort", "reverse", "copy", "cursor", "connect", "execute", "fetchone",
    "fetchall", "commit", "close", "starttls", "send_message", "quit", "isinstance", "len",
    "str", "int", "float", "bool", "list", "dict", "tuple",
];

impl ExternalNames {
    pub fn empty() -> Self {
        Self {
            modules: HashSet::new(),
            functions: HashSet::new(),
        }
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.modules.insert(module.into());
        self
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.functions.insert(function.into());
        self
    }

    pub fn is_external(&self, target: &str) -> bool {
        if self.modules.contains(target) || self.functions.contains(target) {
            return true;
        }
        match target.split_once('.') {
            Some((root, _)) => self.modules.contains(root),
            None => false,
        }
    }
}

impl Default for ExternalNames {
    fn default() -> Self {
        Self {
            modules: BUILTIN_MODULES.iter().map(|s| s.to_string()).collect(),
            functions: BUILTIN_FUNCTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// A vertex reached by an impact query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImpactHit {
    pub name: String,
    pub kind: NodeKind,
    /// Minimum number of hops from the query vertex.
    pub depth: usize,
    /// Relation of the hop that first reached this vertex.
    pub via: Relation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub nodes_by_kind: BTreeMap<NodeKind, usize>,
    pub edges_by_relation: BTreeMap<Relation, usize>,
}

impl GraphStats {
    /// Raw counts over the emitted facts, before any merging or filtering.
    pub fn from_model(model: &GraphModel) -> Self {
        let mut stats = GraphStats {
            total_nodes: model.nodes().len(),
            total_edges: model.edges().len(),
            ..GraphStats::default()
        };
        for node in model.nodes() {
            *stats.nodes_by_kind.entry(node.kind).or_insert(0) += 1;
        }
        for edge in model.edges() {
            *stats.edges_by_relation.entry(edge.relation).or_insert(0) += 1;
        }
        stats
    }
}

pub struct ImpactGraph {
    graph: DependencyGraph,
    index: HashMap<String, NodeIndex>,
    duplicate_nodes: usize,
    rejected: BTreeMap<RejectReason, usize>,
}

impl ImpactGraph {
    pub fn build(model: &GraphModel) -> Self {
        Self::build_with_filter(model, &ExternalNames::default())
    }

    pub fn build_with_filter(model: &GraphModel, external: &ExternalNames) -> Self {
        let mut builder = Self {
            graph: DependencyGraph::new(),
            index: HashMap::new(),
            duplicate_nodes: 0,
            rejected: BTreeMap::new(),
        };

        let units = model
            .nodes()
            .iter()
            .map(|node| node.source_unit.as_str())
            .chain(model.edges().iter().map(|edge| edge.source_unit.as_str()));
        for unit in units {
            if !builder.index.contains_key(unit) {
                builder.add_vertex(Vertex {
                    name: unit.to_string(),
                    kind: NodeKind::Module,
                    source_unit: unit.to_string(),
                    source_line: None,
                });
            }
        }

        for node in model.nodes() {
            if builder.index.contains_key(&node.qualified_name) {
                builder.duplicate_nodes += 1;
                continue;
            }
            builder.add_vertex(Vertex {
                name: node.qualified_name.clone(),
                kind: node.kind,
                source_unit: node.source_unit.clone(),
                source_line: Some(node.source_line),
            });
        }

        let mut seen = HashSet::new();
        for edge in model.edges() {
            let source = builder.index.get(&edge.source).copied();
            let target = builder.index.get(&edge.target).copied();
            let verdict = match (source, target) {
                _ if external.is_external(&edge.target) => Err(RejectReason::ExternalTarget),
                (None, _) => Err(RejectReason::UnknownSource),
                (_, None) => Err(RejectReason::UnknownTarget),
                (Some(source), Some(target)) => {
                    if seen.insert((source, target, edge.relation)) {
                        Ok((source, target))
                    } else {
                        Err(RejectReason::Duplicate)
                    }
                }
            };

            match verdict {
                Ok((source, target)) => {
                    builder.graph.add_edge(
                        source,
                        target,
                        Link {
                            relation: edge.relation,
                            source_unit: edge.source_unit.clone(),
                            source_line: edge.source_line,
                        },
                    );
                }
                Err(reason) => *builder.rejected.entry(reason).or_insert(0) += 1,
            }
        }

        builder
    }

    fn add_vertex(&mut self, vertex: Vertex) -> NodeIndex {
        let name = vertex.name.clone();
        let index = self.graph.add_node(vertex);
        self.index.insert(name, index);
        index
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn vertex(&self, name: &str) -> Option<&Vertex> {
        self.index.get(name).map(|&idx| &self.graph[idx])
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Declarations merged away because their qualified name was already present.
    pub fn duplicate_nodes(&self) -> usize {
        self.duplicate_nodes
    }

    pub fn rejected(&self) -> &BTreeMap<RejectReason, usize> {
        &self.rejected
    }

    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }

    /// Everything `name` reaches within `depth` hops along edge direction.
    pub fn find_impact(&self, name: &str, depth: usize) -> Vec<ImpactHit> {
        self.walk(name, depth, Direction::Outgoing)
    }

    /// Everything that reaches `name` within `depth` hops, i.e. what may
    /// break when `name` changes.
    pub fn find_dependents(&self, name: &str, depth: usize) -> Vec<ImpactHit> {
        self.walk(name, depth, Direction::Incoming)
    }

    /// Direct callers of `name`, sorted.
    pub fn callers_of(&self, name: &str) -> Vec<&str> {
        let Some(&target) = self.index.get(name) else {
            return Vec::new();
        };
        let mut callers: Vec<&str> = self
            .graph
            .edges_directed(target, Direction::Incoming)
            .filter(|edge| edge.weight().relation == Relation::Calls)
            .map(|edge| self.graph[edge.source()].name.as_str())
            .collect();
        callers.sort_unstable();
        callers.dedup();
        callers
    }

    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            total_nodes: self.graph.node_count(),
            total_edges: self.graph.edge_count(),
            ..GraphStats::default()
        };
        for vertex in self.graph.node_weights() {
            *stats.nodes_by_kind.entry(vertex.kind).or_insert(0) += 1;
        }
        for link in self.graph.edge_weights() {
            *stats.edges_by_relation.entry(link.relation).or_insert(0) += 1;
        }
        stats
    }

    fn walk(&self, name: &str, max_depth: usize, direction: Direction) -> Vec<ImpactHit> {
        let Some(&start) = self.index.get(name) else {
            return Vec::new();
        };

        let mut visited: HashSet<NodeIndex> = HashSet::from([start]);
        let mut queue = VecDeque::from([(start, 0usize)]);
        let mut hits = Vec::new();

        while let Some((current, depth)) = queue.pop_front() {
            if depth == max_depth {
                continue;
            }
            for edge in self.graph.edges_directed(current, direction) {
                let next = match direction {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                if !visited.insert(next) {
                    continue;
                }
                let vertex = &self.graph[next];
                hits.push(ImpactHit {
                    name: vertex.name.clone(),
                    kind: vertex.kind,
                    depth: depth + 1,
                    via: edge.weight().relation,
                });
                queue.push_back((next, depth + 1));
            }
        }

        hits.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.name.cmp(&b.name)));
        hits
    }
}
