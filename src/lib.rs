//! # IMPACTGRAPH
//!
//! Heuristic call and dependency graph extraction for Python code bases,
//! built to answer "what breaks if I change X?".
//!
//! Each source unit is parsed with tree-sitter and walked once. The walk
//! emits declaration nodes (classes, functions, methods) and typed edges
//! (imports, inheritance, calls) into an append-only [`GraphModel`]. Method
//! calls on instance attributes are upgraded to `Class.method` targets when
//! the attribute's type can be inferred from imports, constructor calls or
//! initializer annotations.
//!
//! Edges are hypotheses: a resolved call is emitted both qualified and bare,
//! and targets may name nothing that was declared. [`ImpactGraph`] merges and
//! filters the facts into a queryable graph.
//!
//! ## Output Formats
//!
//! - **Summary**: node and edge counts by kind, failures, sink statistics
//! - **JSON**: the raw node and edge sequences

pub mod config;
pub mod core;
pub mod error;
pub mod formatters;
pub mod parsers;

pub use crate::config::AnalyzerConfig;
pub use crate::core::{
    AnalysisReport, AttributeTypePolicy, CodebaseAnalyzer, Edge, GraphModel, ImpactGraph, Node,
    NodeKind, Relation, Traverser,
};
pub use crate::error::{AnalysisError, FailureKind};
