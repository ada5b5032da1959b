pub mod analyzer;
pub mod graph;
pub mod impact;
pub mod resolver;
pub mod scanner;
pub mod traverser;

pub use analyzer::{traverse_unit, AnalysisReport, CodebaseAnalyzer, UnitFailure};
pub use graph::{Edge, GraphModel, Node, NodeAttributes, NodeKind, Relation};
pub use impact::{DependencyGraph, ExternalNames, GraphStats, ImpactGraph, ImpactHit};
pub use resolver::{AttributeTypePolicy, ResolutionState};
pub use scanner::FileScanner;
pub use traverser::Traverser;
