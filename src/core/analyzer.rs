use rayon::prelude::*;
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::graph::{Edge, GraphModel, Node};
use super::resolver::AttributeTypePolicy;
use super::scanner::FileScanner;
use super::traverser::Traverser;
use crate::config::AnalyzerConfig;
use crate::error::{AnalysisError, FailureKind, Result};
use crate::parsers::python::PythonParser;
use crate::parsers::ParsedUnit;

/// A unit that contributed nothing to the model, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitFailure {
    pub unit: String,
    pub kind: FailureKind,
    pub message: String,
}

impl UnitFailure {
    fn new(unit: impl Into<String>, error: &AnalysisError) -> Self {
        Self {
            unit: unit.into(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Outcome of analyzing a batch of units.
#[derive(Debug, Default)]
pub struct AnalysisReport {
    pub model: GraphModel,
    pub failures: Vec<UnitFailure>,
    /// Units that were attempted, failed or not.
    pub units_analyzed: usize,
}

impl AnalysisReport {
    pub fn nodes(&self) -> &[Node] {
        self.model.nodes()
    }

    pub fn edges(&self) -> &[Edge] {
        self.model.edges()
    }

    pub fn units_succeeded(&self) -> usize {
        self.units_analyzed - self.failures.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

enum UnitInput {
    File(PathBuf),
    Source { unit_id: String, source: String },
}

impl UnitInput {
    fn unit_id(&self) -> String {
        match self {
            UnitInput::File(path) => path.to_string_lossy().into_owned(),
            UnitInput::Source { unit_id, .. } => unit_id.clone(),
        }
    }
}

/// Run one traversal over an already parsed unit into a fresh model.
pub fn traverse_unit(unit: &ParsedUnit, policy: AttributeTypePolicy) -> Result<GraphModel> {
    let mut model = GraphModel::new();
    Traverser::with_policy(unit.unit_id.as_str(), &mut model, policy)
        .visit(unit.root(), unit.source_bytes())?;
    Ok(model)
}

/// Drives discovery, parsing and traversal, isolating failures per unit.
pub struct CodebaseAnalyzer {
    config: AnalyzerConfig,
    file_scanner: FileScanner,
    parser: PythonParser,
}

impl CodebaseAnalyzer {
    pub fn new() -> Result<Self> {
        Self::with_config(AnalyzerConfig::default())
    }

    pub fn with_config(config: AnalyzerConfig) -> Result<Self> {
        Ok(Self {
            file_scanner: FileScanner::from_config(&config)?,
            parser: PythonParser::new()?,
            config,
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze a file or, recursively, a directory.
    pub fn analyze_path(&self, path: &Path) -> Result<AnalysisReport> {
        if path.is_file() {
            Ok(self.analyze_file(path))
        } else {
            self.analyze_directory(path)
        }
    }

    pub fn analyze_directory(&self, root_path: &Path) -> Result<AnalysisReport> {
        info!("Scanning {}", root_path.display());
        let files = self.file_scanner.scan_directory(root_path)?;
        info!("Found {} source files to analyze", files.len());

        let inputs = files.into_iter().map(|file| UnitInput::File(file.path)).collect();
        Ok(self.run(inputs))
    }

    pub fn analyze_file(&self, file_path: &Path) -> AnalysisReport {
        self.run(vec![UnitInput::File(file_path.to_path_buf())])
    }

    pub fn analyze_source(&self, unit_id: &str, source: &str) -> AnalysisReport {
        self.analyze_sources(vec![(unit_id.to_string(), source.to_string())])
    }

    /// Analyze in-memory `(unit_id, source)` pairs in the given order.
    pub fn analyze_sources(&self, units: Vec<(String, String)>) -> AnalysisReport {
        let inputs = units
            .into_iter()
            .map(|(unit_id, source)| UnitInput::Source { unit_id, source })
            .collect();
        self.run(inputs)
    }

    fn run(&self, inputs: Vec<UnitInput>) -> AnalysisReport {
        let units_analyzed = inputs.len();

        // Each unit lands in its own model; merging in input order keeps the
        // parallel result identical to the sequential one.
        let outcomes: Vec<(String, Result<GraphModel>)> = if self.config.parallel {
            inputs
                .into_par_iter()
                .map(|input| (input.unit_id(), self.analyze_unit(input)))
                .collect()
        } else {
            inputs
                .into_iter()
                .map(|input| (input.unit_id(), self.analyze_unit(input)))
                .collect()
        };

        let mut report = AnalysisReport {
            units_analyzed,
            ..AnalysisReport::default()
        };
        for (unit_id, outcome) in outcomes {
            match outcome {
                Ok(model) => report.model.extend(model),
                Err(err) => {
                    warn!("Skipping {}: {}", unit_id, err);
                    report.failures.push(UnitFailure::new(unit_id, &err));
                }
            }
        }

        info!(
            units = units_analyzed,
            failed = report.failures.len(),
            nodes = report.nodes().len(),
            edges = report.edges().len(),
            "analysis finished"
        );
        report
    }

    fn analyze_unit(&self, input: UnitInput) -> Result<GraphModel> {
        let unit_id = input.unit_id();
        let policy = self.config.attribute_policy;

        let parsed = match input {
            UnitInput::File(path) => self.parser.parse_file(&path)?,
            UnitInput::Source { unit_id, source } => self.parser.parse_source(&unit_id, source)?,
        };

        match panic::catch_unwind(AssertUnwindSafe(|| traverse_unit(&parsed, policy))) {
            Ok(result) => {
                debug!(unit = %unit_id, ok = result.is_ok(), "unit done");
                result
            }
            Err(payload) => Err(AnalysisError::traversal(unit_id, panic_message(&*payload))),
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("traversal panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("traversal panicked: {message}")
    } else {
        "traversal panicked".to_string()
    }
}
