use anyhow::Result;
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::core::{AnalysisReport, Edge, Node, UnitFailure};

/// JSON export of the raw node and edge sequences, in insertion order.
pub struct JsonFormatter {
    pretty: bool,
}

#[derive(Serialize)]
struct Meta {
    nodes: usize,
    edges: usize,
    units: usize,
    failed_units: usize,
    format: &'static str,
}

#[derive(Serialize)]
struct Document<'a> {
    meta: Meta,
    nodes: &'a [Node],
    edges: &'a [Edge],
    failures: &'a [UnitFailure],
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self { pretty: false }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn format_to_file(&self, report: &AnalysisReport, output_path: &Path) -> Result<()> {
        let json_content = self.format_report(report)?;
        fs::write(output_path, json_content)?;
        Ok(())
    }

    pub fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        let document = Document {
            meta: Meta {
                nodes: report.nodes().len(),
                edges: report.edges().len(),
                units: report.units_analyzed,
                failed_units: report.failures.len(),
                format: if self.pretty { "pretty" } else { "compact" },
            },
            nodes: report.nodes(),
            edges: report.edges(),
            failures: &report.failures,
        };

        let rendered = if self.pretty {
            serde_json::to_string_pretty(&document)?
        } else {
            serde_json::to_string(&document)?
        };
        Ok(rendered)
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}
