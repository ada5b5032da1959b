use crate::core::impact::ImpactHit;
use crate::core::{AnalysisReport, GraphStats, ImpactGraph, NodeKind, Relation};

const RULE_WIDTH: usize = 50;

/// Plain-text statistics block for terminals and logs.
pub struct SummaryFormatter {
    max_failures: usize,
}

impl SummaryFormatter {
    pub fn new() -> Self {
        Self { max_failures: 10 }
    }

    pub fn with_max_failures(mut self, max_failures: usize) -> Self {
        self.max_failures = max_failures;
        self
    }

    pub fn format(&self, report: &AnalysisReport, sink: Option<&ImpactGraph>) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let stats = GraphStats::from_model(&report.model);
        let mut output = String::new();

        output.push_str(&format!("{rule}\nGRAPH SUMMARY\n{rule}\n"));
        output.push_str(&format!(
            "Units analyzed: {} ({} failed)\n",
            report.units_analyzed,
            report.failures.len()
        ));
        output.push_str(&format!("Total Nodes: {}\n", stats.total_nodes));
        output.push_str(&format!("Total Edges: {}\n", stats.total_edges));
        output.push_str(&self.format_breakdown(&stats));

        if let Some(graph) = sink {
            output.push_str("\nMerged graph:\n");
            output.push_str(&format!("  Vertices: {}\n", graph.node_count()));
            output.push_str(&format!("  Kept edges: {}\n", graph.edge_count()));
            output.push_str(&format!(
                "  Merged duplicate nodes: {}\n",
                graph.duplicate_nodes()
            ));
            for (reason, count) in graph.rejected() {
                output.push_str(&format!("  Rejected ({}): {}\n", reason.as_str(), count));
            }
        }

        if report.has_failures() {
            output.push_str("\nFailures:\n");
            for failure in report.failures.iter().take(self.max_failures) {
                output.push_str(&format!("  [{:?}] {}\n", failure.kind, failure.message));
            }
            let hidden = report.failures.len().saturating_sub(self.max_failures);
            if hidden > 0 {
                output.push_str(&format!("  ... and {hidden} more\n"));
            }
        }

        output.push_str(&rule);
        output.push('\n');
        output
    }

    /// One line per hit: `  [depth] name (Kind via RELATION)`.
    pub fn format_hits(&self, title: &str, hits: &[ImpactHit]) -> String {
        let mut output = format!("{title}\n");
        if hits.is_empty() {
            output.push_str("  (none)\n");
        }
        for hit in hits {
            output.push_str(&format!(
                "  [{}] {} ({} via {})\n",
                hit.depth, hit.name, hit.kind, hit.via
            ));
        }
        output
    }

    fn format_breakdown(&self, stats: &GraphStats) -> String {
        let mut output = String::from("\nNodes by Type:\n");
        for kind in NodeKind::all() {
            if let Some(count) = stats.nodes_by_kind.get(kind) {
                output.push_str(&format!("  {kind}: {count}\n"));
            }
        }

        output.push_str("\nEdges by Type:\n");
        for relation in Relation::all() {
            if let Some(count) = stats.edges_by_relation.get(relation) {
                output.push_str(&format!("  {relation}: {count}\n"));
            }
        }
        output
    }
}

impl Default for SummaryFormatter {
    fn default() -> Self {
        Self::new()
    }
}
