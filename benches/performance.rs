use criterion::{black_box, criterion_group, criterion_main, Criterion};
use impactgraph::config::AnalyzerConfig;
use impactgraph::core::{CodebaseAnalyzer, ImpactGraph};
use std::path::Path;
use tempfile::TempDir;

fn write_service_files(dir: &Path, count: usize) {
    for i in 0..count {
        let content = format!(
            r#"
from storage.db import DatabaseConnection
from services.email import EmailSender


class Service{i}:
    def __init__(self, db: DatabaseConnection):
        self.db = db
        self.mailer = EmailSender()

    def process(self, payload):
        row = self.db.insert("items_{i}", payload)
        self.notify(row)
        return self.calculate(row) * 2

    def notify(self, row):
        self.mailer.send(row)

    def calculate(self, row):
        return len(row) + {i}


def main():
    service = Service{i}(DatabaseConnection())
    return service.process({{"id": {i}}})
"#
        );
        std::fs::write(dir.join(format!("service_{i:03}.py")), content).unwrap();
    }
}

fn benchmark_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("codebase_analysis");

    let small = TempDir::new().unwrap();
    write_service_files(small.path(), 10);

    group.bench_function("small_codebase", |b| {
        let analyzer = CodebaseAnalyzer::new().unwrap();
        b.iter(|| {
            let report = analyzer.analyze_directory(black_box(small.path())).unwrap();
            black_box(report)
        });
    });

    let large = TempDir::new().unwrap();
    write_service_files(large.path(), 200);

    group.bench_function("large_codebase", |b| {
        let analyzer = CodebaseAnalyzer::new().unwrap();
        b.iter(|| {
            let report = analyzer.analyze_directory(black_box(large.path())).unwrap();
            black_box(report)
        });
    });

    group.bench_function("large_codebase_sequential", |b| {
        let config = AnalyzerConfig {
            parallel: false,
            ..AnalyzerConfig::default()
        };
        let analyzer = CodebaseAnalyzer::with_config(config).unwrap();
        b.iter(|| {
            let report = analyzer.analyze_directory(black_box(large.path())).unwrap();
            black_box(report)
        });
    });

    group.finish();
}

fn benchmark_impact_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("impact_queries");

    let dir = TempDir::new().unwrap();
    write_service_files(dir.path(), 200);
    let report = CodebaseAnalyzer::new()
        .unwrap()
        .analyze_directory(dir.path())
        .unwrap();

    group.bench_function("build_graph", |b| {
        b.iter(|| black_box(ImpactGraph::build(black_box(&report.model))));
    });

    let graph = ImpactGraph::build(&report.model);
    group.bench_function("find_dependents", |b| {
        b.iter(|| black_box(graph.find_dependents(black_box("Service7.process"), 3)));
    });

    group.finish();
}

criterion_group!(benches, benchmark_analysis, benchmark_impact_queries);
criterion_main!(benches);
