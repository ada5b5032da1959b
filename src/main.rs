use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use impactgraph::config::load_config;
use impactgraph::formatters::{JsonFormatter, SummaryFormatter};
use impactgraph::{AttributeTypePolicy, CodebaseAnalyzer, ImpactGraph};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "impactgraph",
    version,
    about = "Extract a heuristic call/dependency graph from Python code for impact analysis"
)]
struct Cli {
    /// Python file or directory to analyze
    #[arg(short, long, value_name = "PATH")]
    path: PathBuf,

    /// Configuration file (defaults to ./impactgraph.toml when present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the formatted result here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Summary)]
    format: OutputFormat,

    /// Show what NAME reaches (calls, imports, inherits) within --depth hops
    #[arg(long, value_name = "NAME")]
    impact: Option<String>,

    /// Show what reaches NAME within --depth hops
    #[arg(long, value_name = "NAME")]
    dependents: Option<String>,

    /// Maximum number of hops for --impact and --dependents
    #[arg(long, default_value_t = 2)]
    depth: usize,

    /// Analyze units one after another instead of on the thread pool
    #[arg(long)]
    sequential: bool,

    /// Lifetime of inferred attribute types
    #[arg(long, value_enum)]
    attribute_policy: Option<PolicyArg>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
#[value(rename_all = "kebab-case")]
enum OutputFormat {
    Summary,
    Json,
    JsonPretty,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
#[value(rename_all = "kebab-case")]
enum PolicyArg {
    ClassScoped,
    UnitScoped,
}

impl From<PolicyArg> for AttributeTypePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::ClassScoped => AttributeTypePolicy::ClassScoped,
            PolicyArg::UnitScoped => AttributeTypePolicy::UnitScoped,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let start_time = Instant::now();

    if !cli.path.exists() {
        bail!("Path '{}' does not exist", cli.path.display());
    }

    let mut config = load_config(cli.config.as_deref()).context("loading configuration")?;
    if cli.sequential {
        config.parallel = false;
    }
    if let Some(policy) = cli.attribute_policy {
        config.attribute_policy = policy.into();
    }

    let analyzer = CodebaseAnalyzer::with_config(config)?;
    let report = analyzer.analyze_path(&cli.path)?;
    tracing::info!(
        "Analyzed {} units in {:.2}s",
        report.units_analyzed,
        start_time.elapsed().as_secs_f64()
    );

    // An empty result is the only outcome treated as fatal.
    if report.nodes().is_empty() {
        bail!(
            "No nodes found under '{}' ({} of {} units failed)",
            cli.path.display(),
            report.failures.len(),
            report.units_analyzed
        );
    }

    let graph = ImpactGraph::build(&report.model);
    let summary = SummaryFormatter::new();

    let mut rendered = match cli.format {
        OutputFormat::Summary => summary.format(&report, Some(&graph)),
        OutputFormat::Json => JsonFormatter::new().format_report(&report)?,
        OutputFormat::JsonPretty => JsonFormatter::new()
            .with_pretty(true)
            .format_report(&report)?,
    };

    let mut queries = String::new();
    if let Some(name) = &cli.impact {
        if graph.vertex(name).is_none() {
            tracing::warn!("'{}' is not a known node", name);
        }
        let hits = graph.find_impact(name, cli.depth);
        queries.push_str(&summary.format_hits(&format!("Impact of {name}:"), &hits));
    }
    if let Some(name) = &cli.dependents {
        if graph.vertex(name).is_none() {
            tracing::warn!("'{}' is not a known node", name);
        }
        let hits = graph.find_dependents(name, cli.depth);
        queries.push_str(&summary.format_hits(&format!("Dependents of {name}:"), &hits));
    }

    // Query results stay out of JSON documents.
    if cli.format == OutputFormat::Summary {
        rendered.push_str(&queries);
    } else {
        print!("{queries}");
    }

    match &cli.output {
        Some(output) => {
            std::fs::write(output, &rendered)
                .with_context(|| format!("writing {}", output.display()))?;
            println!("Wrote {}", output.display());
        }
        None => print!("{rendered}"),
    }

    tracing::info!(
        "Total execution time: {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}
