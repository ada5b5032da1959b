use impactgraph::config::{load_config, AnalyzerConfig, DEFAULT_EXCLUDE_DIRS};
use impactgraph::{AnalysisError, AttributeTypePolicy, CodebaseAnalyzer, FailureKind};
use std::fs;

#[test]
fn defaults() {
    let config = AnalyzerConfig::default();

    assert!(config.parallel);
    assert_eq!(config.attribute_policy, AttributeTypePolicy::ClassScoped);
    assert_eq!(config.extensions, vec!["py", "pyi", "pyw"]);
    assert_eq!(config.exclude_dirs.len(), DEFAULT_EXCLUDE_DIRS.len());
    assert!(config.exclude_dirs.iter().any(|d| d == "__pycache__"));
    assert!(config.exclude_patterns.is_empty());
}

#[test]
fn partial_toml_keeps_defaults_for_missing_fields() {
    let config = AnalyzerConfig::from_toml_str(
        r#"
parallel = false
attribute_policy = "unit-scoped"
exclude_patterns = ["^migrations/"]
"#,
    )
    .unwrap();

    assert!(!config.parallel);
    assert_eq!(config.attribute_policy, AttributeTypePolicy::UnitScoped);
    assert_eq!(config.exclude_patterns, vec!["^migrations/"]);
    assert_eq!(config.extensions, AnalyzerConfig::default().extensions);
}

#[test]
fn toml_round_trip() {
    let config = AnalyzerConfig {
        parallel: false,
        attribute_policy: AttributeTypePolicy::UnitScoped,
        ..AnalyzerConfig::default()
    };
    let text = config.to_toml_string().unwrap();

    assert!(text.contains("attribute_policy = \"unit-scoped\""));
    assert_eq!(AnalyzerConfig::from_toml_str(&text).unwrap(), config);
}

#[test]
fn unknown_policy_is_a_config_error() {
    let err = AnalyzerConfig::from_toml_str("attribute_policy = \"global\"\n").unwrap_err();

    assert!(matches!(err, AnalysisError::Config(_)));
    assert_eq!(err.kind(), FailureKind::Config);
}

#[test]
fn bad_exclude_pattern_is_rejected_up_front() {
    let config = AnalyzerConfig {
        exclude_patterns: vec!["(unclosed".to_string()],
        ..AnalyzerConfig::default()
    };

    let err = CodebaseAnalyzer::with_config(config).err().unwrap();
    assert!(matches!(err, AnalysisError::Config(ref message) if message.contains("(unclosed")));
}

#[test]
fn load_config_from_an_explicit_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("impactgraph.toml");
    fs::write(&path, "parallel = false\nextensions = [\"py\"]\n").unwrap();

    let config = load_config(Some(path.as_path())).unwrap();
    assert!(!config.parallel);
    assert_eq!(config.extensions, vec!["py"]);
}

#[test]
fn missing_explicit_config_file_is_an_io_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let err = load_config(Some(dir.path().join("missing.toml").as_path())).unwrap_err();

    assert_eq!(err.kind(), FailureKind::Io);
}
