use std::path::PathBuf;

/// Result alias used across the analysis pipeline.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Coarse classification of a per-unit failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FailureKind {
    Parse,
    Traversal,
    Io,
    Config,
}

/// Errors raised while turning a source unit into graph facts.
///
/// None of these are fatal to a batch: the analyzer records them per unit and
/// carries on with the remaining units.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("parse failure in {unit}: {message}")]
    Parse { unit: String, message: String },

    #[error("traversal failure in {unit}: {message}")]
    Traversal { unit: String, message: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("incompatible tree-sitter grammar: {0}")]
    Grammar(#[from] tree_sitter::LanguageError),
}

impl AnalysisError {
    pub fn parse(unit: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            unit: unit.into(),
            message: message.into(),
        }
    }

    pub fn traversal(unit: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Traversal {
            unit: unit.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            AnalysisError::Parse { .. } => FailureKind::Parse,
            AnalysisError::Traversal { .. } => FailureKind::Traversal,
            AnalysisError::Io { .. } => FailureKind::Io,
            AnalysisError::Config(_) | AnalysisError::Grammar(_) => FailureKind::Config,
        }
    }
}
