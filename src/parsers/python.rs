use std::path::Path;
use tracing::debug;

use super::common::{read_source, TreeSitterParser};
use super::ParsedUnit;
use crate::error::Result;

/// Source provider for Python units.
pub struct PythonParser;

impl PythonParser {
    pub fn new() -> Result<Self> {
        // Fail early on a grammar/runtime ABI mismatch rather than per unit.
        TreeSitterParser::new(tree_sitter_python::language())?;
        Ok(Self)
    }

    pub fn parse_source(&self, unit_id: &str, source: String) -> Result<ParsedUnit> {
        let mut parser = TreeSitterParser::new(tree_sitter_python::language())?;
        let tree = parser.parse(unit_id, &source)?;
        debug!(
            unit = unit_id,
            language = self.language_name(),
            bytes = source.len(),
            "parsed unit"
        );

        Ok(ParsedUnit {
            unit_id: unit_id.to_string(),
            source,
            tree,
        })
    }

    /// Read and parse a file; the path string becomes the unit identifier.
    pub fn parse_file(&self, file_path: &Path) -> Result<ParsedUnit> {
        let source = read_source(file_path)?;
        self.parse_source(&file_path.to_string_lossy(), source)
    }

    pub fn language_name(&self) -> &str {
        "python"
    }
}
