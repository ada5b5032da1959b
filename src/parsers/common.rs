use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tree_sitter::{Language, Node as TSNode, Parser, Tree};

use crate::error::{AnalysisError, Result};

pub struct TreeSitterParser {
    parser: Parser,
}

impl TreeSitterParser {
    pub fn new(language: Language) -> Result<Self> {
        let mut parser = Parser::new();
        parser.set_language(language)?;
        Ok(Self { parser })
    }

    /// Parse `source` and reject trees containing syntax errors.
    pub fn parse(&mut self, unit_id: &str, source: &str) -> Result<Tree> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| AnalysisError::parse(unit_id, "parser produced no syntax tree"))?;

        let root = tree.root_node();
        if root.has_error() {
            let message = match first_error_position(&root) {
                Some((line, column)) => format!("invalid syntax at line {line}, column {column}"),
                None => "invalid syntax".to_string(),
            };
            return Err(AnalysisError::parse(unit_id, message));
        }

        Ok(tree)
    }
}

/// Buffered read of a whole source file into a string.
pub fn read_source(file_path: &Path) -> Result<String> {
    let io_error = |source| AnalysisError::Io {
        path: file_path.to_path_buf(),
        source,
    };

    let file = File::open(file_path).map_err(io_error)?;
    let file_size = file.metadata().map_err(io_error)?.len() as usize;

    let mut reader =
        BufReader::with_capacity(if file_size < 8192 { file_size } else { 8192 }, file);

    let mut content = String::with_capacity(file_size);
    match reader.read_to_string(&mut content) {
        Ok(_) => Ok(content),
        Err(err) if err.kind() == std::io::ErrorKind::InvalidData => Err(AnalysisError::parse(
            file_path.to_string_lossy(),
            "source is not valid UTF-8",
        )),
        Err(err) => Err(io_error(err)),
    }
}

pub fn extract_text<'a>(node: &TSNode, source: &'a [u8]) -> &'a str {
    std::str::from_utf8(&source[node.byte_range()]).unwrap_or("")
}

pub fn find_child_by_kind<'tree>(node: &TSNode<'tree>, kind: &str) -> Option<TSNode<'tree>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|child| child.kind() == kind);
    found
}

/// 1-based line and column of the first error or missing node, in pre-order.
///
/// Only subtrees that report an error are entered.
pub fn first_error_position(node: &TSNode) -> Option<(usize, usize)> {
    let mut cursor = node.walk();
    loop {
        let current = cursor.node();
        if current.is_error() || current.is_missing() {
            let position = current.start_position();
            return Some((position.row + 1, position.column + 1));
        }
        if current.has_error() && cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

/// 1-based line of the node's first byte.
pub fn line_of(node: &TSNode) -> usize {
    node.start_position().row + 1
}
