pub mod common;
pub mod python;

use tree_sitter::{Node as TSNode, Tree};

/// One source unit, parsed and ready for traversal.
///
/// The unit identifier is used verbatim as `source_unit` on every emitted fact.
pub struct ParsedUnit {
    pub unit_id: String,
    pub source: String,
    pub tree: Tree,
}

impl ParsedUnit {
    pub fn root(&self) -> TSNode<'_> {
        self.tree.root_node()
    }

    pub fn source_bytes(&self) -> &[u8] {
        self.source.as_bytes()
    }
}

impl std::fmt::Debug for ParsedUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedUnit")
            .field("unit_id", &self.unit_id)
            .field("bytes", &self.source.len())
            .finish()
    }
}
