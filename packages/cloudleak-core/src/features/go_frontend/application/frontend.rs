//! Parse Go source into an analysis unit

use crate::errors::{CloudleakError, Result};
use crate::features::go_frontend::infrastructure::{BindingsBuilder, GoLowering};
use crate::shared::models::AnalysisUnit;
use tracing::debug;
use tree_sitter::Parser;

/// Reusable Go parser. Not `Sync`; create one per worker thread.
pub struct GoFrontend {
    parser: Parser,
}

impl GoFrontend {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::language())
            .map_err(|e| CloudleakError::parse_error(format!("failed to load Go grammar: {}", e)))?;
        Ok(Self { parser })
    }

    pub fn parse(&mut self, path: &str, source: &str) -> Result<AnalysisUnit> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| CloudleakError::parse_error(format!("failed to parse {}", path)))?;
        let root = tree.root_node();
        if root.has_error() {
            // tree-sitter recovers; analysis proceeds on the recovered tree
            debug!(path, "Go source contains syntax errors");
        }

        let file = GoLowering::new(source).lower_file(path, &root);
        let bindings = BindingsBuilder::new(&file).build();
        debug!(
            path,
            functions = file.funcs.len(),
            bindings = bindings.len(),
            "lowered Go unit"
        );
        Ok(AnalysisUnit::new(file, bindings))
    }
}

/// Parse a single Go file with a throwaway parser
pub fn parse_go(path: &str, source: &str) -> Result<AnalysisUnit> {
    GoFrontend::new()?.parse(path, source)
}
