//! Analysis unit: one compilation unit plus what the host resolved about it

use super::ast::SourceFile;
use super::bindings::TypeBindings;

#[derive(Debug, Clone, Default)]
pub struct AnalysisUnit {
    pub file: SourceFile,
    pub bindings: TypeBindings,
}

impl AnalysisUnit {
    pub fn new(file: SourceFile, bindings: TypeBindings) -> Self {
        Self { file, bindings }
    }

    /// Unit without any binding information
    pub fn unbound(file: SourceFile) -> Self {
        Self {
            file,
            bindings: TypeBindings::empty(),
        }
    }

    pub fn path(&self) -> &str {
        &self.file.path
    }
}
