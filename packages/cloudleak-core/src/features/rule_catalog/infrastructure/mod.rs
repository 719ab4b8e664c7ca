//! Catalog sources: built-in rules, YAML/JSON documents, glob compilation

pub mod built_in;
pub mod document;
pub mod glob;

pub use document::{CatalogDocument, CatalogParts};
pub use glob::compile_glob;
