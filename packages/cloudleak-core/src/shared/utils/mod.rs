//! Utility modules shared across features
//!
//! - `scope_stack`: lexical scope management for name resolution
//! - `tree_sitter`: tree-sitter node traversal and extraction
//! - `visit`: syntax tree visitor with per-kind handlers

pub mod scope_stack;
pub mod tree_sitter;
pub mod visit;

pub use scope_stack::ScopeStack;
pub use visit::{CallCollector, Visitor};
