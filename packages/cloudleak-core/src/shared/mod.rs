//! Shared module - Common types and utilities
//!
//! Types shared across all features. Nothing here depends on a feature module.

pub mod models;
pub mod utils;

// Re-exports for convenience
pub use models::*;
pub use utils::scope_stack::ScopeStack;
