//! Feature modules - each feature follows the hexagonal layout
//!
//! - domain/         - Pure types and rules
//! - application/    - Use cases
//! - infrastructure/ - Parsers, loaders, external formats
//!
//! Dependency direction: rule_catalog <- resource_tracking <- escape_analysis
//! <- cleanup_matching; diagnostics is shared by cleanup_matching and the
//! pipeline. context_cancellation only depends on shared models.

pub mod cleanup_matching;
pub mod context_cancellation;
pub mod diagnostics;
pub mod escape_analysis;
pub mod rule_catalog;
pub mod resource_tracking;

// Host role for standalone use and tests
pub mod go_frontend;
