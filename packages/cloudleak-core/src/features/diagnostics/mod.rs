//! Diagnostics
//!
//! Messages and suggested fixes for unreleased handles and uncancelled
//! contexts, plus comment-based suppression.

pub mod application;
pub mod domain;

pub use application::DiagnosticGenerator;
pub use domain::SuppressionMarkers;
