//! Shared models
//!
//! Syntax tree, binding table, spans and diagnostics used by every feature.

pub mod ast;
pub mod bindings;
pub mod diagnostic;
pub mod span;
pub mod unit;

pub use ast::*;
pub use bindings::{Callee, ObjectId, TypeBindings, UnresolvedReference};
pub use diagnostic::{Category, Diagnostic, DiagnosticSink, FnSink, SuggestedFix, TextEdit};
pub use span::{Location, Span, SpanKey};
pub use unit::AnalysisUnit;
