/*
 * Cloudleak Core - Resource Lifecycle Analysis for Go
 *
 * Finds cloud-service client handles that are acquired but never released,
 * and cancellable contexts whose cancel function is never called.
 *
 * Feature-First Hexagonal Architecture:
 * - shared/   : Syntax model, bindings, spans, diagnostics, visitor
 * - features/ : Vertical slices (catalog → tracking → escape → matching → diagnostics)
 * - pipeline/ : Orchestration
 * - config/   : Engine configuration
 *
 * Units are analyzed independently; batches run on the rayon pool.
 */

// Crate-level lint configuration
#![allow(clippy::too_many_arguments)] // Visitor hooks mirror the syntax model
#![allow(clippy::type_complexity)] // Borrowed (expr, call) pairs
#![allow(clippy::unnecessary_map_or)] // map_or style for compatibility
#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::module_inception)] // Module naming intentional
#![allow(clippy::collapsible_if)] // Readability over brevity
#![allow(clippy::single_match)] // Single match for readability

/// Shared models and utilities
pub mod shared;

/// Feature modules
pub mod features;

/// Pipeline orchestration
pub mod pipeline;

/// Engine configuration
pub mod config;

/// Error types
pub mod errors;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use config::EngineConfig;
pub use errors::{CloudleakError, Result};
pub use features::go_frontend::{parse_go, GoFrontend};
pub use features::rule_catalog::{CatalogDocument, RuleCatalog, ServiceRule};
pub use pipeline::Orchestrator;
pub use shared::models::{
    AnalysisUnit, Category, Diagnostic, DiagnosticSink, FnSink, SourceFile, Span, SuggestedFix,
    TextEdit, TypeBindings,
};
