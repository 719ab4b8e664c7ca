//! Escape analysis
//!
//! Decides whether an acquired handle leaves its function (returned, stored
//! into a field) or is released by a managed-transaction callback.

pub mod application;
pub mod domain;

pub use application::{function_at, EscapeAnalyzer};
pub use domain::{AutoManagementVerdict, EscapeVerdict, ManagedTransactionKind};
