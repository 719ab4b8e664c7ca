//! Pipeline orchestration
//!
//! `Orchestrator` wires the feature slices into one analysis pass per unit.

pub mod orchestrator;

pub use orchestrator::Orchestrator;
