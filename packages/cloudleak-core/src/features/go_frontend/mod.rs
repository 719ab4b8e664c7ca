//! Go front end
//!
//! Plays the host role for the engine: parses Go source with tree-sitter-go,
//! lowers it into the shared syntax model and derives a partial binding table.
//!
//! Structure:
//! - `infrastructure`: tree-sitter lowering and the binding-table builder
//! - `application`: `GoFrontend` / `parse_go` entry points

pub mod application;
pub mod infrastructure;

pub use application::{parse_go, GoFrontend};
