pub mod analyzer;

pub use analyzer::{function_at, EscapeAnalyzer};
