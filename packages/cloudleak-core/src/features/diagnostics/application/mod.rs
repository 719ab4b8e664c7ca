pub mod generator;

pub use generator::DiagnosticGenerator;
