//! Test fixture generators

use cloudleak_core::{Diagnostic, EngineConfig, Orchestrator};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

pub const STORAGE: &str = "cloud.google.com/go/storage";
pub const PUBSUB: &str = "cloud.google.com/go/pubsub";
pub const SPANNER: &str = "cloud.google.com/go/spanner";
pub const FIRESTORE: &str = "cloud.google.com/go/firestore";

/// Go file in package `svc` importing `context` plus `imports`
pub fn go_file(imports: &[&str], body: &str) -> String {
    let mut lines = String::from("package svc\n\nimport (\n    \"context\"\n");
    for import in imports {
        lines.push_str(&format!("    \"{import}\"\n"));
    }
    lines.push_str(")\n\n");
    lines.push_str(body);
    lines.push('\n');
    lines
}

pub fn orchestrator() -> Orchestrator {
    Orchestrator::new(Arc::new(EngineConfig::default())).expect("built-in catalog is valid")
}

pub fn orchestrator_with(config: EngineConfig) -> Orchestrator {
    Orchestrator::new(Arc::new(config)).expect("catalog is valid")
}

/// Analyze `source` as `svc/handler.go` with the default engine
pub fn analyze(source: &str) -> Vec<Diagnostic> {
    orchestrator()
        .analyze_source("svc/handler.go", source)
        .expect("Go source parses")
}

/// Temporary file with the given extension and content
pub fn temp_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("create temp file");
    file.write_all(content.as_bytes()).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

/// Minimal catalog document with a single service
pub fn single_service_catalog_yaml() -> &'static str {
    r#"services:
  - name: storage
    originPath: cloud.google.com/go/storage
    acquisitionOperations: [NewClient]
    cleanupMethods:
      - method: Close
        required: true
        description: releases the client
pathExemptions:
  - name: generated
    pattern: "**/generated/**"
    condition:
      kind: short-lived-program
      description: generated code
      enabled: true
"#
}
