//! Pipeline orchestrator
//!
//! Runs every feature over one unit and returns its findings, sorted and
//! deduplicated:
//!
//! ```text
//! exemption → unresolved check → tracking → escape/auto-management
//!           → cleanup matching → context tracking → suppression → sort
//! ```

use crate::config::EngineConfig;
use crate::errors::Result;
use crate::features::cleanup_matching::CleanupMatcher;
use crate::features::context_cancellation::ContextCancellationTracker;
use crate::features::diagnostics::DiagnosticGenerator;
use crate::features::escape_analysis::{function_at, EscapeAnalyzer};
use crate::features::go_frontend::parse_go;
use crate::features::resource_tracking::{ResourceRecord, ResourceTracker};
use crate::features::rule_catalog::RuleCatalog;
use crate::shared::models::{AnalysisUnit, Diagnostic, DiagnosticSink};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, info};

pub struct Orchestrator {
    config: Arc<EngineConfig>,
    catalog: Arc<RuleCatalog>,
    tracker: ResourceTracker,
    escape: EscapeAnalyzer,
    contexts: ContextCancellationTracker,
    generator: DiagnosticGenerator,
    matcher: CleanupMatcher,
}

impl Orchestrator {
    /// Load the configured rule catalog and assemble the pipeline.
    ///
    /// An unreadable catalog falls back to the built-in one; a catalog that
    /// parses but fails validation is an error.
    pub fn new(config: Arc<EngineConfig>) -> Result<Self> {
        let catalog = RuleCatalog::load(config.catalog_path.as_deref())?;
        Ok(Self::with_catalog(config, Arc::new(catalog)))
    }

    pub fn with_catalog(config: Arc<EngineConfig>, catalog: Arc<RuleCatalog>) -> Self {
        let generator = DiagnosticGenerator::new(Arc::clone(&config));
        Self {
            tracker: ResourceTracker::new(Arc::clone(&catalog)),
            escape: EscapeAnalyzer::new(),
            contexts: ContextCancellationTracker::new(),
            matcher: CleanupMatcher::new(generator.clone()),
            generator,
            catalog,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    pub fn analyze(&self, unit: &AnalysisUnit) -> Vec<Diagnostic> {
        let path = unit.path();
        if let Some(reason) = self.catalog.is_exempt(path) {
            info!(path, %reason, "unit exempt from analysis");
            return Vec::new();
        }

        if unit.bindings.has_unresolved() {
            debug!(
                path,
                unresolved = unit.bindings.unresolved().len(),
                "skipping unit with unresolved dependencies"
            );
            return vec![self.generator.unresolved_dependency(unit)];
        }

        let mut diagnostics = self.check_resources(unit);
        if self.config.check_contexts {
            diagnostics.extend(
                self.contexts
                    .unsatisfied(unit)
                    .iter()
                    .map(|handle| self.generator.missing_cancellation(handle, unit)),
            );
        }

        let before = diagnostics.len();
        diagnostics.retain(|d| !self.generator.is_suppressed_at_line(unit, d.line));
        diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        diagnostics.dedup();

        debug!(
            path,
            diagnostics = diagnostics.len(),
            suppressed = before.saturating_sub(diagnostics.len()),
            "unit analyzed"
        );
        diagnostics
    }

    fn check_resources(&self, unit: &AnalysisUnit) -> Vec<Diagnostic> {
        let funcs = &unit.file.funcs;
        let mut by_function: Vec<Vec<ResourceRecord>> = vec![Vec::new(); funcs.len()];
        for record in self.tracker.find_acquisitions(unit) {
            if let Some(bucket) = by_function.get_mut(record.scope.func_index) {
                bucket.push(record);
            }
        }

        let mut diagnostics = Vec::new();
        for (decl, mut records) in funcs.iter().zip(by_function) {
            if records.is_empty() {
                continue;
            }
            for record in records.iter_mut() {
                let function = function_at(decl, record.scope.body_span);
                let rule = self.catalog.rule_for(&record.service);
                self.escape.annotate(record, function, rule);
            }
            if let Some(body) = &decl.body {
                self.matcher.validate_order(body, &records);
            }
            diagnostics.extend(self.matcher.validate(unit, decl, &records));
        }
        diagnostics
    }

    /// Report every finding of `unit` to `sink`
    pub fn run(&self, unit: &AnalysisUnit, sink: &mut dyn DiagnosticSink) {
        for diagnostic in self.analyze(unit) {
            sink.report(diagnostic);
        }
    }

    /// Analyze units in parallel; results keep the input order
    pub fn analyze_batch(&self, units: &[AnalysisUnit]) -> Vec<Vec<Diagnostic>> {
        units.par_iter().map(|unit| self.analyze(unit)).collect()
    }

    /// Parse `source` with the bundled Go front end and analyze it
    pub fn analyze_source(&self, path: &str, source: &str) -> Result<Vec<Diagnostic>> {
        let unit = parse_go(path, source)?;
        Ok(self.analyze(&unit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{Category, FnSink};

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(Arc::new(EngineConfig::default())).unwrap()
    }

    const LEAK: &str = r#"package svc

import (
    "context"

    "cloud.google.com/go/storage"
)

func upload(ctx context.Context) error {
    client, err := storage.NewClient(ctx)
    if err != nil {
        return err
    }
    ctx, cancel := context.WithTimeout(ctx, time.Second)
    _ = ctx
    return client.Bucket("b").Object("o").Delete(ctx)
}
"#;

    #[test]
    fn test_reports_both_leaks_in_order() {
        let diags = orchestrator().analyze_source("svc/upload.go", LEAK).unwrap();
        let categories: Vec<_> = diags.iter().map(|d| d.category).collect();
        assert_eq!(categories, vec![Category::ResourceLeak, Category::ContextLeak]);
        assert_eq!(diags[0].line, 10);
        assert_eq!(diags[1].line, 14);
    }

    #[test]
    fn test_context_checking_can_be_disabled() {
        let config = EngineConfig::default().check_contexts(false);
        let orchestrator = Orchestrator::new(Arc::new(config)).unwrap();
        let diags = orchestrator.analyze_source("svc/upload.go", LEAK).unwrap();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].category, Category::ResourceLeak);
    }

    #[test]
    fn test_exempt_path_is_skipped() {
        let diags = orchestrator()
            .analyze_source("tools/cmd/upload/main.go", LEAK)
            .unwrap();
        assert!(diags.is_empty());
    }

    #[test]
    fn test_unresolved_unit_gets_only_the_advisory() {
        let mut unit = parse_go("svc/upload.go", LEAK).unwrap();
        unit.bindings.record_unresolved("time", LEAK.find("time.Second").unwrap() as u32);
        let diags = orchestrator().analyze(&unit);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].category, Category::UnresolvedDependency);
        assert_eq!((diags[0].line, diags[0].column), (14, 44));
    }

    #[test]
    fn test_run_reports_to_sink() {
        let unit = parse_go("svc/upload.go", LEAK).unwrap();
        let mut lines = Vec::new();
        orchestrator().run(&unit, &mut FnSink(|d: Diagnostic| lines.push(d.line)));
        assert_eq!(lines, vec![10, 14]);
    }

    #[test]
    fn test_batch_keeps_input_order() {
        let leaky = parse_go("svc/a.go", LEAK).unwrap();
        let clean = parse_go("svc/b.go", "package svc\n\nfunc noop() {}\n").unwrap();
        let results = orchestrator().analyze_batch(&[clean, leaky]);
        assert_eq!(results.len(), 2);
        assert!(results[0].is_empty());
        assert_eq!(results[1].len(), 2);
    }
}
