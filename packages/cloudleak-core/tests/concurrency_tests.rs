//! Concurrency tests
//!
//! One orchestrator and one catalog shared across threads; units analyzed in
//! parallel must give the same results as sequential runs.

mod common;

use cloudleak_core::{parse_go, AnalysisUnit, Category, EngineConfig, Orchestrator, RuleCatalog};
use common::*;
use std::sync::Arc;
use std::thread;

fn units(n: usize) -> Vec<AnalysisUnit> {
    (0..n)
        .map(|i| {
            let body = if i % 2 == 0 {
                "func f(ctx context.Context) {\n    c, _ := storage.NewClient(ctx)\n    _ = c\n}"
            } else {
                "func f(ctx context.Context) {\n    c, _ := storage.NewClient(ctx)\n    defer c.Close()\n}"
            };
            parse_go(&format!("svc/unit_{i}.go"), &go_file(&[STORAGE], body)).unwrap()
        })
        .collect()
}

#[test]
fn test_batch_matches_sequential() {
    let engine = orchestrator();
    let units = units(32);
    let parallel = engine.analyze_batch(&units);
    let sequential: Vec<_> = units.iter().map(|u| engine.analyze(u)).collect();
    assert_eq!(parallel, sequential);

    for (i, diags) in parallel.iter().enumerate() {
        let expected = if i % 2 == 0 { 1 } else { 0 };
        assert_count(diags, Category::ResourceLeak, expected);
    }
}

#[test]
fn test_shared_orchestrator_across_threads() {
    let engine = Arc::new(orchestrator());
    let units = Arc::new(units(8));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let units = Arc::clone(&units);
            thread::spawn(move || {
                units
                    .iter()
                    .map(|u| engine.analyze(u).len())
                    .sum::<usize>()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 4);
    }
}

#[test]
fn test_catalog_cache_shared_between_engines() {
    let catalog = Arc::new(RuleCatalog::built_in());
    let config = Arc::new(EngineConfig::default());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let catalog = Arc::clone(&catalog);
            let config = Arc::clone(&config);
            thread::spawn(move || {
                let engine = Orchestrator::with_catalog(config, Arc::clone(&catalog));
                let method = catalog.cleanup_method_for("*storage.Client");
                let diags = engine
                    .analyze_source(
                        "svc/a.go",
                        &go_file(
                            &[STORAGE],
                            "func f(ctx context.Context) {\n    c, _ := storage.NewClient(ctx)\n    _ = c\n}",
                        ),
                    )
                    .unwrap();
                (method, diags.len())
            })
        })
        .collect();

    for handle in handles {
        let (method, count) = handle.join().unwrap();
        assert_eq!(method.as_deref(), Some("Close"));
        assert_eq!(count, 1);
    }
}
