//! Custom assertions for diagnostic verification

use cloudleak_core::{Category, Diagnostic};

pub fn assert_no_diagnostics(diagnostics: &[Diagnostic]) {
    assert!(
        diagnostics.is_empty(),
        "Expected no diagnostics, got: {:#?}",
        diagnostics
    );
}

pub fn assert_categories(diagnostics: &[Diagnostic], expected: &[Category]) {
    let actual: Vec<Category> = diagnostics.iter().map(|d| d.category).collect();
    assert_eq!(
        actual, expected,
        "Unexpected categories. Diagnostics: {:#?}",
        diagnostics
    );
}

pub fn assert_count(diagnostics: &[Diagnostic], category: Category, expected: usize) {
    let actual = diagnostics.iter().filter(|d| d.category == category).count();
    assert_eq!(
        actual, expected,
        "Expected {expected} {category} diagnostics, got {actual}: {:#?}",
        diagnostics
    );
}

/// Diagnostic reported at the first occurrence of `needle` in `source`
pub fn assert_reported_at(diagnostics: &[Diagnostic], source: &str, needle: &str) {
    let offset = source.find(needle).expect("needle present in source") as u32;
    assert!(
        diagnostics.iter().any(|d| d.pos == offset),
        "Expected a diagnostic at offset {offset} ({needle}), got: {:#?}",
        diagnostics
    );
}
