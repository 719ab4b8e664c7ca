//! Property-based tests
//!
//! Invariants that hold for every generated function:
//! - Count: one diagnostic per unreleased handle and per uncalled cancel
//! - Escape: stored or returned handles never produce a diagnostic
//! - Suppression: a same-line marker silences the acquisition
//! - Idempotence: two runs produce byte-identical output

mod common;

use cloudleak_core::Category;
use common::*;
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Fragment {
    Released,
    Leaked,
    FieldStored,
    Suppressed,
    Cancelled,
    Uncancelled,
    CancelledInClosure,
}

impl Fragment {
    fn render(&self, i: usize) -> String {
        match self {
            Fragment::Released => format!(
                "    c{i}, _ := storage.NewClient(ctx)\n    defer c{i}.Close()\n"
            ),
            Fragment::Leaked => format!("    c{i}, _ := storage.NewClient(ctx)\n    _ = c{i}\n"),
            Fragment::FieldStored => format!(
                "    c{i}, _ := storage.NewClient(ctx)\n    s.clients[{i}] = c{i}\n"
            ),
            Fragment::Suppressed => format!(
                "    c{i}, _ := storage.NewClient(ctx) //nolint:cloudleak\n    _ = c{i}\n"
            ),
            Fragment::Cancelled => format!(
                "    ctx{i}, cancel{i} := context.WithCancel(ctx)\n    defer cancel{i}()\n    _ = ctx{i}\n"
            ),
            Fragment::Uncancelled => format!(
                "    ctx{i}, cancel{i} := context.WithCancel(ctx)\n    _ = ctx{i}\n"
            ),
            Fragment::CancelledInClosure => format!(
                "    ctx{i}, cancel{i} := context.WithTimeout(ctx, time.Second)\n    go func() {{\n        defer cancel{i}()\n        work(ctx{i})\n    }}()\n"
            ),
        }
    }

    fn expected(&self) -> (usize, usize) {
        match self {
            Fragment::Leaked => (1, 0),
            Fragment::Uncancelled => (0, 1),
            _ => (0, 0),
        }
    }
}

fn fragment() -> impl Strategy<Value = Fragment> {
    prop_oneof![
        Just(Fragment::Released),
        Just(Fragment::Leaked),
        Just(Fragment::FieldStored),
        Just(Fragment::Suppressed),
        Just(Fragment::Cancelled),
        Just(Fragment::Uncancelled),
        Just(Fragment::CancelledInClosure),
    ]
}

fn program(fragments: &[Fragment]) -> String {
    let body: String = fragments
        .iter()
        .enumerate()
        .map(|(i, f)| f.render(i))
        .collect();
    go_file(
        &[STORAGE],
        &format!(
            "type Server struct {{\n    clients map[int]*storage.Client\n}}\n\nfunc (s *Server) run(ctx context.Context) {{\n{body}}}"
        ),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_one_diagnostic_per_unreleased_handle(fragments in prop::collection::vec(fragment(), 0..8)) {
        let source = program(&fragments);
        let diags = analyze(&source);

        let (leaks, contexts) = fragments
            .iter()
            .map(Fragment::expected)
            .fold((0, 0), |(a, b), (x, y)| (a + x, b + y));
        let resource = diags.iter().filter(|d| d.category == Category::ResourceLeak).count();
        let context = diags.iter().filter(|d| d.category == Category::ContextLeak).count();
        prop_assert_eq!(resource, leaks, "source:\n{}", source);
        prop_assert_eq!(context, contexts, "source:\n{}", source);
    }

    #[test]
    fn prop_analysis_is_idempotent(fragments in prop::collection::vec(fragment(), 0..8)) {
        let source = program(&fragments);
        let engine = orchestrator();
        let first = engine.analyze_source("svc/handler.go", &source).unwrap();
        let second = engine.analyze_source("svc/handler.go", &source).unwrap();
        prop_assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}

#[test]
fn test_every_suppression_form_silences_a_leak() {
    for marker in [
        "//nolint",
        "//nolint:cloudleak",
        "//nolint:errcheck,all",
        "//lint:ignore cloudleak pooled",
        "//cloudleak:ignore",
    ] {
        let source = go_file(
            &[STORAGE],
            &format!("func f(ctx context.Context) {{\n    c, _ := storage.NewClient(ctx) {marker}\n    _ = c\n}}"),
        );
        assert_no_diagnostics(&analyze(&source));
    }
}

#[test]
fn test_marker_for_another_tool_does_not_suppress() {
    let source = go_file(
        &[STORAGE],
        "func f(ctx context.Context) {\n    c, _ := storage.NewClient(ctx) //nolint:errcheck\n    _ = c\n}",
    );
    assert_count(&analyze(&source), Category::ResourceLeak, 1);
}

#[test]
fn test_marker_on_line_above_suppresses() {
    let source = go_file(
        &[STORAGE],
        "func f(ctx context.Context) {\n    //lint:ignore cloudleak handed to the pool\n    c, _ := storage.NewClient(ctx)\n    _ = c\n}",
    );
    assert_no_diagnostics(&analyze(&source));
}

#[test]
fn test_trailing_marker_does_not_cover_next_acquisition() {
    let source = go_file(
        &[STORAGE],
        "func f(ctx context.Context) {\n    a, _ := storage.NewClient(ctx) //nolint:cloudleak\n    b, _ := storage.NewClient(ctx)\n    _, _ = a, b\n}",
    );
    let diags = analyze(&source);
    assert_count(&diags, Category::ResourceLeak, 1);
    assert_reported_at(&diags, &source, "storage.NewClient(ctx)\n    _, _");
    assert!(diags[0].message.contains("`b`"));
}

#[test]
fn test_auto_managed_transaction_needs_no_cleanup() {
    let source = go_file(
        &[SPANNER],
        r#"func transfer(ctx context.Context, client *spanner.Client) error {
    _, err := client.ReadWriteTransaction(ctx, func(ctx context.Context, txn *spanner.ReadWriteTransaction) error {
        return txn.BufferWrite(nil)
    })
    return err
}"#,
    );
    assert_no_diagnostics(&analyze(&source));
}

#[test]
fn test_firestore_run_transaction_needs_no_cleanup() {
    let source = go_file(
        &[FIRESTORE],
        r#"func bump(ctx context.Context, client *firestore.Client) error {
    return client.RunTransaction(ctx, func(ctx context.Context, tx *firestore.Transaction) error {
        return nil
    })
}"#,
    );
    assert_no_diagnostics(&analyze(&source));
}
