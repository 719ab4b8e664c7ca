//! Escape Analysis for acquired handles
//!
//! Purely syntactic and linear in the size of the function:
//!
//! ```text
//! Returned        return x / return &x / return (x) / return Wrapper{c: x}
//! FieldAssigned   s.client = x / s.pool[i] = x   (anywhere in the function)
//! AutoManaged     client.ReadWriteTransaction(ctx, func(ctx, x *T) error {...})
//! ```
//!
//! No alias tracking: `y := x; return y` does not make `x` escape.
//!
//! `return` statements are only considered for the function itself, not for
//! nested function literals, whose results go to their own callers.

use crate::features::escape_analysis::domain::{AutoManagementVerdict, EscapeVerdict};
use crate::features::resource_tracking::{Annotation, ResourceRecord};
use crate::features::rule_catalog::ServiceRule;
use crate::shared::models::{Expr, ExprKind, FuncDecl, FuncLit, FunctionRef, Span, Stmt};
use crate::shared::utils::visit::{walk_assign, CallCollector, Visitor};
use tracing::debug;

#[derive(Debug, Default, Clone, Copy)]
pub struct EscapeAnalyzer;

impl EscapeAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, name: &str, function: FunctionRef<'_>) -> EscapeVerdict {
        let Some(body) = function.body() else {
            return EscapeVerdict::default();
        };
        let mut scan = EscapeScan {
            name,
            returned: false,
            field_assigned: false,
            closure_depth: 0,
        };
        scan.visit_block(body);

        let reason = match (scan.returned, scan.field_assigned) {
            (true, true) => format!("`{}` is returned and stored into a field", name),
            (true, false) => format!("`{}` is returned to the caller", name),
            (false, true) => format!("`{}` is stored into a field", name),
            (false, false) => String::new(),
        };
        EscapeVerdict {
            is_returned: scan.returned,
            is_field_assigned: scan.field_assigned,
            reason,
        }
    }

    /// Reason to skip cleanup checking, if any.
    ///
    /// Iterators and readers are never skipped: even when handed out, their
    /// lifetime has to be bounded where they were opened.
    pub fn should_skip(&self, record: &ResourceRecord, verdict: &EscapeVerdict) -> Option<String> {
        if record.kind.is_stream() {
            return None;
        }
        verdict.escapes().then(|| verdict.reason.clone())
    }

    /// Auto-management verdict for a handle bound by a managed transaction
    /// callback
    pub fn detect_auto_management(
        &self,
        record: &ResourceRecord,
        function: FunctionRef<'_>,
        rule: &ServiceRule,
    ) -> Option<AutoManagementVerdict> {
        if !rule.supports_auto_management() {
            return None;
        }
        let body = function.body()?;

        CallCollector::in_block(body).into_iter().find_map(|(expr, call)| {
            let managed = call.callee_name().and_then(|op| rule.managed_transaction(op))?;
            match call.func_lit_arg(0) {
                Some(lit) => {
                    let param = lit.params.get(managed.callback_param)?;
                    (param.name.as_deref() == Some(record.name.as_str())).then(|| {
                        AutoManagementVerdict {
                            is_auto_managed: true,
                            kind: managed.kind,
                            is_closure_managed: true,
                            reason: format!(
                                "`{}` is managed by {}.{} ({} transaction)",
                                record.name, rule.name, managed.operation, managed.kind
                            ),
                        }
                    })
                }
                // Callback passed by reference: the framework still owns the
                // transaction opened by this very call
                None => (expr.span == record.call_span).then(|| AutoManagementVerdict {
                    is_auto_managed: true,
                    kind: managed.kind,
                    is_closure_managed: false,
                    reason: format!(
                        "transaction opened by {}.{} is released by the framework",
                        rule.name, managed.operation
                    ),
                }),
            }
        })
    }

    /// Run both checks and annotate the record. Returns whether the record no
    /// longer needs a local cleanup.
    pub fn annotate(
        &self,
        record: &mut ResourceRecord,
        function: FunctionRef<'_>,
        rule: Option<&ServiceRule>,
    ) -> bool {
        if let Some(verdict) = rule.and_then(|r| self.detect_auto_management(record, function, r)) {
            debug!(variable = %record.name, reason = %verdict.reason, "auto-managed");
            record.annotate(Annotation::AutoManaged {
                kind: verdict.kind,
                closure_managed: verdict.is_closure_managed,
                reason: verdict.reason,
            });
            return true;
        }

        let verdict = self.analyze(&record.name, function);
        match self.should_skip(record, &verdict) {
            Some(reason) => {
                debug!(variable = %record.name, %reason, "escapes");
                record.annotate(Annotation::Escaped { reason });
                true
            }
            None => false,
        }
    }
}

/// Innermost function of `decl` whose body has span `body_span`; the
/// declaration itself when no literal matches
pub fn function_at(decl: &FuncDecl, body_span: Span) -> FunctionRef<'_> {
    let Some(body) = &decl.body else {
        return FunctionRef::Decl(decl);
    };
    if body.span == body_span {
        return FunctionRef::Decl(decl);
    }
    let mut finder = LiteralFinder {
        body_span,
        found: None,
    };
    finder.visit_block(body);
    finder
        .found
        .map_or(FunctionRef::Decl(decl), FunctionRef::Lit)
}

struct LiteralFinder<'ast> {
    body_span: Span,
    found: Option<&'ast FuncLit>,
}

impl<'ast> Visitor<'ast> for LiteralFinder<'ast> {
    fn visit_func_lit(&mut self, _expr: &'ast Expr, lit: &'ast FuncLit) {
        if self.found.is_some() {
            return;
        }
        if lit.body.span == self.body_span {
            self.found = Some(lit);
            return;
        }
        if lit.body.span.contains(&self.body_span) {
            self.visit_block(&lit.body);
        }
    }
}

struct EscapeScan<'n> {
    name: &'n str,
    returned: bool,
    field_assigned: bool,
    closure_depth: u32,
}

impl<'n, 'ast> Visitor<'ast> for EscapeScan<'n> {
    fn visit_return(&mut self, _stmt: &'ast Stmt, results: &'ast [Expr]) {
        if self.closure_depth == 0 && results.iter().any(|r| refers_directly(r, self.name)) {
            self.returned = true;
        }
        for result in results {
            self.visit_expr(result);
        }
    }

    fn visit_assign(&mut self, stmt: &'ast Stmt, lhs: &'ast [Expr], rhs: &'ast [Expr], define: bool) {
        if lhs.len() == rhs.len() {
            let stored = lhs
                .iter()
                .zip(rhs)
                .any(|(target, value)| is_field_target(target) && value.direct_ident() == Some(self.name));
            if stored {
                self.field_assigned = true;
            }
        }
        walk_assign(self, stmt, lhs, rhs, define)
    }

    fn visit_func_lit(&mut self, _expr: &'ast Expr, lit: &'ast FuncLit) {
        self.closure_depth += 1;
        self.visit_block(&lit.body);
        self.closure_depth -= 1;
    }
}

/// `x`, `(x)`, `&x`, or `x` as an element of a composite literal
fn refers_directly(expr: &Expr, name: &str) -> bool {
    match &expr.unparen().kind {
        ExprKind::Ident(ident) => ident == name,
        ExprKind::Unary { op, operand } if op == "&" => refers_directly(operand, name),
        ExprKind::Composite { elements, .. } => elements.iter().any(|element| match &element.kind {
            ExprKind::KeyValue { value, .. } => refers_directly(value, name),
            _ => refers_directly(element, name),
        }),
        _ => false,
    }
}

/// `s.f`, `s.a.b`, or an index into a field (`s.pool[i]`)
fn is_field_target(expr: &Expr) -> bool {
    match &expr.unparen().kind {
        ExprKind::Selector { .. } => true,
        ExprKind::Index { operand, .. } => is_field_target(operand),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::go_frontend::parse_go;
    use crate::features::resource_tracking::ResourceTracker;
    use crate::features::rule_catalog::{ManagedTransactionKind, ResourceKind, RuleCatalog};
    use crate::shared::models::AnalysisUnit;
    use std::sync::Arc;

    fn unit(body: &str) -> AnalysisUnit {
        let source = format!(
            "package svc\n\nimport (\n    \"cloud.google.com/go/spanner\"\n    \"cloud.google.com/go/storage\"\n)\n\n{}\n",
            body
        );
        parse_go("svc/store.go", &source).unwrap()
    }

    fn verdict(body: &str, name: &str) -> EscapeVerdict {
        let unit = unit(body);
        EscapeAnalyzer::new().analyze(name, FunctionRef::Decl(&unit.file.funcs[0]))
    }

    fn tracked(unit: &AnalysisUnit) -> Vec<ResourceRecord> {
        ResourceTracker::new(Arc::new(RuleCatalog::built_in())).find_acquisitions(unit)
    }

    #[test]
    fn test_direct_return() {
        let v = verdict(
            "func open(ctx context.Context) (*storage.Client, error) {\n    c, err := storage.NewClient(ctx)\n    return c, err\n}",
            "c",
        );
        assert!(v.is_returned);
        assert!(!v.is_field_assigned);
        assert!(v.reason.contains("returned"));
    }

    #[test]
    fn test_return_forms() {
        for ret in ["(c)", "&c", "&wrapper{client: c}", "wrapper{c}"] {
            let body = format!(
                "func open(ctx context.Context) any {{\n    c, _ := storage.NewClient(ctx)\n    return {}\n}}",
                ret
            );
            assert!(verdict(&body, "c").is_returned, "{}", ret);
        }
    }

    #[test]
    fn test_call_argument_is_not_a_return() {
        let v = verdict(
            "func open(ctx context.Context) error {\n    c, _ := storage.NewClient(ctx)\n    return use(c)\n}",
            "c",
        );
        assert!(!v.is_returned);
    }

    #[test]
    fn test_return_inside_literal_does_not_count() {
        let v = verdict(
            "func open(ctx context.Context) {\n    c, _ := storage.NewClient(ctx)\n    get := func() *storage.Client { return c }\n    _ = get\n}",
            "c",
        );
        assert!(!v.is_returned);
    }

    #[test]
    fn test_field_assignment_anywhere() {
        let v = verdict(
            "func (s *server) init(ctx context.Context) {\n    c, _ := storage.NewClient(ctx)\n    if s != nil {\n        s.gcs = c\n    }\n}",
            "c",
        );
        assert!(v.is_field_assigned);
        let v = verdict(
            "func (s *server) init(ctx context.Context) {\n    c, _ := storage.NewClient(ctx)\n    s.pool[0] = c\n}",
            "c",
        );
        assert!(v.is_field_assigned);
    }

    #[test]
    fn test_alias_is_not_followed() {
        let v = verdict(
            "func open(ctx context.Context) *storage.Client {\n    c, _ := storage.NewClient(ctx)\n    d := c\n    return d\n}",
            "c",
        );
        assert!(!v.escapes());
    }

    #[test]
    fn test_streams_are_never_skipped() {
        let unit = unit(
            "func rows(ctx context.Context, client *spanner.Client, stmt spanner.Statement) *spanner.RowIterator {\n    iter := client.Single().Query(ctx, stmt)\n    return iter\n}",
        );
        let records = tracked(&unit);
        assert_eq!(records[0].kind, ResourceKind::Iterator);
        let analyzer = EscapeAnalyzer::new();
        let v = analyzer.analyze("iter", FunctionRef::Decl(&unit.file.funcs[0]));
        assert!(v.is_returned);
        assert!(analyzer.should_skip(&records[0], &v).is_none());
    }

    #[test]
    fn test_detect_auto_management_by_callback_param() {
        let unit = unit(
            "func update(ctx context.Context, client *spanner.Client) error {\n    _, err := client.ReadWriteTransaction(ctx, func(ctx context.Context, txn *spanner.ReadWriteTransaction) error {\n        return nil\n    })\n    return err\n}",
        );
        let records = tracked(&unit);
        let catalog = RuleCatalog::built_in();
        let rule = catalog.rule_for("spanner").unwrap();
        let verdict = EscapeAnalyzer::new()
            .detect_auto_management(&records[0], FunctionRef::Decl(&unit.file.funcs[0]), rule)
            .unwrap();
        assert!(verdict.is_auto_managed);
        assert!(verdict.is_closure_managed);
        assert_eq!(verdict.kind, ManagedTransactionKind::ReadWrite);
    }

    #[test]
    fn test_no_auto_management_for_plain_services() {
        let unit = unit(
            "func run(ctx context.Context) {\n    c, _ := storage.NewClient(ctx)\n    _ = c\n}",
        );
        let records = tracked(&unit);
        let catalog = RuleCatalog::built_in();
        let rule = catalog.rule_for("storage").unwrap();
        assert!(EscapeAnalyzer::new()
            .detect_auto_management(&records[0], FunctionRef::Decl(&unit.file.funcs[0]), rule)
            .is_none());
    }

    #[test]
    fn test_annotate_marks_escaped_record() {
        let unit = unit(
            "func open(ctx context.Context) (*storage.Client, error) {\n    c, err := storage.NewClient(ctx)\n    return c, err\n}",
        );
        let mut records = tracked(&unit);
        let catalog = RuleCatalog::built_in();
        let skipped = EscapeAnalyzer::new().annotate(
            &mut records[0],
            FunctionRef::Decl(&unit.file.funcs[0]),
            catalog.rule_for("storage"),
        );
        assert!(skipped);
        assert!(matches!(records[0].annotation, Some(Annotation::Escaped { .. })));
        assert!(!records[0].needs_cleanup());
    }

    #[test]
    fn test_function_at_finds_nested_literal() {
        let unit = unit(
            "func run(ctx context.Context) {\n    go func() {\n        c, _ := storage.NewClient(ctx)\n        _ = c\n    }()\n}",
        );
        let records = tracked(&unit);
        let decl = &unit.file.funcs[0];
        let function = function_at(decl, records[0].scope.body_span);
        assert!(matches!(function, FunctionRef::Lit(_)));
        assert!(matches!(
            function_at(decl, decl.body.as_ref().unwrap().span),
            FunctionRef::Decl(_)
        ));
    }
}
