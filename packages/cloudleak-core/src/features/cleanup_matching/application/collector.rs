//! Cleanup site collection
//!
//! One pass over a top-level function, function literals included, producing
//! the [`SiteTable`] the matcher works on.

use crate::features::cleanup_matching::domain::{CleanupSite, SiteOrigin, SiteTable};
use crate::shared::models::{Block, CallExpr, Expr, ExprKind, Stmt};
use crate::shared::utils::visit::{walk_assign, walk_expr, CallCollector, Visitor};

pub fn collect_sites(body: &Block) -> SiteTable {
    let mut collector = SiteCollector::default();
    collector.visit_block(body);
    collector.table
}

#[derive(Default)]
struct SiteCollector {
    table: SiteTable,
}

impl SiteCollector {
    fn push(&mut self, call_expr: &Expr, call: &CallExpr, origin: SiteOrigin) {
        let ExprKind::Selector { field, .. } = &call.func.unparen().kind else {
            return;
        };
        self.table.sites.push(CleanupSite {
            receiver: call.receiver_ident().map(str::to_string),
            method: field.clone(),
            span: call_expr.span,
            origin,
        });
    }

    /// `x.Close` passed as a method value, or calls inside a literal
    fn register(&mut self, list: &str, arg: &Expr) {
        match &arg.unparen().kind {
            ExprKind::Selector { operand, field } => {
                self.table.sites.push(CleanupSite {
                    receiver: operand.as_ident().map(str::to_string),
                    method: field.clone(),
                    span: arg.span,
                    origin: SiteOrigin::Registration {
                        list: list.to_string(),
                    },
                });
            }
            ExprKind::FuncLit(lit) => {
                for (expr, call) in CallCollector::in_block(&lit.body) {
                    self.push(
                        expr,
                        call,
                        SiteOrigin::Registration {
                            list: list.to_string(),
                        },
                    );
                }
            }
            _ => {}
        }
    }
}

impl<'ast> Visitor<'ast> for SiteCollector {
    fn visit_defer(&mut self, _stmt: &'ast Stmt, call: &'ast Expr) {
        let mut idents = IdentCollector::default();
        idents.visit_expr(call);
        self.table.deferred_refs.extend(idents.names);

        if let ExprKind::Call(inner) = &call.unparen().kind {
            match &inner.func.unparen().kind {
                ExprKind::FuncLit(lit) => {
                    for (expr, nested) in CallCollector::in_block(&lit.body) {
                        self.push(expr, nested, SiteOrigin::DeferredLiteral);
                    }
                }
                ExprKind::Selector { .. } => self.push(call, inner, SiteOrigin::Deferred),
                _ => {}
            }
        }
        self.visit_expr(call);
    }

    fn visit_assign(&mut self, stmt: &'ast Stmt, lhs: &'ast [Expr], rhs: &'ast [Expr], define: bool) {
        if let ([target], [value]) = (lhs, rhs) {
            if let (Some(list), Some(call)) = (list_name(target), value.as_call()) {
                if call.bare_callee() == Some("append") {
                    for arg in call.args.iter().skip(1) {
                        self.register(list, arg);
                    }
                }
            }
        }
        walk_assign(self, stmt, lhs, rhs, define);
    }
}

/// `closers` or `s.closers`
fn list_name(target: &Expr) -> Option<&str> {
    match &target.unparen().kind {
        ExprKind::Ident(name) => Some(name),
        ExprKind::Selector { field, .. } => Some(field),
        _ => None,
    }
}

#[derive(Default)]
struct IdentCollector {
    names: Vec<String>,
}

impl<'ast> Visitor<'ast> for IdentCollector {
    fn visit_expr(&mut self, expr: &'ast Expr) {
        if let ExprKind::Selector { field, .. } = &expr.kind {
            // `defer s.closeAll(s.closers)` refers to the list by field name
            self.names.push(field.clone());
        }
        walk_expr(self, expr)
    }

    fn visit_ident(&mut self, _expr: &'ast Expr, name: &'ast str) {
        self.names.push(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::go_frontend::parse_go;
    use pretty_assertions::assert_eq;

    fn sites(body: &str) -> SiteTable {
        let source = format!("package svc\n\n{}\n", body);
        let unit = parse_go("svc/a.go", &source).unwrap();
        collect_sites(unit.file.funcs[0].body.as_ref().unwrap())
    }

    fn describe(table: &SiteTable) -> Vec<(Option<String>, String, SiteOrigin)> {
        table
            .sites
            .iter()
            .map(|s| (s.receiver.clone(), s.method.clone(), s.origin.clone()))
            .collect()
    }

    #[test]
    fn test_direct_and_literal_defers() {
        let table = sites(
            "func f() {\n    defer a.Close()\n    defer func() {\n        if err := b.Close(); err != nil {\n            log(err)\n        }\n    }()\n}",
        );
        assert_eq!(
            describe(&table),
            vec![
                (Some("a".into()), "Close".into(), SiteOrigin::Deferred),
                (Some("b".into()), "Close".into(), SiteOrigin::DeferredLiteral),
            ]
        );
    }

    #[test]
    fn test_plain_call_is_not_a_site() {
        let table = sites("func f() {\n    a.Close()\n}");
        assert!(table.is_empty());
    }

    #[test]
    fn test_registrations_and_deferred_refs() {
        let table = sites(
            "func f() {\n    var closers []func() error\n    defer func() {\n        for _, c := range closers {\n            c()\n        }\n    }()\n    closers = append(closers, a.Close)\n    pending = append(pending, func() { b.Stop() })\n}",
        );
        assert_eq!(
            describe(&table),
            vec![
                (
                    Some("a".into()),
                    "Close".into(),
                    SiteOrigin::Registration {
                        list: "closers".into()
                    }
                ),
                (
                    Some("b".into()),
                    "Stop".into(),
                    SiteOrigin::Registration {
                        list: "pending".into()
                    }
                ),
            ]
        );
        assert!(table.is_deferred_list("closers"));
        assert!(!table.is_deferred_list("pending"));
    }

    #[test]
    fn test_defers_inside_closures_are_collected() {
        let table = sites("func f() {\n    go func() {\n        defer a.Close()\n    }()\n}");
        assert_eq!(table.len(), 1);
        assert!(table.sites[0].is_deferred());
    }
}
