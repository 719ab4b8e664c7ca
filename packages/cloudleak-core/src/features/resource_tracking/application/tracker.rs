/*
 * Resource Tracker
 *
 * Walks every top-level function of a unit and emits one ResourceRecord per
 * acquisition site.
 *
 * Sites:
 * - `x := svc.Op(...)`, `x = svc.Op(...)`, `var x = svc.Op(...)`
 * - managed transactions, also as bare expression statements
 *   (`client.ReadWriteTransaction(ctx, func(ctx, txn) error {...})`)
 *
 * Naming:
 * 1. left-hand identifier
 * 2. callback parameter of a closure-based API
 * 3. per-kind convention fallback (advisory)
 *
 * A left-hand field or index target stores the handle at the point of
 * acquisition, so no record is produced for it.
 */

use super::classify::{import_table, Classification, Classifier};
use crate::features::resource_tracking::domain::{
    LexicalScope, NameOrigin, ResourceRecord, VariableId,
};
use crate::features::rule_catalog::{ManagedTransaction, RuleCatalog};
use crate::shared::models::{
    AnalysisUnit, CallExpr, Expr, ExprKind, FuncDecl, FuncLit, Span, Stmt, StmtKind,
    TypeBindings, VarSpec,
};
use crate::shared::utils::visit::{walk_assign, walk_stmt, walk_var_spec, Visitor};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::debug;

pub struct ResourceTracker {
    catalog: Arc<RuleCatalog>,
}

impl ResourceTracker {
    pub fn new(catalog: Arc<RuleCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    /// Acquisition sites of every function in the unit, in source order
    pub fn find_acquisitions(&self, unit: &AnalysisUnit) -> Vec<ResourceRecord> {
        let imports = import_table(&unit.file.imports);
        let classifier = Classifier {
            catalog: &self.catalog,
            bindings: &unit.bindings,
            imports: &imports,
        };
        let mut scan = AcquisitionScan::new(&classifier, &unit.bindings);

        for (index, func) in unit.file.funcs.iter().enumerate() {
            scan.scan_function(index, func);
        }

        debug!(
            path = %unit.file.path,
            records = scan.records.len(),
            "resource acquisitions collected"
        );
        scan.records
    }
}

/// Per-unit traversal state; function-level state is reset for every
/// top-level function
struct AcquisitionScan<'a, 'c> {
    classifier: &'a Classifier<'c>,
    bindings: &'a TypeBindings,
    func_index: usize,
    func_name: String,
    /// Bodies of the enclosing functions, innermost last
    bodies: Vec<Span>,
    /// Handle variable → service, for receiver lookups later in the function
    tracked: FxHashMap<String, String>,
    next_synthetic: u32,
    records: Vec<ResourceRecord>,
}

impl<'a, 'c> AcquisitionScan<'a, 'c> {
    fn new(classifier: &'a Classifier<'c>, bindings: &'a TypeBindings) -> Self {
        Self {
            classifier,
            bindings,
            func_index: 0,
            func_name: String::new(),
            bodies: Vec::new(),
            tracked: FxHashMap::default(),
            next_synthetic: 0,
            records: Vec::new(),
        }
    }

    fn scan_function(&mut self, index: usize, func: &FuncDecl) {
        let Some(body) = &func.body else {
            return;
        };
        self.func_index = index;
        self.func_name = func.name.clone();
        self.tracked.clear();
        self.bodies.clear();
        self.bodies.push(body.span);

        let before = self.records.len();
        self.visit_block(body);
        debug!(
            func = %func.name,
            records = self.records.len() - before,
            "scanned function"
        );
    }

    fn scope(&self) -> LexicalScope {
        LexicalScope {
            func_index: self.func_index,
            func_name: self.func_name.clone(),
            body_span: self.bodies.last().copied().unwrap_or_default(),
            closure_depth: self.bodies.len().saturating_sub(1) as u32,
        }
    }

    fn synthetic_id(&mut self) -> VariableId {
        let id = VariableId::Synthetic(self.next_synthetic);
        self.next_synthetic += 1;
        id
    }

    /// Pair left-hand targets with right-hand values.
    ///
    /// One call feeding several targets binds only the primary (first) result.
    fn track_pairs(&mut self, stmt: &Stmt, targets: &[Expr], values: &[Expr]) {
        if values.len() == targets.len() {
            for (target, value) in targets.iter().zip(values) {
                self.track_value(stmt, Some(target), value);
            }
        } else if let [value] = values {
            self.track_value(stmt, targets.first(), value);
        }
    }

    fn track_value(&mut self, stmt: &Stmt, target: Option<&Expr>, value: &Expr) {
        let value = value.unparen();
        if let ExprKind::Call(call) = &value.kind {
            self.track_call(stmt, target, value, call);
        }
    }

    fn track_call(&mut self, stmt: &Stmt, target: Option<&Expr>, expr: &Expr, call: &CallExpr) {
        let Some(classification) = self.classifier.classify(expr, call, &self.tracked) else {
            self.note_derived(target, call);
            return;
        };
        let rule = classification.rule;
        let op = classification.operation.as_str();
        let managed = rule.managed_transaction(op);

        if target.is_none() && managed.is_none() {
            return;
        }
        if let Some(managed) = managed {
            if !self.is_direct_receiver(call, managed) {
                debug!(
                    service = %rule.name,
                    operation = op,
                    line = expr.span.start_line,
                    "managed transaction on a wrapped receiver, not tracked"
                );
                return;
            }
        }

        let Some((cleanup_method, required)) = self.cleanup_for(&classification) else {
            debug!(service = %rule.name, operation = op, "no cleanup method declared");
            return;
        };
        let kind = rule.kind_for_operation(op);

        let Some(resolved) = self.resolve_name(target, call, managed) else {
            debug!(
                service = %rule.name,
                operation = op,
                line = expr.span.start_line,
                "handle stored into a field at acquisition"
            );
            return;
        };
        let (name, name_origin, id) = match resolved {
            Some(resolved) => resolved,
            None => (
                kind.fallback_name().to_string(),
                NameOrigin::Fallback,
                self.synthetic_id(),
            ),
        };

        if name_origin != NameOrigin::Fallback && name != "_" {
            self.tracked.insert(name.clone(), rule.name.clone());
        }

        debug!(
            service = %rule.name,
            operation = op,
            variable = %name,
            strategy = classification.strategy.name(),
            "acquisition"
        );

        self.records.push(ResourceRecord {
            id,
            name,
            name_origin,
            call_span: expr.span,
            stmt_span: stmt.span,
            service: rule.name.clone(),
            operation: op.to_string(),
            cleanup_method,
            required,
            kind,
            scope: self.scope(),
            annotation: None,
        });
    }

    /// Cleanup for a classified call. Methods on a typed receiver without a
    /// per-operation override go through the catalog's type cache.
    fn cleanup_for(&self, classification: &Classification<'_>) -> Option<(String, bool)> {
        let rule = classification.rule;
        let op = classification.operation.as_str();
        let catalog = self.classifier.catalog;
        if let Some(type_text) = classification.receiver_type.as_deref() {
            let same_service = catalog
                .rule_for_type(type_text)
                .map_or(false, |owner| owner.name == rule.name);
            if same_service && !rule.overrides_cleanup(op) {
                if let Some(method) = catalog.cleanup_method_for(type_text) {
                    return Some((method, true));
                }
            }
        }
        rule.cleanup_for_operation(op)
            .map(|(method, required)| (method.to_string(), required))
    }

    /// `None` when the handle lands in a field or index target,
    /// `Some(None)` when no real name is available
    fn resolve_name(
        &mut self,
        target: Option<&Expr>,
        call: &CallExpr,
        managed: Option<&ManagedTransaction>,
    ) -> Option<Option<(String, NameOrigin, VariableId)>> {
        // The results of a managed transaction are not the handle
        if let Some(managed) = managed {
            return Some(self.callback_param(call, 0, managed.callback_param));
        }

        let Some(target) = target.map(Expr::unparen) else {
            return Some(None);
        };
        let ExprKind::Ident(name) = &target.kind else {
            return None;
        };
        let id = self.variable_id(target.span);
        Some(Some((name.clone(), NameOrigin::Assignment, id)))
    }

    /// Handle parameter of the first callback literal at or after `arg_index`
    fn callback_param(
        &mut self,
        call: &CallExpr,
        arg_index: usize,
        param_index: usize,
    ) -> Option<(String, NameOrigin, VariableId)> {
        let param = call
            .func_lit_arg(arg_index)
            .and_then(|lit| lit.params.get(param_index))?;
        let name = param.name.as_deref().filter(|n| *n != "_")?.to_string();
        let id = self.variable_id(param.span);
        Some((name, NameOrigin::CallbackParam, id))
    }

    fn variable_id(&mut self, span: Span) -> VariableId {
        match self.bindings.object_of(span.key()) {
            Some(object) => VariableId::Object(object),
            None => self.synthetic_id(),
        }
    }

    /// A managed transaction must be opened on a plain variable or field
    /// whose known type, if any, is the service's client type
    fn is_direct_receiver(&self, call: &CallExpr, managed: &ManagedTransaction) -> bool {
        let Some(receiver) = call.receiver().map(Expr::unparen) else {
            return true;
        };
        if !matches!(receiver.kind, ExprKind::Ident(_) | ExprKind::Selector { .. }) {
            return false;
        }
        match (
            self.bindings.type_of(receiver.span.key()),
            managed.client_type.as_deref(),
        ) {
            (Some(type_text), Some(client_type)) => bare_type_name(type_text) == client_type,
            _ => true,
        }
    }

    /// `obj := client.Bucket(b).Object(o)` makes `obj` a handle of the same
    /// service for receiver lookups
    fn note_derived(&mut self, target: Option<&Expr>, call: &CallExpr) {
        let Some(name) = target.and_then(Expr::as_ident).filter(|n| *n != "_") else {
            return;
        };
        let service = chain_root(call).and_then(|root| self.tracked.get(root)).cloned();
        match service {
            Some(service) => {
                self.tracked.insert(name.to_string(), service);
            }
            None => {
                // Reassigned to something unrelated
                self.tracked.remove(name);
            }
        }
    }
}

impl<'a, 'c, 'ast> Visitor<'ast> for AcquisitionScan<'a, 'c> {
    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        if let StmtKind::Expr(expr) = &stmt.kind {
            self.track_value(stmt, None, expr);
        }
        walk_stmt(self, stmt)
    }

    fn visit_assign(&mut self, stmt: &'ast Stmt, lhs: &'ast [Expr], rhs: &'ast [Expr], define: bool) {
        self.track_pairs(stmt, lhs, rhs);
        walk_assign(self, stmt, lhs, rhs, define)
    }

    fn visit_var_spec(&mut self, stmt: &'ast Stmt, spec: &'ast VarSpec) {
        self.track_pairs(stmt, &spec.names, &spec.values);
        walk_var_spec(self, stmt, spec)
    }

    fn visit_func_lit(&mut self, _expr: &'ast Expr, lit: &'ast FuncLit) {
        self.bodies.push(lit.body.span);
        self.visit_block(&lit.body);
        self.bodies.pop();
    }
}

/// Root identifier of a method chain: `client.Bucket(b).Object(o)` → `client`
fn chain_root(call: &CallExpr) -> Option<&str> {
    let mut current = call.receiver()?;
    loop {
        current = match &current.kind {
            ExprKind::Ident(name) => return Some(name),
            ExprKind::Paren(inner) => inner.as_ref(),
            ExprKind::Selector { operand, .. } => operand.as_ref(),
            ExprKind::Call(inner) => inner.receiver()?,
            _ => return None,
        };
    }
}

/// `*spanner.Client` → `Client`
fn bare_type_name(type_text: &str) -> &str {
    let bare = type_text.trim_start_matches(['*', '&', '[', ']', ' ']);
    bare.rsplit('.').next().unwrap_or(bare)
}
