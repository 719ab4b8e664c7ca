/*
 * Context Cancellation Tracker
 *
 * Scope-aware matching of cancel-function calls to cancellable-context
 * constructors, independent of the resource tracker.
 *
 * Scopes are pushed for blocks, statement headers (if/for/range/switch/
 * select), case clauses and function literals. Each scope maps a name to
 * `Some(record)` for a tracked cancel function or `None` for a declaration
 * that shadows it.
 *
 * Name resolution for a call `name(...)`:
 * 1. scope stack, innermost first: `Some(record)` → valid observation,
 *    `None` → shadowed, ignored
 * 2. not declared in any open scope: flat per-unit table of every cancel
 *    variable seen, resolved after the whole unit is traversed. A call that
 *    precedes every record of that name yields an invalid observation.
 */

use crate::features::context_cancellation::domain::{
    CancelHandleRecord, CancellationObservation, ObservationKind,
};
use crate::features::resource_tracking::application::import_table;
use crate::shared::models::{
    AnalysisUnit, Block, CallExpr, CaseClause, Expr, ExprKind, FuncDecl, FuncLit, Param, Span,
    Stmt, StmtKind, TypeBindings, VarSpec,
};
use crate::shared::utils::visit::{
    walk_call, walk_case_clause, walk_for, walk_if, walk_range, walk_switch, Visitor,
};
use crate::shared::ScopeStack;
use rustc_hash::FxHashMap;
use tracing::debug;

/// (package path, function) pairs returning `(ctx, cancel)`
const CONSTRUCTORS: &[(&str, &str)] = &[
    ("context", "WithCancel"),
    ("context", "WithTimeout"),
    ("context", "WithDeadline"),
    ("context", "WithCancelCause"),
    ("context", "WithTimeoutCause"),
    ("context", "WithDeadlineCause"),
    ("os/signal", "NotifyContext"),
];

#[derive(Debug, Default, Clone, Copy)]
pub struct ContextCancellationTracker;

impl ContextCancellationTracker {
    pub fn new() -> Self {
        Self
    }

    /// Every cancellable-context handle of the unit with its observations
    pub fn scan(&self, unit: &AnalysisUnit) -> Vec<CancelHandleRecord> {
        let imports = import_table(&unit.file.imports);
        let mut scan = CancelScan {
            bindings: &unit.bindings,
            imports: &imports,
            func_name: String::new(),
            scopes: ScopeStack::new(),
            records: Vec::new(),
            global: FxHashMap::default(),
            pending: Vec::new(),
            deferred_depth: 0,
        };
        for func in &unit.file.funcs {
            scan.scan_function(func);
        }
        scan.resolve_pending();

        debug!(
            path = %unit.file.path,
            handles = scan.records.len(),
            unsatisfied = scan.records.iter().filter(|r| !r.is_satisfied()).count(),
            "context handles scanned"
        );
        scan.records
    }

    /// Handles without any valid cancellation
    pub fn unsatisfied(&self, unit: &AnalysisUnit) -> Vec<CancelHandleRecord> {
        self.scan(unit)
            .into_iter()
            .filter(|r| !r.is_satisfied())
            .collect()
    }
}

/// Call that no open scope could resolve
struct PendingCall {
    name: String,
    span: Span,
    depth: usize,
    kind: ObservationKind,
}

struct CancelScan<'a> {
    bindings: &'a TypeBindings,
    imports: &'a FxHashMap<String, String>,
    func_name: String,
    scopes: ScopeStack<Option<usize>>,
    records: Vec<CancelHandleRecord>,
    /// Cancel variable name → records, in creation order
    global: FxHashMap<String, Vec<usize>>,
    pending: Vec<PendingCall>,
    /// > 0 inside a `defer` statement
    deferred_depth: u32,
}

impl<'a> CancelScan<'a> {
    fn scan_function(&mut self, func: &FuncDecl) {
        let Some(body) = &func.body else {
            return;
        };
        self.func_name = func.name.clone();
        self.scopes.clear();
        self.scopes.push();
        for param in func.receiver.iter().chain(&func.params).chain(&func.results) {
            self.shadow_param(param);
        }
        self.visit_block(body);
        self.scopes.pop();
    }

    fn shadow_param(&mut self, param: &Param) {
        if let Some(name) = param.name.as_deref().filter(|n| *n != "_") {
            self.scopes.declare(name, None);
        }
    }

    fn shadow(&mut self, expr: &Expr) {
        if let Some(name) = expr.as_ident().filter(|n| *n != "_") {
            self.scopes.declare(name, None);
        }
    }

    /// Qualified constructor name when `call` creates a cancellable context
    fn constructor(&self, expr: &Expr, call: &CallExpr) -> Option<String> {
        let ExprKind::Selector { operand, field } = &call.func.kind else {
            return None;
        };
        let qualifier = operand.as_ident()?;
        let path = match self.bindings.callee_of(expr.span.key()) {
            Some(callee) => callee.package_path.as_str(),
            None => {
                // A variable, not a package
                if self.scopes.lookup(qualifier).is_some()
                    || self.bindings.object_of(operand.span.key()).is_some()
                {
                    return None;
                }
                match self.imports.get(qualifier) {
                    Some(path) => path.as_str(),
                    None => match qualifier {
                        "context" => "context",
                        "signal" => "os/signal",
                        _ => return None,
                    },
                }
            }
        };
        CONSTRUCTORS
            .iter()
            .any(|(pkg, name)| *pkg == path && name == field)
            .then(|| format!("{}.{}", qualifier, field))
    }

    /// `ctx, cancel := ctor(...)` / `ctx, cancel = ctor(...)` /
    /// `var ctx, cancel = ctor(...)`. Returns whether a record was created.
    fn register(&mut self, stmt: &Stmt, targets: &[Expr], values: &[Expr], define: bool) -> bool {
        let ([ctx_target, cancel_target], [value]) = (targets, values) else {
            return false;
        };
        let value = value.unparen();
        let ExprKind::Call(call) = &value.kind else {
            return false;
        };
        let Some(constructor) = self.constructor(value, call) else {
            return false;
        };
        let Some(cancel_name) = cancel_target.as_ident() else {
            // Stored straight into a field or slot
            return false;
        };

        let index = self.records.len();
        self.records.push(CancelHandleRecord {
            context_name: ctx_target.as_ident().unwrap_or("_").to_string(),
            cancel_name: cancel_name.to_string(),
            cancel_id: self.bindings.object_of(cancel_target.span.key()),
            constructor: constructor.clone(),
            call_span: value.span,
            stmt_span: stmt.span,
            func_name: self.func_name.clone(),
            observations: Vec::new(),
        });
        debug!(
            cancel = cancel_name,
            constructor = %constructor,
            line = value.span.start_line,
            "cancellable context"
        );

        if cancel_name != "_" {
            if define || !self.scopes.assign(cancel_name, Some(index)) {
                self.scopes.declare(cancel_name, Some(index));
            }
            self.global
                .entry(cancel_name.to_string())
                .or_default()
                .push(index);
        }
        if define {
            self.shadow(ctx_target);
        }
        true
    }

    fn observe(&mut self, name: &str, span: Span) {
        let kind = if self.deferred_depth > 0 {
            ObservationKind::Deferred
        } else {
            ObservationKind::Direct
        };
        let depth = self.scopes.depth();
        match self.scopes.lookup(name).copied() {
            Some(Some(index)) => self.records[index].observe(CancellationObservation {
                name: name.to_string(),
                span,
                depth,
                is_valid: true,
                kind,
            }),
            Some(None) => {}
            None => self.pending.push(PendingCall {
                name: name.to_string(),
                span,
                depth,
                kind,
            }),
        }
    }

    /// Resolve calls through the flat table: the latest record created before
    /// the call, else an invalid observation on the first record of the name
    fn resolve_pending(&mut self) {
        for call in std::mem::take(&mut self.pending) {
            let Some(candidates) = self.global.get(&call.name) else {
                continue;
            };
            let preceding = candidates
                .iter()
                .rev()
                .find(|&&i| self.records[i].call_span.start <= call.span.start)
                .copied();
            let (index, is_valid) = match (preceding, candidates.first()) {
                (Some(index), _) => (index, true),
                (None, Some(&first)) => (first, false),
                (None, None) => continue,
            };
            debug!(
                cancel = %call.name,
                line = call.span.start_line,
                is_valid,
                "resolved through unit table"
            );
            self.records[index].observe(CancellationObservation {
                name: call.name,
                span: call.span,
                depth: call.depth,
                is_valid,
                kind: call.kind,
            });
        }
    }

    fn in_scope(&mut self, f: impl FnOnce(&mut Self)) {
        self.scopes.push();
        f(self);
        self.scopes.pop();
    }
}

impl<'a, 'ast> Visitor<'ast> for CancelScan<'a> {
    fn visit_block(&mut self, block: &'ast Block) {
        self.in_scope(|this| {
            for stmt in &block.stmts {
                this.visit_stmt(stmt);
            }
        });
    }

    fn visit_assign(&mut self, stmt: &'ast Stmt, lhs: &'ast [Expr], rhs: &'ast [Expr], define: bool) {
        for value in rhs {
            self.visit_expr(value);
        }
        if self.register(stmt, lhs, rhs, define) {
            return;
        }
        for target in lhs {
            match target.as_ident() {
                Some(name) if define && self.scopes.lookup_current(name).is_none() => {
                    self.shadow(target)
                }
                _ => self.visit_expr(target),
            }
        }
    }

    fn visit_var_spec(&mut self, stmt: &'ast Stmt, spec: &'ast VarSpec) {
        for value in &spec.values {
            self.visit_expr(value);
        }
        if !self.register(stmt, &spec.names, &spec.values, true) {
            for name in &spec.names {
                self.shadow(name);
            }
        }
    }

    fn visit_defer(&mut self, _stmt: &'ast Stmt, call: &'ast Expr) {
        self.deferred_depth += 1;
        self.visit_expr(call);
        self.deferred_depth -= 1;
    }

    fn visit_go(&mut self, _stmt: &'ast Stmt, call: &'ast Expr) {
        // A goroutine runs on its own schedule even when started from a
        // deferred literal
        let saved = std::mem::replace(&mut self.deferred_depth, 0);
        self.visit_expr(call);
        self.deferred_depth = saved;
    }

    fn visit_if(
        &mut self,
        _stmt: &'ast Stmt,
        init: Option<&'ast Stmt>,
        cond: &'ast Expr,
        then: &'ast Block,
        els: Option<&'ast Stmt>,
    ) {
        self.in_scope(|this| walk_if(this, init, cond, then, els));
    }

    fn visit_for(
        &mut self,
        _stmt: &'ast Stmt,
        init: Option<&'ast Stmt>,
        cond: Option<&'ast Expr>,
        post: Option<&'ast Stmt>,
        body: &'ast Block,
    ) {
        self.in_scope(|this| walk_for(this, init, cond, post, body));
    }

    fn visit_range(
        &mut self,
        stmt: &'ast Stmt,
        key: Option<&'ast Expr>,
        value: Option<&'ast Expr>,
        iterable: &'ast Expr,
        body: &'ast Block,
    ) {
        let define = matches!(stmt.kind, StmtKind::Range { define: true, .. });
        self.in_scope(|this| {
            if define {
                this.visit_expr(iterable);
                for target in key.into_iter().chain(value) {
                    this.shadow(target);
                }
                this.visit_block(body);
            } else {
                walk_range(this, key, value, iterable, body);
            }
        });
    }

    fn visit_switch(
        &mut self,
        _stmt: &'ast Stmt,
        init: Option<&'ast Stmt>,
        tag: Option<&'ast Expr>,
        clauses: &'ast [CaseClause],
    ) {
        self.in_scope(|this| walk_switch(this, init, tag, clauses));
    }

    fn visit_select(&mut self, _stmt: &'ast Stmt, clauses: &'ast [CaseClause]) {
        self.in_scope(|this| {
            for clause in clauses {
                this.visit_case_clause(clause);
            }
        });
    }

    fn visit_case_clause(&mut self, clause: &'ast CaseClause) {
        self.in_scope(|this| walk_case_clause(this, clause));
    }

    fn visit_call(&mut self, expr: &'ast Expr, call: &'ast CallExpr) {
        if let Some(name) = call.bare_callee() {
            self.observe(name, expr.span);
        }
        walk_call(self, call)
    }

    fn visit_func_lit(&mut self, _expr: &'ast Expr, lit: &'ast FuncLit) {
        self.in_scope(|this| {
            for param in lit.params.iter().chain(&lit.results) {
                this.shadow_param(param);
            }
            this.visit_block(&lit.body);
        });
    }
}
