//! Partial binding table for lowered Go units
//!
//! Without a type checker the front end can still tell the engine a good deal:
//! - identifier identities, resolved through lexical scopes
//! - declared types of parameters, receivers, typed `var`s and struct fields
//!   reached through a typed receiver (`s.client`)
//! - callees of import-qualified calls (`storage.NewClient`) and of method
//!   calls on identifiers with a declared, import-qualified type
//!
//! Anything else is left out and the engine falls back to its heuristics.

use crate::shared::models::{
    Block, CallExpr, CaseClause, Callee, Expr, ExprKind, FuncDecl, FuncLit, ObjectId, Param,
    SourceFile, Stmt, StmtKind, TypeBindings, VarSpec,
};
use crate::shared::utils::visit::{walk_call, walk_case_clause, walk_expr, Visitor};
use crate::shared::ScopeStack;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
struct Declared {
    object: ObjectId,
    type_text: Option<String>,
}

pub struct BindingsBuilder<'a> {
    file: &'a SourceFile,
    imports: FxHashMap<&'a str, &'a str>,
    scopes: ScopeStack<Declared>,
    bindings: TypeBindings,
    next_object: u32,
}

impl<'a> BindingsBuilder<'a> {
    pub fn new(file: &'a SourceFile) -> Self {
        let imports = file
            .imports
            .iter()
            .filter(|i| !matches!(i.alias.as_deref(), Some("_") | Some(".")))
            .map(|i| (i.local_name(), i.path.as_str()))
            .collect();
        Self {
            file,
            imports,
            scopes: ScopeStack::new(),
            bindings: TypeBindings::new(),
            next_object: 0,
        }
    }

    pub fn build(mut self) -> TypeBindings {
        let file = self.file;
        for func in &file.funcs {
            self.visit_func_decl(func);
        }
        self.bindings
    }

    fn visit_func_decl(&mut self, func: &'a FuncDecl) {
        self.scopes.push();
        if let Some(receiver) = &func.receiver {
            self.declare_param(receiver);
        }
        for param in func.params.iter().chain(func.results.iter()) {
            self.declare_param(param);
        }
        if let Some(body) = &func.body {
            self.visit_block(body);
        }
        self.scopes.pop();
    }

    fn declare_param(&mut self, param: &Param) {
        if let Some(name) = &param.name {
            let object = self.declare(name, Some(param.type_text.clone()));
            self.bindings.record_object(param.span.key(), object);
            self.bindings.record_type(param.span.key(), param.type_text.clone());
        }
    }

    fn declare(&mut self, name: &str, type_text: Option<String>) -> ObjectId {
        let object = ObjectId(self.next_object);
        self.next_object += 1;
        if name != "_" {
            self.scopes.declare(name, Declared { object, type_text });
        }
        object
    }

    /// Declare a defining identifier and bind its span
    fn declare_ident(&mut self, expr: &Expr, type_text: Option<String>) {
        if let Some(name) = expr.as_ident() {
            let object = self.declare(name, type_text.clone());
            self.bindings.record_object(expr.span.key(), object);
            if let Some(ty) = type_text {
                self.bindings.record_type(expr.span.key(), ty);
            }
        }
    }

    /// Import path for a package qualifier not shadowed by a local
    fn package_path(&self, qualifier: &str) -> Option<&'a str> {
        if self.scopes.lookup(qualifier).is_some() {
            return None;
        }
        self.imports.get(qualifier).copied()
    }

    /// Declared type of an expression: identifiers and fields of local structs
    fn static_type(&self, expr: &Expr) -> Option<String> {
        match &expr.unparen().kind {
            ExprKind::Ident(name) => self
                .scopes
                .lookup(name)
                .and_then(|d| d.type_text.clone()),
            ExprKind::Selector { operand, field } => {
                let owner = self.static_type(operand)?;
                let owner = owner.trim_start_matches('*');
                self.file
                    .struct_type(owner)
                    .and_then(|t| t.field_type(field))
                    .map(str::to_string)
            }
            _ => None,
        }
    }

    fn record_callee(&mut self, expr: &Expr, call: &CallExpr) {
        let ExprKind::Selector { operand, field } = &call.func.kind else {
            return;
        };
        if let Some(qualifier) = operand.as_ident() {
            if let Some(path) = self.package_path(qualifier) {
                self.bindings.record_callee(
                    expr.span.key(),
                    Callee {
                        package_path: path.to_string(),
                        receiver_type: None,
                        name: field.clone(),
                    },
                );
                return;
            }
        }
        let Some(receiver_type) = self.static_type(operand) else {
            return;
        };
        let bare = receiver_type.trim_start_matches(['*', '[', ']']);
        let Some((qualifier, _)) = bare.split_once('.') else {
            return;
        };
        if let Some(path) = self.imports.get(qualifier).copied() {
            self.bindings.record_callee(
                expr.span.key(),
                Callee {
                    package_path: path.to_string(),
                    receiver_type: Some(receiver_type.clone()),
                    name: field.clone(),
                },
            );
        }
    }
}

impl<'a, 'ast> Visitor<'ast> for BindingsBuilder<'a> {
    fn visit_block(&mut self, block: &'ast Block) {
        self.scopes.push();
        for stmt in &block.stmts {
            self.visit_stmt(stmt);
        }
        self.scopes.pop();
    }

    fn visit_assign(&mut self, _stmt: &'ast Stmt, lhs: &'ast [Expr], rhs: &'ast [Expr], define: bool) {
        for expr in rhs {
            self.visit_expr(expr);
        }
        for expr in lhs {
            match expr.as_ident() {
                // `:=` redeclares only names new to the current scope
                Some(name) if define && self.scopes.lookup_current(name).is_none() => {
                    self.declare_ident(expr, None)
                }
                _ => self.visit_expr(expr),
            }
        }
    }

    fn visit_var_spec(&mut self, _stmt: &'ast Stmt, spec: &'ast VarSpec) {
        for value in &spec.values {
            self.visit_expr(value);
        }
        for name in &spec.names {
            self.declare_ident(name, spec.type_text.clone());
        }
    }

    fn visit_if(
        &mut self,
        _stmt: &'ast Stmt,
        init: Option<&'ast Stmt>,
        cond: &'ast Expr,
        then: &'ast Block,
        els: Option<&'ast Stmt>,
    ) {
        self.scopes.push();
        if let Some(init) = init {
            self.visit_stmt(init);
        }
        self.visit_expr(cond);
        self.visit_block(then);
        if let Some(els) = els {
            self.visit_stmt(els);
        }
        self.scopes.pop();
    }

    fn visit_for(
        &mut self,
        _stmt: &'ast Stmt,
        init: Option<&'ast Stmt>,
        cond: Option<&'ast Expr>,
        post: Option<&'ast Stmt>,
        body: &'ast Block,
    ) {
        self.scopes.push();
        if let Some(init) = init {
            self.visit_stmt(init);
        }
        if let Some(cond) = cond {
            self.visit_expr(cond);
        }
        if let Some(post) = post {
            self.visit_stmt(post);
        }
        self.visit_block(body);
        self.scopes.pop();
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
        self.visit_expr(iterable);
        self.scopes.push();
        for target in key.into_iter().chain(value) {
            if define {
                self.declare_ident(target, None);
            } else {
                self.visit_expr(target);
            }
        }
        self.visit_block(body);
        self.scopes.pop();
    }

    fn visit_switch(
        &mut self,
        _stmt: &'ast Stmt,
        init: Option<&'ast Stmt>,
        tag: Option<&'ast Expr>,
        clauses: &'ast [CaseClause],
    ) {
        self.scopes.push();
        if let Some(init) = init {
            self.visit_stmt(init);
        }
        if let Some(tag) = tag {
            self.visit_expr(tag);
        }
        for clause in clauses {
            self.visit_case_clause(clause);
        }
        self.scopes.pop();
    }

    fn visit_case_clause(&mut self, clause: &'ast CaseClause) {
        self.scopes.push();
        walk_case_clause(self, clause);
        self.scopes.pop();
    }

    fn visit_expr(&mut self, expr: &'ast Expr) {
        if let ExprKind::Selector { operand, .. } = &expr.kind {
            if operand.as_ident().map_or(false, |q| self.package_path(q).is_some()) {
                // Package qualifier, not a variable
                return;
            }
            if let Some(ty) = self.static_type(expr) {
                self.bindings.record_type(expr.span.key(), ty);
            }
        }
        walk_expr(self, expr)
    }

    fn visit_call(&mut self, expr: &'ast Expr, call: &'ast CallExpr) {
        self.record_callee(expr, call);
        walk_call(self, call)
    }

    fn visit_func_lit(&mut self, _expr: &'ast Expr, lit: &'ast FuncLit) {
        self.scopes.push();
        for param in lit.params.iter().chain(lit.results.iter()) {
            self.declare_param(param);
        }
        self.visit_block(&lit.body);
        self.scopes.pop();
    }

    fn visit_ident(&mut self, expr: &'ast Expr, name: &'ast str) {
        if let Some(declared) = self.scopes.lookup(name) {
            let object = declared.object;
            let type_text = declared.type_text.clone();
            self.bindings.record_object(expr.span.key(), object);
            if let Some(ty) = type_text {
                self.bindings.record_type(expr.span.key(), ty);
            }
        }
    }
}
