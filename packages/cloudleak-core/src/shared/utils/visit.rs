//! Syntax tree visitor
//!
//! One handler per statement / expression kind. [`walk_stmt`] and
//! [`walk_expr`] are the single dispatch tables; every default handler calls
//! the matching `walk_*` function, so an override that still wants to descend
//! calls it explicitly.

use crate::shared::models::{
    Block, CallExpr, CaseClause, Expr, ExprKind, FuncLit, Stmt, StmtKind, VarSpec,
};

pub trait Visitor<'ast>: Sized {
    fn visit_block(&mut self, block: &'ast Block) {
        walk_block(self, block)
    }

    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        walk_stmt(self, stmt)
    }

    fn visit_assign(&mut self, stmt: &'ast Stmt, lhs: &'ast [Expr], rhs: &'ast [Expr], define: bool) {
        walk_assign(self, stmt, lhs, rhs, define)
    }

    fn visit_var_spec(&mut self, stmt: &'ast Stmt, spec: &'ast VarSpec) {
        walk_var_spec(self, stmt, spec)
    }

    fn visit_defer(&mut self, stmt: &'ast Stmt, call: &'ast Expr) {
        self.visit_expr(call)
    }

    fn visit_go(&mut self, stmt: &'ast Stmt, call: &'ast Expr) {
        self.visit_expr(call)
    }

    fn visit_return(&mut self, stmt: &'ast Stmt, results: &'ast [Expr]) {
        for result in results {
            self.visit_expr(result);
        }
    }

    fn visit_if(
        &mut self,
        stmt: &'ast Stmt,
        init: Option<&'ast Stmt>,
        cond: &'ast Expr,
        then: &'ast Block,
        els: Option<&'ast Stmt>,
    ) {
        walk_if(self, init, cond, then, els)
    }

    fn visit_for(
        &mut self,
        stmt: &'ast Stmt,
        init: Option<&'ast Stmt>,
        cond: Option<&'ast Expr>,
        post: Option<&'ast Stmt>,
        body: &'ast Block,
    ) {
        walk_for(self, init, cond, post, body)
    }

    fn visit_range(
        &mut self,
        stmt: &'ast Stmt,
        key: Option<&'ast Expr>,
        value: Option<&'ast Expr>,
        iterable: &'ast Expr,
        body: &'ast Block,
    ) {
        walk_range(self, key, value, iterable, body)
    }

    fn visit_switch(
        &mut self,
        stmt: &'ast Stmt,
        init: Option<&'ast Stmt>,
        tag: Option<&'ast Expr>,
        clauses: &'ast [CaseClause],
    ) {
        walk_switch(self, init, tag, clauses)
    }

    fn visit_select(&mut self, stmt: &'ast Stmt, clauses: &'ast [CaseClause]) {
        for clause in clauses {
            self.visit_case_clause(clause);
        }
    }

    fn visit_case_clause(&mut self, clause: &'ast CaseClause) {
        walk_case_clause(self, clause)
    }

    fn visit_expr(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr)
    }

    fn visit_call(&mut self, expr: &'ast Expr, call: &'ast CallExpr) {
        walk_call(self, call)
    }

    fn visit_func_lit(&mut self, expr: &'ast Expr, lit: &'ast FuncLit) {
        self.visit_block(&lit.body)
    }

    fn visit_ident(&mut self, expr: &'ast Expr, name: &'ast str) {}
}

pub fn walk_block<'ast, V: Visitor<'ast>>(visitor: &mut V, block: &'ast Block) {
    for stmt in &block.stmts {
        visitor.visit_stmt(stmt);
    }
}

pub fn walk_stmt<'ast, V: Visitor<'ast>>(visitor: &mut V, stmt: &'ast Stmt) {
    match &stmt.kind {
        StmtKind::Assign { lhs, rhs, define } => visitor.visit_assign(stmt, lhs, rhs, *define),
        StmtKind::VarDecl(specs) => {
            for spec in specs {
                visitor.visit_var_spec(stmt, spec);
            }
        }
        StmtKind::Expr(expr) => visitor.visit_expr(expr),
        StmtKind::Defer(call) => visitor.visit_defer(stmt, call),
        StmtKind::Go(call) => visitor.visit_go(stmt, call),
        StmtKind::Return(results) => visitor.visit_return(stmt, results),
        StmtKind::If {
            init,
            cond,
            then,
            els,
        } => visitor.visit_if(stmt, init.as_deref(), cond, then, els.as_deref()),
        StmtKind::For {
            init,
            cond,
            post,
            body,
        } => visitor.visit_for(stmt, init.as_deref(), cond.as_ref(), post.as_deref(), body),
        StmtKind::Range {
            key,
            value,
            iterable,
            body,
            ..
        } => visitor.visit_range(stmt, key.as_ref(), value.as_ref(), iterable, body),
        StmtKind::Switch { init, tag, clauses } => {
            visitor.visit_switch(stmt, init.as_deref(), tag.as_ref(), clauses)
        }
        StmtKind::Select { clauses } => visitor.visit_select(stmt, clauses),
        StmtKind::Block(block) => visitor.visit_block(block),
        StmtKind::Labeled { stmt: inner, .. } => visitor.visit_stmt(inner),
        StmtKind::Send { channel, value } => {
            visitor.visit_expr(channel);
            visitor.visit_expr(value);
        }
        StmtKind::IncDec(expr) => visitor.visit_expr(expr),
        StmtKind::Branch(_) | StmtKind::Empty => {}
    }
}

pub fn walk_assign<'ast, V: Visitor<'ast>>(
    visitor: &mut V,
    _stmt: &'ast Stmt,
    lhs: &'ast [Expr],
    rhs: &'ast [Expr],
    _define: bool,
) {
    for expr in rhs {
        visitor.visit_expr(expr);
    }
    for expr in lhs {
        visitor.visit_expr(expr);
    }
}

pub fn walk_var_spec<'ast, V: Visitor<'ast>>(visitor: &mut V, _stmt: &'ast Stmt, spec: &'ast VarSpec) {
    for value in &spec.values {
        visitor.visit_expr(value);
    }
    for name in &spec.names {
        visitor.visit_expr(name);
    }
}

pub fn walk_if<'ast, V: Visitor<'ast>>(
    visitor: &mut V,
    init: Option<&'ast Stmt>,
    cond: &'ast Expr,
    then: &'ast Block,
    els: Option<&'ast Stmt>,
) {
    if let Some(init) = init {
        visitor.visit_stmt(init);
    }
    visitor.visit_expr(cond);
    visitor.visit_block(then);
    if let Some(els) = els {
        visitor.visit_stmt(els);
    }
}

pub fn walk_for<'ast, V: Visitor<'ast>>(
    visitor: &mut V,
    init: Option<&'ast Stmt>,
    cond: Option<&'ast Expr>,
    post: Option<&'ast Stmt>,
    body: &'ast Block,
) {
    if let Some(init) = init {
        visitor.visit_stmt(init);
    }
    if let Some(cond) = cond {
        visitor.visit_expr(cond);
    }
    if let Some(post) = post {
        visitor.visit_stmt(post);
    }
    visitor.visit_block(body);
}

pub fn walk_range<'ast, V: Visitor<'ast>>(
    visitor: &mut V,
    key: Option<&'ast Expr>,
    value: Option<&'ast Expr>,
    iterable: &'ast Expr,
    body: &'ast Block,
) {
    visitor.visit_expr(iterable);
    if let Some(key) = key {
        visitor.visit_expr(key);
    }
    if let Some(value) = value {
        visitor.visit_expr(value);
    }
    visitor.visit_block(body);
}

pub fn walk_switch<'ast, V: Visitor<'ast>>(
    visitor: &mut V,
    init: Option<&'ast Stmt>,
    tag: Option<&'ast Expr>,
    clauses: &'ast [CaseClause],
) {
    if let Some(init) = init {
        visitor.visit_stmt(init);
    }
    if let Some(tag) = tag {
        visitor.visit_expr(tag);
    }
    for clause in clauses {
        visitor.visit_case_clause(clause);
    }
}

pub fn walk_case_clause<'ast, V: Visitor<'ast>>(visitor: &mut V, clause: &'ast CaseClause) {
    if let Some(comm) = &clause.comm {
        visitor.visit_stmt(comm);
    }
    for expr in &clause.exprs {
        visitor.visit_expr(expr);
    }
    for stmt in &clause.body {
        visitor.visit_stmt(stmt);
    }
}

pub fn walk_expr<'ast, V: Visitor<'ast>>(visitor: &mut V, expr: &'ast Expr) {
    match &expr.kind {
        ExprKind::Ident(name) => visitor.visit_ident(expr, name),
        ExprKind::Selector { operand, .. } => visitor.visit_expr(operand),
        ExprKind::Call(call) => visitor.visit_call(expr, call),
        ExprKind::FuncLit(lit) => visitor.visit_func_lit(expr, lit),
        ExprKind::Unary { operand, .. } => visitor.visit_expr(operand),
        ExprKind::Binary { left, right, .. } => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        ExprKind::Paren(inner) => visitor.visit_expr(inner),
        ExprKind::Index { operand, index } => {
            visitor.visit_expr(operand);
            visitor.visit_expr(index);
        }
        ExprKind::Composite { elements, .. } => {
            for element in elements {
                visitor.visit_expr(element);
            }
        }
        ExprKind::KeyValue { key, value } => {
            visitor.visit_expr(key);
            visitor.visit_expr(value);
        }
        ExprKind::TypeAssert { operand, .. } => visitor.visit_expr(operand),
        ExprKind::Literal(_) => {}
        ExprKind::Other { children, .. } => {
            for child in children {
                visitor.visit_expr(child);
            }
        }
    }
}

pub fn walk_call<'ast, V: Visitor<'ast>>(visitor: &mut V, call: &'ast CallExpr) {
    visitor.visit_expr(&call.func);
    for arg in &call.args {
        visitor.visit_expr(arg);
    }
}

/// Collects every call expression under a node, closures included
#[derive(Default)]
pub struct CallCollector<'ast> {
    pub calls: Vec<(&'ast Expr, &'ast CallExpr)>,
}

impl<'ast> Visitor<'ast> for CallCollector<'ast> {
    fn visit_call(&mut self, expr: &'ast Expr, call: &'ast CallExpr) {
        self.calls.push((expr, call));
        walk_call(self, call);
    }
}

impl<'ast> CallCollector<'ast> {
    pub fn in_block(block: &'ast Block) -> Vec<(&'ast Expr, &'ast CallExpr)> {
        let mut collector = Self::default();
        collector.visit_block(block);
        collector.calls
    }

    pub fn in_expr(expr: &'ast Expr) -> Vec<(&'ast Expr, &'ast CallExpr)> {
        let mut collector = Self::default();
        collector.visit_expr(expr);
        collector.calls
    }
}
