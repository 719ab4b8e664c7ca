/*
 * Go Lowering
 *
 * Converts a tree-sitter-go parse tree into the engine's syntax model.
 *
 * Handles:
 * - imports, struct type declarations, functions and methods
 * - every statement kind (block contents with or without statement_list)
 * - expressions; unknown node kinds become `ExprKind::Other` with their
 *   lowered children so nested calls and closures stay reachable
 */

use crate::shared::models::{
    Block, CallExpr, CaseClause, Comment, Expr, ExprKind, FieldDecl, FuncDecl, FuncLit,
    ImportSpec, Param, SourceFile, Stmt, StmtKind, TypeDecl, VarSpec,
};
use crate::shared::utils::tree_sitter::{
    children_by_field, find_descendants_by_kind, has_token, named_children, node_text,
    node_text_owned, node_to_span, unfielded_named_children, unquote,
};
use tree_sitter::Node;

pub struct GoLowering<'s> {
    source: &'s str,
}

impl<'s> GoLowering<'s> {
    pub fn new(source: &'s str) -> Self {
        Self { source }
    }

    fn text(&self, node: &Node) -> &'s str {
        node_text(node, self.source)
    }

    pub fn lower_file(&self, path: &str, root: &Node) -> SourceFile {
        let mut file = SourceFile::new(path);
        file.source = self.source.to_string();

        for child in named_children(root) {
            match child.kind() {
                "package_clause" => {
                    if let Some(name) = named_children(&child).first() {
                        file.package = node_text_owned(name, self.source);
                    }
                }
                "import_declaration" => self.lower_imports(&child, &mut file.imports),
                "type_declaration" => self.lower_type_decl(&child, &mut file.types),
                "function_declaration" | "method_declaration" => {
                    file.funcs.push(self.lower_func_decl(&child));
                }
                _ => {}
            }
        }

        file.comments = find_descendants_by_kind(root, "comment")
            .iter()
            .map(|c| Comment {
                text: node_text_owned(c, self.source),
                span: node_to_span(c),
            })
            .collect();

        file
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Declarations
    // ═══════════════════════════════════════════════════════════════════════

    fn lower_imports(&self, node: &Node, out: &mut Vec<ImportSpec>) {
        for spec in find_descendants_by_kind(node, "import_spec") {
            let Some(path) = spec.child_by_field_name("path") else {
                continue;
            };
            let alias = spec
                .child_by_field_name("name")
                .map(|n| node_text_owned(&n, self.source));
            out.push(ImportSpec {
                alias,
                path: unquote(self.text(&path)).to_string(),
                span: node_to_span(&spec),
            });
        }
    }

    fn lower_type_decl(&self, node: &Node, out: &mut Vec<TypeDecl>) {
        for spec in find_descendants_by_kind(node, "type_spec") {
            let (Some(name), Some(ty)) = (
                spec.child_by_field_name("name"),
                spec.child_by_field_name("type"),
            ) else {
                continue;
            };
            if ty.kind() != "struct_type" {
                continue;
            }
            let mut fields = Vec::new();
            for field in find_descendants_by_kind(&ty, "field_declaration") {
                let type_text = field
                    .child_by_field_name("type")
                    .map(|t| node_text_owned(&t, self.source))
                    .unwrap_or_default();
                let names = children_by_field(&field, "name");
                if names.is_empty() {
                    // Embedded field: addressed by its type name
                    let embedded = type_text.trim_start_matches('*');
                    let name = embedded.rsplit('.').next().unwrap_or(embedded);
                    fields.push(FieldDecl {
                        name: name.to_string(),
                        type_text: type_text.clone(),
                        span: node_to_span(&field),
                    });
                }
                for name in names {
                    fields.push(FieldDecl {
                        name: node_text_owned(&name, self.source),
                        type_text: type_text.clone(),
                        span: node_to_span(&name),
                    });
                }
            }
            out.push(TypeDecl {
                name: node_text_owned(&name, self.source),
                fields,
                span: node_to_span(&spec),
            });
        }
    }

    fn lower_func_decl(&self, node: &Node) -> FuncDecl {
        let receiver = node
            .child_by_field_name("receiver")
            .and_then(|r| self.lower_params(&r).into_iter().next());
        FuncDecl {
            name: node
                .child_by_field_name("name")
                .map(|n| node_text_owned(&n, self.source))
                .unwrap_or_default(),
            receiver,
            params: node
                .child_by_field_name("parameters")
                .map(|p| self.lower_params(&p))
                .unwrap_or_default(),
            results: self.lower_results(node.child_by_field_name("result")),
            body: node.child_by_field_name("body").map(|b| self.lower_block(&b)),
            span: node_to_span(node),
        }
    }

    fn lower_params(&self, list: &Node) -> Vec<Param> {
        let mut params = Vec::new();
        for decl in named_children(list) {
            let variadic = decl.kind() == "variadic_parameter_declaration";
            if decl.kind() != "parameter_declaration" && !variadic {
                continue;
            }
            let mut type_text = decl
                .child_by_field_name("type")
                .map(|t| node_text_owned(&t, self.source))
                .unwrap_or_default();
            if variadic {
                type_text = format!("...{}", type_text);
            }
            let names = children_by_field(&decl, "name");
            if names.is_empty() {
                params.push(Param {
                    name: None,
                    type_text,
                    span: node_to_span(&decl),
                });
                continue;
            }
            for name in names {
                params.push(Param {
                    name: Some(node_text_owned(&name, self.source)),
                    type_text: type_text.clone(),
                    span: node_to_span(&name),
                });
            }
        }
        params
    }

    fn lower_results(&self, node: Option<Node>) -> Vec<Param> {
        match node {
            Some(list) if list.kind() == "parameter_list" => self.lower_params(&list),
            Some(ty) => vec![Param {
                name: None,
                type_text: node_text_owned(&ty, self.source),
                span: node_to_span(&ty),
            }],
            None => Vec::new(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Statements
    // ═══════════════════════════════════════════════════════════════════════

    pub fn lower_block(&self, node: &Node) -> Block {
        Block {
            stmts: self.lower_statements(named_children(node)),
            span: node_to_span(node),
        }
    }

    /// Lower a statement sequence, flattening `statement_list` wrappers
    fn lower_statements(&self, nodes: Vec<Node>) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        for node in nodes {
            if node.kind() == "statement_list" {
                stmts.extend(self.lower_statements(named_children(&node)));
            } else {
                stmts.push(self.lower_stmt(&node));
            }
        }
        stmts
    }

    fn lower_boxed_stmt(&self, node: Option<Node>) -> Option<Box<Stmt>> {
        node.map(|n| Box::new(self.lower_stmt(&n)))
    }

    fn lower_stmt(&self, node: &Node) -> Stmt {
        let span = node_to_span(node);
        let kind = match node.kind() {
            "short_var_declaration" => StmtKind::Assign {
                lhs: self.lower_expr_list(node.child_by_field_name("left")),
                rhs: self.lower_expr_list(node.child_by_field_name("right")),
                define: true,
            },
            "assignment_statement" => StmtKind::Assign {
                lhs: self.lower_expr_list(node.child_by_field_name("left")),
                rhs: self.lower_expr_list(node.child_by_field_name("right")),
                define: false,
            },
            "receive_statement" => {
                let rhs: Vec<Expr> = node
                    .child_by_field_name("right")
                    .map(|r| vec![self.lower_expr(&r)])
                    .unwrap_or_default();
                match node.child_by_field_name("left") {
                    Some(left) => StmtKind::Assign {
                        lhs: self.lower_expr_list(Some(left)),
                        rhs,
                        define: has_token(node, ":="),
                    },
                    None => match rhs.into_iter().next() {
                        Some(expr) => StmtKind::Expr(expr),
                        None => StmtKind::Empty,
                    },
                }
            }
            "var_declaration" => StmtKind::VarDecl(
                find_descendants_by_kind(node, "var_spec")
                    .iter()
                    .map(|spec| self.lower_var_spec(spec))
                    .collect(),
            ),
            "expression_statement" => match self.first_unfielded_expr(node) {
                Some(expr) => StmtKind::Expr(expr),
                None => StmtKind::Empty,
            },
            "defer_statement" | "go_statement" => match self.first_unfielded_expr(node) {
                Some(expr) if node.kind() == "defer_statement" => StmtKind::Defer(expr),
                Some(expr) => StmtKind::Go(expr),
                None => StmtKind::Empty,
            },
            "return_statement" => {
                let results = unfielded_named_children(node)
                    .into_iter()
                    .flat_map(|child| self.lower_expr_list(Some(child)))
                    .collect();
                StmtKind::Return(results)
            }
            "if_statement" => self.lower_if(node),
            "for_statement" => self.lower_for(node),
            "expression_switch_statement" | "type_switch_statement" => StmtKind::Switch {
                init: self.lower_boxed_stmt(node.child_by_field_name("initializer")),
                tag: node.child_by_field_name("value").map(|v| self.lower_expr(&v)),
                clauses: unfielded_named_children(node)
                    .iter()
                    .map(|c| self.lower_case_clause(c))
                    .collect(),
            },
            "select_statement" => StmtKind::Select {
                clauses: unfielded_named_children(node)
                    .iter()
                    .map(|c| self.lower_case_clause(c))
                    .collect(),
            },
            "block" => StmtKind::Block(self.lower_block(node)),
            "labeled_statement" => {
                let label = node
                    .child_by_field_name("label")
                    .map(|l| node_text_owned(&l, self.source))
                    .unwrap_or_default();
                match unfielded_named_children(node).first() {
                    Some(inner) => StmtKind::Labeled {
                        label,
                        stmt: Box::new(self.lower_stmt(inner)),
                    },
                    None => StmtKind::Empty,
                }
            }
            "send_statement" => {
                match (
                    node.child_by_field_name("channel"),
                    node.child_by_field_name("value"),
                ) {
                    (Some(channel), Some(value)) => StmtKind::Send {
                        channel: self.lower_expr(&channel),
                        value: self.lower_expr(&value),
                    },
                    _ => StmtKind::Empty,
                }
            }
            "inc_statement" | "dec_statement" => match self.first_unfielded_expr(node) {
                Some(expr) => StmtKind::IncDec(expr),
                None => StmtKind::Empty,
            },
            "break_statement" | "continue_statement" | "goto_statement"
            | "fallthrough_statement" => StmtKind::Branch(node.kind().to_string()),
            "empty_statement" | "type_declaration" | "const_declaration" => StmtKind::Empty,
            _ => StmtKind::Expr(self.lower_expr(node)),
        };
        Stmt { kind, span }
    }

    fn first_unfielded_expr(&self, node: &Node) -> Option<Expr> {
        unfielded_named_children(node)
            .first()
            .map(|child| self.lower_expr(child))
    }

    fn lower_var_spec(&self, spec: &Node) -> VarSpec {
        VarSpec {
            names: children_by_field(spec, "name")
                .iter()
                .map(|n| self.lower_expr(n))
                .collect(),
            type_text: spec
                .child_by_field_name("type")
                .map(|t| node_text_owned(&t, self.source)),
            values: self.lower_expr_list(spec.child_by_field_name("value")),
            span: node_to_span(spec),
        }
    }

    fn lower_if(&self, node: &Node) -> StmtKind {
        let cond = match node.child_by_field_name("condition") {
            Some(c) => self.lower_expr(&c),
            None => Expr::new(ExprKind::Literal(String::new()), node_to_span(node)),
        };
        let then = match node.child_by_field_name("consequence") {
            Some(b) => self.lower_block(&b),
            None => Block {
                stmts: Vec::new(),
                span: node_to_span(node),
            },
        };
        StmtKind::If {
            init: self.lower_boxed_stmt(node.child_by_field_name("initializer")),
            cond,
            then,
            els: self.lower_boxed_stmt(node.child_by_field_name("alternative")),
        }
    }

    fn lower_for(&self, node: &Node) -> StmtKind {
        let body = match node.child_by_field_name("body") {
            Some(b) => self.lower_block(&b),
            None => Block {
                stmts: Vec::new(),
                span: node_to_span(node),
            },
        };
        let header = unfielded_named_children(node).into_iter().next();
        match header {
            Some(clause) if clause.kind() == "range_clause" => {
                let mut left = self
                    .lower_expr_list(clause.child_by_field_name("left"))
                    .into_iter();
                let iterable = match clause.child_by_field_name("right") {
                    Some(r) => self.lower_expr(&r),
                    None => Expr::new(ExprKind::Literal(String::new()), node_to_span(&clause)),
                };
                StmtKind::Range {
                    key: left.next(),
                    value: left.next(),
                    define: has_token(&clause, ":="),
                    iterable,
                    body,
                }
            }
            Some(clause) if clause.kind() == "for_clause" => StmtKind::For {
                init: self.lower_boxed_stmt(clause.child_by_field_name("initializer")),
                cond: clause
                    .child_by_field_name("condition")
                    .map(|c| self.lower_expr(&c)),
                post: self.lower_boxed_stmt(clause.child_by_field_name("update")),
                body,
            },
            Some(cond) => StmtKind::For {
                init: None,
                cond: Some(self.lower_expr(&cond)),
                post: None,
                body,
            },
            None => StmtKind::For {
                init: None,
                cond: None,
                post: None,
                body,
            },
        }
    }

    fn lower_case_clause(&self, node: &Node) -> CaseClause {
        let mut exprs = Vec::new();
        for field in ["value", "type"] {
            for child in children_by_field(node, field) {
                exprs.extend(self.lower_expr_list(Some(child)));
            }
        }
        CaseClause {
            comm: self.lower_boxed_stmt(node.child_by_field_name("communication")),
            exprs,
            body: self.lower_statements(unfielded_named_children(node)),
            span: node_to_span(node),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Expressions
    // ═══════════════════════════════════════════════════════════════════════

    /// Lower an `expression_list` (or a single expression) into its elements
    fn lower_expr_list(&self, node: Option<Node>) -> Vec<Expr> {
        match node {
            Some(list) if list.kind() == "expression_list" => named_children(&list)
                .iter()
                .map(|e| self.lower_expr(e))
                .collect(),
            Some(expr) => vec![self.lower_expr(&expr)],
            None => Vec::new(),
        }
    }

    fn boxed_field(&self, node: &Node, field: &str) -> Box<Expr> {
        Box::new(match node.child_by_field_name(field) {
            Some(child) => self.lower_expr(&child),
            None => Expr::new(ExprKind::Literal(String::new()), node_to_span(node)),
        })
    }

    pub fn lower_expr(&self, node: &Node) -> Expr {
        let span = node_to_span(node);
        let kind = match node.kind() {
            "identifier" | "field_identifier" | "package_identifier" | "type_identifier"
            | "blank_identifier" => ExprKind::Ident(node_text_owned(node, self.source)),
            "selector_expression" => ExprKind::Selector {
                operand: self.boxed_field(node, "operand"),
                field: node
                    .child_by_field_name("field")
                    .map(|f| node_text_owned(&f, self.source))
                    .unwrap_or_default(),
            },
            "call_expression" => {
                let args = node
                    .child_by_field_name("arguments")
                    .map(|list| {
                        named_children(&list)
                            .iter()
                            .map(|a| self.lower_expr(a))
                            .collect()
                    })
                    .unwrap_or_default();
                ExprKind::Call(CallExpr {
                    func: self.boxed_field(node, "function"),
                    args,
                })
            }
            "func_literal" => ExprKind::FuncLit(FuncLit {
                params: node
                    .child_by_field_name("parameters")
                    .map(|p| self.lower_params(&p))
                    .unwrap_or_default(),
                results: self.lower_results(node.child_by_field_name("result")),
                body: match node.child_by_field_name("body") {
                    Some(b) => self.lower_block(&b),
                    None => Block {
                        stmts: Vec::new(),
                        span,
                    },
                },
            }),
            "unary_expression" => ExprKind::Unary {
                op: node
                    .child_by_field_name("operator")
                    .map(|o| node_text_owned(&o, self.source))
                    .unwrap_or_default(),
                operand: self.boxed_field(node, "operand"),
            },
            "binary_expression" => ExprKind::Binary {
                op: node
                    .child_by_field_name("operator")
                    .map(|o| node_text_owned(&o, self.source))
                    .unwrap_or_default(),
                left: self.boxed_field(node, "left"),
                right: self.boxed_field(node, "right"),
            },
            "parenthesized_expression" => match named_children(node).first() {
                Some(inner) => ExprKind::Paren(Box::new(self.lower_expr(inner))),
                None => ExprKind::Literal(String::new()),
            },
            "index_expression" => ExprKind::Index {
                operand: self.boxed_field(node, "operand"),
                index: self.boxed_field(node, "index"),
            },
            "composite_literal" => ExprKind::Composite {
                type_text: node
                    .child_by_field_name("type")
                    .map(|t| node_text_owned(&t, self.source)),
                elements: node
                    .child_by_field_name("body")
                    .map(|b| self.lower_elements(&b))
                    .unwrap_or_default(),
            },
            "literal_value" => ExprKind::Composite {
                type_text: None,
                elements: self.lower_elements(node),
            },
            "literal_element" | "variadic_argument" => match named_children(node).first() {
                Some(inner) => return self.lower_expr(inner),
                None => ExprKind::Literal(String::new()),
            },
            "keyed_element" => {
                let parts = named_children(node);
                match (parts.first(), parts.get(1)) {
                    (Some(key), Some(value)) => ExprKind::KeyValue {
                        key: Box::new(self.lower_expr(key)),
                        value: Box::new(self.lower_expr(value)),
                    },
                    _ => ExprKind::Other {
                        text: node.kind().to_string(),
                        children: parts.iter().map(|p| self.lower_expr(p)).collect(),
                    },
                }
            }
            "type_assertion_expression" => ExprKind::TypeAssert {
                operand: self.boxed_field(node, "operand"),
                type_text: node
                    .child_by_field_name("type")
                    .map(|t| node_text_owned(&t, self.source)),
            },
            "interpreted_string_literal" | "raw_string_literal" | "int_literal"
            | "float_literal" | "imaginary_literal" | "rune_literal" | "true" | "false"
            | "nil" | "iota" => ExprKind::Literal(node_text_owned(node, self.source)),
            _ => ExprKind::Other {
                text: node.kind().to_string(),
                children: named_children(node)
                    .iter()
                    .map(|c| self.lower_expr(c))
                    .collect(),
            },
        };
        Expr::new(kind, span)
    }

    fn lower_elements(&self, literal_value: &Node) -> Vec<Expr> {
        named_children(literal_value)
            .iter()
            .map(|e| self.lower_expr(e))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn lower(source: &str) -> SourceFile {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_go::language()).unwrap();
        let tree = parser.parse(source, None).unwrap();
        GoLowering::new(source).lower_file("test.go", &tree.root_node())
    }

    #[test]
    fn test_imports_and_package() {
        let file = lower(
            r#"
package svc

import (
    "context"
    gcs "cloud.google.com/go/storage"
)
"#,
        );
        assert_eq!(file.package, "svc");
        assert_eq!(file.imports.len(), 2);
        assert_eq!(file.imports[0].path, "context");
        assert_eq!(file.imports[1].alias.as_deref(), Some("gcs"));
        assert_eq!(file.imports[1].local_name(), "gcs");
    }

    #[test]
    fn test_method_with_receiver_and_results() {
        let file = lower(
            r#"
package svc

type Service struct {
    client *spanner.Client
    name, region string
}

func (s *Service) Open(ctx context.Context, opts ...Option) (*Handle, error) {
    return nil, nil
}
"#,
        );
        let ty = file.struct_type("Service").unwrap();
        assert_eq!(ty.field_type("client"), Some("*spanner.Client"));
        assert_eq!(ty.field_type("region"), Some("string"));

        let func = &file.funcs[0];
        assert_eq!(func.name, "Open");
        assert_eq!(func.receiver.as_ref().unwrap().type_text, "*Service");
        assert_eq!(func.params.len(), 2);
        assert_eq!(func.params[1].type_text, "...Option");
        assert_eq!(func.results.len(), 2);
    }

    #[test]
    fn test_short_var_declaration_with_call() {
        let file = lower(
            r#"
package main

func f(ctx context.Context) {
    client, err := storage.NewClient(ctx)
    _ = err
}
"#,
        );
        let body = file.funcs[0].body.as_ref().unwrap();
        match &body.stmts[0].kind {
            StmtKind::Assign { lhs, rhs, define } => {
                assert!(*define);
                assert_eq!(lhs.len(), 2);
                assert_eq!(lhs[0].as_ident(), Some("client"));
                let call = rhs[0].as_call().unwrap();
                assert_eq!(call.callee_name(), Some("NewClient"));
                assert_eq!(call.receiver_ident(), Some("storage"));
            }
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn test_defer_func_literal_and_comments() {
        let file = lower(
            r#"
package main

func f() {
    // setup
    defer func() {
        c.Close()
    }()
}
"#,
        );
        assert_eq!(file.comments.len(), 1);
        assert_eq!(file.comments[0].text, "// setup");
        let body = file.funcs[0].body.as_ref().unwrap();
        assert_eq!(body.stmts.len(), 1);
        match &body.stmts[0].kind {
            StmtKind::Defer(expr) => {
                let call = expr.as_call().unwrap();
                assert!(matches!(call.func.kind, ExprKind::FuncLit(_)));
            }
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn test_range_and_switch_clauses() {
        let file = lower(
            r#"
package main

func f(xs []int) {
    for i, x := range xs {
        switch x {
        case 1, 2:
            g(i)
        default:
            h()
        }
    }
}
"#,
        );
        let body = file.funcs[0].body.as_ref().unwrap();
        let StmtKind::Range {
            key, value, define, body: loop_body, ..
        } = &body.stmts[0].kind
        else {
            panic!("expected range");
        };
        assert!(*define);
        assert_eq!(key.as_ref().and_then(Expr::as_ident), Some("i"));
        assert_eq!(value.as_ref().and_then(Expr::as_ident), Some("x"));
        let StmtKind::Switch { clauses, .. } = &loop_body.stmts[0].kind else {
            panic!("expected switch");
        };
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0].exprs.len(), 2);
        assert_eq!(clauses[0].body.len(), 1);
        assert!(clauses[1].exprs.is_empty());
    }

    #[test]
    fn test_composite_literal_elements() {
        let file = lower(
            r#"
package main

func f() *Holder {
    return &Holder{client: c}
}
"#,
        );
        let body = file.funcs[0].body.as_ref().unwrap();
        let StmtKind::Return(results) = &body.stmts[0].kind else {
            panic!("expected return");
        };
        let ExprKind::Unary { op, operand } = &results[0].kind else {
            panic!("expected address-of");
        };
        assert_eq!(op, "&");
        let ExprKind::Composite { elements, .. } = &operand.kind else {
            panic!("expected composite literal");
        };
        let ExprKind::KeyValue { value, .. } = &elements[0].kind else {
            panic!("expected keyed element");
        };
        assert_eq!(value.as_ident(), Some("c"));
    }
}
