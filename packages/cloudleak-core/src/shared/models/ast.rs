/*
 * Syntax Model
 *
 * Tagged-union tree the engine consumes. A host (or the bundled Go front end)
 * lowers its own parse tree into these types; the engine never sees
 * parser-specific nodes.
 *
 * Shape:
 * - SourceFile: imports, struct types, functions, comments
 * - FuncDecl / FuncLit: parameters, results, body Block
 * - Stmt / Expr: one variant per statement / expression kind
 */

use super::span::Span;
use serde::{Deserialize, Serialize};

/// One compilation unit (a single Go file)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    pub package: String,
    pub imports: Vec<ImportSpec>,
    pub types: Vec<TypeDecl>,
    pub funcs: Vec<FuncDecl>,
    pub comments: Vec<Comment>,
    /// Original text; may be empty for synthetic units
    #[serde(default)]
    pub source: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Find a struct type declared in this unit
    pub fn struct_type(&self, name: &str) -> Option<&TypeDecl> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Text of the given 1-indexed line, if the source is available
    pub fn line_text(&self, line: u32) -> Option<&str> {
        if line == 0 {
            return None;
        }
        self.source.lines().nth((line - 1) as usize)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSpec {
    /// Explicit alias (`foo "example.com/bar"`), `_` and `.` included
    pub alias: Option<String>,
    pub path: String,
    pub span: Span,
}

impl ImportSpec {
    /// Name the package is referred to by inside the unit.
    ///
    /// Without an alias this is the last path segment, skipping major-version
    /// (`v2`) and generated-client (`apiv1`) segments.
    pub fn local_name(&self) -> &str {
        if let Some(alias) = &self.alias {
            return alias;
        }
        let mut segments = self.path.rsplit('/');
        let last = segments.next().unwrap_or(self.path.as_str());
        if is_version_segment(last) {
            segments.next().unwrap_or(last)
        } else {
            last
        }
    }
}

fn is_version_segment(segment: &str) -> bool {
    let rest = segment
        .strip_prefix("apiv")
        .or_else(|| segment.strip_prefix('v'));
    match rest {
        Some(rest) => rest.chars().next().map_or(false, |c| c.is_ascii_digit()),
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    pub fields: Vec<FieldDecl>,
    pub span: Span,
}

impl TypeDecl {
    pub fn field_type(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == field)
            .map(|f| f.type_text.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub type_text: String,
    pub span: Span,
}

/// Function or method declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuncDecl {
    pub name: String,
    pub receiver: Option<Param>,
    pub params: Vec<Param>,
    pub results: Vec<Param>,
    pub body: Option<Block>,
    pub span: Span,
}

/// Anonymous function (closure)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuncLit {
    pub params: Vec<Param>,
    pub results: Vec<Param>,
    pub body: Block,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    /// `None` for unnamed parameters (`func(context.Context)`)
    pub name: Option<String>,
    pub type_text: String,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StmtKind {
    /// `a, b := f()` (define) or `a.b = c`
    Assign {
        lhs: Vec<Expr>,
        rhs: Vec<Expr>,
        define: bool,
    },
    /// `var a, b T = x, y`
    VarDecl(Vec<VarSpec>),
    Expr(Expr),
    Defer(Expr),
    Go(Expr),
    Return(Vec<Expr>),
    If {
        init: Option<Box<Stmt>>,
        cond: Expr,
        then: Block,
        /// Either a `Block` statement or a nested `If`
        els: Option<Box<Stmt>>,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: Block,
    },
    Range {
        key: Option<Expr>,
        value: Option<Expr>,
        define: bool,
        iterable: Expr,
        body: Block,
    },
    /// Expression and type switches
    Switch {
        init: Option<Box<Stmt>>,
        tag: Option<Expr>,
        clauses: Vec<CaseClause>,
    },
    Select {
        clauses: Vec<CaseClause>,
    },
    Block(Block),
    Labeled {
        label: String,
        stmt: Box<Stmt>,
    },
    Send {
        channel: Expr,
        value: Expr,
    },
    IncDec(Expr),
    /// break / continue / goto / fallthrough
    Branch(String),
    Empty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarSpec {
    pub names: Vec<Expr>,
    pub type_text: Option<String>,
    pub values: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseClause {
    /// Communication statement of a `select` case
    pub comm: Option<Box<Stmt>>,
    pub exprs: Vec<Expr>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExprKind {
    Ident(String),
    Selector {
        operand: Box<Expr>,
        field: String,
    },
    Call(CallExpr),
    FuncLit(FuncLit),
    Unary {
        op: String,
        operand: Box<Expr>,
    },
    Binary {
        op: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Paren(Box<Expr>),
    Index {
        operand: Box<Expr>,
        index: Box<Expr>,
    },
    Composite {
        type_text: Option<String>,
        elements: Vec<Expr>,
    },
    KeyValue {
        key: Box<Expr>,
        value: Box<Expr>,
    },
    TypeAssert {
        operand: Box<Expr>,
        type_text: Option<String>,
    },
    Literal(String),
    /// Anything else; keeps lowered children so nested calls stay visible
    Other {
        text: String,
        children: Vec<Expr>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallExpr {
    pub func: Box<Expr>,
    pub args: Vec<Expr>,
}

impl CallExpr {
    /// Method name for `x.M(...)`, function name for `f(...)`
    pub fn callee_name(&self) -> Option<&str> {
        match &self.func.kind {
            ExprKind::Selector { field, .. } => Some(field),
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// Receiver expression of `x.M(...)`
    pub fn receiver(&self) -> Option<&Expr> {
        match &self.func.kind {
            ExprKind::Selector { operand, .. } => Some(operand),
            _ => None,
        }
    }

    /// Receiver identifier of `x.M(...)`
    pub fn receiver_ident(&self) -> Option<&str> {
        self.receiver().and_then(Expr::as_ident)
    }

    /// Callee is a bare identifier: `f(...)`
    pub fn bare_callee(&self) -> Option<&str> {
        match &self.func.kind {
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// First function-literal argument at or after `index`
    pub fn func_lit_arg(&self, index: usize) -> Option<&FuncLit> {
        self.args.iter().skip(index).find_map(|a| match &a.unparen().kind {
            ExprKind::FuncLit(lit) => Some(lit),
            _ => None,
        })
    }
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&CallExpr> {
        match &self.unparen().kind {
            ExprKind::Call(call) => Some(call),
            _ => None,
        }
    }

    /// Strip any parentheses
    pub fn unparen(&self) -> &Expr {
        let mut current = self;
        while let ExprKind::Paren(inner) = &current.kind {
            current = inner;
        }
        current
    }

    pub fn is_selector(&self) -> bool {
        matches!(self.unparen().kind, ExprKind::Selector { .. })
    }

    /// Identifier directly denoted by this expression: `x`, `(x)`, `&x`
    pub fn direct_ident(&self) -> Option<&str> {
        match &self.unparen().kind {
            ExprKind::Ident(name) => Some(name),
            ExprKind::Unary { op, operand } if op == "&" => operand.direct_ident(),
            _ => None,
        }
    }
}

/// Borrowed view over either kind of function, used wherever a component only
/// needs parameters and a body.
#[derive(Debug, Clone, Copy)]
pub enum FunctionRef<'a> {
    Decl(&'a FuncDecl),
    Lit(&'a FuncLit),
}

impl<'a> FunctionRef<'a> {
    pub fn body(&self) -> Option<&'a Block> {
        match self {
            FunctionRef::Decl(decl) => decl.body.as_ref(),
            FunctionRef::Lit(lit) => Some(&lit.body),
        }
    }

    pub fn params(&self) -> &'a [Param] {
        match self {
            FunctionRef::Decl(decl) => &decl.params,
            FunctionRef::Lit(lit) => &lit.params,
        }
    }

    pub fn name(&self) -> &'a str {
        match self {
            FunctionRef::Decl(decl) => &decl.name,
            FunctionRef::Lit(_) => "func literal",
        }
    }
}
