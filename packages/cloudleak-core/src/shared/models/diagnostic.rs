/*
 * Diagnostics
 *
 * Findings handed back to the host: position, category, message and
 * suggested text edits.
 */

use super::span::Span;
use serde::{Deserialize, Serialize};

/// Finding category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Cloud client / handle never released
    ResourceLeak,

    /// Cancel function of a cancellable context never called
    ContextLeak,

    /// Unit skipped because the host could not resolve external identifiers
    UnresolvedDependency,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::ResourceLeak => "resource-leak",
            Category::ContextLeak => "context-leak",
            Category::UnresolvedDependency => "unresolved-dependency",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Replace `[start, end)` with `new_text`; `start == end` inserts
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextEdit {
    pub start: u32,
    pub end: u32,
    pub new_text: String,
}

impl TextEdit {
    pub fn insert(offset: u32, text: impl Into<String>) -> Self {
        Self {
            start: offset,
            end: offset,
            new_text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SuggestedFix {
    pub message: String,
    pub edits: Vec<TextEdit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Byte offset of the reported node
    pub pos: u32,
    pub line: u32,
    pub column: u32,
    pub category: Category,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggested_fixes: Vec<SuggestedFix>,
}

impl Diagnostic {
    pub fn new(span: Span, category: Category, message: impl Into<String>) -> Self {
        Self {
            pos: span.start,
            line: span.start_line,
            column: span.start_col,
            category,
            message: message.into(),
            suggested_fixes: Vec::new(),
        }
    }

    pub fn with_fix(mut self, fix: SuggestedFix) -> Self {
        self.suggested_fixes.push(fix);
        self
    }

    /// Sort key giving a stable order across runs
    pub fn sort_key(&self) -> (u32, Category, &str) {
        (self.pos, self.category, self.message.as_str())
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: [{}] {}",
            self.line, self.column, self.category, self.message
        )
    }
}

/// Host-side reporting callback
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Adapts a closure into a [`DiagnosticSink`]
pub struct FnSink<F>(pub F);

impl<F: FnMut(Diagnostic)> DiagnosticSink for FnSink<F> {
    fn report(&mut self, diagnostic: Diagnostic) {
        (self.0)(diagnostic)
    }
}
