/*
 * Diagnostic Generator
 *
 * Findings for unreleased handles and uncancelled contexts. Each finding
 * carries one suggested fix inserting the missing `defer` on a new line after
 * the acquiring statement, indented like it. An acquisition in an `if` header
 * gets the `defer` as the first statement of the body.
 *
 * No fix:
 * - handles discarded with `_`
 * - acquisitions in a `for` or `switch` header
 */

use crate::config::EngineConfig;
use crate::features::context_cancellation::CancelHandleRecord;
use crate::features::diagnostics::domain::SuppressionMarkers;
use crate::features::resource_tracking::ResourceRecord;
use crate::shared::models::{
    AnalysisUnit, Block, CaseClause, Comment, Category, Diagnostic, Expr, Span, Stmt,
    SuggestedFix, TextEdit,
};
use crate::shared::utils::visit::{walk_for, walk_if, walk_switch, Visitor};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct DiagnosticGenerator {
    config: Arc<EngineConfig>,
    markers: SuppressionMarkers,
}

impl DiagnosticGenerator {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        let markers = SuppressionMarkers::new(
            config.tool_name.clone(),
            config.extra_suppression_markers.clone(),
        );
        Self { config, markers }
    }

    pub fn tool_name(&self) -> &str {
        &self.config.tool_name
    }

    pub fn missing_cleanup(&self, record: &ResourceRecord, unit: &AnalysisUnit) -> Diagnostic {
        if record.is_discarded() {
            return Diagnostic::new(
                record.call_span,
                Category::ResourceLeak,
                format!(
                    "{} {} from {} is discarded with `_` and can never be released with {}()",
                    record.service, record.kind, record.operation, record.cleanup_method
                ),
            );
        }

        let mut message = format!(
            "{} {} `{}` from {} is never released: missing `defer {}.{}()`",
            record.service,
            record.kind,
            record.name,
            record.operation,
            record.name,
            record.cleanup_method
        );
        if record.is_advisory() {
            message.push_str(" (variable name is a naming-convention guess)");
        }

        let statement = format!("defer {}.{}()", record.name, record.cleanup_method);
        with_defer_fix(
            Diagnostic::new(record.call_span, Category::ResourceLeak, message),
            unit,
            record.stmt_span,
            &statement,
        )
    }

    pub fn missing_cancellation(&self, handle: &CancelHandleRecord, unit: &AnalysisUnit) -> Diagnostic {
        if handle.is_discarded() {
            return Diagnostic::new(
                handle.call_span,
                Category::ContextLeak,
                format!(
                    "the cancel function returned by {} is discarded; the context `{}` is never released",
                    handle.constructor, handle.context_name
                ),
            );
        }

        let call = if handle.constructor.ends_with("WithCancelCause") {
            format!("{}(nil)", handle.cancel_name)
        } else {
            format!("{}()", handle.cancel_name)
        };
        let message = format!(
            "the `{}` function returned by {} is never called: context leak",
            handle.cancel_name, handle.constructor
        );
        with_defer_fix(
            Diagnostic::new(handle.call_span, Category::ContextLeak, message),
            unit,
            handle.stmt_span,
            &format!("defer {}", call),
        )
    }

    /// Single advisory replacing every other finding of a unit whose external
    /// identifiers could not be resolved
    pub fn unresolved_dependency(&self, unit: &AnalysisUnit) -> Diagnostic {
        let unresolved = unit.bindings.unresolved();
        let mut names: Vec<&str> = unresolved.iter().map(|u| u.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        let sample = names.iter().take(3).copied().collect::<Vec<_>>().join(", ");
        let pos = unresolved.iter().map(|u| u.offset).min().unwrap_or(0);
        let (line, column) = location_of(unit, pos).unwrap_or((1, 0));
        let span = Span::new(pos, pos, line, column, line, column);
        Diagnostic::new(
            span,
            Category::UnresolvedDependency,
            format!(
                "{} skipped {}: {} unresolved external identifier(s) ({}); analyze a narrower package set or make the dependencies available",
                self.config.tool_name,
                unit.file.path,
                names.len(),
                sample
            ),
        )
    }

    /// Comment marker on `line`, or a marker comment on its own line right
    /// above it
    pub fn is_suppressed_at_line(&self, unit: &AnalysisUnit, line: u32) -> bool {
        unit.file.comments.iter().any(|comment| {
            let same_line = comment.span.contains_line(line);
            let line_above = comment.span.end_line + 1 == line && stands_alone(unit, comment);
            (same_line || line_above) && self.markers.matches(&comment.text)
        })
    }

    pub fn is_suppressed(&self, unit: &AnalysisUnit, offset: u32) -> bool {
        location_of(unit, offset)
            .map_or(false, |(line, _)| self.is_suppressed_at_line(unit, line))
    }
}

/// Only whitespace precedes `comment` on its first line
fn stands_alone(unit: &AnalysisUnit, comment: &Comment) -> bool {
    match unit.file.line_text(comment.span.start_line) {
        Some(text) => text
            .get(..comment.span.start_col as usize)
            .map_or(false, |prefix| prefix.trim().is_empty()),
        None => true,
    }
}

fn with_defer_fix(
    diagnostic: Diagnostic,
    unit: &AnalysisUnit,
    stmt: Span,
    statement: &str,
) -> Diagnostic {
    let edit = match Anchor::of(unit, stmt) {
        Anchor::AfterStatement => {
            let indent = indentation(unit, stmt.start_line);
            Some(TextEdit::insert(stmt.end, format!("\n{}{}", indent, statement)))
        }
        Anchor::IfBody {
            open_brace,
            header_line,
            first_line,
        } => if_body_edit(unit, open_brace, header_line, first_line, statement),
        Anchor::Unplaceable => None,
    };
    match edit {
        Some(edit) => diagnostic.with_fix(SuggestedFix {
            message: format!("Add `{}`", statement),
            edits: vec![edit],
        }),
        None => diagnostic,
    }
}

/// Insert right after the `{` of an `if` body, indented like the body
fn if_body_edit(
    unit: &AnalysisUnit,
    open_brace: u32,
    header_line: u32,
    first_line: Option<u32>,
    statement: &str,
) -> Option<TextEdit> {
    let source = unit.file.source.as_bytes();
    if source.get(open_brace as usize) != Some(&b'{') {
        return None;
    }
    let indent = match first_line.filter(|line| *line > header_line) {
        Some(line) => indentation(unit, line),
        None => format!("{}\t", indentation(unit, header_line)),
    };
    Some(TextEdit::insert(open_brace + 1, format!("\n{}{}", indent, statement)))
}

/// Where the `defer` for an acquiring statement can go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    AfterStatement,
    /// The statement initializes an `if` header
    IfBody {
        open_brace: u32,
        header_line: u32,
        first_line: Option<u32>,
    },
    /// The statement initializes a `for` or `switch` header
    Unplaceable,
}

impl Anchor {
    fn of(unit: &AnalysisUnit, stmt: Span) -> Self {
        let mut finder = HeaderInitFinder {
            init: stmt,
            anchor: Anchor::AfterStatement,
        };
        for func in &unit.file.funcs {
            if let Some(body) = &func.body {
                finder.visit_block(body);
            }
        }
        finder.anchor
    }
}

struct HeaderInitFinder {
    init: Span,
    anchor: Anchor,
}

impl HeaderInitFinder {
    fn is_target(&self, init: Option<&Stmt>) -> bool {
        init.map_or(false, |stmt| stmt.span == self.init)
    }
}

impl<'ast> Visitor<'ast> for HeaderInitFinder {
    fn visit_if(
        &mut self,
        stmt: &'ast Stmt,
        init: Option<&'ast Stmt>,
        cond: &'ast Expr,
        then: &'ast Block,
        els: Option<&'ast Stmt>,
    ) {
        if self.is_target(init) {
            self.anchor = Anchor::IfBody {
                open_brace: then.span.start,
                header_line: stmt.span.start_line,
                first_line: then.stmts.first().map(|s| s.span.start_line),
            };
        }
        walk_if(self, init, cond, then, els)
    }

    fn visit_for(
        &mut self,
        _stmt: &'ast Stmt,
        init: Option<&'ast Stmt>,
        cond: Option<&'ast Expr>,
        post: Option<&'ast Stmt>,
        body: &'ast Block,
    ) {
        if self.is_target(init) {
            self.anchor = Anchor::Unplaceable;
        }
        walk_for(self, init, cond, post, body)
    }

    fn visit_switch(
        &mut self,
        _stmt: &'ast Stmt,
        init: Option<&'ast Stmt>,
        tag: Option<&'ast Expr>,
        clauses: &'ast [CaseClause],
    ) {
        if self.is_target(init) {
            self.anchor = Anchor::Unplaceable;
        }
        walk_switch(self, init, tag, clauses)
    }
}

/// Leading whitespace of `line`; a tab when the source is unavailable
fn indentation(unit: &AnalysisUnit, line: u32) -> String {
    match unit.file.line_text(line) {
        Some(text) => text
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect(),
        None => "\t".to_string(),
    }
}

/// 1-indexed line and 0-indexed byte column of an offset, if the source is
/// available
fn location_of(unit: &AnalysisUnit, offset: u32) -> Option<(u32, u32)> {
    let source = unit.file.source.as_bytes();
    if source.is_empty() {
        return None;
    }
    let end = (offset as usize).min(source.len());
    let before = &source[..end];
    let newlines = before.iter().filter(|&&b| b == b'\n').count();
    let line_start = before.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
    Some((newlines as u32 + 1, (end - line_start) as u32))
}
