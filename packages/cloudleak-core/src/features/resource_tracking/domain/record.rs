/*
 * Resource Records
 *
 * One record per acquisition site. Records live for a single unit analysis
 * and are owned by the tracker run that created them.
 */

use crate::features::rule_catalog::{ManagedTransactionKind, ResourceKind};
use crate::shared::models::{ObjectId, Span};
use serde::{Deserialize, Serialize};

/// Identity of the variable holding the handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableId {
    /// Resolved through the binding table
    Object(ObjectId),

    /// Placeholder when the binding table has no entry
    Synthetic(u32),
}

/// How the variable name was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NameOrigin {
    /// Left-hand side of the acquiring assignment
    Assignment,

    /// Parameter of the callback literal passed to a managed transaction
    CallbackParam,

    /// Per-kind convention name; advisory only
    Fallback,
}

/// Where the acquisition sits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexicalScope {
    /// Index of the top-level function in the unit
    pub func_index: usize,
    pub func_name: String,
    /// Body of the innermost enclosing function (declaration or literal)
    pub body_span: Span,
    /// Number of function literals between the top-level function and the site
    pub closure_depth: u32,
}

/// Why a record needs no local cleanup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Annotation {
    Escaped {
        reason: String,
    },
    AutoManaged {
        kind: ManagedTransactionKind,
        closure_managed: bool,
        reason: String,
    },
}

impl Annotation {
    pub fn reason(&self) -> &str {
        match self {
            Annotation::Escaped { reason } | Annotation::AutoManaged { reason, .. } => reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub id: VariableId,
    pub name: String,
    pub name_origin: NameOrigin,
    /// Span of the acquiring call
    pub call_span: Span,
    /// Span of the enclosing assignment / declaration / expression statement
    pub stmt_span: Span,
    pub service: String,
    pub operation: String,
    pub cleanup_method: String,
    pub required: bool,
    pub kind: ResourceKind,
    pub scope: LexicalScope,
    pub annotation: Option<Annotation>,
}

impl ResourceRecord {
    /// Name came from a convention, not from the source
    pub fn is_advisory(&self) -> bool {
        self.name_origin == NameOrigin::Fallback
    }

    /// Handle discarded with `_`
    pub fn is_discarded(&self) -> bool {
        self.name == "_"
    }

    pub fn line(&self) -> u32 {
        self.call_span.start_line
    }

    pub fn annotate(&mut self, annotation: Annotation) {
        self.annotation = Some(annotation);
    }

    pub fn needs_cleanup(&self) -> bool {
        self.required && self.annotation.is_none()
    }
}
