/*
 * Cleanup Sites
 *
 * Everything in a function that schedules a release:
 *
 *   defer x.Close()                         Deferred
 *   defer func() { _ = x.Close() }()        DeferredLiteral
 *   closers = append(closers, x.Close)      Registration { list: "closers" }
 *   closers = append(closers, func() { x.Close() })
 */

use crate::shared::models::Span;
use rustc_hash::FxHashSet;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SiteOrigin {
    Deferred,
    DeferredLiteral,
    /// Appended to a list of cleanup functions
    Registration { list: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupSite {
    /// Receiver identifier of `x.Method`; `None` for complex receivers
    pub receiver: Option<String>,
    pub method: String,
    pub span: Span,
    pub origin: SiteOrigin,
}

impl CleanupSite {
    pub fn is_deferred(&self) -> bool {
        matches!(self.origin, SiteOrigin::Deferred | SiteOrigin::DeferredLiteral)
    }

    pub fn list(&self) -> Option<&str> {
        match &self.origin {
            SiteOrigin::Registration { list } => Some(list),
            _ => None,
        }
    }

    pub fn releases(&self, name: &str, method: &str) -> bool {
        self.method == method && self.receiver.as_deref() == Some(name)
    }
}

/// Cleanup sites of one top-level function
#[derive(Debug, Clone, Default)]
pub struct SiteTable {
    pub sites: Vec<CleanupSite>,
    /// Identifiers referenced from `defer` statements
    pub deferred_refs: FxHashSet<String>,
}

impl SiteTable {
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Whether a `defer` statement mentions `list`
    pub fn is_deferred_list(&self, list: &str) -> bool {
        self.deferred_refs.contains(list)
    }
}
