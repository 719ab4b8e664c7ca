//! Matcher strategies
//!
//! Tried in order for every record; the first strategy that accepts some
//! unclaimed site wins. Position and proximity are the matcher's concern, a
//! strategy only decides whether a site can release a record.

use super::site::{CleanupSite, SiteTable};
use crate::features::resource_tracking::ResourceRecord;

/// Conventional names of cleanup-function lists
pub const CONVENTIONAL_LISTS: &[&str] = &[
    "closers",
    "cleanups",
    "cleanup",
    "cleanupFns",
    "closeFns",
    "closeFuncs",
    "toClose",
    "deferred",
    "finalizers",
    "shutdown",
    "shutdownFns",
];

pub fn is_conventional_list(name: &str) -> bool {
    CONVENTIONAL_LISTS
        .iter()
        .any(|list| list.eq_ignore_ascii_case(name))
}

pub trait MatchStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn accepts(&self, record: &ResourceRecord, site: &CleanupSite, table: &SiteTable) -> bool;
}

/// `defer x.Close()` or `x.Close()` inside a deferred literal
pub struct DirectDefer;

impl MatchStrategy for DirectDefer {
    fn name(&self) -> &'static str {
        "direct-defer"
    }

    fn accepts(&self, record: &ResourceRecord, site: &CleanupSite, _table: &SiteTable) -> bool {
        site.is_deferred() && site.releases(&record.name, &record.cleanup_method)
    }
}

/// `list = append(list, x.Close)` where a `defer` references `list`
pub struct DeferredListRegistration;

impl MatchStrategy for DeferredListRegistration {
    fn name(&self) -> &'static str {
        "deferred-list"
    }

    fn accepts(&self, record: &ResourceRecord, site: &CleanupSite, table: &SiteTable) -> bool {
        site.list().map_or(false, |list| table.is_deferred_list(list))
            && site.releases(&record.name, &record.cleanup_method)
    }
}

/// Method-only match for records whose name is a naming-convention guess.
/// Never used for iterators and readers.
pub struct AdvisoryName;

impl MatchStrategy for AdvisoryName {
    fn name(&self) -> &'static str {
        "advisory-name"
    }

    fn accepts(&self, record: &ResourceRecord, site: &CleanupSite, _table: &SiteTable) -> bool {
        record.is_advisory()
            && !record.kind.is_stream()
            && site.is_deferred()
            && site.method == record.cleanup_method
    }
}

/// `closers = append(closers, x.Close)` with a conventional list name, even
/// when no `defer` mentions the list
pub struct ConventionalList;

impl MatchStrategy for ConventionalList {
    fn name(&self) -> &'static str {
        "conventional-list"
    }

    fn accepts(&self, record: &ResourceRecord, site: &CleanupSite, _table: &SiteTable) -> bool {
        site.list().map_or(false, is_conventional_list)
            && site.releases(&record.name, &record.cleanup_method)
    }
}

pub fn default_strategies() -> Vec<Box<dyn MatchStrategy>> {
    vec![
        Box::new(DirectDefer),
        Box::new(DeferredListRegistration),
        Box::new(AdvisoryName),
        Box::new(ConventionalList),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::cleanup_matching::domain::SiteOrigin;
    use crate::features::resource_tracking::{LexicalScope, NameOrigin, VariableId};
    use crate::features::rule_catalog::ResourceKind;
    use crate::shared::models::Span;

    fn record(name: &str, origin: NameOrigin, kind: ResourceKind) -> ResourceRecord {
        ResourceRecord {
            id: VariableId::Synthetic(0),
            name: name.into(),
            name_origin: origin,
            call_span: Span::new(10, 20, 2, 0, 2, 10),
            stmt_span: Span::new(10, 20, 2, 0, 2, 10),
            service: "storage".into(),
            operation: "NewClient".into(),
            cleanup_method: if kind.is_stream() { "Stop" } else { "Close" }.into(),
            required: true,
            kind,
            scope: LexicalScope {
                func_index: 0,
                func_name: "f".into(),
                body_span: Span::zero(),
                closure_depth: 0,
            },
            annotation: None,
        }
    }

    fn site(receiver: &str, method: &str, origin: SiteOrigin) -> CleanupSite {
        CleanupSite {
            receiver: Some(receiver.into()),
            method: method.into(),
            span: Span::new(30, 40, 3, 0, 3, 10),
            origin,
        }
    }

    #[test]
    fn test_direct_defer_needs_receiver_and_method() {
        let r = record("gcs", NameOrigin::Assignment, ResourceKind::Client);
        let table = SiteTable::default();
        assert!(DirectDefer.accepts(&r, &site("gcs", "Close", SiteOrigin::Deferred), &table));
        assert!(DirectDefer.accepts(&r, &site("gcs", "Close", SiteOrigin::DeferredLiteral), &table));
        assert!(!DirectDefer.accepts(&r, &site("other", "Close", SiteOrigin::Deferred), &table));
        assert!(!DirectDefer.accepts(&r, &site("gcs", "Flush", SiteOrigin::Deferred), &table));
    }

    #[test]
    fn test_list_strategies() {
        let r = record("gcs", NameOrigin::Assignment, ResourceKind::Client);
        let mut table = SiteTable::default();
        let registered = site(
            "gcs",
            "Close",
            SiteOrigin::Registration {
                list: "pending".into(),
            },
        );
        assert!(!DeferredListRegistration.accepts(&r, &registered, &table));
        assert!(!ConventionalList.accepts(&r, &registered, &table));
        table.deferred_refs.insert("pending".into());
        assert!(DeferredListRegistration.accepts(&r, &registered, &table));

        let conventional = site(
            "gcs",
            "Close",
            SiteOrigin::Registration {
                list: "Closers".into(),
            },
        );
        assert!(ConventionalList.accepts(&r, &conventional, &table));
    }

    #[test]
    fn test_advisory_name_skips_streams() {
        let table = SiteTable::default();
        let client = record("client", NameOrigin::Fallback, ResourceKind::Client);
        assert!(AdvisoryName.accepts(&client, &site("c", "Close", SiteOrigin::Deferred), &table));

        let iter = record("iter", NameOrigin::Fallback, ResourceKind::Iterator);
        assert!(!AdvisoryName.accepts(&iter, &site("it", "Stop", SiteOrigin::Deferred), &table));

        let named = record("gcs", NameOrigin::Assignment, ResourceKind::Client);
        assert!(!AdvisoryName.accepts(&named, &site("c", "Close", SiteOrigin::Deferred), &table));
    }

    #[test]
    fn test_default_order() {
        let names: Vec<_> = default_strategies().iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec!["direct-defer", "deferred-list", "advisory-name", "conventional-list"]
        );
    }
}
