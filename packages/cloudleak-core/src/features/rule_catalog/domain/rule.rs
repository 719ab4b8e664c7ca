/*
 * Service Rules
 *
 * One entry per cloud-service family: which operations hand out a handle and
 * which method releases it.
 *
 * Invariant: every required cleanup method has a non-empty name (enforced by
 * catalog validation).
 */

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Shape of the handle an acquisition produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Client,
    Transaction,
    Iterator,
    Reader,
    Writer,
}

impl ResourceKind {
    /// Conventional variable name used when no real name can be resolved
    pub fn fallback_name(&self) -> &'static str {
        match self {
            ResourceKind::Client => "client",
            ResourceKind::Transaction => "tx",
            ResourceKind::Iterator => "iter",
            ResourceKind::Reader => "reader",
            ResourceKind::Writer => "writer",
        }
    }

    /// Iterators and readers must be bounded locally even when returned
    pub fn is_stream(&self) -> bool {
        matches!(self, ResourceKind::Iterator | ResourceKind::Reader)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Client => "client",
            ResourceKind::Transaction => "transaction",
            ResourceKind::Iterator => "iterator",
            ResourceKind::Reader => "reader",
            ResourceKind::Writer => "writer",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Closed set of framework-managed transaction styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ManagedTransactionKind {
    ReadWrite,
    ReadOnly,
    Run,
}

impl ManagedTransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ManagedTransactionKind::ReadWrite => "read-write",
            ManagedTransactionKind::ReadOnly => "read-only",
            ManagedTransactionKind::Run => "run",
        }
    }
}

impl std::fmt::Display for ManagedTransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupMethod {
    pub method: String,
    pub required: bool,
    #[serde(default)]
    pub description: String,
}

/// Operation whose callback receives a handle the framework releases itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedTransaction {
    pub operation: String,
    pub kind: ManagedTransactionKind,
    /// Index of the handle parameter in the callback literal
    #[serde(default = "default_callback_param")]
    pub callback_param: usize,
    /// Type name (without package qualifier) of a receiver allowed to open it
    #[serde(default)]
    pub client_type: Option<String>,
}

fn default_callback_param() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRule {
    pub name: String,
    pub origin_path: String,
    pub acquisition_operations: Vec<String>,
    pub cleanup_methods: Vec<CleanupMethod>,
    pub operation_cleanup: FxHashMap<String, String>,
    pub operation_kinds: FxHashMap<String, ResourceKind>,
    pub managed_transactions: Vec<ManagedTransaction>,
}

impl ServiceRule {
    pub fn new(name: impl Into<String>, origin_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            origin_path: origin_path.into(),
            acquisition_operations: Vec::new(),
            cleanup_methods: Vec::new(),
            operation_cleanup: FxHashMap::default(),
            operation_kinds: FxHashMap::default(),
            managed_transactions: Vec::new(),
        }
    }

    pub fn with_operations(mut self, ops: &[&str]) -> Self {
        self.acquisition_operations
            .extend(ops.iter().map(|s| s.to_string()));
        self
    }

    pub fn with_cleanup(mut self, method: &str, required: bool, description: &str) -> Self {
        self.cleanup_methods.push(CleanupMethod {
            method: method.to_string(),
            required,
            description: description.to_string(),
        });
        self
    }

    pub fn with_operation_cleanup(mut self, op: &str, method: &str) -> Self {
        self.operation_cleanup
            .insert(op.to_string(), method.to_string());
        self
    }

    pub fn with_managed_transaction(
        mut self,
        op: &str,
        kind: ManagedTransactionKind,
        callback_param: usize,
        client_type: Option<&str>,
    ) -> Self {
        self.managed_transactions.push(ManagedTransaction {
            operation: op.to_string(),
            kind,
            callback_param,
            client_type: client_type.map(str::to_string),
        });
        self
    }

    /// Whether `op` hands out a handle of this service
    pub fn is_acquisition(&self, op: &str) -> bool {
        self.acquisition_operations.iter().any(|o| o == op)
            || self.managed_transaction(op).is_some()
    }

    pub fn managed_transaction(&self, op: &str) -> Option<&ManagedTransaction> {
        self.managed_transactions.iter().find(|m| m.operation == op)
    }

    pub fn supports_auto_management(&self) -> bool {
        !self.managed_transactions.is_empty()
    }

    pub fn first_required_cleanup(&self) -> Option<&CleanupMethod> {
        self.cleanup_methods.iter().find(|c| c.required)
    }

    pub fn overrides_cleanup(&self, op: &str) -> bool {
        self.operation_cleanup.contains_key(op)
    }

    /// Cleanup expected after `op`: per-operation override, else the first
    /// required method. Returns the method and its required flag.
    pub fn cleanup_for_operation(&self, op: &str) -> Option<(&str, bool)> {
        if let Some(method) = self.operation_cleanup.get(op) {
            let required = self
                .cleanup_methods
                .iter()
                .find(|c| &c.method == method)
                .map_or(true, |c| c.required);
            return Some((method.as_str(), required));
        }
        self.first_required_cleanup()
            .map(|c| (c.method.as_str(), c.required))
    }

    /// Resource kind produced by `op`.
    ///
    /// Explicit override, else derived from the operation and cleanup names.
    pub fn kind_for_operation(&self, op: &str) -> ResourceKind {
        if let Some(kind) = self.operation_kinds.get(op) {
            return *kind;
        }
        if op.contains("Transaction") || self.managed_transaction(op).is_some() {
            return ResourceKind::Transaction;
        }
        if op.contains("Reader") {
            return ResourceKind::Reader;
        }
        if op.contains("Writer") {
            return ResourceKind::Writer;
        }
        match self.cleanup_for_operation(op) {
            Some(("Stop", _)) => ResourceKind::Iterator,
            _ => ResourceKind::Client,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spanner() -> ServiceRule {
        ServiceRule::new("spanner", "cloud.google.com/go/spanner")
            .with_operations(&["NewClient", "ReadOnlyTransaction", "Query"])
            .with_cleanup("Close", true, "release sessions")
            .with_cleanup("Stop", false, "stop iteration")
            .with_operation_cleanup("Query", "Stop")
            .with_managed_transaction(
                "ReadWriteTransaction",
                ManagedTransactionKind::ReadWrite,
                1,
                Some("Client"),
            )
    }

    #[test]
    fn test_cleanup_for_operation_prefers_override() {
        let rule = spanner();
        assert_eq!(rule.cleanup_for_operation("NewClient"), Some(("Close", true)));
        assert_eq!(rule.cleanup_for_operation("Query"), Some(("Stop", false)));
    }

    #[test]
    fn test_kind_derivation() {
        let rule = spanner();
        assert_eq!(rule.kind_for_operation("NewClient"), ResourceKind::Client);
        assert_eq!(rule.kind_for_operation("ReadOnlyTransaction"), ResourceKind::Transaction);
        assert_eq!(rule.kind_for_operation("Query"), ResourceKind::Iterator);
        assert_eq!(rule.kind_for_operation("ReadWriteTransaction"), ResourceKind::Transaction);
    }

    #[test]
    fn test_managed_transaction_counts_as_acquisition() {
        let rule = spanner();
        assert!(rule.is_acquisition("ReadWriteTransaction"));
        assert!(rule.supports_auto_management());
        assert!(!rule.is_acquisition("Apply"));
    }

    #[test]
    fn test_stream_kinds() {
        assert!(ResourceKind::Iterator.is_stream());
        assert!(ResourceKind::Reader.is_stream());
        assert!(!ResourceKind::Writer.is_stream());
        assert_eq!(ResourceKind::Transaction.fallback_name(), "tx");
    }
}
