//! Symbol / type binding table
//!
//! What the host's type-resolution service knows about a unit. Every lookup
//! returns an `Option`: partial tables are the normal case and callers fall back
//! to heuristics when an entry is missing.

use super::span::SpanKey;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Identity of a declared object (variable, parameter, field)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

/// Statically resolved target of a call expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Callee {
    /// Import path of the package declaring the function or the receiver type
    pub package_path: String,
    /// Receiver type for method calls (e.g. `*spanner.Client`)
    pub receiver_type: Option<String>,
    pub name: String,
}

/// External identifier the host could not resolve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedReference {
    pub name: String,
    pub offset: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeBindings {
    expr_types: FxHashMap<SpanKey, String>,
    objects: FxHashMap<SpanKey, ObjectId>,
    callees: FxHashMap<SpanKey, Callee>,
    unresolved: Vec<UnresolvedReference>,
}

impl TypeBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table with no information at all
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn type_of(&self, key: SpanKey) -> Option<&str> {
        self.expr_types.get(&key).map(String::as_str)
    }

    pub fn object_of(&self, key: SpanKey) -> Option<ObjectId> {
        self.objects.get(&key).copied()
    }

    pub fn callee_of(&self, key: SpanKey) -> Option<&Callee> {
        self.callees.get(&key)
    }

    pub fn unresolved(&self) -> &[UnresolvedReference] {
        &self.unresolved
    }

    pub fn has_unresolved(&self) -> bool {
        !self.unresolved.is_empty()
    }

    pub fn record_type(&mut self, key: SpanKey, type_text: impl Into<String>) {
        self.expr_types.insert(key, type_text.into());
    }

    pub fn record_object(&mut self, key: SpanKey, object: ObjectId) {
        self.objects.insert(key, object);
    }

    pub fn record_callee(&mut self, key: SpanKey, callee: Callee) {
        self.callees.insert(key, callee);
    }

    pub fn record_unresolved(&mut self, name: impl Into<String>, offset: u32) {
        self.unresolved.push(UnresolvedReference {
            name: name.into(),
            offset,
        });
    }

    pub fn len(&self) -> usize {
        self.expr_types.len() + self.objects.len() + self.callees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_entries_are_none() {
        let bindings = TypeBindings::empty();
        assert!(bindings.type_of(SpanKey(0, 1)).is_none());
        assert!(bindings.object_of(SpanKey(0, 1)).is_none());
        assert!(bindings.callee_of(SpanKey(0, 1)).is_none());
        assert!(!bindings.has_unresolved());
    }

    #[test]
    fn test_record_and_lookup() {
        let mut bindings = TypeBindings::new();
        bindings.record_type(SpanKey(3, 9), "*storage.Client");
        bindings.record_object(SpanKey(3, 9), ObjectId(7));
        bindings.record_unresolved("missingpkg", 42);

        assert_eq!(bindings.type_of(SpanKey(3, 9)), Some("*storage.Client"));
        assert_eq!(bindings.object_of(SpanKey(3, 9)), Some(ObjectId(7)));
        assert_eq!(bindings.unresolved()[0].name, "missingpkg");
    }
}
