//! Lexical scope stack
//!
//! Tracks nested scopes during tree traversal. Each scope maps a declared name
//! to a payload; lookups walk from the innermost scope outwards.

use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
pub struct ScopeStack<T> {
    scopes: Vec<FxHashMap<String, T>>,
}

impl<T> Default for ScopeStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ScopeStack<T> {
    /// Create a stack holding a single (outermost) scope
    pub fn new() -> Self {
        Self {
            scopes: vec![FxHashMap::default()],
        }
    }

    /// Push a new scope
    pub fn push(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    /// Pop the current scope; the outermost scope is never popped
    pub fn pop(&mut self) -> Option<FxHashMap<String, T>> {
        if self.scopes.len() > 1 {
            self.scopes.pop()
        } else {
            None
        }
    }

    /// Declare `name` in the innermost scope, replacing any previous entry there
    pub fn declare(&mut self, name: impl Into<String>, value: T) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.into(), value);
        }
    }

    /// Overwrite the innermost existing declaration of `name`.
    /// Returns `false` when `name` is not declared in any scope.
    pub fn assign(&mut self, name: &str, value: T) -> bool {
        match self.scopes.iter_mut().rev().find_map(|scope| scope.get_mut(name)) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Innermost declaration of `name`
    pub fn lookup(&self, name: &str) -> Option<&T> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Innermost declaration of `name` together with the depth it was found at
    pub fn lookup_with_depth(&self, name: &str) -> Option<(usize, &T)> {
        self.scopes
            .iter()
            .enumerate()
            .rev()
            .find_map(|(depth, scope)| scope.get(name).map(|v| (depth, v)))
    }

    /// Declaration of `name` in the innermost scope only
    pub fn lookup_current(&self, name: &str) -> Option<&T> {
        self.scopes.last().and_then(|scope| scope.get(name))
    }

    /// Current depth (outermost scope is depth 1)
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.iter().all(|scope| scope.is_empty())
    }

    /// Drop everything but a fresh outermost scope
    pub fn clear(&mut self) {
        self.scopes.clear();
        self.scopes.push(FxHashMap::default());
    }

    /// Execute a closure within a new scope
    pub fn with_scope<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        self.push();
        let result = f(self);
        self.pop();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_prefers_innermost() {
        let mut stack = ScopeStack::new();
        stack.declare("cancel", 1);
        stack.push();
        stack.declare("cancel", 2);
        assert_eq!(stack.lookup("cancel"), Some(&2));
        stack.pop();
        assert_eq!(stack.lookup("cancel"), Some(&1));
    }

    #[test]
    fn test_lookup_with_depth() {
        let mut stack = ScopeStack::new();
        stack.declare("a", ());
        stack.push();
        stack.push();
        assert_eq!(stack.lookup_with_depth("a").map(|(d, _)| d), Some(0));
        assert_eq!(stack.depth(), 3);
    }

    #[test]
    fn test_outermost_scope_survives_pop() {
        let mut stack: ScopeStack<u8> = ScopeStack::new();
        assert!(stack.pop().is_none());
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_assign_updates_declaring_scope() {
        let mut stack = ScopeStack::new();
        stack.declare("cancel", None);
        stack.push();
        assert!(stack.assign("cancel", Some(3)));
        assert!(stack.lookup_current("cancel").is_none());
        stack.pop();
        assert_eq!(stack.lookup("cancel"), Some(&Some(3)));
        assert!(!stack.assign("missing", Some(1)));
    }

    #[test]
    fn test_with_scope() {
        let mut stack = ScopeStack::new();
        stack.declare("outer", 0);

        let inner = stack.with_scope(|s| {
            s.declare("inner", 1);
            s.lookup("outer").copied()
        });

        assert_eq!(inner, Some(0));
        assert!(stack.lookup("inner").is_none());
    }
}
