/*
 * Cancellable-context handles
 *
 * `ctx, cancel := context.WithTimeout(parent, d)` creates one record keyed by
 * the cancel variable. Every call believed to invoke that variable adds an
 * observation; the record is satisfied once any observation is valid.
 */

use crate::shared::models::{ObjectId, Span};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObservationKind {
    /// `defer cancel()` or a call inside a deferred function literal
    Deferred,
    /// Any other call of the cancel function
    Direct,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationObservation {
    pub name: String,
    pub span: Span,
    /// Scope depth at the call
    pub depth: usize,
    pub is_valid: bool,
    pub kind: ObservationKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelHandleRecord {
    pub context_name: String,
    pub cancel_name: String,
    pub cancel_id: Option<ObjectId>,
    /// Qualified constructor, e.g. `context.WithCancel`
    pub constructor: String,
    pub call_span: Span,
    pub stmt_span: Span,
    pub func_name: String,
    pub observations: Vec<CancellationObservation>,
}

impl CancelHandleRecord {
    pub fn is_satisfied(&self) -> bool {
        self.observations.iter().any(|o| o.is_valid)
    }

    /// Cancel function discarded with `_`
    pub fn is_discarded(&self) -> bool {
        self.cancel_name == "_"
    }

    pub fn observe(&mut self, observation: CancellationObservation) {
        self.observations.push(observation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CancelHandleRecord {
        CancelHandleRecord {
            context_name: "ctx".into(),
            cancel_name: "cancel".into(),
            cancel_id: None,
            constructor: "context.WithCancel".into(),
            call_span: Span::new(20, 45, 3, 18, 3, 43),
            stmt_span: Span::new(4, 45, 3, 4, 3, 43),
            func_name: "run".into(),
            observations: Vec::new(),
        }
    }

    fn observation(is_valid: bool) -> CancellationObservation {
        CancellationObservation {
            name: "cancel".into(),
            span: Span::new(60, 68, 4, 10, 4, 18),
            depth: 2,
            is_valid,
            kind: ObservationKind::Deferred,
        }
    }

    #[test]
    fn test_satisfied_needs_a_valid_observation() {
        let mut handle = record();
        assert!(!handle.is_satisfied());
        handle.observe(observation(false));
        assert!(!handle.is_satisfied());
        handle.observe(observation(true));
        assert!(handle.is_satisfied());
    }
}
