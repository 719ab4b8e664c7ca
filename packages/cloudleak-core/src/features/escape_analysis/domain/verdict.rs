//! Escape and auto-management verdicts

use crate::features::rule_catalog::ManagedTransactionKind;
use serde::{Deserialize, Serialize};

/// Whether a handle leaves the function that acquired it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscapeVerdict {
    pub is_returned: bool,
    pub is_field_assigned: bool,
    pub reason: String,
}

impl EscapeVerdict {
    pub fn escapes(&self) -> bool {
        self.is_returned || self.is_field_assigned
    }
}

/// Handle released by a framework callback rather than by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoManagementVerdict {
    pub is_auto_managed: bool,
    pub kind: ManagedTransactionKind,
    /// The handle is a parameter of the callback literal itself
    pub is_closure_managed: bool,
    pub reason: String,
}
