pub mod exemption;
pub mod rule;

pub use exemption::{ConditionKind, ExemptionCondition, PathExemption};
pub use rule::{CleanupMethod, ManagedTransaction, ManagedTransactionKind, ResourceKind, ServiceRule};
