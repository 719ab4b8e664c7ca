pub mod verdict;

pub use crate::features::rule_catalog::ManagedTransactionKind;
pub use verdict::{AutoManagementVerdict, EscapeVerdict};
