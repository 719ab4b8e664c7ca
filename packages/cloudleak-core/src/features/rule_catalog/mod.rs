/*
 * Rule Catalog
 *
 * Which operations acquire cloud-service handles, which methods release them,
 * and which paths are exempt from analysis.
 *
 * Architecture:
 * - Domain: ServiceRule, PathExemption, ResourceKind, ManagedTransactionKind
 * - Application: RuleCatalog (lookups, exemptions), CleanupCache
 * - Infrastructure: built-in catalog, YAML/JSON documents, glob compilation
 */

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{type_qualifier, CatalogSource, CleanupCache, RuleCatalog};
pub use domain::{
    CleanupMethod, ConditionKind, ExemptionCondition, ManagedTransaction, ManagedTransactionKind,
    PathExemption, ResourceKind, ServiceRule,
};
pub use infrastructure::CatalogDocument;
