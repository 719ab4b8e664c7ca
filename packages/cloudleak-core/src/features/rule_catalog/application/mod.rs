pub mod cache;
pub mod catalog;

pub use cache::CleanupCache;
pub use catalog::{type_qualifier, CatalogSource, RuleCatalog};
