pub mod site;
pub mod strategy;

pub use site::{CleanupSite, SiteOrigin, SiteTable};
pub use strategy::{
    default_strategies, is_conventional_list, AdvisoryName, ConventionalList, DeferredListRegistration,
    DirectDefer, MatchStrategy, CONVENTIONAL_LISTS,
};
