pub mod collector;
pub mod matcher;

pub use collector::collect_sites;
pub use matcher::CleanupMatcher;
