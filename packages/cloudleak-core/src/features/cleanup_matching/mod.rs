/*
 * Cleanup Matching
 *
 * Pairs acquisitions with the `defer` statements and cleanup-list
 * registrations that release them.
 *
 * Architecture:
 * - Domain: CleanupSite, SiteTable, MatchStrategy and its implementations
 * - Application: site collection, CleanupMatcher
 */

pub mod application;
pub mod domain;

pub use application::{collect_sites, CleanupMatcher};
pub use domain::{CleanupSite, MatchStrategy, SiteOrigin, SiteTable};
