pub mod tracker;

pub use tracker::ContextCancellationTracker;
