pub mod classify;
pub mod tracker;

pub use classify::{import_table, Classification, ClassificationStrategy, Classifier};
pub use tracker::ResourceTracker;
