pub mod suppression;

pub use suppression::SuppressionMarkers;
