pub mod handle;

pub use handle::{CancelHandleRecord, CancellationObservation, ObservationKind};
