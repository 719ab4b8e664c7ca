/*
 * Context Cancellation
 *
 * Tracks `context.With*` / `signal.NotifyContext` handles and whether their
 * cancel function is ever called, following nested scopes and closures.
 *
 * Architecture:
 * - Domain: CancelHandleRecord, CancellationObservation, ObservationKind
 * - Application: ContextCancellationTracker
 */

pub mod application;
pub mod domain;

pub use application::ContextCancellationTracker;
pub use domain::{CancelHandleRecord, CancellationObservation, ObservationKind};
