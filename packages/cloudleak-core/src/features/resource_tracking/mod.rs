/*
 * Resource Tracking
 *
 * Classifies call expressions against the rule catalog and records every
 * acquisition site of a cloud-service handle.
 *
 * Architecture:
 * - Domain: ResourceRecord, VariableId, NameOrigin, LexicalScope, Annotation
 * - Application: Classifier (ordered strategies), ResourceTracker
 */

pub mod application;
pub mod domain;

pub use application::{Classification, ClassificationStrategy, Classifier, ResourceTracker};
pub use domain::{Annotation, LexicalScope, NameOrigin, ResourceRecord, VariableId};
