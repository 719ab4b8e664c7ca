//! Common test utilities for cloudleak-core
//!
//! Go source fixtures, engine builders and diagnostic assertions shared by
//! the integration tests.

#![allow(dead_code)]

mod assertions;
mod fixtures;

pub use assertions::*;
pub use fixtures::*;
