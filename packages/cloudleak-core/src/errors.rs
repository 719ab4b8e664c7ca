//! Error types for cloudleak-core
//!
//! Provides unified error handling across the crate.

use crate::config::error::{ConfigError, ValidationError};
use thiserror::Error;

/// Main error type for cloudleak operations
#[derive(Debug, Error)]
pub enum CloudleakError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Front-end parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Rule catalog rejected during validation
    #[error("Rule catalog validation failed: {0}")]
    Validation(#[from] ValidationError),
}

impl CloudleakError {
    /// Create a parse error
    pub fn parse_error(msg: impl Into<String>) -> Self {
        CloudleakError::Parse(msg.into())
    }
}

/// Result type alias for cloudleak operations
pub type Result<T> = std::result::Result<T, CloudleakError>;
