//! Configuration error types
//!
//! `ConfigError` covers documents that cannot be read or parsed; callers
//! recover from it by falling back to the built-in catalog. `ValidationError`
//! covers documents that parse but describe an invalid catalog; callers must
//! handle it explicitly.

use thiserror::Error;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// File extension not understood
    #[error("Unsupported configuration format '{0}'. Use .yaml, .yml or .json")]
    UnsupportedFormat(String),
}

/// Rule catalog validation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("catalog declares no services")]
    NoServices,

    #[error("service #{index} has an empty name")]
    EmptyServiceName { index: usize },

    #[error("service '{0}' is declared more than once")]
    DuplicateService(String),

    #[error("service '{0}' declares no acquisition operations")]
    NoAcquisitionOperations(String),

    #[error("service '{0}' has an empty acquisition operation name")]
    EmptyAcquisitionOperation(String),

    #[error("service '{0}' declares no cleanup methods")]
    NoCleanupMethods(String),

    #[error("service '{0}' has a required cleanup method with an empty name")]
    EmptyCleanupMethod(String),

    #[error("service '{service}' maps unknown operation '{operation}'")]
    UnknownOperation { service: String, operation: String },

    #[error("service '{service}' maps operation '{operation}' to undeclared cleanup method '{method}'")]
    UnknownCleanupMethod {
        service: String,
        operation: String,
        method: String,
    },

    #[error("exemption #{index} has an empty name")]
    EmptyExemptionName { index: usize },

    #[error("exemption '{0}' has an empty pattern")]
    EmptyPattern(String),

    #[error("exemption '{name}' references unknown condition kind '{kind}'. Valid kinds: short-lived-program, serverless-handler, test-file")]
    UnknownConditionKind { name: String, kind: String },

    #[error("exemption '{name}' has an invalid pattern: {reason}")]
    InvalidPattern { name: String, reason: String },
}

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages_name_the_offender() {
        let err = ValidationError::UnknownConditionKind {
            name: "lambdas".into(),
            kind: "lambda".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("lambdas"));
        assert!(msg.contains("'lambda'"));
    }

    #[test]
    fn test_yaml_error_converts() {
        let yaml_err = serde_yaml::from_str::<Vec<u32>>("{not: [a list").unwrap_err();
        let err: ConfigError = yaml_err.into();
        assert!(err.to_string().starts_with("YAML parsing error"));
    }
}
