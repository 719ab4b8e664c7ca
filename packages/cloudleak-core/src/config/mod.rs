//! Engine configuration
//!
//! `EngineConfig` is built once per process and shared by `Arc` with every
//! component. The rule catalog itself is a separate document referenced by
//! `catalog_path`; see `features::rule_catalog`.
//!
//! ```rust,ignore
//! use cloudleak_core::config::EngineConfig;
//!
//! let config = EngineConfig::default()
//!     .with_catalog_path("rules/cloudleak.yaml")
//!     .with_suppression_marker("//cloudleak-ok");
//! ```

pub mod error;

pub use error::{ConfigError, ConfigResult, ValidationError};

use serde::{Deserialize, Serialize};

/// Default tool name used in suppression markers
pub const DEFAULT_TOOL_NAME: &str = "cloudleak";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Name matched by `//nolint:<name>`, `//lint:ignore <name>`, `//<name>:ignore`
    pub tool_name: String,

    /// Rule catalog document; `None` uses the built-in catalog
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<String>,

    /// Run the cancellable-context tracker
    pub check_contexts: bool,

    /// Additional literal markers that suppress a finding when present in a comment
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_suppression_markers: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tool_name: DEFAULT_TOOL_NAME.to_string(),
            catalog_path: None,
            check_contexts: true,
            extra_suppression_markers: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool_name(mut self, name: impl Into<String>) -> Self {
        self.tool_name = name.into();
        self
    }

    pub fn with_catalog_path(mut self, path: impl Into<String>) -> Self {
        self.catalog_path = Some(path.into());
        self
    }

    pub fn check_contexts(mut self, enabled: bool) -> Self {
        self.check_contexts = enabled;
        self
    }

    pub fn with_suppression_marker(mut self, marker: impl Into<String>) -> Self {
        self.extra_suppression_markers.push(marker.into());
        self
    }

    /// Load from a YAML file
    pub fn from_yaml(path: &str) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let config: EngineConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
