/*
 * Rule Catalog
 *
 * Service rules and path exemptions, loaded once per process and shared by
 * `Arc` between concurrently analyzed units.
 *
 * Loading:
 * - no path: built-in catalog
 * - unreadable / unknown format / syntax error: warn, built-in catalog
 * - parsed but invalid: `ValidationError` returned to the caller
 */

use super::cache::CleanupCache;
use crate::config::error::ValidationError;
use crate::features::rule_catalog::domain::{PathExemption, ServiceRule};
use crate::features::rule_catalog::infrastructure::built_in::{built_in_exemptions, built_in_rules};
use crate::features::rule_catalog::infrastructure::document::{CatalogDocument, CatalogParts};
use rustc_hash::FxHashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Where the active rules came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    BuiltIn,
    /// In-memory document
    Inline,
    File(String),
    /// Configured file could not be read or parsed
    Fallback(String),
}

#[derive(Debug)]
pub struct RuleCatalog {
    rules: Vec<ServiceRule>,
    by_name: FxHashMap<String, usize>,
    exemptions: Vec<PathExemption>,
    cleanup_cache: CleanupCache,
    source: CatalogSource,
}

impl RuleCatalog {
    fn assemble(rules: Vec<ServiceRule>, exemptions: Vec<PathExemption>, source: CatalogSource) -> Self {
        let by_name = rules
            .iter()
            .enumerate()
            .map(|(i, r)| (r.name.clone(), i))
            .collect();
        Self {
            rules,
            by_name,
            exemptions,
            cleanup_cache: CleanupCache::new(),
            source,
        }
    }

    pub fn built_in() -> Self {
        Self::assemble(built_in_rules(), built_in_exemptions(), CatalogSource::BuiltIn)
    }

    pub fn from_parts(parts: CatalogParts, source: CatalogSource) -> Self {
        Self::assemble(parts.rules, parts.exemptions, source)
    }

    /// Validate an in-memory document
    pub fn from_document(document: CatalogDocument) -> Result<Self, ValidationError> {
        Ok(Self::from_parts(document.validate()?, CatalogSource::Inline))
    }

    /// Load the catalog at `path`, falling back to the built-in catalog when
    /// the file cannot be read or parsed
    pub fn load(path: Option<&str>) -> Result<Self, ValidationError> {
        let Some(path) = path.map(str::trim).filter(|p| !p.is_empty()) else {
            debug!("no rule catalog configured, using built-in catalog");
            return Ok(Self::built_in());
        };

        match CatalogDocument::from_path(Path::new(path)) {
            Ok(document) => {
                let parts = document.validate()?;
                info!(
                    path,
                    services = parts.rules.len(),
                    exemptions = parts.exemptions.len(),
                    "loaded rule catalog"
                );
                Ok(Self::from_parts(parts, CatalogSource::File(path.to_string())))
            }
            Err(error) => {
                warn!(path, %error, "rule catalog unusable, falling back to built-in catalog");
                Ok(Self::assemble(
                    built_in_rules(),
                    built_in_exemptions(),
                    CatalogSource::Fallback(path.to_string()),
                ))
            }
        }
    }

    pub fn source(&self) -> &CatalogSource {
        &self.source
    }

    pub fn rules(&self) -> &[ServiceRule] {
        &self.rules
    }

    pub fn exemptions(&self) -> &[PathExemption] {
        &self.exemptions
    }

    pub fn cleanup_cache(&self) -> &CleanupCache {
        &self.cleanup_cache
    }

    pub fn rule_for(&self, service: &str) -> Option<&ServiceRule> {
        self.by_name.get(service).map(|&i| &self.rules[i])
    }

    /// Rule whose origin package is `import_path` or one of its ancestors.
    /// The longest origin wins.
    pub fn rule_for_package(&self, import_path: &str) -> Option<&ServiceRule> {
        self.rules
            .iter()
            .filter(|r| !r.origin_path.is_empty())
            .filter(|r| {
                import_path == r.origin_path
                    || import_path
                        .strip_prefix(r.origin_path.as_str())
                        .map_or(false, |rest| rest.starts_with('/'))
            })
            .max_by_key(|r| r.origin_path.len())
    }

    /// Rule for a textual type such as `*spanner.Client` or `[]storage.Writer`
    pub fn rule_for_type(&self, type_name: &str) -> Option<&ServiceRule> {
        let qualifier = type_qualifier(type_name)?;
        self.rule_for(qualifier)
    }

    /// First required cleanup method of the service owning `type_name`
    pub fn cleanup_method_for(&self, type_name: &str) -> Option<String> {
        if let Some(cached) = self.cleanup_cache.get(type_name) {
            return cached;
        }
        let method = self
            .rule_for_type(type_name)
            .and_then(ServiceRule::first_required_cleanup)
            .map(|c| c.method.clone());
        self.cleanup_cache.put(type_name, method.clone());
        method
    }

    /// Reason for skipping `path`, if an enabled exemption covers it
    pub fn is_exempt(&self, path: &str) -> Option<String> {
        self.exemptions
            .iter()
            .find(|e| e.applies_to(path))
            .map(PathExemption::reason)
    }
}

/// Package qualifier of a textual type: `*spanner.Client` → `spanner`
pub fn type_qualifier(type_name: &str) -> Option<&str> {
    let bare = type_name.trim_start_matches(['*', '&', '[', ']', ' ']);
    let (qualifier, _) = bare.split_once('.')?;
    if qualifier.is_empty() {
        None
    } else {
        Some(qualifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn temp_file(suffix: &str) -> NamedTempFile {
        Builder::new().suffix(suffix).tempfile().unwrap()
    }

    #[test]
    fn test_empty_path_uses_built_in() {
        let catalog = RuleCatalog::load(None).unwrap();
        assert_eq!(catalog.source(), &CatalogSource::BuiltIn);
        let catalog = RuleCatalog::load(Some("  ")).unwrap();
        assert_eq!(catalog.source(), &CatalogSource::BuiltIn);
        assert!(catalog.rule_for("spanner").is_some());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let catalog = RuleCatalog::load(Some("/nonexistent/cloudleak.yaml")).unwrap();
        assert!(matches!(catalog.source(), CatalogSource::Fallback(_)));
        assert_eq!(catalog.rules().len(), built_in_rules().len());
    }

    #[test]
    fn test_malformed_yaml_falls_back() {
        let mut file = temp_file(".yaml");
        writeln!(file, "services: [{{name: storage").unwrap();
        let path = file.path().to_str().unwrap();
        let catalog = RuleCatalog::load(Some(path)).unwrap();
        assert_eq!(catalog.source(), &CatalogSource::Fallback(path.to_string()));
    }

    #[test]
    fn test_invalid_document_is_a_validation_error() {
        let mut file = temp_file(".json");
        writeln!(file, r#"{{"services": []}}"#).unwrap();
        let err = RuleCatalog::load(Some(file.path().to_str().unwrap())).unwrap_err();
        assert_eq!(err, ValidationError::NoServices);
    }

    #[test]
    fn test_rule_for_package() {
        let catalog = RuleCatalog::built_in();
        assert_eq!(
            catalog.rule_for_package("cloud.google.com/go/storage").map(|r| r.name.as_str()),
            Some("storage")
        );
        assert_eq!(
            catalog
                .rule_for_package("cloud.google.com/go/secretmanager/apiv1")
                .map(|r| r.name.as_str()),
            Some("secretmanager")
        );
        assert!(catalog.rule_for_package("cloud.google.com/go/storagex").is_none());
        assert!(catalog.rule_for_package("net/http").is_none());
    }

    #[test]
    fn test_cleanup_method_for_type_is_cached() {
        let catalog = RuleCatalog::built_in();
        assert_eq!(catalog.cleanup_method_for("*spanner.Client"), Some("Close".to_string()));
        assert_eq!(catalog.cleanup_method_for("*spanner.Client"), Some("Close".to_string()));
        assert_eq!(catalog.cleanup_method_for("*http.Client"), None);
        assert_eq!(catalog.cleanup_method_for("Client"), None);
    }

    #[test]
    fn test_is_exempt() {
        let catalog = RuleCatalog::built_in();
        assert!(catalog.is_exempt("services/api/cmd/server/main.go").is_some());
        assert!(catalog.is_exempt("services/functions/handler.go").is_some());
        assert!(catalog.is_exempt("internal/store/store_test.go").is_none());
        assert!(catalog.is_exempt("internal/store/store.go").is_none());
    }

    #[test]
    fn test_type_qualifier() {
        assert_eq!(type_qualifier("*spanner.Client"), Some("spanner"));
        assert_eq!(type_qualifier("[]*storage.Writer"), Some("storage"));
        assert_eq!(type_qualifier("Client"), None);
    }
}
