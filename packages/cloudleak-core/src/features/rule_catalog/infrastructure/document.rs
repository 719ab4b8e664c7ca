/*
 * Catalog Document
 *
 * YAML/JSON schema of a rule catalog file.
 *
 * # Schema
 * ```yaml
 * services:
 *   - name: spanner
 *     originPath: cloud.google.com/go/spanner
 *     acquisitionOperations: [NewClient, Query]
 *     cleanupMethods:
 *       - method: Close
 *         required: true
 *         description: returns sessions to the pool
 *     operationCleanup:
 *       Query: Stop
 *     operationKinds:
 *       Query: iterator
 *     managedTransactions:
 *       - operation: ReadWriteTransaction
 *         kind: read-write
 *         callbackParam: 1
 *         clientType: Client
 * pathExemptions:
 *   - name: tests
 *     pattern: "*_test.go"
 *     condition:
 *       kind: test-file
 *       description: test helpers
 *       enabled: false
 * ```
 *
 * Parsing failures are `ConfigError`s; a document that parses but describes
 * an invalid catalog is a `ValidationError`.
 */

use super::glob::compile_glob;
use crate::config::error::{ConfigError, ConfigResult, ValidationError};
use crate::features::rule_catalog::domain::{
    CleanupMethod, ConditionKind, ExemptionCondition, ManagedTransaction, PathExemption,
    ResourceKind, ServiceRule,
};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDocument {
    #[serde(default)]
    pub services: Vec<ServiceDocument>,

    #[serde(default)]
    pub path_exemptions: Vec<ExemptionDocument>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDocument {
    pub name: String,

    #[serde(default)]
    pub origin_path: String,

    #[serde(default)]
    pub acquisition_operations: Vec<String>,

    #[serde(default)]
    pub cleanup_methods: Vec<CleanupMethod>,

    #[serde(default, skip_serializing_if = "FxHashMap::is_empty")]
    pub operation_cleanup: FxHashMap<String, String>,

    #[serde(default, skip_serializing_if = "FxHashMap::is_empty")]
    pub operation_kinds: FxHashMap<String, ResourceKind>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub managed_transactions: Vec<ManagedTransaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExemptionDocument {
    pub name: String,
    pub pattern: String,
    pub condition: ConditionDocument,
}

/// Kind stays a string so unknown kinds surface as validation errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionDocument {
    pub kind: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Validated catalog contents
#[derive(Debug, Clone)]
pub struct CatalogParts {
    pub rules: Vec<ServiceRule>,
    pub exemptions: Vec<PathExemption>,
}

impl CatalogDocument {
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Read a document, choosing the format by extension (YAML when absent)
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match format.as_deref() {
            None | Some("yaml") | Some("yml") => {
                let content = std::fs::read_to_string(path)?;
                Self::from_yaml_str(&content)
            }
            Some("json") => {
                let content = std::fs::read_to_string(path)?;
                Self::from_json_str(&content)
            }
            Some(other) => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Validate and convert into domain rules and compiled exemptions
    pub fn validate(self) -> Result<CatalogParts, ValidationError> {
        if self.services.is_empty() {
            return Err(ValidationError::NoServices);
        }

        let mut seen = FxHashSet::default();
        let mut rules = Vec::with_capacity(self.services.len());
        for (index, service) in self.services.into_iter().enumerate() {
            if service.name.trim().is_empty() {
                return Err(ValidationError::EmptyServiceName { index });
            }
            if !seen.insert(service.name.clone()) {
                return Err(ValidationError::DuplicateService(service.name));
            }
            rules.push(validate_service(service)?);
        }

        let mut exemptions = Vec::with_capacity(self.path_exemptions.len());
        for (index, exemption) in self.path_exemptions.into_iter().enumerate() {
            exemptions.push(validate_exemption(index, exemption)?);
        }

        Ok(CatalogParts { rules, exemptions })
    }
}

fn validate_service(service: ServiceDocument) -> Result<ServiceRule, ValidationError> {
    let name = service.name;
    if service.acquisition_operations.is_empty() && service.managed_transactions.is_empty() {
        return Err(ValidationError::NoAcquisitionOperations(name));
    }
    if service
        .acquisition_operations
        .iter()
        .any(|op| op.trim().is_empty())
    {
        return Err(ValidationError::EmptyAcquisitionOperation(name));
    }
    if service.cleanup_methods.is_empty() {
        return Err(ValidationError::NoCleanupMethods(name));
    }
    if service
        .cleanup_methods
        .iter()
        .any(|c| c.required && c.method.trim().is_empty())
    {
        return Err(ValidationError::EmptyCleanupMethod(name));
    }

    let known_op = |op: &str| {
        service.acquisition_operations.iter().any(|o| o == op)
            || service.managed_transactions.iter().any(|m| m.operation == op)
    };
    let mut override_ops: Vec<&String> = service
        .operation_cleanup
        .keys()
        .chain(service.operation_kinds.keys())
        .collect();
    // Deterministic error selection across hash orders
    override_ops.sort();
    if let Some(op) = override_ops.into_iter().find(|op| !known_op(op.as_str())) {
        return Err(ValidationError::UnknownOperation {
            service: name,
            operation: op.clone(),
        });
    }

    let mut overrides: Vec<(&String, &String)> = service.operation_cleanup.iter().collect();
    overrides.sort();
    for (op, method) in overrides {
        if !service.cleanup_methods.iter().any(|c| &c.method == method) {
            return Err(ValidationError::UnknownCleanupMethod {
                service: name,
                operation: op.clone(),
                method: method.clone(),
            });
        }
    }

    Ok(ServiceRule {
        name,
        origin_path: service.origin_path,
        acquisition_operations: service.acquisition_operations,
        cleanup_methods: service.cleanup_methods,
        operation_cleanup: service.operation_cleanup,
        operation_kinds: service.operation_kinds,
        managed_transactions: service.managed_transactions,
    })
}

fn validate_exemption(
    index: usize,
    exemption: ExemptionDocument,
) -> Result<PathExemption, ValidationError> {
    if exemption.name.trim().is_empty() {
        return Err(ValidationError::EmptyExemptionName { index });
    }
    if exemption.pattern.trim().is_empty() {
        return Err(ValidationError::EmptyPattern(exemption.name));
    }
    let Some(kind) = ConditionKind::parse(&exemption.condition.kind) else {
        return Err(ValidationError::UnknownConditionKind {
            name: exemption.name,
            kind: exemption.condition.kind,
        });
    };
    let matcher = compile_glob(&exemption.pattern).map_err(|e| ValidationError::InvalidPattern {
        name: exemption.name.clone(),
        reason: e.to_string(),
    })?;
    Ok(PathExemption::new(
        exemption.name,
        exemption.pattern,
        ExemptionCondition {
            kind,
            description: exemption.condition.description,
            enabled: exemption.condition.enabled,
        },
        matcher,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const VALID: &str = r#"
services:
  - name: spanner
    originPath: cloud.google.com/go/spanner
    acquisitionOperations: [NewClient, Query]
    cleanupMethods:
      - method: Close
        required: true
      - method: Stop
        required: true
    operationCleanup:
      Query: Stop
    operationKinds:
      Query: iterator
    managedTransactions:
      - operation: ReadWriteTransaction
        kind: read-write
        clientType: Client
pathExemptions:
  - name: tools
    pattern: "**/tools/**"
    condition:
      kind: short-lived-program
"#;

    #[test]
    fn test_valid_yaml_document() {
        let parts = CatalogDocument::from_yaml_str(VALID)
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(parts.rules.len(), 1);
        let rule = &parts.rules[0];
        assert_eq!(rule.cleanup_for_operation("Query"), Some(("Stop", true)));
        assert_eq!(rule.kind_for_operation("Query"), ResourceKind::Iterator);
        assert_eq!(rule.managed_transactions[0].callback_param, 1);
        assert!(parts.exemptions[0].condition.enabled);
        assert!(parts.exemptions[0].applies_to("repo/tools/gen.go"));
    }

    #[test]
    fn test_json_document() {
        let json = r#"{
            "services": [{
                "name": "pubsub",
                "originPath": "cloud.google.com/go/pubsub",
                "acquisitionOperations": ["NewClient"],
                "cleanupMethods": [{"method": "Close", "required": true}]
            }]
        }"#;
        let parts = CatalogDocument::from_json_str(json).unwrap().validate().unwrap();
        assert_eq!(parts.rules[0].name, "pubsub");
        assert!(parts.exemptions.is_empty());
    }

    #[test]
    fn test_empty_services_rejected() {
        let doc = CatalogDocument::from_yaml_str("services: []\n").unwrap();
        assert_eq!(doc.validate().unwrap_err(), ValidationError::NoServices);
    }

    #[test]
    fn test_required_cleanup_without_name_rejected() {
        let yaml = r#"
services:
  - name: storage
    acquisitionOperations: [NewClient]
    cleanupMethods:
      - method: ""
        required: true
"#;
        let err = CatalogDocument::from_yaml_str(yaml).unwrap().validate().unwrap_err();
        assert_eq!(err, ValidationError::EmptyCleanupMethod("storage".into()));
    }

    #[test]
    fn test_unknown_condition_kind_rejected() {
        let yaml = r#"
services:
  - name: storage
    acquisitionOperations: [NewClient]
    cleanupMethods: [{method: Close, required: true}]
pathExemptions:
  - name: lambdas
    pattern: "**/lambda/**"
    condition: {kind: lambda}
"#;
        let err = CatalogDocument::from_yaml_str(yaml).unwrap().validate().unwrap_err();
        assert!(matches!(err, ValidationError::UnknownConditionKind { .. }));
    }

    #[test]
    fn test_override_for_unknown_operation_rejected() {
        let yaml = r#"
services:
  - name: storage
    acquisitionOperations: [NewClient]
    cleanupMethods: [{method: Close, required: true}]
    operationCleanup: {NewWriter: Close}
"#;
        let err = CatalogDocument::from_yaml_str(yaml).unwrap().validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownOperation {
                service: "storage".into(),
                operation: "NewWriter".into(),
            }
        );
    }

    #[test]
    fn test_duplicate_service_rejected() {
        let yaml = r#"
services:
  - {name: kms, acquisitionOperations: [NewKeyManagementClient], cleanupMethods: [{method: Close, required: true}]}
  - {name: kms, acquisitionOperations: [NewKeyManagementClient], cleanupMethods: [{method: Close, required: true}]}
"#;
        let err = CatalogDocument::from_yaml_str(yaml).unwrap().validate().unwrap_err();
        assert_eq!(err, ValidationError::DuplicateService("kms".into()));
    }

    #[test]
    fn test_unknown_extension() {
        let result = CatalogDocument::from_path(Path::new("rules.toml"));
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(ext)) if ext == "toml"));
    }
}
