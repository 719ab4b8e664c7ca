/*
 * Built-in Catalog
 *
 * Google Cloud client libraries for Go. Service names equal the Go package
 * names so `storage.Client` resolves to the `storage` rule.
 *
 * Used when no catalog document is configured or the configured one cannot
 * be read.
 */

use super::glob::compile_glob;
use crate::features::rule_catalog::domain::{
    ConditionKind, ExemptionCondition, ManagedTransactionKind, PathExemption, ResourceKind,
    ServiceRule,
};

pub fn built_in_rules() -> Vec<ServiceRule> {
    vec![
        ServiceRule::new("storage", "cloud.google.com/go/storage")
            .with_operations(&[
                "NewClient",
                "NewGRPCClient",
                "NewReader",
                "NewRangeReader",
                "NewWriter",
            ])
            .with_cleanup("Close", true, "closes the client or flushes the object stream"),
        ServiceRule::new("pubsub", "cloud.google.com/go/pubsub")
            .with_operations(&["NewClient", "NewClientWithConfig"])
            .with_cleanup("Close", true, "releases gRPC connections"),
        spanner(),
        firestore(),
        ServiceRule::new("bigquery", "cloud.google.com/go/bigquery")
            .with_operations(&["NewClient"])
            .with_cleanup("Close", true, "releases the underlying transport"),
        ServiceRule::new("datastore", "cloud.google.com/go/datastore")
            .with_operations(&["NewClient"])
            .with_cleanup("Close", true, "releases gRPC connections")
            .with_managed_transaction(
                "RunInTransaction",
                ManagedTransactionKind::Run,
                0,
                Some("Client"),
            ),
        ServiceRule::new("bigtable", "cloud.google.com/go/bigtable")
            .with_operations(&["NewClient", "NewAdminClient", "NewInstanceAdminClient"])
            .with_cleanup("Close", true, "releases gRPC connections"),
        ServiceRule::new("secretmanager", "cloud.google.com/go/secretmanager/apiv1")
            .with_operations(&["NewClient"])
            .with_cleanup("Close", true, "releases gRPC connections"),
        ServiceRule::new("kms", "cloud.google.com/go/kms/apiv1")
            .with_operations(&["NewKeyManagementClient"])
            .with_cleanup("Close", true, "releases gRPC connections"),
    ]
}

fn spanner() -> ServiceRule {
    let mut rule = ServiceRule::new("spanner", "cloud.google.com/go/spanner")
        .with_operations(&[
            "NewClient",
            "NewClientWithConfig",
            "ReadOnlyTransaction",
            "BatchReadOnlyTransaction",
            "Query",
            "Read",
            "ReadUsingIndex",
            "ReadWithOptions",
        ])
        .with_cleanup("Close", true, "returns sessions to the pool")
        .with_cleanup("Stop", true, "stops a row iterator")
        .with_managed_transaction(
            "ReadWriteTransaction",
            ManagedTransactionKind::ReadWrite,
            1,
            Some("Client"),
        );
    for op in ["Query", "Read", "ReadUsingIndex", "ReadWithOptions"] {
        rule = rule.with_operation_cleanup(op, "Stop");
        rule.operation_kinds.insert(op.to_string(), ResourceKind::Iterator);
    }
    rule
}

fn firestore() -> ServiceRule {
    let mut rule = ServiceRule::new("firestore", "cloud.google.com/go/firestore")
        .with_operations(&["NewClient", "NewClientWithDatabase", "Documents"])
        .with_cleanup("Close", true, "releases gRPC connections")
        .with_cleanup("Stop", true, "stops a document iterator")
        .with_operation_cleanup("Documents", "Stop")
        .with_managed_transaction("RunTransaction", ManagedTransactionKind::Run, 1, Some("Client"));
    rule.operation_kinds
        .insert("Documents".to_string(), ResourceKind::Iterator);
    rule
}

pub fn built_in_exemptions() -> Vec<PathExemption> {
    let specs = [
        (
            "cmd-entrypoints",
            "**/cmd/**",
            ConditionKind::ShortLivedProgram,
            "short-lived programs release everything at exit",
            true,
        ),
        (
            "cloud-functions",
            "**/functions/**",
            ConditionKind::ServerlessHandler,
            "serverless handlers reuse clients across invocations",
            true,
        ),
        (
            "tests",
            "**/*_test.go",
            ConditionKind::TestFile,
            "test files",
            false,
        ),
    ];

    specs
        .iter()
        .filter_map(|(name, pattern, kind, description, enabled)| {
            let matcher = compile_glob(pattern).ok()?;
            Some(PathExemption::new(
                *name,
                *pattern,
                ExemptionCondition {
                    kind: *kind,
                    description: description.to_string(),
                    enabled: *enabled,
                },
                matcher,
            ))
        })
        .collect()
}
