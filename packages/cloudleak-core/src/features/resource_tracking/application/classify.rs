//! Acquisition classification
//!
//! Ordered strategies, most precise first. The first strategy that names a
//! service rule whose acquisition set contains the called operation wins.

use crate::features::rule_catalog::{RuleCatalog, ServiceRule};
use crate::shared::models::{CallExpr, Expr, ExprKind, ImportSpec, TypeBindings};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationStrategy {
    /// Callee resolved by the binding table
    BoundCallee,
    /// `alias.Func(...)` with `alias` an import of a catalog package
    ImportTable,
    /// Receiver type text, tracked handle variable, or method-chain root
    ReceiverHeuristic,
}

impl ClassificationStrategy {
    pub const ORDER: [ClassificationStrategy; 3] = [
        ClassificationStrategy::BoundCallee,
        ClassificationStrategy::ImportTable,
        ClassificationStrategy::ReceiverHeuristic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ClassificationStrategy::BoundCallee => "bound-callee",
            ClassificationStrategy::ImportTable => "import-table",
            ClassificationStrategy::ReceiverHeuristic => "receiver-heuristic",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Classification<'c> {
    pub rule: &'c ServiceRule,
    pub operation: String,
    pub strategy: ClassificationStrategy,
    /// Static receiver type that identified the service, e.g. `*spanner.Client`
    pub receiver_type: Option<String>,
}

pub struct Classifier<'c> {
    pub catalog: &'c RuleCatalog,
    pub bindings: &'c TypeBindings,
    /// Import local name → import path
    pub imports: &'c FxHashMap<String, String>,
}

impl<'c> Classifier<'c> {
    /// `tracked` maps handle variables already seen in the function to their service
    pub fn classify(
        &self,
        expr: &Expr,
        call: &CallExpr,
        tracked: &FxHashMap<String, String>,
    ) -> Option<Classification<'c>> {
        let op = call.callee_name()?;
        ClassificationStrategy::ORDER.iter().find_map(|strategy| {
            let (rule, receiver_type) = match strategy {
                ClassificationStrategy::BoundCallee => self.by_bound_callee(expr, op),
                ClassificationStrategy::ImportTable => self.by_import(call, op).map(|r| (r, None)),
                ClassificationStrategy::ReceiverHeuristic => self.by_receiver(call, op, tracked),
            }?;
            Some(Classification {
                rule,
                operation: op.to_string(),
                strategy: *strategy,
                receiver_type,
            })
        })
    }

    fn by_bound_callee(&self, expr: &Expr, op: &str) -> Option<(&'c ServiceRule, Option<String>)> {
        let callee = self.bindings.callee_of(expr.span.key())?;
        if callee.name != op {
            return None;
        }
        let by_package = self
            .catalog
            .rule_for_package(&callee.package_path)
            .filter(|r| r.is_acquisition(op));
        let rule = by_package.or_else(|| {
            callee
                .receiver_type
                .as_deref()
                .and_then(|t| self.catalog.rule_for_type(t))
                .filter(|r| r.is_acquisition(op))
        })?;
        Some((rule, callee.receiver_type.clone()))
    }

    fn by_import(&self, call: &CallExpr, op: &str) -> Option<&'c ServiceRule> {
        let receiver = call.receiver()?;
        let qualifier = receiver.as_ident()?;
        // A bound identifier is a variable, not a package
        if self.bindings.object_of(receiver.span.key()).is_some() {
            return None;
        }
        let path = self.imports.get(qualifier)?;
        self.catalog
            .rule_for_package(path)
            .filter(|r| r.is_acquisition(op))
    }

    fn by_receiver(
        &self,
        call: &CallExpr,
        op: &str,
        tracked: &FxHashMap<String, String>,
    ) -> Option<(&'c ServiceRule, Option<String>)> {
        let mut current = call.receiver()?;
        loop {
            if let Some(type_text) = self.bindings.type_of(current.span.key()) {
                if let Some(rule) = self
                    .catalog
                    .rule_for_type(type_text)
                    .filter(|r| r.is_acquisition(op))
                {
                    return Some((rule, Some(type_text.to_string())));
                }
            }
            current = match &current.kind {
                ExprKind::Ident(name) => {
                    return tracked
                        .get(name)
                        .and_then(|service| self.catalog.rule_for(service))
                        .filter(|r| r.is_acquisition(op))
                        .map(|r| (r, None));
                }
                ExprKind::Paren(inner) => inner.as_ref(),
                ExprKind::Selector { operand, .. } => operand.as_ref(),
                ExprKind::Call(inner) => match &inner.func.kind {
                    ExprKind::Selector { operand, .. } => operand.as_ref(),
                    _ => return None,
                },
                _ => return None,
            };
        }
    }
}

/// Import local name → path for every import usable as a qualifier
pub fn import_table(imports: &[ImportSpec]) -> FxHashMap<String, String> {
    imports
        .iter()
        .filter(|i| !matches!(i.alias.as_deref(), Some("_") | Some(".")))
        .map(|i| (i.local_name().to_string(), i.path.clone()))
        .collect()
}
