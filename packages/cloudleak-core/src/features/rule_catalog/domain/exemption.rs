//! Path exemptions
//!
//! A glob pattern plus the condition that justifies skipping every finding in
//! matching units (short-lived programs, serverless handlers, tests).

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConditionKind {
    ShortLivedProgram,
    ServerlessHandler,
    TestFile,
}

impl ConditionKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "short-lived-program" => Some(ConditionKind::ShortLivedProgram),
            "serverless-handler" => Some(ConditionKind::ServerlessHandler),
            "test-file" => Some(ConditionKind::TestFile),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionKind::ShortLivedProgram => "short-lived-program",
            ConditionKind::ServerlessHandler => "serverless-handler",
            ConditionKind::TestFile => "test-file",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExemptionCondition {
    pub kind: ConditionKind,
    pub description: String,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct PathExemption {
    pub name: String,
    pub pattern: String,
    pub condition: ExemptionCondition,
    matcher: Regex,
}

impl PathExemption {
    pub fn new(
        name: impl Into<String>,
        pattern: impl Into<String>,
        condition: ExemptionCondition,
        matcher: Regex,
    ) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            condition,
            matcher,
        }
    }

    /// Whether this (enabled) exemption covers `path`
    pub fn applies_to(&self, path: &str) -> bool {
        if !self.condition.enabled {
            return false;
        }
        let normalized = path.replace('\\', "/");
        self.matcher.is_match(&normalized)
    }

    /// Human-readable reason reported when the exemption applies
    pub fn reason(&self) -> String {
        if self.condition.description.is_empty() {
            format!("{} ({})", self.name, self.condition.kind.as_str())
        } else {
            format!("{}: {}", self.name, self.condition.description)
        }
    }
}
