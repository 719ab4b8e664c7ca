//! Suppression markers
//!
//! Recognized in a comment on the reported line or the line right above it:
//! - `//nolint` (bare, every tool)
//! - `//nolint:a,b` when the list names the tool or `all`
//! - `//lint:ignore <tool> reason`
//! - `//<tool>:ignore`
//! - any configured extra marker, matched literally

use once_cell::sync::Lazy;
use regex::Regex;

static NOLINT: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"//\s*nolint(?::([A-Za-z0-9_,\- ]+))?").ok());

static LINT_IGNORE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"//\s*lint:ignore\s+([A-Za-z0-9_,\-]+)").ok());

#[derive(Debug, Clone)]
pub struct SuppressionMarkers {
    tool_name: String,
    tool_ignore: Option<Regex>,
    extra: Vec<String>,
}

impl SuppressionMarkers {
    pub fn new(tool_name: impl Into<String>, extra: Vec<String>) -> Self {
        let tool_name = tool_name.into();
        let tool_ignore = Regex::new(&format!(r"//\s*{}:ignore\b", regex::escape(&tool_name))).ok();
        Self {
            tool_name,
            tool_ignore,
            extra: extra.into_iter().filter(|m| !m.trim().is_empty()).collect(),
        }
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    /// Whether a single comment suppresses findings of this tool
    pub fn matches(&self, comment: &str) -> bool {
        if let Some(captures) = NOLINT.as_ref().and_then(|re| re.captures(comment)) {
            match captures.get(1) {
                None => return true,
                Some(list) if self.names_tool(list.as_str()) => return true,
                Some(_) => {}
            }
        }
        if let Some(captures) = LINT_IGNORE.as_ref().and_then(|re| re.captures(comment)) {
            if captures.get(1).map_or(false, |list| self.names_tool(list.as_str())) {
                return true;
            }
        }
        if self.tool_ignore.as_ref().map_or(false, |re| re.is_match(comment)) {
            return true;
        }
        self.extra.iter().any(|marker| comment.contains(marker.as_str()))
    }

    fn names_tool(&self, list: &str) -> bool {
        list.split(',')
            .map(str::trim)
            .any(|name| name == "all" || name == self.tool_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> SuppressionMarkers {
        SuppressionMarkers::new("cloudleak", vec!["//leak-ok".to_string()])
    }

    #[test]
    fn test_nolint_forms() {
        let m = markers();
        assert!(m.matches("//nolint"));
        assert!(m.matches("// nolint // closed by the pool"));
        assert!(m.matches("//nolint:cloudleak"));
        assert!(m.matches("//nolint:errcheck,cloudleak"));
        assert!(m.matches("//nolint:all"));
        assert!(!m.matches("//nolint:errcheck"));
        assert!(!m.matches("//nolint:cloudleakx"));
    }

    #[test]
    fn test_lint_ignore_and_tool_marker() {
        let m = markers();
        assert!(m.matches("//lint:ignore cloudleak handed to the server"));
        assert!(!m.matches("//lint:ignore SA1019 deprecated"));
        assert!(m.matches("//cloudleak:ignore"));
        assert!(!m.matches("//otherlint:ignore"));
    }

    #[test]
    fn test_extra_markers() {
        let m = markers();
        assert!(m.matches("// see //leak-ok"));
        assert!(!m.matches("// regular comment"));
    }

    #[test]
    fn test_tool_name_is_escaped() {
        let m = SuppressionMarkers::new("leak.check", Vec::new());
        assert!(m.matches("//leak.check:ignore"));
        assert!(!m.matches("//leakxcheck:ignore"));
    }
}
