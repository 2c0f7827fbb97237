use globset::{GlobBuilder, GlobMatcher};

use crate::error::{DeployMetricsError, Result};

/// Shell-style pattern matched against workflow display names.
///
/// Matching is case-sensitive: `*` matches any run of characters (including
/// `/`), `?` matches exactly one, and `[...]` matches a character set.
#[derive(Debug, Clone)]
pub struct WorkflowPattern {
    raw: String,
    matcher: GlobMatcher,
}

impl WorkflowPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(false)
            .case_insensitive(false)
            .build()
            .map_err(|e| {
                DeployMetricsError::Config(format!("Invalid workflow pattern '{pattern}': {e}"))
            })?;

        Ok(Self {
            raw: pattern.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    pub fn is_match(&self, workflow_name: &str) -> bool {
        self.matcher.is_match(workflow_name)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}
