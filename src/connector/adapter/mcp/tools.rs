use schemars::JsonSchema;
use serde::Deserialize;

use crate::domain::TestFilter;

fn default_repo() -> String {
    "all".to_string()
}

fn default_limit() -> usize {
    10
}

/// Tri-state test-inclusion filter mirrored here (rather than reusing
/// [`TestFilter`] directly) so the MCP-facing schema stays independent of the
/// domain model's own derive set.
#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IncludeTests {
    Include,
    Exclude,
    Only,
}

impl Default for IncludeTests {
    fn default() -> Self {
        IncludeTests::Include
    }
}

impl From<IncludeTests> for TestFilter {
    fn from(value: IncludeTests) -> Self {
        match value {
            IncludeTests::Include => TestFilter::Include,
            IncludeTests::Exclude => TestFilter::Exclude,
            IncludeTests::Only => TestFilter::Only,
        }
    }
}

/// Input parameters for the `search_code` tool (§6).
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchToolInput {
    /// Natural language or symbol-name query describing the code to find.
    pub query: String,

    /// Repository name to search, or "all" for every indexed repository.
    #[serde(default = "default_repo")]
    pub repo: String,

    /// Restrict results to a module path.
    pub module: Option<String>,

    /// Whether to include, exclude, or exclusively return test code.
    #[serde(default)]
    pub include_tests: IncludeTests,

    /// Maximum number of results to return (default: 10).
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Opaque pagination cursor from a previous response's `cursor` field.
    pub cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn include_tests_defaults_to_include() {
        let filter: TestFilter = IncludeTests::default().into();
        assert_eq!(filter, TestFilter::Include);
    }

    #[test]
    fn deserializes_minimal_input_with_defaults() {
        let input: SearchToolInput = serde_json::from_str(r#"{"query": "parse config"}"#).unwrap();
        assert_eq!(input.repo, "all");
        assert_eq!(input.limit, 10);
        assert!(input.cursor.is_none());
    }
}
