use serde::{Deserialize, Serialize};

/// Tri-state test-inclusion filter (§4.11 step 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TestFilter {
    #[default]
    Include,
    Exclude,
    Only,
}

/// One of the five classification outcomes (§4.11).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    Symbol,
    Relationship,
    Flow,
    Pattern,
    Concept,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Symbol => "symbol",
            QueryType::Relationship => "relationship",
            QueryType::Flow => "flow",
            QueryType::Pattern => "pattern",
            QueryType::Concept => "concept",
        }
    }
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A retrieval strategy's static configuration (the table in §4.11).
#[derive(Debug, Clone, Copy)]
pub struct Strategy {
    pub query_type: QueryType,
    pub semantic: bool,
    pub symbol_filter: bool,
    pub pattern_filter: bool,
    pub graph_expand_depth: Option<u32>,
    pub max_results: usize,
}

impl Strategy {
    pub fn for_type(query_type: QueryType) -> Strategy {
        match query_type {
            QueryType::Symbol => Strategy {
                query_type,
                semantic: false,
                symbol_filter: true,
                pattern_filter: false,
                graph_expand_depth: None,
                max_results: 10,
            },
            QueryType::Relationship => Strategy {
                query_type,
                semantic: false,
                symbol_filter: true,
                pattern_filter: false,
                graph_expand_depth: Some(1),
                max_results: 20,
            },
            QueryType::Flow => Strategy {
                query_type,
                semantic: true,
                symbol_filter: false,
                pattern_filter: false,
                graph_expand_depth: Some(3),
                max_results: 15,
            },
            QueryType::Pattern => Strategy {
                query_type,
                semantic: false,
                symbol_filter: false,
                pattern_filter: true,
                graph_expand_depth: None,
                max_results: 5,
            },
            QueryType::Concept => Strategy {
                query_type,
                semantic: true,
                symbol_filter: false,
                pattern_filter: false,
                graph_expand_depth: Some(1),
                max_results: 10,
            },
        }
    }
}

/// The `search_code` tool's request parameters (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    query: String,
    #[serde(default = "default_repo")]
    repo: String,
    #[serde(default)]
    module: Option<String>,
    #[serde(default)]
    include_tests: TestFilter,
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    cursor: Option<String>,
}

fn default_repo() -> String {
    "all".to_string()
}

fn default_limit() -> usize {
    10
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            repo: default_repo(),
            module: None,
            include_tests: TestFilter::default(),
            limit: default_limit(),
            cursor: None,
        }
    }

    pub fn with_repo(mut self, repo: impl Into<String>) -> Self {
        self.repo = repo.into();
        self
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn with_include_tests(mut self, filter: TestFilter) -> Self {
        self.include_tests = filter;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn is_all_repos(&self) -> bool {
        self.repo == "all"
    }

    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    pub fn include_tests(&self) -> TestFilter {
        self.include_tests
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let q = SearchQuery::new("find it");
        assert_eq!(q.repo(), "all");
        assert!(q.is_all_repos());
        assert_eq!(q.limit(), 10);
        assert_eq!(q.include_tests(), TestFilter::Include);
    }

    #[test]
    fn strategy_limits_match_table() {
        assert_eq!(Strategy::for_type(QueryType::Symbol).max_results, 10);
        assert_eq!(Strategy::for_type(QueryType::Relationship).max_results, 20);
        assert_eq!(Strategy::for_type(QueryType::Flow).max_results, 15);
        assert_eq!(Strategy::for_type(QueryType::Pattern).max_results, 5);
        assert_eq!(Strategy::for_type(QueryType::Concept).max_results, 10);
        assert_eq!(Strategy::for_type(QueryType::Relationship).graph_expand_depth, Some(1));
        assert_eq!(Strategy::for_type(QueryType::Flow).graph_expand_depth, Some(3));
    }
}
