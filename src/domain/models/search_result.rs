use serde::{Deserialize, Serialize};

use super::{Chunk, QueryType};

/// One entry in a `search_code` response's `results` array (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub file_path: String,
    pub module: String,
    pub symbol_name: Option<String>,
    pub kind: String,
    pub start_line: u32,
    pub end_line: u32,
    pub content: String,
    pub docstring: Option<String>,
    pub is_test: bool,
}

impl From<&Chunk> for SearchResultItem {
    fn from(chunk: &Chunk) -> Self {
        SearchResultItem {
            file_path: chunk.file_path().to_string(),
            module: chunk.module().to_string(),
            symbol_name: chunk.symbol_name().map(str::to_string),
            kind: chunk.kind().as_str().to_string(),
            start_line: chunk.start_line(),
            end_line: chunk.end_line(),
            content: chunk.content().to_string(),
            docstring: chunk.docstring().map(str::to_string),
            is_test: chunk.is_test(),
        }
    }
}

/// A suggestion surfaced alongside an empty result window (§4.13).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub term: String,
    pub reason: String,
}

/// The full `search_code` response shape, serialized verbatim into the tool
/// call's text content (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchResponse {
    Results {
        query_type: QueryType,
        results: Vec<SearchResultItem>,
        total_count: usize,
        has_more: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        cursor: Option<String>,
    },
    Empty {
        query_type: QueryType,
        results: Vec<SearchResultItem>,
        message: String,
        suggestions: Vec<Suggestion>,
        #[serde(skip_serializing_if = "Option::is_none")]
        hint: Option<String>,
    },
}

impl SearchResponse {
    pub fn results(
        query_type: QueryType,
        results: Vec<SearchResultItem>,
        total_count: usize,
        has_more: bool,
        cursor: Option<String>,
    ) -> Self {
        SearchResponse::Results {
            query_type,
            results,
            total_count,
            has_more,
            cursor,
        }
    }

    pub fn empty(
        query_type: QueryType,
        message: impl Into<String>,
        suggestions: Vec<Suggestion>,
        hint: Option<String>,
    ) -> Self {
        SearchResponse::Empty {
            query_type,
            results: Vec::new(),
            message: message.into(),
            suggestions,
            hint,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SearchResponse::Empty { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_response_omits_cursor_when_no_more_pages() {
        let resp = SearchResponse::results(QueryType::Symbol, vec![], 0, false, None);
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("cursor").is_none());
    }

    #[test]
    fn empty_response_carries_suggestions() {
        let resp = SearchResponse::empty(
            QueryType::Concept,
            "no results",
            vec![Suggestion {
                term: "auth".into(),
                reason: "synonym for 'login'".into(),
            }],
            None,
        );
        assert!(resp.is_empty());
    }
}
