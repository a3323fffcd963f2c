use std::sync::LazyLock;

use regex::Regex;

use crate::domain::QueryType;

static HOW_DOES_WORK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)how (do|does)\b.*\bwork").expect("valid regex"));
static PATTERN_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(pattern|typical|standard|convention|structure of|example of)\b").expect("valid regex")
});
static RELATIONSHIP_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(calls?|calling|called|uses?|using|used|imports?|importing|imported|depends?|depending|references?|referencing|referenced|invokes?|invoking|invoked)\b")
        .expect("valid regex")
});
static FLOW_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(flow|path from|path to|route|routing|pipeline|chain)\b").expect("valid regex")
});
static IDENTIFIER_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-zA-Z0-9]*[A-Z][a-zA-Z0-9]*$|^[a-z][a-z0-9_]*_[a-z0-9_]+$|^[A-Z][a-zA-Z0-9]*$")
        .expect("valid regex")
});

/// Classifies free-text queries into one of five retrieval strategies,
/// first-match-wins order (§4.11).
pub fn classify(query: &str) -> QueryType {
    if query.contains('"') || query.contains('`') {
        return QueryType::Symbol;
    }
    if HOW_DOES_WORK.is_match(query) || PATTERN_WORDS.is_match(query) {
        return QueryType::Pattern;
    }
    if RELATIONSHIP_WORDS.is_match(query) {
        return QueryType::Relationship;
    }
    if FLOW_WORDS.is_match(query) {
        return QueryType::Flow;
    }
    if query
        .split_whitespace()
        .any(|word| IDENTIFIER_LIKE.is_match(word.trim_matches(|c: char| !c.is_alphanumeric() && c != '_')))
    {
        return QueryType::Symbol;
    }
    QueryType::Concept
}

/// Extracts the symbol name a symbol-strategy query targets: a quoted or
/// backticked term takes priority, otherwise the first identifier-like word.
pub fn extract_symbol_name(query: &str) -> Option<String> {
    for quote in ['"', '`'] {
        if let Some(start) = query.find(quote) {
            if let Some(end) = query[start + 1..].find(quote) {
                return Some(query[start + 1..start + 1 + end].to_string());
            }
        }
    }
    query
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '_'))
        .find(|w| IDENTIFIER_LIKE.is_match(w))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_pattern_queries() {
        assert_eq!(classify("how do importers work"), QueryType::Pattern);
        assert_eq!(classify("what is the typical structure of a handler"), QueryType::Pattern);
    }

    #[test]
    fn classifies_relationship_queries() {
        assert_eq!(classify("what calls validateToken"), QueryType::Relationship);
    }

    #[test]
    fn classifies_symbol_queries() {
        assert_eq!(classify("UserService"), QueryType::Symbol);
        assert_eq!(classify(r#"find "parse_config""#), QueryType::Symbol);
    }

    #[test]
    fn classifies_flow_queries() {
        assert_eq!(classify("request flow through the pipeline"), QueryType::Flow);
    }

    #[test]
    fn classifies_concept_queries_as_fallback() {
        assert_eq!(classify("authentication timeout handling"), QueryType::Concept);
    }

    #[test]
    fn extracts_quoted_symbol_over_identifier() {
        assert_eq!(extract_symbol_name(r#"find "parse_config" usage"#), Some("parse_config".to_string()));
    }
}
