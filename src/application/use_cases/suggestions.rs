use std::collections::HashMap;

use crate::domain::Suggestion;

/// Bidirectional synonym clusters around domain terms (§4.13).
const SYNONYM_CLUSTERS: &[&[&str]] = &[
    &["auth", "authentication", "login", "oauth", "session"],
    &["db", "database", "datastore", "storage"],
    &["queue", "mq", "broker", "pubsub"],
    &["http", "rest", "api", "endpoint"],
    &["api", "interface", "sdk"],
    &["cache", "memoize", "redis"],
    &["user", "account", "profile"],
    &["config", "configuration", "settings", "options"],
    &["error", "exception", "failure"],
    &["log", "logging", "logger", "audit"],
    &["test", "spec", "fixture"],
    &["file", "document", "blob"],
    &["timeout", "deadline", "expiry"],
];

fn synonyms_for(word: &str) -> Vec<&'static str> {
    SYNONYM_CLUSTERS
        .iter()
        .filter(|cluster| cluster.contains(&word))
        .flat_map(|cluster| cluster.iter().copied())
        .filter(|term| *term != word)
        .collect()
}

/// Given a query and the set of terms actually observed in a repo's index
/// (module names, symbol names, lowercased), returns up to 5 suggestions:
/// synonym matches first, then bidirectional substring matches, ranked by
/// how often the known term appears (§4.13).
pub fn suggest(query: &str, known_term_frequency: &HashMap<String, usize>) -> Vec<Suggestion> {
    let words: Vec<String> = query
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
        .collect();

    let mut scored: Vec<(String, String, usize)> = Vec::new(); // (term, reason, frequency)

    for word in &words {
        for syn in synonyms_for(word) {
            if let Some(freq) = known_term_frequency.get(syn) {
                scored.push((syn.to_string(), format!("synonym for '{word}'"), *freq));
            }
        }
    }

    for word in &words {
        for (known, freq) in known_term_frequency {
            if known == word {
                continue;
            }
            if known.contains(word.as_str()) || word.contains(known.as_str()) {
                scored.push((known.clone(), "partial match".to_string(), *freq));
            }
        }
    }

    scored.sort_by(|a, b| b.2.cmp(&a.2));
    scored.dedup_by(|a, b| a.0 == b.0);
    scored
        .into_iter()
        .take(5)
        .map(|(term, reason, _)| Suggestion { term, reason })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_synonyms_present_in_index() {
        let mut known = HashMap::new();
        known.insert("oauth".to_string(), 12);
        known.insert("unrelated".to_string(), 3);

        let suggestions = suggest("auth flow", &known);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].term, "oauth");
        assert!(suggestions[0].reason.contains("synonym"));
    }

    #[test]
    fn suggests_partial_matches() {
        let mut known = HashMap::new();
        known.insert("user_service".to_string(), 5);

        let suggestions = suggest("service lookup", &known);
        assert_eq!(suggestions[0].term, "user_service");
        assert_eq!(suggestions[0].reason, "partial match");
    }

    #[test]
    fn caps_at_five_suggestions() {
        let mut known = HashMap::new();
        for i in 0..10 {
            known.insert(format!("cache_layer_{i}"), i);
        }
        let suggestions = suggest("cache", &known);
        assert!(suggestions.len() <= 5);
    }
}
