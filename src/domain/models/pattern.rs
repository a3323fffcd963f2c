use serde::{Deserialize, Serialize};

/// A named cluster of classes sharing a method-set signature (§4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    name: String,
    module: String,
    description: String,
    common_methods: Vec<String>,
    members: Vec<String>,
    canonical_member: String,
}

/// Name used when no common suffix of length >= 4 exists across cluster members.
pub const UNNAMED_PATTERN: &str = "Pattern";
pub const MIN_SUFFIX_LEN: usize = 4;

impl Pattern {
    pub fn new(
        name: impl Into<String>,
        module: impl Into<String>,
        common_methods: Vec<String>,
        mut members: Vec<String>,
    ) -> Self {
        members.sort();
        let canonical_member = members.first().cloned().unwrap_or_default();
        let name = name.into();
        let description = format!(
            "{} members share methods: {}",
            members.len(),
            common_methods.join(", ")
        );
        Self {
            name,
            module: module.into(),
            description,
            common_methods,
            members,
            canonical_member,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn common_methods(&self) -> &[String] {
        &self.common_methods
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn canonical_member(&self) -> &str {
        &self.canonical_member
    }

    /// Synthetic markdown content used as the pattern chunk's body (§4.2).
    pub fn to_markdown(&self) -> String {
        format!(
            "# Pattern: {}\n\nCommon methods: {}\n\nMembers:\n{}\n\nCanonical example: {}\n",
            self.name,
            self.common_methods.join(", "),
            self.members
                .iter()
                .map(|m| format!("- {m}"))
                .collect::<Vec<_>>()
                .join("\n"),
            self.canonical_member
        )
    }
}

/// Jaccard similarity between two method-name sets.
pub fn jaccard(a: &std::collections::BTreeSet<String>, b: &std::collections::BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Longest common suffix of a set of names, if at least `MIN_SUFFIX_LEN` long;
/// otherwise [`UNNAMED_PATTERN`].
pub fn longest_common_suffix_name(names: &[String]) -> String {
    if names.is_empty() {
        return UNNAMED_PATTERN.to_string();
    }
    let reversed: Vec<Vec<char>> = names.iter().map(|n| n.chars().rev().collect()).collect();
    let min_len = reversed.iter().map(|c| c.len()).min().unwrap_or(0);
    let mut suffix_len = 0;
    for i in 0..min_len {
        let c = reversed[0][i];
        if reversed.iter().all(|chars| chars[i] == c) {
            suffix_len += 1;
        } else {
            break;
        }
    }
    if suffix_len < MIN_SUFFIX_LEN {
        return UNNAMED_PATTERN.to_string();
    }
    let suffix: String = reversed[0][..suffix_len].iter().rev().collect();
    suffix
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn jaccard_identical_sets_is_one() {
        let a: BTreeSet<String> = ["fetch", "save"].iter().map(|s| s.to_string()).collect();
        assert_eq!(jaccard(&a, &a), 1.0);
    }

    #[test]
    fn jaccard_disjoint_sets_is_zero() {
        let a: BTreeSet<String> = ["fetch"].iter().map(|s| s.to_string()).collect();
        let b: BTreeSet<String> = ["save"].iter().map(|s| s.to_string()).collect();
        assert_eq!(jaccard(&a, &b), 0.0);
    }

    #[test]
    fn common_suffix_requires_minimum_length() {
        let names = vec!["AWSImporter".to_string(), "AzureImporter".to_string(), "GCPImporter".to_string()];
        assert_eq!(longest_common_suffix_name(&names), "Importer");
    }

    #[test]
    fn common_suffix_falls_back_when_too_short() {
        let names = vec!["Foo".to_string(), "Bar".to_string()];
        assert_eq!(longest_common_suffix_name(&names), UNNAMED_PATTERN);
    }
}
