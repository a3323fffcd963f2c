use serde::{Deserialize, Serialize};

/// The edge kind a [`Relationship`] becomes in the graph store (§3, §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    Imports,
    Calls,
    Extends,
}

impl RelationshipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::Imports => "IMPORTS",
            RelationshipKind::Calls => "CALLS",
            RelationshipKind::Extends => "EXTENDS",
        }
    }
}

impl std::fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A relationship extracted during parsing. Transient at parse time; persisted
/// as a typed graph edge by the pipeline's graph-upsert step (§4.9 step 9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    kind: RelationshipKind,
    source_file: String,
    source_symbol: Option<String>,
    source_line: Option<u32>,
    /// Module path for `Imports`; symbol name for `Calls`/`Extends`.
    target: String,
}

impl Relationship {
    pub fn new(kind: RelationshipKind, source_file: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            kind,
            source_file: source_file.into(),
            source_symbol: None,
            source_line: None,
            target: target.into(),
        }
    }

    pub fn with_source_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.source_symbol = Some(symbol.into());
        self
    }

    pub fn with_source_line(mut self, line: u32) -> Self {
        self.source_line = Some(line);
        self
    }

    pub fn kind(&self) -> RelationshipKind {
        self.kind
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    pub fn source_symbol(&self) -> Option<&str> {
        self.source_symbol.as_deref()
    }

    pub fn source_line(&self) -> Option<u32> {
        self.source_line
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_optional_fields() {
        let rel = Relationship::new(RelationshipKind::Calls, "a.py", "helper")
            .with_source_symbol("main")
            .with_source_line(10);
        assert_eq!(rel.kind(), RelationshipKind::Calls);
        assert_eq!(rel.source_symbol(), Some("main"));
        assert_eq!(rel.source_line(), Some(10));
        assert_eq!(rel.target(), "helper");
    }
}
