use serde::{Deserialize, Serialize};

/// The declaration kind a [`Symbol`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Class,
    Method,
    Variable,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Class => "class",
            SymbolKind::Method => "method",
            SymbolKind::Variable => "variable",
        }
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A declaration extracted from a single file's AST. Transient: exists only
/// for the duration of one pipeline run and is never persisted directly —
/// it is consumed by the chunker (into [`super::Chunk`]) and by pattern
/// detection, then dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    name: String,
    kind: SymbolKind,
    file_path: String,
    start_line: u32,
    end_line: u32,
    content: String,
    docstring: Option<String>,
    /// Enclosing class name, set only for `SymbolKind::Method`.
    parent: Option<String>,
    signature: Option<String>,
}

impl Symbol {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        kind: SymbolKind,
        file_path: impl Into<String>,
        start_line: u32,
        end_line: u32,
        content: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            file_path: file_path.into(),
            start_line,
            end_line,
            content: content.into(),
            docstring: None,
            parent: None,
            signature: None,
        }
    }

    pub fn with_docstring(mut self, docstring: impl Into<String>) -> Self {
        self.docstring = Some(docstring.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn start_line(&self) -> u32 {
        self.start_line
    }

    pub fn end_line(&self) -> u32 {
        self.end_line
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn docstring(&self) -> Option<&str> {
        self.docstring.as_deref()
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    pub fn is_method(&self) -> bool {
        self.kind == SymbolKind::Method && self.parent.is_some()
    }

    /// Dot-joined qualified name: `Class.method` for methods, bare name otherwise.
    pub fn qualified_name(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{parent}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_name_joins_parent_for_methods() {
        let sym = Symbol::new(
            "greet",
            SymbolKind::Method,
            "greeter.py",
            4,
            5,
            "def greet(self): ...",
        )
        .with_parent("Greeter");
        assert_eq!(sym.qualified_name(), "Greeter.greet");
        assert!(sym.is_method());
    }

    #[test]
    fn qualified_name_is_bare_for_functions() {
        let sym = Symbol::new("greet", SymbolKind::Function, "greeter.py", 1, 2, "def greet(): ...");
        assert_eq!(sym.qualified_name(), "greet");
        assert!(!sym.is_method());
    }
}
