use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::Language;

/// Whether a chunk carries code or rendered documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    Code,
    Doc,
}

/// The retrieval-unit kind. `ClassSummary`, `Pattern`, and `Navigation` are
/// synthesized by the chunker rather than lifted directly from a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    Function,
    Class,
    Method,
    ClassSummary,
    Pattern,
    Navigation,
    Variable,
}

impl ChunkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkKind::Function => "function",
            ChunkKind::Class => "class",
            ChunkKind::Method => "method",
            ChunkKind::ClassSummary => "class_summary",
            ChunkKind::Pattern => "pattern",
            ChunkKind::Navigation => "navigation",
            ChunkKind::Variable => "variable",
        }
    }
}

impl std::fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Default retrieval weight for non-test code chunks.
pub const WEIGHT_DEFAULT: f32 = 1.0;
/// Retrieval weight applied to chunks extracted from test files.
pub const WEIGHT_TEST: f32 = 0.5;
/// Retrieval weight applied to navigation and pattern chunks.
pub const WEIGHT_BOOSTED: f32 = 1.5;

/// The unit of retrieval. See data-model §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    id: String,
    repo: String,
    file_path: String,
    start_line: u32,
    end_line: u32,
    chunk_type: ChunkType,
    kind: ChunkKind,
    module: String,
    module_root: String,
    submodule: Option<String>,
    symbol_name: Option<String>,
    heading_path: Option<String>,
    content: String,
    context_header: Option<String>,
    signature: Option<String>,
    docstring: Option<String>,
    is_test: bool,
    retrieval_weight: f32,
    has_secrets: bool,
    follows_pattern: Option<String>,
    language: Language,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    vector: Option<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    score: Option<f32>,
}

/// Chunk identifier: SHA-256 of `repo:file:symbol:startLine`, reformatted as a
/// canonical 36-character dashed identifier (8-4-4-4-12 hex) from the digest's
/// first 16 bytes. Pure function of its inputs — identical inputs across runs
/// and across machines always yield the same id.
pub fn chunk_id(repo: &str, file: &str, symbol: &str, start_line: u32) -> String {
    let input = format!("{repo}:{file}:{symbol}:{start_line}");
    let digest = Sha256::digest(input.as_bytes());
    let b = &digest[..16];
    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7], b[8], b[9], b[10], b[11], b[12], b[13], b[14], b[15]
    )
}

/// Splits a dotted module path into (root, remainder-after-first-dot).
pub fn split_module(module: &str) -> (String, Option<String>) {
    match module.split_once('.') {
        Some((root, rest)) if !rest.is_empty() => (root.to_string(), Some(rest.to_string())),
        _ => (module.to_string(), None),
    }
}

impl Chunk {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repo: impl Into<String>,
        file_path: impl Into<String>,
        start_line: u32,
        end_line: u32,
        chunk_type: ChunkType,
        kind: ChunkKind,
        module: impl Into<String>,
        content: impl Into<String>,
        language: Language,
    ) -> Self {
        let repo = repo.into();
        let file_path = file_path.into();
        let module = module.into();
        let (module_root, submodule) = split_module(&module);
        Self {
            id: chunk_id(&repo, &file_path, "", start_line),
            repo,
            file_path,
            start_line,
            end_line,
            chunk_type,
            kind,
            module,
            module_root,
            submodule,
            symbol_name: None,
            heading_path: None,
            content: content.into(),
            context_header: None,
            signature: None,
            docstring: None,
            is_test: false,
            retrieval_weight: WEIGHT_DEFAULT,
            has_secrets: false,
            follows_pattern: None,
            language,
            vector: None,
            score: None,
        }
    }

    /// Re-derives the id from symbol name once known. Called by the chunker
    /// after `with_symbol_name`, since the id is keyed on symbol, not just line.
    pub fn with_symbol_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.id = chunk_id(&self.repo, &self.file_path, &name, self.start_line);
        self.symbol_name = Some(name);
        self
    }

    pub fn with_heading_path(mut self, path: impl Into<String>) -> Self {
        self.heading_path = Some(path.into());
        self
    }

    pub fn with_context_header(mut self, header: impl Into<String>) -> Self {
        self.context_header = Some(header.into());
        self
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn with_docstring(mut self, docstring: impl Into<String>) -> Self {
        self.docstring = Some(docstring.into());
        self
    }

    pub fn with_is_test(mut self, is_test: bool) -> Self {
        self.is_test = is_test;
        self.retrieval_weight = if is_test { WEIGHT_TEST } else { WEIGHT_DEFAULT };
        self
    }

    pub fn with_retrieval_weight(mut self, weight: f32) -> Self {
        self.retrieval_weight = weight;
        self
    }

    pub fn with_secrets(mut self, has_secrets: bool, redacted_content: impl Into<String>) -> Self {
        self.has_secrets = has_secrets;
        self.content = redacted_content.into();
        self
    }

    pub fn with_follows_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.follows_pattern = Some(pattern.into());
        self
    }

    pub fn with_vector(mut self, vector: Vec<f32>) -> Self {
        self.vector = Some(vector);
        self
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    /// In-place counterpart to [`Self::with_vector`], for mutating a chunk
    /// already owned behind a `&mut` (e.g. while iterating a batch).
    pub fn set_vector(&mut self, vector: Vec<f32>) {
        self.vector = Some(vector);
    }

    /// In-place counterpart to [`Self::with_follows_pattern`].
    pub fn set_follows_pattern(&mut self, pattern: impl Into<String>) {
        self.follows_pattern = Some(pattern.into());
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn repo(&self) -> &str {
        &self.repo
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

    pub fn chunk_type(&self) -> ChunkType {
        self.chunk_type
    }

    pub fn kind(&self) -> ChunkKind {
        self.kind
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn module_root(&self) -> &str {
        &self.module_root
    }

    pub fn submodule(&self) -> Option<&str> {
        self.submodule.as_deref()
    }

    pub fn symbol_name(&self) -> Option<&str> {
        self.symbol_name.as_deref()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn context_header(&self) -> Option<&str> {
        self.context_header.as_deref()
    }

    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    pub fn docstring(&self) -> Option<&str> {
        self.docstring.as_deref()
    }

    pub fn is_test(&self) -> bool {
        self.is_test
    }

    pub fn retrieval_weight(&self) -> f32 {
        self.retrieval_weight
    }

    pub fn has_secrets(&self) -> bool {
        self.has_secrets
    }

    pub fn follows_pattern(&self) -> Option<&str> {
        self.follows_pattern.as_deref()
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn vector(&self) -> Option<&[f32]> {
        self.vector.as_deref()
    }

    pub fn score(&self) -> Option<f32> {
        self.score
    }

    /// Text handed to the embedder: context header, docstring, content,
    /// each separated by a blank line, skipping absent fields (§4.9 step 6).
    pub fn embedding_text(&self) -> String {
        let mut parts = Vec::new();
        if let Some(h) = &self.context_header {
            parts.push(h.clone());
        }
        if let Some(d) = &self.docstring {
            parts.push(d.clone());
        }
        parts.push(self.content.clone());
        parts.join("\n\n")
    }

    pub fn ranked_score(&self) -> f32 {
        self.score.unwrap_or(0.0) * self.retrieval_weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_deterministic() {
        let a = chunk_id("repo", "a.py", "greet", 1);
        let b = chunk_id("repo", "a.py", "greet", 1);
        assert_eq!(a, b);
        assert_eq!(a.len(), 36);
        assert_eq!(a.chars().filter(|c| *c == '-').count(), 4);
    }

    #[test]
    fn id_changes_with_any_component() {
        let base = chunk_id("repo", "a.py", "greet", 1);
        assert_ne!(base, chunk_id("repo2", "a.py", "greet", 1));
        assert_ne!(base, chunk_id("repo", "b.py", "greet", 1));
        assert_ne!(base, chunk_id("repo", "a.py", "other", 1));
        assert_ne!(base, chunk_id("repo", "a.py", "greet", 2));
    }

    #[test]
    fn split_module_handles_dotted_and_bare() {
        assert_eq!(
            split_module("pkg.sub.mod"),
            ("pkg".to_string(), Some("sub.mod".to_string()))
        );
        assert_eq!(split_module("pkg"), ("pkg".to_string(), None));
    }

    #[test]
    fn is_test_sets_weight() {
        let chunk = Chunk::new(
            "repo",
            "tests/test_x.py",
            1,
            2,
            ChunkType::Code,
            ChunkKind::Function,
            "x",
            "def f(): pass",
            Language::Python,
        )
        .with_is_test(true);
        assert_eq!(chunk.retrieval_weight(), WEIGHT_TEST);
    }

    #[test]
    fn embedding_text_joins_present_fields() {
        let chunk = Chunk::new(
            "repo",
            "a.py",
            1,
            2,
            ChunkType::Code,
            ChunkKind::Method,
            "a",
            "def greet(self): ...",
            Language::Python,
        )
        .with_context_header("# a.py\n# class Greeter")
        .with_docstring("Says hello.");
        let text = chunk.embedding_text();
        assert!(text.contains("class Greeter"));
        assert!(text.contains("Says hello."));
        assert!(text.contains("def greet"));
    }
}
