use async_trait::async_trait;

use crate::domain::{DomainError, Language, Relationship, Symbol};

/// Language-agnostic AST wrapper (§4.1). Implementations are polymorphic over
/// the capability set {extract symbols, extract relationships}; variants are
/// the supported languages.
#[async_trait]
pub trait ParserService: Send + Sync {
    /// Extract top-level functions/classes, methods, and nested functions.
    /// Fails with `UnsupportedLanguage` for an extension outside
    /// `supported_languages`; a grammar error is a `ParseError`, never a panic.
    async fn extract_symbols(
        &self,
        content: &str,
        file_path: &str,
        language: Language,
    ) -> Result<Vec<Symbol>, DomainError>;

    /// Extract `imports`/`calls`/`extends` edges (§4.1).
    async fn extract_relationships(
        &self,
        content: &str,
        file_path: &str,
        language: Language,
    ) -> Result<Vec<Relationship>, DomainError>;

    fn supported_languages(&self) -> Vec<Language>;

    fn supports_language(&self, language: Language) -> bool {
        self.supported_languages().contains(&language)
    }
}
