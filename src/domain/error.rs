use thiserror::Error;

/// Unified error type crossing every module boundary in this crate.
///
/// Adapters translate backend-specific failures into one of these variants;
/// callers never see a `qdrant_client`, `neo4rs`, or `redis` error directly.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("unsupported language for extension: {0}")]
    UnsupportedLanguage(String),

    #[error("parse error in {file}: {message}")]
    ParseError { file: String, message: String },

    #[error("embedding failure: {0}")]
    EmbeddingFailure(String),

    #[error("store failure: {0}")]
    StoreFailure(String),

    #[error("cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("graph store unavailable: {0}")]
    GraphUnavailable(String),

    #[error("invalid cursor: {0}")]
    InvalidCursor(String),

    #[error("config missing: {0}")]
    ConfigMissing(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn parse_error(file: impl Into<String>, message: impl Into<String>) -> Self {
        DomainError::ParseError {
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        DomainError::StoreFailure(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        DomainError::NotFound(message.into())
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        DomainError::AlreadyExists(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        DomainError::InvalidInput(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        DomainError::Internal(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::NotFound(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, DomainError::AlreadyExists(_))
    }

    /// Per component-design §4.9: embedding and store failures abort an index run;
    /// everything else is either recoverable or already file-scoped.
    pub fn is_fatal_to_pipeline(&self) -> bool {
        matches!(
            self,
            DomainError::EmbeddingFailure(_) | DomainError::StoreFailure(_)
        )
    }
}
