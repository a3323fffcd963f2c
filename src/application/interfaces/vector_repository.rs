use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Chunk, DomainError};

/// A single field-equality predicate in a [`Filter`]'s conjunction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FilterValue {
    Str(String),
    Bool(bool),
}

/// An ordered conjunction ("must") of field-equality predicates (§4.6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Filter {
    must: Vec<(String, FilterValue)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq_str(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.must.push((field.into(), FilterValue::Str(value.into())));
        self
    }

    pub fn eq_bool(mut self, field: impl Into<String>, value: bool) -> Self {
        self.must.push((field.into(), FilterValue::Bool(value)));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
    }

    pub fn predicates(&self) -> &[(String, FilterValue)] {
        &self.must
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    Green,
    Yellow,
    Red,
}

#[derive(Debug, Clone)]
pub struct CollectionInfo {
    pub points_count: u64,
    pub dimension: usize,
    pub status: CollectionStatus,
}

/// Collection management, upsert, filtered similarity search, and
/// payload-only scroll (§4.6). Backed by Qdrant.
#[async_trait]
pub trait VectorRepository: Send + Sync {
    /// Idempotent: creates `name` with cosine distance at `dimension` if absent.
    async fn ensure_collection(&self, name: &str, dimension: usize) -> Result<(), DomainError>;

    /// Writes each chunk with its vector and full payload (every persisted
    /// chunk field except transient score/the vector on read).
    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<(), DomainError>;

    /// Up to `limit` nearest neighbors by cosine similarity, payload +
    /// score populated, vector field cleared.
    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        filter: &Filter,
    ) -> Result<Vec<Chunk>, DomainError>;

    /// Payload-only filter scan, no scoring.
    async fn scroll(&self, collection: &str, filter: &Filter, limit: usize) -> Result<Vec<Chunk>, DomainError>;

    async fn collection_info(&self, name: &str) -> Result<CollectionInfo, DomainError>;

    async fn delete_collection(&self, name: &str) -> Result<(), DomainError>;

    async fn delete_by_repo(&self, collection: &str, repo: &str) -> Result<(), DomainError>;

    async fn delete_by_file(&self, collection: &str, repo: &str, file_path: &str) -> Result<u64, DomainError>;
}
