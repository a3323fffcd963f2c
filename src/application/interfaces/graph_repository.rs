use async_trait::async_trait;
use std::collections::HashMap;

use crate::domain::{DomainError, Pattern, Relationship, Symbol};

/// Typed nodes/edges for repo/module/file/symbol; upserts, hash lookups, and
/// bounded expansion queries (§4.7). Backed by Neo4j.
#[async_trait]
pub trait GraphRepository: Send + Sync {
    /// Creates the constraints and indexes listed in §4.7. Idempotent.
    async fn ensure_schema(&self) -> Result<(), DomainError>;

    async fn upsert_repository(&self, repo: &str) -> Result<(), DomainError>;

    async fn upsert_module(&self, repo: &str, path: &str) -> Result<(), DomainError>;

    async fn upsert_file(&self, repo: &str, path: &str, content_hash: &str, indexed_at: i64) -> Result<(), DomainError>;

    async fn upsert_symbol(&self, repo: &str, file_path: &str, symbol: &Symbol) -> Result<(), DomainError>;

    async fn upsert_pattern(&self, repo: &str, module: &str, pattern: &Pattern) -> Result<(), DomainError>;

    async fn upsert_relationship(&self, repo: &str, relationship: &Relationship) -> Result<(), DomainError>;

    async fn find_symbol_by_name(&self, repo: &str, name: &str) -> Result<Vec<String>, DomainError>;

    async fn find_callers(&self, repo: &str, name: &str) -> Result<Vec<String>, DomainError>;

    async fn find_callees(&self, repo: &str, name: &str) -> Result<Vec<String>, DomainError>;

    /// Importers/importees (both directions) first, then one-hop CALLS
    /// neighbors via shared symbols — ranking decided per DESIGN.md.
    async fn find_related_files(&self, repo: &str, path: &str, limit: usize) -> Result<Vec<String>, DomainError>;

    /// Bounded traversal over CALLS|EXTENDS|CONTAINS starting from `names`.
    async fn expand_from_symbols(
        &self,
        repo: &str,
        names: &[String],
        depth: u32,
        limit: usize,
    ) -> Result<Vec<String>, DomainError>;

    async fn get_file_hash(&self, repo: &str, path: &str) -> Result<Option<String>, DomainError>;

    async fn get_all_file_hashes(&self, repo: &str) -> Result<HashMap<String, String>, DomainError>;

    async fn delete_file(&self, repo: &str, path: &str) -> Result<(), DomainError>;

    async fn delete_repository(&self, repo: &str) -> Result<(), DomainError>;
}
