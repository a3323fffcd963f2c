use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::application::interfaces::{Cache, EmbeddingService, GraphRepository, MetricEvent, MetricsSink, ParserService, VectorRepository};
use crate::application::use_cases::chunker::{chunk_navigation_doc, chunk_patterns, Chunker};
use crate::application::use_cases::invalidation_hook::stale_marker_key;
use crate::application::use_cases::pattern_detector::{self, DEFAULT_MIN_CLUSTER_SIZE, DEFAULT_SIMILARITY_THRESHOLD};
use crate::application::use_cases::search_router::VECTOR_COLLECTION;
use crate::application::use_cases::walker::Walker;
use crate::domain::{compute_file_hash, Chunk, DomainError, Language, RepoConfig, Symbol};

const EMBED_BATCH_SIZE: usize = 64;
const UPSERT_BATCH_SIZE: usize = 100;
const NAVIGATION_FILE_NAMES: &[&str] = &["AGENTS.md", "CLAUDE.md"];

/// Per-file failure collected during a run rather than surfaced immediately.
#[derive(Debug, Clone)]
pub struct FileError {
    pub file_path: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct IndexResult {
    pub files_processed: u64,
    pub files_skipped: u64,
    pub chunks_created: u64,
    pub errors: Vec<FileError>,
}

/// Orchestrates walk → parse → chunk → pattern → embed → store for one
/// repository, with incremental re-indexing driven by per-file content
/// hashes (§4.9).
pub struct IndexPipeline {
    parser: Arc<dyn ParserService>,
    embedding: Arc<dyn EmbeddingService>,
    vector_repo: Arc<dyn VectorRepository>,
    graph_repo: Option<Arc<dyn GraphRepository>>,
    cache: Option<Arc<dyn Cache>>,
    metrics: Arc<dyn MetricsSink>,
    hierarchical: bool,
}

impl IndexPipeline {
    pub fn new(
        parser: Arc<dyn ParserService>,
        embedding: Arc<dyn EmbeddingService>,
        vector_repo: Arc<dyn VectorRepository>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            parser,
            embedding,
            vector_repo,
            graph_repo: None,
            cache: None,
            metrics,
            hierarchical: false,
        }
    }

    pub fn with_graph(mut self, graph_repo: Arc<dyn GraphRepository>) -> Self {
        self.graph_repo = Some(graph_repo);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_hierarchical_chunking(mut self, hierarchical: bool) -> Self {
        self.hierarchical = hierarchical;
        self
    }

    /// Consumes the out-of-band stale marker for a file, if one was set by
    /// the invalidation hook (§4.12). Returns `true` when the file must be
    /// re-indexed regardless of an unchanged content hash.
    async fn take_stale_marker(&self, repo_name: &str, relative_path: &str) -> bool {
        let Some(cache) = &self.cache else {
            return false;
        };
        let marker_key = stale_marker_key(repo_name, relative_path);
        match cache.get(&marker_key).await {
            Ok(Some(_)) => {
                if let Err(e) = cache.delete(&marker_key).await {
                    warn!("failed to clear stale marker for {relative_path}: {e}");
                }
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!("failed to check stale marker for {relative_path}: {e}");
                false
            }
        }
    }

    pub async fn index(&self, repo_path: &Path, repo_name: &str, config: &RepoConfig, incremental: bool) -> Result<IndexResult, DomainError> {
        let started = Instant::now();
        let mut result = IndexResult::default();

        self.vector_repo.ensure_collection(VECTOR_COLLECTION, self.embedding.dimension()).await?;

        let previous_hashes = if incremental {
            match &self.graph_repo {
                Some(graph) => graph.get_all_file_hashes(repo_name).await.unwrap_or_default(),
                None => HashMap::new(),
            }
        } else {
            HashMap::new()
        };

        let walker = Walker::new(&config.include, &config.exclude)?;
        let files = walker.walk(repo_path);

        let chunker = Chunker::new(self.hierarchical);
        let mut all_chunks: Vec<Chunk> = Vec::new();
        let mut all_symbols: Vec<Symbol> = Vec::new();
        let mut new_hashes: HashMap<String, String> = HashMap::new();
        let mut relationship_edges = Vec::new();

        for file in &files {
            let relative_path = file.strip_prefix(repo_path).unwrap_or(file).to_string_lossy().replace('\\', "/");
            let file_name = file.file_name().and_then(|n| n.to_str()).unwrap_or_default();

            let content = match tokio::fs::read_to_string(file).await {
                Ok(c) => c,
                Err(e) => {
                    warn!("failed to read {relative_path}: {e}");
                    result.errors.push(FileError { file_path: relative_path.clone(), message: e.to_string() });
                    continue;
                }
            };

            let content_hash = compute_file_hash(&content);
            if incremental {
                if let Some(prev) = previous_hashes.get(&relative_path) {
                    if prev == &content_hash {
                        if !self.take_stale_marker(repo_name, &relative_path).await {
                            result.files_skipped += 1;
                            continue;
                        }
                        debug!("{relative_path} marked stale out-of-band; re-indexing despite unchanged hash");
                    }
                }
            }

            if NAVIGATION_FILE_NAMES.contains(&file_name) {
                let chunks = chunk_navigation_doc(repo_name, &relative_path, &content);
                result.chunks_created += chunks.len() as u64;
                all_chunks.extend(chunks);
                new_hashes.insert(relative_path, content_hash);
                result.files_processed += 1;
                continue;
            }

            let language = Language::from_path(file);
            if language == Language::Unknown {
                continue;
            }

            let symbols = match self.parser.extract_symbols(&content, &relative_path, language).await {
                Ok(s) => s,
                Err(e) => {
                    warn!("failed to parse {relative_path}: {e}");
                    result.errors.push(FileError { file_path: relative_path.clone(), message: e.to_string() });
                    continue;
                }
            };
            let relationships = match self.parser.extract_relationships(&content, &relative_path, language).await {
                Ok(r) => r,
                Err(e) => {
                    warn!("failed to extract relationships from {relative_path}: {e}");
                    Vec::new()
                }
            };

            let chunks = chunker.chunk_file(repo_name, &relative_path, language, &symbols);
            debug!("chunked {relative_path} into {} chunks", chunks.len());

            result.chunks_created += chunks.len() as u64;
            all_chunks.extend(chunks);
            all_symbols.extend(symbols);
            relationship_edges.extend(relationships);
            new_hashes.insert(relative_path, content_hash);
            result.files_processed += 1;
        }

        let patterns = pattern_detector::detect_patterns(repo_name, &all_symbols, DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_MIN_CLUSTER_SIZE);
        if !patterns.is_empty() {
            let member_files: std::collections::HashSet<&str> =
                patterns.iter().flat_map(|p| p.members().iter().map(String::as_str)).collect();
            for chunk in all_chunks.iter_mut() {
                if member_files.contains(chunk.file_path()) {
                    if let Some(pattern) = patterns.iter().find(|p| p.members().iter().any(|m| m == chunk.file_path())) {
                        chunk.set_follows_pattern(pattern.name());
                    }
                }
            }
            let pattern_chunks = chunk_patterns(repo_name, &patterns);
            result.chunks_created += pattern_chunks.len() as u64;
            all_chunks.extend(pattern_chunks);
        }

        self.embed_chunks(&mut all_chunks).await?;

        for batch in all_chunks.chunks(UPSERT_BATCH_SIZE) {
            self.vector_repo.upsert(VECTOR_COLLECTION, batch).await?;
        }

        if let Some(graph) = &self.graph_repo {
            self.upsert_graph(graph, repo_name, &new_hashes, &all_symbols, &relationship_edges, &patterns).await?;
        }

        if let Some(cache) = &self.cache {
            let _ = cache.incr_index_version(repo_name).await;
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        let _ = self
            .metrics
            .record(MetricEvent::IndexRun {
                repo: repo_name.to_string(),
                files_indexed: result.files_processed,
                chunks_written: result.chunks_created,
                duration_ms,
            })
            .await;

        info!(
            "indexed {} ({} files, {} chunks, {} skipped) in {}ms",
            repo_name, result.files_processed, result.chunks_created, result.files_skipped, duration_ms
        );

        Ok(result)
    }

    async fn embed_chunks(&self, chunks: &mut [Chunk]) -> Result<(), DomainError> {
        for batch_start in (0..chunks.len()).step_by(EMBED_BATCH_SIZE) {
            let batch_end = (batch_start + EMBED_BATCH_SIZE).min(chunks.len());
            let texts: Vec<String> = chunks[batch_start..batch_end].iter().map(Chunk::embedding_text).collect();
            let vectors = self.embedding.embed_batch(&texts).await?;
            for (chunk, vector) in chunks[batch_start..batch_end].iter_mut().zip(vectors.into_iter()) {
                chunk.set_vector(vector);
            }
        }
        Ok(())
    }

    async fn upsert_graph(
        &self,
        graph: &Arc<dyn GraphRepository>,
        repo_name: &str,
        file_hashes: &HashMap<String, String>,
        symbols: &[Symbol],
        relationships: &[crate::domain::Relationship],
        patterns: &[crate::domain::Pattern],
    ) -> Result<(), DomainError> {
        graph.ensure_schema().await?;
        graph.upsert_repository(repo_name).await?;

        let now = crate::domain::now_unix();
        for (path, hash) in file_hashes {
            graph.upsert_file(repo_name, path, hash, now).await?;
        }
        for symbol in symbols {
            graph.upsert_symbol(repo_name, symbol.file_path(), symbol).await?;
        }
        for edge in relationships {
            graph.upsert_relationship(repo_name, edge).await?;
        }
        for pattern in patterns {
            graph.upsert_pattern(repo_name, pattern.module(), pattern).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as StdHashMap;
    use std::sync::Mutex as StdMutex;

    #[test]
    fn file_error_carries_path_and_message() {
        let err = FileError { file_path: "a.py".into(), message: "boom".into() };
        assert_eq!(err.file_path, "a.py");
    }

    struct FakeCache {
        entries: StdMutex<StdHashMap<String, String>>,
    }

    impl FakeCache {
        fn new() -> Self {
            Self { entries: StdMutex::new(StdHashMap::new()) }
        }
    }

    #[async_trait::async_trait]
    impl crate::application::interfaces::Cache for FakeCache {
        async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str, _ttl: std::time::Duration) -> Result<(), DomainError> {
            self.entries.lock().unwrap().insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<(), DomainError> {
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }

        async fn incr_index_version(&self, _repo: &str) -> Result<i64, DomainError> {
            Ok(1)
        }

        async fn index_version(&self, _repo: &str) -> Result<i64, DomainError> {
            Ok(1)
        }
    }

    fn pipeline_with_cache(cache: Arc<dyn Cache>) -> IndexPipeline {
        struct NoopParser;
        #[async_trait::async_trait]
        impl ParserService for NoopParser {
            async fn extract_symbols(&self, _content: &str, _file_path: &str, _language: Language) -> Result<Vec<Symbol>, DomainError> {
                Ok(Vec::new())
            }
            async fn extract_relationships(&self, _content: &str, _file_path: &str, _language: Language) -> Result<Vec<crate::domain::Relationship>, DomainError> {
                Ok(Vec::new())
            }
            fn supported_languages(&self) -> Vec<Language> {
                Vec::new()
            }
        }

        struct NoopEmbedding;
        #[async_trait::async_trait]
        impl EmbeddingService for NoopEmbedding {
            async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
                Ok(Vec::new())
            }
            fn dimension(&self) -> usize {
                1
            }
        }

        struct NoopVectorRepo;
        #[async_trait::async_trait]
        impl VectorRepository for NoopVectorRepo {
            async fn ensure_collection(&self, _collection: &str, _dimension: usize) -> Result<(), DomainError> {
                Ok(())
            }
            async fn upsert(&self, _collection: &str, _chunks: &[Chunk]) -> Result<(), DomainError> {
                Ok(())
            }
            async fn search(
                &self,
                _collection: &str,
                _vector: &[f32],
                _limit: usize,
                _filter: &crate::application::interfaces::Filter,
            ) -> Result<Vec<Chunk>, DomainError> {
                Ok(Vec::new())
            }
            async fn scroll(&self, _collection: &str, _filter: &crate::application::interfaces::Filter, _limit: usize) -> Result<Vec<Chunk>, DomainError> {
                Ok(Vec::new())
            }
            async fn collection_info(&self, _name: &str) -> Result<crate::application::interfaces::CollectionInfo, DomainError> {
                Ok(crate::application::interfaces::CollectionInfo {
                    points_count: 0,
                    dimension: 1,
                    status: crate::application::interfaces::CollectionStatus::Green,
                })
            }
            async fn delete_collection(&self, _name: &str) -> Result<(), DomainError> {
                Ok(())
            }
            async fn delete_by_repo(&self, _collection: &str, _repo: &str) -> Result<(), DomainError> {
                Ok(())
            }
            async fn delete_by_file(&self, _collection: &str, _repo: &str, _file_path: &str) -> Result<u64, DomainError> {
                Ok(0)
            }
        }

        struct NoopMetrics;
        #[async_trait::async_trait]
        impl MetricsSink for NoopMetrics {
            async fn record(&self, _event: MetricEvent) -> Result<(), DomainError> {
                Ok(())
            }
        }

        IndexPipeline::new(Arc::new(NoopParser), Arc::new(NoopEmbedding), Arc::new(NoopVectorRepo), Arc::new(NoopMetrics)).with_cache(cache)
    }

    #[tokio::test]
    async fn unchanged_hash_without_marker_stays_skipped() {
        let cache: Arc<dyn Cache> = Arc::new(FakeCache::new());
        let pipeline = pipeline_with_cache(cache);
        assert!(!pipeline.take_stale_marker("demo", "src/main.py").await);
    }

    #[tokio::test]
    async fn stale_marker_forces_reindex_and_is_cleared() {
        let fake = Arc::new(FakeCache::new());
        let cache: Arc<dyn Cache> = fake.clone();
        let key = stale_marker_key("demo", "src/main.py");
        cache.set(&key, "1", std::time::Duration::ZERO).await.unwrap();

        let pipeline = pipeline_with_cache(cache.clone());
        assert!(pipeline.take_stale_marker("demo", "src/main.py").await);
        assert_eq!(cache.get(&key).await.unwrap(), None);
    }
}
