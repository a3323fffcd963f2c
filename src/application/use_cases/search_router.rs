use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::application::interfaces::{Cache, EmbeddingService, Filter, GraphRepository, MetricEvent, MetricsSink, VectorRepository};
use crate::application::use_cases::{query_classifier, suggestions};
use crate::domain::{
    now_unix, Chunk, CursorPayload, DomainError, QueryType, SearchQuery, SearchResponse, SearchResultItem, Strategy,
    TestFilter,
};

pub const VECTOR_COLLECTION: &str = "chunks";

/// Executes a classified query against the vector and graph stores,
/// paginates, and write-through caches the serialized response (§4.11).
pub struct SearchRouter {
    vector_repo: Arc<dyn VectorRepository>,
    graph_repo: Option<Arc<dyn GraphRepository>>,
    embedding: Arc<dyn EmbeddingService>,
    cache: Option<Arc<dyn Cache>>,
    metrics: Arc<dyn MetricsSink>,
    query_ttl: Duration,
}

impl SearchRouter {
    pub fn new(
        vector_repo: Arc<dyn VectorRepository>,
        embedding: Arc<dyn EmbeddingService>,
        metrics: Arc<dyn MetricsSink>,
        query_ttl: Duration,
    ) -> Self {
        Self {
            vector_repo,
            graph_repo: None,
            embedding,
            cache: None,
            metrics,
            query_ttl,
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

    pub async fn search(&self, request: SearchQuery) -> Result<SearchResponse, DomainError> {
        let started = Instant::now();

        let offset = match request.cursor() {
            Some(cursor) => CursorPayload::decode(cursor, now_unix())?.o,
            None => 0,
        };

        let query_type = query_classifier::classify(request.query());
        let strategy = Strategy::for_type(query_type);
        let limit = request.limit().min(strategy.max_results);

        let version = self.current_version(request.repo()).await;
        let query_hash = query_hash(request.query(), request.repo(), request.module());
        let cache_key = format!("query:{}:{}:{}", request.repo(), query_hash, version);

        if let Some(cache) = &self.cache {
            if let Ok(Some(cached)) = cache.get(&cache_key).await {
                debug!("cache hit for {cache_key}");
                self.record_metric(&request, query_type, -1, started, true).await;
                return recompute_cursor(cached, offset, limit, &query_hash);
            }
        }

        let filter = self.build_filter(&request);
        let fetch_limit = 2 * limit + offset + 1;

        let mut ranked = self.dispatch(&request, query_type, &strategy, &filter, fetch_limit).await?;

        if let (Some(depth), Some(graph)) = (strategy.graph_expand_depth, &self.graph_repo) {
            ranked = self.expand_via_graph(&request, graph, ranked, depth, fetch_limit).await;
        }

        let total_count = ranked.len();
        let window: Vec<Chunk> = ranked.into_iter().skip(offset).take(limit).collect();
        let has_more = total_count > offset + limit;

        let response = if window.is_empty() && offset == 0 {
            let known = self.known_term_frequency(request.repo()).await;
            let suggestions = suggestions::suggest(request.query(), &known);
            let hint = (!request.is_all_repos())
                .then(|| format!("no results in repo '{}'; try repo=\"all\"", request.repo()));
            SearchResponse::empty(query_type, "no results found for this query", suggestions, hint)
        } else {
            let cursor = if has_more {
                Some(CursorPayload::new(query_hash.clone(), offset + limit, now_unix()).encode()?)
            } else {
                None
            };
            let items: Vec<SearchResultItem> = window.iter().map(SearchResultItem::from).collect();
            SearchResponse::results(query_type, items, total_count, has_more, cursor)
        };

        if let Some(cache) = &self.cache {
            if let Ok(serialized) = serde_json::to_string(&strip_cursor(&response)) {
                let _ = cache.set(&cache_key, &serialized, self.query_ttl).await;
            }
        }

        self.record_metric(&request, query_type, total_count as i64, started, false).await;
        Ok(response)
    }

    async fn current_version(&self, repo: &str) -> i64 {
        match &self.cache {
            Some(cache) => cache.index_version(repo).await.unwrap_or(0),
            None => 0,
        }
    }

    fn build_filter(&self, request: &SearchQuery) -> Filter {
        let mut filter = Filter::new();
        if !request.is_all_repos() {
            filter = filter.eq_str("repo", request.repo());
        }
        if let Some(module) = request.module() {
            filter = filter.eq_str("module_root", module);
        }
        filter = match request.include_tests() {
            TestFilter::Include => filter,
            TestFilter::Exclude => filter.eq_bool("is_test", false),
            TestFilter::Only => filter.eq_bool("is_test", true),
        };
        filter
    }

    async fn dispatch(
        &self,
        request: &SearchQuery,
        query_type: QueryType,
        strategy: &Strategy,
        filter: &Filter,
        fetch_limit: usize,
    ) -> Result<Vec<Chunk>, DomainError> {
        if strategy.symbol_filter {
            if let Some(name) = query_classifier::extract_symbol_name(request.query()) {
                let symbol_filter = filter.clone().eq_str("symbol_name", name);
                let results = self.vector_repo.scroll(VECTOR_COLLECTION, &symbol_filter, fetch_limit).await?;
                if !results.is_empty() {
                    return Ok(rank(results));
                }
            }
            return self.semantic_search(request, filter, fetch_limit).await;
        }

        if strategy.pattern_filter {
            let pattern_filter = filter.clone().eq_str("kind", "pattern");
            let results = self.vector_repo.scroll(VECTOR_COLLECTION, &pattern_filter, fetch_limit).await?;
            if !results.is_empty() {
                return Ok(rank(results));
            }
            return self.semantic_search(request, filter, fetch_limit).await;
        }

        let _ = query_type;
        self.semantic_search(request, filter, fetch_limit).await
    }

    async fn semantic_search(&self, request: &SearchQuery, filter: &Filter, fetch_limit: usize) -> Result<Vec<Chunk>, DomainError> {
        let vectors = self.embedding.embed_batch(&[request.query().to_string()]).await?;
        let vector = vectors.into_iter().next().unwrap_or_default();
        let results = self.vector_repo.search(VECTOR_COLLECTION, &vector, fetch_limit, filter).await?;
        Ok(rank(results))
    }

    async fn expand_via_graph(
        &self,
        request: &SearchQuery,
        graph: &Arc<dyn GraphRepository>,
        mut ranked: Vec<Chunk>,
        depth: u32,
        fetch_limit: usize,
    ) -> Vec<Chunk> {
        let names: Vec<String> = ranked.iter().filter_map(|c| c.symbol_name().map(str::to_string)).collect();
        if names.is_empty() {
            return ranked;
        }
        let expanded = match graph.expand_from_symbols(request.repo(), &names, depth, fetch_limit).await {
            Ok(names) => names,
            Err(e) => {
                warn!("graph expansion unavailable: {e}");
                return ranked;
            }
        };

        let existing: std::collections::HashSet<String> =
            ranked.iter().filter_map(|c| c.symbol_name().map(str::to_string)).collect();

        for name in expanded {
            if existing.contains(&name) {
                continue;
            }
            let filter = Filter::new().eq_str("repo", request.repo()).eq_str("symbol_name", &name);
            if let Ok(found) = self.vector_repo.scroll(VECTOR_COLLECTION, &filter, 1).await {
                for chunk in found {
                    ranked.push(chunk.with_score(0.5));
                }
            }
        }
        ranked
    }

    async fn known_term_frequency(&self, repo: &str) -> HashMap<String, usize> {
        let mut filter = Filter::new();
        if repo != "all" {
            filter = filter.eq_str("repo", repo);
        }
        let chunks = self.vector_repo.scroll(VECTOR_COLLECTION, &filter, 500).await.unwrap_or_default();
        let mut freq = HashMap::new();
        for chunk in &chunks {
            if let Some(name) = chunk.symbol_name() {
                *freq.entry(name.to_lowercase()).or_insert(0) += 1;
            }
            *freq.entry(chunk.module_root().to_lowercase()).or_insert(0) += 1;
        }
        freq
    }

    async fn record_metric(&self, request: &SearchQuery, query_type: QueryType, result_count: i64, started: Instant, cache_hit: bool) {
        let event = MetricEvent::SearchQuery {
            repo: request.repo().to_string(),
            query_type: query_type.as_str().to_string(),
            result_count: result_count.max(0) as usize,
            duration_ms: started.elapsed().as_millis() as u64,
            cache_hit,
        };
        if let Err(e) = self.metrics.record(event).await {
            warn!("failed to record search metric: {e}");
        }
        info!(
            "search query_type={} repo={} results={} cache_hit={}",
            query_type, request.repo(), result_count, cache_hit
        );
    }
}

fn rank(mut chunks: Vec<Chunk>) -> Vec<Chunk> {
    chunks.sort_by(|a, b| b.ranked_score().partial_cmp(&a.ranked_score()).unwrap_or(std::cmp::Ordering::Equal));
    chunks
}

/// 16-hex-character prefix of SHA-256 over colon-joined (query, repo, module).
pub fn query_hash(query: &str, repo: &str, module: Option<&str>) -> String {
    let joined = format!("{}:{}:{}", query, repo, module.unwrap_or(""));
    let digest = Sha256::digest(joined.as_bytes());
    digest.iter().take(8).map(|b| format!("{b:02x}")).collect()
}

/// Cached payloads never carry a cursor (decided in DESIGN.md): on a cache
/// hit the cursor is recomputed fresh against the current offset.
fn strip_cursor(response: &SearchResponse) -> SearchResponse {
    match response {
        SearchResponse::Results { query_type, results, total_count, has_more, .. } => SearchResponse::Results {
            query_type: *query_type,
            results: results.clone(),
            total_count: *total_count,
            has_more: *has_more,
            cursor: None,
        },
        other => other.clone(),
    }
}

fn recompute_cursor(cached_json: String, offset: usize, limit: usize, query_hash: &str) -> Result<SearchResponse, DomainError> {
    let mut response: SearchResponse =
        serde_json::from_str(&cached_json).map_err(|e| DomainError::internal(format!("corrupt cache entry: {e}")))?;
    if let SearchResponse::Results { cursor, has_more, .. } = &mut response {
        if *has_more {
            *cursor = Some(CursorPayload::new(query_hash, offset + limit, now_unix()).encode()?);
        }
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_hash_is_deterministic_and_sensitive_to_inputs() {
        let a = query_hash("find auth", "repo1", None);
        let b = query_hash("find auth", "repo1", None);
        let c = query_hash("find auth", "repo2", None);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
    }
}
