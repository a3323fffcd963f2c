use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, warn};

use crate::application::{Cache, EmbeddingService, GraphRepository, IndexPipeline, MetricsSink, ParserService, SearchRouter, VectorRepository};
use crate::connector::adapter::{default_metrics_path, FileMetricsSink, Neo4jGraphRepository, QdrantVectorRepository, RedisCache, TreeSitterParser, VoyageEmbedder};
use crate::domain::GlobalConfig;

pub struct ContainerConfig {
    pub data_dir: String,
    pub global: GlobalConfig,
}

/// Wires the concrete Voyage/Qdrant/Neo4j/Redis adapters into the use cases
/// (§6), degrading gracefully per §7 when the graph store or cache is absent
/// or unreachable rather than failing the whole process.
pub struct Container {
    parser: Arc<TreeSitterParser>,
    embedding: Arc<dyn EmbeddingService>,
    vector_repo: Arc<dyn VectorRepository>,
    graph_repo: Option<Arc<dyn GraphRepository>>,
    cache: Option<Arc<dyn Cache>>,
    metrics: Arc<dyn MetricsSink>,
    query_ttl: Duration,
    config: ContainerConfig,
}

impl Container {
    pub async fn new(config: ContainerConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        let parser = Arc::new(TreeSitterParser::new());

        let embedding: Arc<dyn EmbeddingService> = Arc::new(VoyageEmbedder::from_env()?);

        let qdrant_url = std::env::var("QDRANT_URL").unwrap_or_else(|_| {
            config
                .global
                .storage
                .vector_url
                .clone()
                .unwrap_or_else(|| "http://localhost:6334".to_string())
        });
        let vector_repo: Arc<dyn VectorRepository> = Arc::new(QdrantVectorRepository::connect(&qdrant_url, None)?);

        let graph_repo: Option<Arc<dyn GraphRepository>> = {
            let neo4j_url = std::env::var("NEO4J_URL").unwrap_or_else(|_| {
                config.global.storage.graph_url.clone().unwrap_or_else(|| "bolt://localhost:7687".to_string())
            });
            let user = std::env::var("NEO4J_USER").unwrap_or_else(|_| "neo4j".to_string());
            let password = std::env::var("NEO4J_PASSWORD").unwrap_or_default();
            match Neo4jGraphRepository::connect(&neo4j_url, &user, &password).await {
                Ok(graph) => {
                    debug!("connected to graph store at {neo4j_url}");
                    Some(Arc::new(graph) as Arc<dyn GraphRepository>)
                }
                Err(e) => {
                    warn!("graph store unavailable ({e}); continuing without graph expansion or incremental mode");
                    None
                }
            }
        };

        let cache: Option<Arc<dyn Cache>> = {
            let redis_url = std::env::var("REDIS_URL").unwrap_or_else(|_| {
                config.global.storage.cache_url.clone().unwrap_or_else(|| "redis://localhost:6379".to_string())
            });
            match RedisCache::connect(&redis_url).await {
                Ok(cache) => {
                    debug!("connected to cache at {redis_url}");
                    Some(Arc::new(cache) as Arc<dyn Cache>)
                }
                Err(e) => {
                    warn!("cache unavailable ({e}); downgrading to cache-less mode");
                    None
                }
            }
        };

        let metrics_path = default_metrics_path(&PathBuf::from(&config.data_dir));
        let metrics: Arc<dyn MetricsSink> = Arc::new(FileMetricsSink::new(metrics_path));

        let query_ttl = Duration::from_secs(config.global.cache.query_ttl_minutes * 60);

        Ok(Self {
            parser,
            embedding,
            vector_repo,
            graph_repo,
            cache,
            metrics,
            query_ttl,
            config,
        })
    }

    pub fn index_pipeline(&self) -> IndexPipeline {
        let mut pipeline = IndexPipeline::new(
            self.parser.clone() as Arc<dyn ParserService>,
            self.embedding.clone(),
            self.vector_repo.clone(),
            self.metrics.clone(),
        );
        if let Some(graph) = &self.graph_repo {
            pipeline = pipeline.with_graph(graph.clone());
        }
        if let Some(cache) = &self.cache {
            pipeline = pipeline.with_cache(cache.clone());
        }
        pipeline
    }

    pub fn search_router(&self) -> SearchRouter {
        let mut router = SearchRouter::new(self.vector_repo.clone(), self.embedding.clone(), self.metrics.clone(), self.query_ttl);
        if let Some(graph) = &self.graph_repo {
            router = router.with_graph(graph.clone());
        }
        if let Some(cache) = &self.cache {
            router = router.with_cache(cache.clone());
        }
        router
    }

    pub fn cache(&self) -> Option<Arc<dyn Cache>> {
        self.cache.clone()
    }

    pub fn vector_repo(&self) -> Arc<dyn VectorRepository> {
        self.vector_repo.clone()
    }

    pub fn graph_repo(&self) -> Option<Arc<dyn GraphRepository>> {
        self.graph_repo.clone()
    }

    pub fn data_dir(&self) -> &str {
        &self.config.data_dir
    }
}
