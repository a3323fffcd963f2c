use async_trait::async_trait;

use crate::domain::DomainError;

/// A single observation emitted by the indexing or search path (§4.14).
#[derive(Debug, Clone)]
pub enum MetricEvent {
    IndexRun {
        repo: String,
        files_indexed: u64,
        chunks_written: u64,
        duration_ms: u64,
    },
    SearchQuery {
        repo: String,
        query_type: String,
        result_count: usize,
        duration_ms: u64,
        cache_hit: bool,
    },
    InvalidationRun {
        repo: String,
        files_changed: u64,
        duration_ms: u64,
    },
}

/// Append-only sink for [`MetricEvent`]s. Never fatal to the pipeline that
/// emits them — implementations swallow their own I/O errors and log instead.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn record(&self, event: MetricEvent) -> Result<(), DomainError>;
}
