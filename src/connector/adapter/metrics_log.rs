use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

use crate::application::{MetricEvent, MetricsSink};
use crate::domain::DomainError;

#[derive(Serialize)]
#[serde(tag = "event")]
enum MetricLine<'a> {
    #[serde(rename = "index_run")]
    IndexRun { repo: &'a str, files_indexed: u64, chunks_written: u64, duration_ms: u64 },
    #[serde(rename = "search_query")]
    SearchQuery { repo: &'a str, query_type: &'a str, result_count: usize, duration_ms: u64, cache_hit: bool },
    #[serde(rename = "invalidation_run")]
    InvalidationRun { repo: &'a str, files_changed: u64, duration_ms: u64 },
}

/// Append-only, fire-and-forget JSON-lines metrics sink (§4.14). Write-only
/// by design — no analysis path is implemented, matching the Non-goals.
/// Guarded by a plain `std::sync::Mutex` rather than an async one: each
/// write is a single synchronous `write_all` and never holds the lock
/// across an await point.
pub struct FileMetricsSink {
    path: PathBuf,
    writer: Mutex<()>,
}

impl FileMetricsSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), writer: Mutex::new(()) }
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let _guard = self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{line}")
    }
}

#[async_trait]
impl MetricsSink for FileMetricsSink {
    async fn record(&self, event: MetricEvent) -> Result<(), DomainError> {
        let line = match &event {
            MetricEvent::IndexRun { repo, files_indexed, chunks_written, duration_ms } => {
                serde_json::to_string(&MetricLine::IndexRun { repo, files_indexed: *files_indexed, chunks_written: *chunks_written, duration_ms: *duration_ms })
            }
            MetricEvent::SearchQuery { repo, query_type, result_count, duration_ms, cache_hit } => serde_json::to_string(&MetricLine::SearchQuery {
                repo,
                query_type,
                result_count: *result_count,
                duration_ms: *duration_ms,
                cache_hit: *cache_hit,
            }),
            MetricEvent::InvalidationRun { repo, files_changed, duration_ms } => {
                serde_json::to_string(&MetricLine::InvalidationRun { repo, files_changed: *files_changed, duration_ms: *duration_ms })
            }
        };

        match line {
            Ok(line) => {
                if let Err(e) = self.append(&line) {
                    warn!("failed to append metrics line to {}: {e}", self.path.display());
                }
            }
            Err(e) => warn!("failed to serialize metric event: {e}"),
        }
        Ok(())
    }
}

pub fn default_metrics_path(data_dir: &Path) -> PathBuf {
    data_dir.join("metrics.jsonl")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appends_one_json_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.jsonl");
        let sink = FileMetricsSink::new(&path);

        sink.record(MetricEvent::IndexRun { repo: "demo".into(), files_indexed: 3, chunks_written: 9, duration_ms: 42 }).await.unwrap();
        sink.record(MetricEvent::SearchQuery { repo: "demo".into(), query_type: "symbol".into(), result_count: 2, duration_ms: 5, cache_hit: true })
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"event\":\"index_run\""));
        assert!(lines[1].contains("\"cache_hit\":true"));
    }
}
