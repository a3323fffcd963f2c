use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::domain::RepoConfig;

use super::index_pipeline::IndexPipeline;

/// One watched repository: its path and parsed config.
pub struct WatchedRepo {
    pub name: String,
    pub path: PathBuf,
    pub config: RepoConfig,
}

/// Resolves the current commit head for a repo, preferring `git
/// rev-parse HEAD`, falling back to reading `.git/HEAD` and resolving refs,
/// and finally hashing the ref name if neither resolves (§4.12).
pub async fn resolve_head(repo_path: &Path) -> String {
    if let Ok(output) = tokio::process::Command::new("git")
        .arg("rev-parse")
        .arg("HEAD")
        .current_dir(repo_path)
        .output()
        .await
    {
        if output.status.success() {
            if let Ok(head) = String::from_utf8(output.stdout) {
                return head.trim().to_string();
            }
        }
    }

    let head_file = repo_path.join(".git").join("HEAD");
    if let Ok(content) = tokio::fs::read_to_string(&head_file).await {
        let content = content.trim();
        if let Some(ref_path) = content.strip_prefix("ref: ") {
            if let Ok(resolved) = tokio::fs::read_to_string(repo_path.join(".git").join(ref_path)).await {
                return resolved.trim().to_string();
            }
            let digest = Sha256::digest(ref_path.as_bytes());
            return format!("{digest:x}");
        }
        return content.to_string();
    }

    let digest = Sha256::digest(repo_path.to_string_lossy().as_bytes());
    format!("{digest:x}")
}

/// Polls watched repositories at a fixed interval and re-indexes any whose
/// head has changed since the last tick (§4.12, §5).
pub struct Watcher {
    pipeline: Arc<IndexPipeline>,
    repos: Vec<WatchedRepo>,
    tick_interval: Duration,
    last_seen: Mutex<HashMap<String, String>>,
    in_flight: HashMap<String, Arc<Mutex<()>>>,
}

impl Watcher {
    pub fn new(pipeline: Arc<IndexPipeline>, repos: Vec<WatchedRepo>, tick_interval: Duration) -> Self {
        let in_flight = repos.iter().map(|r| (r.name.clone(), Arc::new(Mutex::new(())))).collect();
        Self {
            pipeline,
            repos,
            tick_interval,
            last_seen: Mutex::new(HashMap::new()),
            in_flight,
        }
    }

    /// Runs the tick loop until `cancel` is triggered.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.tick_interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("watcher loop cancelled");
                    return;
                }
                _ = interval.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    async fn tick(&self) {
        for repo in &self.repos {
            let Some(lock) = self.in_flight.get(&repo.name) else { continue };
            let Ok(_guard) = lock.try_lock() else {
                warn!("skipping tick for {}: previous index run still in flight", repo.name);
                continue;
            };

            let head = resolve_head(&repo.path).await;
            let changed = {
                let seen = self.last_seen.lock().await;
                seen.get(&repo.name) != Some(&head)
            };
            if !changed {
                continue;
            }

            info!("detected head change for {}: re-indexing", repo.name);
            match self.pipeline.index(&repo.path, &repo.name, &repo.config, true).await {
                Ok(result) => {
                    self.last_seen.lock().await.insert(repo.name.clone(), head);
                    info!("watcher re-indexed {} ({} files processed)", repo.name, result.files_processed);
                }
                Err(e) => {
                    error!("watcher failed to re-index {}: {e}", repo.name);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolve_head_falls_back_when_not_a_git_repo() {
        let dir = tempfile::tempdir().unwrap();
        let head = resolve_head(dir.path()).await;
        assert_eq!(head.len(), 64);
    }
}
