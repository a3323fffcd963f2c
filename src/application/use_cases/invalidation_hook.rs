use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::application::interfaces::Cache;

const WALL_CLOCK_BOUND: Duration = Duration::from_secs(5);

/// Invoked by an external file-edit signal with an absolute path. Locates the
/// enclosing repo, bumps its index version, and writes a stale marker so the
/// next incremental pipeline run treats the file as dirty regardless of hash
/// comparison. Never propagates errors — every failure is logged and
/// swallowed (§4.12, §7).
pub async fn invalidate(cache: &Arc<dyn Cache>, repos_root: &Path, edited_path: &Path) {
    let result = tokio::time::timeout(WALL_CLOCK_BOUND, invalidate_inner(cache, repos_root, edited_path)).await;
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("invalidation hook failed for {}: {e}", edited_path.display()),
        Err(_) => warn!("invalidation hook timed out for {}", edited_path.display()),
    }
}

async fn invalidate_inner(cache: &Arc<dyn Cache>, repos_root: &Path, edited_path: &Path) -> Result<(), crate::domain::DomainError> {
    let repo_name = enclosing_repo(repos_root, edited_path)
        .ok_or_else(|| crate::domain::DomainError::invalid_input("path is not under the repos root"))?;

    cache.incr_index_version(&repo_name).await?;

    let relative_path = edited_path
        .strip_prefix(repos_root.join(&repo_name))
        .unwrap_or(edited_path)
        .to_string_lossy()
        .replace('\\', "/");
    let marker_key = stale_marker_key(&repo_name, &relative_path);
    cache.set(&marker_key, "1", Duration::ZERO).await?;
    Ok(())
}

/// First path component of `edited_path` relative to `repos_root`.
fn enclosing_repo(repos_root: &Path, edited_path: &Path) -> Option<String> {
    let relative = edited_path.strip_prefix(repos_root).ok()?;
    relative.components().next().map(|c| c.as_os_str().to_string_lossy().to_string())
}

/// Cache key for a file's stale marker, keyed by repo name and the same
/// repo-relative path the indexing pipeline uses for its content-hash map.
pub fn stale_marker_key(repo_name: &str, relative_path: &str) -> String {
    format!("stale:{repo_name}:{relative_path}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enclosing_repo_is_first_path_component() {
        let root = Path::new("/repos");
        let edited = Path::new("/repos/demo/src/main.py");
        assert_eq!(enclosing_repo(root, edited), Some("demo".to_string()));
    }

    #[test]
    fn enclosing_repo_is_none_outside_root() {
        let root = Path::new("/repos");
        let edited = Path::new("/elsewhere/main.py");
        assert_eq!(enclosing_repo(root, edited), None);
    }
}
