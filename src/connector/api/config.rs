use std::path::Path;

use crate::domain::{DomainError, GlobalConfig, RepoConfig, RepoConfigFile};

/// Loads the per-repo YAML config from `<repo_path>/codeindex.yaml` under the
/// top-level `code-index` key (§6). Missing file is an error for indexing.
pub async fn load_repo_config(repo_path: &Path) -> Result<RepoConfig, DomainError> {
    let path = repo_path.join("codeindex.yaml");
    let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
        DomainError::ConfigMissing(format!("repo config not found at {}: {e}", path.display()))
    })?;
    let parsed: RepoConfigFile = serde_yaml::from_str(&content)
        .map_err(|e| DomainError::ConfigMissing(format!("invalid repo config {}: {e}", path.display())))?;
    Ok(parsed.code_index)
}

/// Loads the process-wide YAML config. A missing file yields
/// [`GlobalConfig::default`] rather than an error (§6).
pub async fn load_global_config(path: &Path) -> GlobalConfig {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => match serde_yaml::from_str(&content) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!("failed to parse global config {}: {e}. Using defaults.", path.display());
                GlobalConfig::default()
            }
        },
        Err(_) => GlobalConfig::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_repo_config_is_config_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_repo_config(dir.path()).await.unwrap_err();
        assert!(matches!(err, DomainError::ConfigMissing(_)));
    }

    #[tokio::test]
    async fn missing_global_config_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_global_config(&dir.path().join("nope.yaml")).await;
        assert_eq!(cfg.embedding.provider, "voyage");
    }

    #[tokio::test]
    async fn repo_config_loads_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(
            dir.path().join("codeindex.yaml"),
            "code-index:\n  name: demo\n  default_branch: main\n",
        )
        .await
        .unwrap();
        let cfg = load_repo_config(dir.path()).await.unwrap();
        assert_eq!(cfg.name, "demo");
    }
}
