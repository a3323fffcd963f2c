use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-repo YAML config, found at the repo root under the top-level key
/// `code-index` (§6). Missing file is an error for `index`, not for the
/// invalidation hook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoConfigFile {
    #[serde(rename = "code-index")]
    pub code_index: RepoConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoConfig {
    pub name: String,
    pub default_branch: String,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub submodules: BTreeMap<String, String>,
}

/// Process-wide YAML config (§6). Missing file yields [`GlobalConfig::default`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_provider() -> String {
    "voyage".to_string()
}

fn default_model() -> String {
    "voyage-code-3".to_string()
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    pub vector_url: Option<String>,
    pub graph_url: Option<String>,
    pub cache_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: u64,
    #[serde(default = "default_max_files")]
    pub max_files: u32,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_size_mb() -> u64 {
    50
}

fn default_max_files() -> u32 {
    5
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_size_mb: default_max_size_mb(),
            max_files: default_max_files(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_query_ttl_minutes")]
    pub query_ttl_minutes: u64,
}

fn default_query_ttl_minutes() -> u64 {
    15
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            query_ttl_minutes: default_query_ttl_minutes(),
        }
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            embedding: EmbeddingConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

/// Repository bookkeeping record (ambient addition): indexing status used by
/// the CLI's `stats`/`list` commands. Not part of the chunk/graph data model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    id: String,
    name: String,
    path: String,
    created_at: i64,
    updated_at: i64,
    chunk_count: u64,
    file_count: u64,
}

impl Repository {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        let now = super::now_unix();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            path: path.into(),
            created_at: now,
            updated_at: now,
            chunk_count: 0,
            file_count: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn chunk_count(&self) -> u64 {
        self.chunk_count
    }

    pub fn file_count(&self) -> u64 {
        self.file_count
    }

    pub fn update_stats(&mut self, chunk_count: u64, file_count: u64) {
        self.chunk_count = chunk_count;
        self.file_count = file_count;
        self.updated_at = super::now_unix();
    }

    pub fn is_indexed(&self) -> bool {
        self.chunk_count > 0
    }

    pub fn average_chunks_per_file(&self) -> f64 {
        if self.file_count == 0 {
            0.0
        } else {
            self.chunk_count as f64 / self.file_count as f64
        }
    }

    pub fn summary(&self) -> String {
        format!("{} ({} files, {} chunks)", self.name, self.file_count, self.chunk_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_config_defaults_match_spec() {
        let cfg = GlobalConfig::default();
        assert_eq!(cfg.embedding.provider, "voyage");
        assert_eq!(cfg.cache.query_ttl_minutes, 15);
    }

    #[test]
    fn repo_config_parses_yaml_shape() {
        let yaml = r#"
code-index:
  name: demo
  default_branch: main
  include: ["**/*.py"]
  exclude: []
  modules:
    core:
      description: core logic
      submodules:
        auth: authentication
"#;
        let parsed: RepoConfigFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(parsed.code_index.name, "demo");
        assert_eq!(parsed.code_index.modules["core"].description, "core logic");
    }

    #[test]
    fn repository_average_chunks_per_file() {
        let mut repo = Repository::new("demo", "/tmp/demo");
        repo.update_stats(50, 10);
        assert!((repo.average_chunks_per_file() - 5.0).abs() < 0.01);
        assert!(repo.is_indexed());
    }
}
