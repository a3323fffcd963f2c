use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;

use crate::domain::DomainError;

const DEFAULT_INCLUDES: &[&str] = &["**/*.py", "**/*.js", "**/*.ts", "**/*.tsx", "**/*.jsx"];

const DEFAULT_EXCLUDES: &[&str] = &[
    "**/.git/**",
    "**/__pycache__/**",
    "**/*.pyc",
    "**/node_modules/**",
    "**/venv/**",
    "**/.venv/**",
    "**/dist/**",
    "**/build/**",
    "**/.idea/**",
    "**/.vscode/**",
    "**/*.min.js",
    "**/*.bundle.js",
];

fn build_set(patterns: impl Iterator<Item = String>) -> Result<GlobSet, DomainError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(&pattern)
            .map_err(|e| DomainError::invalid_input(format!("invalid glob '{pattern}': {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| DomainError::internal(format!("failed to build glob set: {e}")))
}

/// File-tree traversal honoring include/exclude glob lists layered over the
/// repo's defaults (§4.10).
pub struct Walker {
    includes: GlobSet,
    excludes: GlobSet,
}

impl Walker {
    pub fn new(extra_includes: &[String], extra_excludes: &[String]) -> Result<Self, DomainError> {
        let includes = if extra_includes.is_empty() {
            DEFAULT_INCLUDES.iter().map(|s| s.to_string()).collect::<Vec<_>>()
        } else {
            extra_includes.to_vec()
        };
        let mut excludes = DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        excludes.extend(extra_excludes.iter().cloned());

        Ok(Self {
            includes: build_set(includes.into_iter())?,
            excludes: build_set(excludes.into_iter())?,
        })
    }

    /// Yields absolute paths under `root` whose forward-slash-normalized
    /// relative path matches an include pattern and no exclude pattern.
    pub fn walk(&self, root: &Path) -> Vec<PathBuf> {
        let mut out = Vec::new();
        let walker = WalkBuilder::new(root)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .filter_entry({
                let excludes = self.excludes.clone();
                let root = root.to_path_buf();
                move |entry| {
                    if entry.path() == root {
                        return true;
                    }
                    let rel = relative_slash_path(&root, entry.path());
                    !excludes.is_match(&rel)
                }
            })
            .build();

        for entry in walker.filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let rel = relative_slash_path(root, path);
            if self.includes.is_match(&rel) && !self.excludes.is_match(&rel) {
                out.push(path.to_path_buf());
            }
        }
        out
    }
}

fn relative_slash_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn walks_only_included_extensions_and_skips_excludes() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "pass").unwrap();
        fs::write(dir.path().join("b.txt"), "hi").unwrap();
        fs::create_dir_all(dir.path().join("node_modules")).unwrap();
        fs::write(dir.path().join("node_modules/vendored.js"), "x").unwrap();

        let walker = Walker::new(&[], &[]).unwrap();
        let found = walker.walk(dir.path());
        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert!(names.contains(&"a.py".to_string()));
        assert!(!names.contains(&"b.txt".to_string()));
        assert!(!names.iter().any(|n| n == "vendored.js"));
    }
}
