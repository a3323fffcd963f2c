use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use neo4rs::{query, Graph};
use tracing::{debug, warn};

use crate::application::GraphRepository;
use crate::domain::{DomainError, Pattern, Relationship, RelationshipKind, Symbol};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Neo4j-backed [`GraphRepository`] over Bolt/Cypher via `neo4rs` (§4.7).
/// Grounded on the donor's `DuckdbCallGraphRepository`: schema created
/// idempotently on construction, adapter-specific errors folded into
/// `DomainError::storage`/`GraphUnavailable`, query methods return plain
/// `Vec<String>` rather than leaking the driver's row type.
pub struct Neo4jGraphRepository {
    graph: Graph,
}

impl Neo4jGraphRepository {
    /// Connects and verifies connectivity with a bounded timeout, per §4.7 —
    /// callers are expected to fall back to graph-less mode on `Err`.
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self, DomainError> {
        let graph = tokio::time::timeout(CONNECT_TIMEOUT, Graph::new(uri, user, password))
            .await
            .map_err(|_| DomainError::GraphUnavailable(format!("connect to {uri} timed out")))?
            .map_err(|e| DomainError::GraphUnavailable(format!("connect to {uri} failed: {e}")))?;

        let repo = Self { graph };
        tokio::time::timeout(CONNECT_TIMEOUT, repo.ping())
            .await
            .map_err(|_| DomainError::GraphUnavailable("ping timed out".to_string()))??;
        Ok(repo)
    }

    async fn ping(&self) -> Result<(), DomainError> {
        self.graph
            .execute(query("RETURN 1"))
            .await
            .map_err(|e| DomainError::GraphUnavailable(format!("ping failed: {e}")))?;
        Ok(())
    }

    async fn run(&self, q: neo4rs::Query) -> Result<(), DomainError> {
        self.graph.run(q).await.map_err(|e| DomainError::storage(format!("cypher write failed: {e}")))
    }

    async fn names_from(&self, q: neo4rs::Query, column: &str) -> Result<Vec<String>, DomainError> {
        let mut result = self.graph.execute(q).await.map_err(|e| DomainError::storage(format!("cypher read failed: {e}")))?;
        let mut names = Vec::new();
        while let Ok(Some(row)) = result.next().await {
            if let Ok(name) = row.get::<String>(column) {
                names.push(name);
            }
        }
        Ok(names)
    }
}

#[async_trait]
impl GraphRepository for Neo4jGraphRepository {
    async fn ensure_schema(&self) -> Result<(), DomainError> {
        const STATEMENTS: &[&str] = &[
            "CREATE CONSTRAINT repo_name IF NOT EXISTS FOR (r:Repository) REQUIRE r.name IS UNIQUE",
            "CREATE CONSTRAINT file_repo_path IF NOT EXISTS FOR (f:File) REQUIRE (f.repo, f.path) IS UNIQUE",
            "CREATE CONSTRAINT symbol_unique IF NOT EXISTS FOR (s:Symbol) REQUIRE (s.repo, s.file_path, s.name, s.start_line) IS UNIQUE",
            "CREATE CONSTRAINT module_repo_path IF NOT EXISTS FOR (m:Module) REQUIRE (m.repo, m.path) IS UNIQUE",
            "CREATE CONSTRAINT pattern_module_name IF NOT EXISTS FOR (p:Pattern) REQUIRE (p.module, p.name) IS UNIQUE",
            "CREATE INDEX file_repo IF NOT EXISTS FOR (f:File) ON (f.repo)",
            "CREATE INDEX file_hash IF NOT EXISTS FOR (f:File) ON (f.hash)",
            "CREATE INDEX symbol_repo IF NOT EXISTS FOR (s:Symbol) ON (s.repo)",
            "CREATE INDEX symbol_kind IF NOT EXISTS FOR (s:Symbol) ON (s.kind)",
            "CREATE INDEX symbol_name IF NOT EXISTS FOR (s:Symbol) ON (s.name)",
            "CREATE INDEX module_repo IF NOT EXISTS FOR (m:Module) ON (m.repo)",
        ];
        for statement in STATEMENTS {
            self.run(query(statement)).await?;
        }
        debug!("neo4j schema ensured");
        Ok(())
    }

    async fn upsert_repository(&self, repo: &str) -> Result<(), DomainError> {
        self.run(query("MERGE (r:Repository {name: $repo})").param("repo", repo)).await
    }

    async fn upsert_module(&self, repo: &str, path: &str) -> Result<(), DomainError> {
        self.run(
            query(
                "MERGE (r:Repository {name: $repo}) \
                 MERGE (m:Module {repo: $repo, path: $path}) \
                 MERGE (r)-[:CONTAINS]->(m)",
            )
            .param("repo", repo)
            .param("path", path),
        )
        .await
    }

    async fn upsert_file(&self, repo: &str, path: &str, content_hash: &str, indexed_at: i64) -> Result<(), DomainError> {
        self.run(
            query(
                "MERGE (r:Repository {name: $repo}) \
                 MERGE (f:File {repo: $repo, path: $path}) \
                 SET f.hash = $hash, f.indexed_at = $indexed_at \
                 MERGE (r)-[:CONTAINS]->(f)",
            )
            .param("repo", repo)
            .param("path", path)
            .param("hash", content_hash)
            .param("indexed_at", indexed_at),
        )
        .await
    }

    async fn upsert_symbol(&self, repo: &str, file_path: &str, symbol: &Symbol) -> Result<(), DomainError> {
        self.run(
            query(
                "MERGE (f:File {repo: $repo, path: $file_path}) \
                 MERGE (s:Symbol {repo: $repo, file_path: $file_path, name: $name, start_line: $start_line}) \
                 SET s.kind = $kind, s.end_line = $end_line, s.parent = $parent, s.signature = $signature \
                 MERGE (f)-[:CONTAINS]->(s)",
            )
            .param("repo", repo)
            .param("file_path", file_path)
            .param("name", symbol.name())
            .param("start_line", symbol.start_line() as i64)
            .param("end_line", symbol.end_line() as i64)
            .param("kind", symbol.kind().as_str())
            .param("parent", symbol.parent().unwrap_or_default())
            .param("signature", symbol.signature().unwrap_or_default()),
        )
        .await
    }

    async fn upsert_pattern(&self, repo: &str, module: &str, pattern: &Pattern) -> Result<(), DomainError> {
        self.run(
            query(
                "MERGE (p:Pattern {module: $module, name: $name}) \
                 SET p.repo = $repo, p.description = $description, p.members = $members, p.common_methods = $common_methods",
            )
            .param("repo", repo)
            .param("module", module)
            .param("name", pattern.name())
            .param("description", pattern.description())
            .param("members", pattern.members().to_vec())
            .param("common_methods", pattern.common_methods().to_vec()),
        )
        .await
    }

    async fn upsert_relationship(&self, repo: &str, relationship: &Relationship) -> Result<(), DomainError> {
        let edge_label = relationship.kind().as_str();
        let cypher = match relationship.kind() {
            RelationshipKind::Imports => {
                format!(
                    "MATCH (a:File {{repo: $repo, path: $source_file}}) \
                     MERGE (b:Module {{repo: $repo, path: $target}}) \
                     MERGE (a)-[:{edge_label}]->(b)"
                )
            }
            RelationshipKind::Calls | RelationshipKind::Extends => {
                format!(
                    "MATCH (a:Symbol {{repo: $repo, file_path: $source_file, name: $source_symbol}}) \
                     MATCH (b:Symbol {{repo: $repo, name: $target}}) \
                     MERGE (a)-[:{edge_label}]->(b)"
                )
            }
        };
        self.run(
            query(&cypher)
                .param("repo", repo)
                .param("source_file", relationship.source_file())
                .param("source_symbol", relationship.source_symbol().unwrap_or_default())
                .param("target", relationship.target()),
        )
        .await
        .or_else(|e| {
            warn!("relationship upsert skipped (endpoint not yet indexed): {e}");
            Ok(())
        })
    }

    async fn find_symbol_by_name(&self, repo: &str, name: &str) -> Result<Vec<String>, DomainError> {
        self.names_from(
            query("MATCH (s:Symbol {repo: $repo, name: $name}) RETURN s.file_path AS file_path").param("repo", repo).param("name", name),
            "file_path",
        )
        .await
    }

    async fn find_callers(&self, repo: &str, name: &str) -> Result<Vec<String>, DomainError> {
        self.names_from(
            query("MATCH (caller:Symbol)-[:CALLS]->(:Symbol {repo: $repo, name: $name}) RETURN DISTINCT caller.name AS name")
                .param("repo", repo)
                .param("name", name),
            "name",
        )
        .await
    }

    async fn find_callees(&self, repo: &str, name: &str) -> Result<Vec<String>, DomainError> {
        self.names_from(
            query("MATCH (:Symbol {repo: $repo, name: $name})-[:CALLS]->(callee:Symbol) RETURN DISTINCT callee.name AS name")
                .param("repo", repo)
                .param("name", name),
            "name",
        )
        .await
    }

    async fn find_related_files(&self, repo: &str, path: &str, limit: usize) -> Result<Vec<String>, DomainError> {
        self.names_from(
            query(
                "MATCH (f:File {repo: $repo, path: $path}) \
                 OPTIONAL MATCH (f)-[:IMPORTS]-(m:Module) \
                 OPTIONAL MATCH (f)-[:CONTAINS]->(:Symbol)-[:CALLS]-(:Symbol)<-[:CONTAINS]-(other:File) \
                 WITH collect(DISTINCT m.path) + collect(DISTINCT other.path) AS paths \
                 UNWIND paths AS related \
                 WITH related WHERE related IS NOT NULL AND related <> $path \
                 RETURN DISTINCT related AS path LIMIT $limit",
            )
            .param("repo", repo)
            .param("path", path)
            .param("limit", limit as i64),
            "path",
        )
        .await
    }

    async fn expand_from_symbols(&self, repo: &str, names: &[String], depth: u32, limit: usize) -> Result<Vec<String>, DomainError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let cypher = format!(
            "MATCH (start:Symbol {{repo: $repo}}) WHERE start.name IN $names \
             CALL apoc.path.subgraphNodes(start, {{relationshipFilter: 'CALLS|EXTENDS|CONTAINS', maxLevel: $depth}}) YIELD node \
             WHERE node:Symbol \
             RETURN DISTINCT node.name AS name LIMIT $limit"
        );
        match self
            .names_from(
                query(&cypher).param("repo", repo).param("names", names.to_vec()).param("depth", depth as i64).param("limit", limit as i64),
                "name",
            )
            .await
        {
            Ok(names) if !names.is_empty() => Ok(names),
            _ => {
                self.names_from(
                    query(
                        "MATCH (start:Symbol {repo: $repo}) WHERE start.name IN $names \
                         MATCH (start)-[:CALLS|EXTENDS|CONTAINS]-(neighbor:Symbol) \
                         RETURN DISTINCT neighbor.name AS name LIMIT $limit",
                    )
                    .param("repo", repo)
                    .param("names", names.to_vec())
                    .param("limit", limit as i64),
                    "name",
                )
                .await
            }
        }
    }

    async fn get_file_hash(&self, repo: &str, path: &str) -> Result<Option<String>, DomainError> {
        let hashes = self
            .names_from(
                query("MATCH (f:File {repo: $repo, path: $path}) RETURN f.hash AS hash").param("repo", repo).param("path", path),
                "hash",
            )
            .await?;
        Ok(hashes.into_iter().next())
    }

    async fn get_all_file_hashes(&self, repo: &str) -> Result<HashMap<String, String>, DomainError> {
        let mut result = self
            .graph
            .execute(query("MATCH (f:File {repo: $repo}) RETURN f.path AS path, f.hash AS hash").param("repo", repo))
            .await
            .map_err(|e| DomainError::storage(format!("get_all_file_hashes failed: {e}")))?;

        let mut hashes = HashMap::new();
        while let Ok(Some(row)) = result.next().await {
            if let (Ok(path), Ok(hash)) = (row.get::<String>("path"), row.get::<String>("hash")) {
                hashes.insert(path, hash);
            }
        }
        Ok(hashes)
    }

    async fn delete_file(&self, repo: &str, path: &str) -> Result<(), DomainError> {
        self.run(
            query("MATCH (f:File {repo: $repo, path: $path}) OPTIONAL MATCH (f)-[:CONTAINS]->(s:Symbol) DETACH DELETE f, s")
                .param("repo", repo)
                .param("path", path),
        )
        .await
    }

    async fn delete_repository(&self, repo: &str) -> Result<(), DomainError> {
        self.run(query("MATCH (n) WHERE n.repo = $repo OR (n:Repository AND n.name = $repo) DETACH DELETE n").param("repo", repo)).await
    }
}
