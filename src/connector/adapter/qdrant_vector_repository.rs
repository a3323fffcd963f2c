use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    condition, point_id, r#match::MatchValue, value::Kind as QKind, vectors::VectorsOptions,
    with_payload_selector::SelectorOptions, Condition, CreateCollectionBuilder, Distance,
    FieldCondition, Filter as QFilter, Match, PointId, PointStruct, ScrollPointsBuilder,
    SearchPointsBuilder, UpsertPointsBuilder, Value as QValue, Vector, Vectors,
    VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use tracing::{debug, info};

use crate::application::interfaces::{CollectionInfo, CollectionStatus, Filter, FilterValue, VectorRepository};
use crate::domain::{Chunk, DomainError};

/// Qdrant-backed [`VectorRepository`] (§4.6). Grounded on the pack's
/// `qdrant-client` facade pattern: a thin wrapper holding a `Qdrant` client
/// and hiding the protobuf builder types behind the domain's own `Filter`.
pub struct QdrantVectorRepository {
    client: Qdrant,
}

impl QdrantVectorRepository {
    pub fn new(client: Qdrant) -> Self {
        Self { client }
    }

    pub fn connect(url: &str, api_key: Option<String>) -> Result<Self, DomainError> {
        let mut builder = Qdrant::from_url(url);
        if let Some(key) = api_key {
            builder = builder.api_key(key);
        }
        let client = builder.build().map_err(|e| DomainError::storage(format!("qdrant connect failed: {e}")))?;
        Ok(Self::new(client))
    }
}

fn json_to_qvalue(v: serde_json::Value) -> QValue {
    use serde_json::Value as J;
    match v {
        J::String(s) => QValue { kind: Some(QKind::StringValue(s)) },
        J::Number(n) => {
            if let Some(i) = n.as_i64() {
                QValue { kind: Some(QKind::IntegerValue(i)) }
            } else if let Some(f) = n.as_f64() {
                QValue { kind: Some(QKind::DoubleValue(f)) }
            } else {
                QValue { kind: Some(QKind::StringValue(n.to_string())) }
            }
        }
        J::Bool(b) => QValue { kind: Some(QKind::BoolValue(b)) },
        J::Null => QValue { kind: None },
        _ => QValue { kind: None },
    }
}

fn qvalue_to_json(v: QValue) -> serde_json::Value {
    match v.kind {
        Some(QKind::StringValue(s)) => serde_json::Value::String(s),
        Some(QKind::IntegerValue(i)) => serde_json::json!(i),
        Some(QKind::DoubleValue(f)) => serde_json::json!(f),
        Some(QKind::BoolValue(b)) => serde_json::Value::Bool(b),
        _ => serde_json::Value::Null,
    }
}

/// Serializes a chunk to its Qdrant payload, dropping the fields Qdrant
/// stores outside the payload map (`id` as point id, `vector` separately,
/// `score` only meaningful on read).
fn chunk_payload(chunk: &Chunk) -> Result<HashMap<String, QValue>, DomainError> {
    let mut value = serde_json::to_value(chunk).map_err(|e| DomainError::storage(format!("chunk serialization failed: {e}")))?;
    let map = value.as_object_mut().ok_or_else(|| DomainError::storage("chunk did not serialize to an object"))?;
    map.remove("id");
    map.remove("vector");
    map.remove("score");
    Ok(map.iter().map(|(k, v)| (k.clone(), json_to_qvalue(v.clone()))).collect())
}

/// Reconstructs a `Chunk` from a Qdrant payload plus an optional score,
/// leaving `vector` unset per the read-path contract (§4.6c).
fn chunk_from_payload(payload: HashMap<String, QValue>, score: Option<f32>) -> Result<Chunk, DomainError> {
    let mut map = serde_json::Map::new();
    for (k, v) in payload {
        map.insert(k, qvalue_to_json(v));
    }
    if let Some(score) = score {
        map.insert("score".to_string(), serde_json::json!(score));
    }
    serde_json::from_value(serde_json::Value::Object(map)).map_err(|e| DomainError::storage(format!("chunk deserialization failed: {e}")))
}

fn to_qdrant_filter(filter: &Filter) -> QFilter {
    let must = filter
        .predicates()
        .iter()
        .map(|(field, value)| {
            let match_value = match value {
                FilterValue::Str(s) => MatchValue::Keyword(s.clone()),
                FilterValue::Bool(b) => MatchValue::Boolean(*b),
            };
            Condition {
                condition_one_of: Some(condition::ConditionOneOf::Field(FieldCondition {
                    key: field.clone(),
                    r#match: Some(Match { match_value: Some(match_value) }),
                    ..Default::default()
                })),
            }
        })
        .collect();
    QFilter { must, ..Default::default() }
}

fn payload_selector(enabled: bool) -> SelectorOptions {
    SelectorOptions::Enable(enabled)
}

#[async_trait]
impl VectorRepository for QdrantVectorRepository {
    async fn ensure_collection(&self, name: &str, dimension: usize) -> Result<(), DomainError> {
        if self.client.collection_info(name).await.is_ok() {
            debug!("collection {name} already exists");
            return Ok(());
        }
        self.client
            .create_collection(CreateCollectionBuilder::new(name).vectors_config(VectorParamsBuilder::new(dimension as u64, Distance::Cosine)))
            .await
            .map_err(|e| DomainError::storage(format!("create_collection({name}) failed: {e}")))?;
        info!("created collection {name} (dim={dimension})");
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<(), DomainError> {
        if chunks.is_empty() {
            return Ok(());
        }
        let mut points = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let vector = chunk.vector().ok_or_else(|| DomainError::storage(format!("chunk {} has no vector to upsert", chunk.id())))?;
            let payload = chunk_payload(chunk)?;
            let id = PointId { point_id_options: Some(point_id::PointIdOptions::Uuid(chunk.id().to_string())) };
            let vectors = Vectors { vectors_options: Some(VectorsOptions::Vector(Vector { data: vector.to_vec(), ..Default::default() })) };
            points.push(PointStruct { id: Some(id), payload, vectors: Some(vectors), ..Default::default() });
        }
        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points))
            .await
            .map_err(|e| DomainError::storage(format!("upsert into {collection} failed: {e}")))?;
        Ok(())
    }

    async fn search(&self, collection: &str, vector: &[f32], limit: usize, filter: &Filter) -> Result<Vec<Chunk>, DomainError> {
        let mut builder = SearchPointsBuilder::new(collection, vector.to_vec(), limit as u64).with_payload(payload_selector(true));
        if !filter.is_empty() {
            builder = builder.filter(to_qdrant_filter(filter));
        }
        let response = self
            .client
            .search_points(builder)
            .await
            .map_err(|e| DomainError::storage(format!("search in {collection} failed: {e}")))?;

        response
            .result
            .into_iter()
            .map(|point| chunk_from_payload(point.payload, Some(point.score)))
            .collect()
    }

    async fn scroll(&self, collection: &str, filter: &Filter, limit: usize) -> Result<Vec<Chunk>, DomainError> {
        let mut builder = ScrollPointsBuilder::new(collection).limit(limit as u32).with_payload(payload_selector(true));
        if !filter.is_empty() {
            builder = builder.filter(to_qdrant_filter(filter));
        }
        let response = self
            .client
            .scroll(builder)
            .await
            .map_err(|e| DomainError::storage(format!("scroll in {collection} failed: {e}")))?;

        response.result.into_iter().map(|point| chunk_from_payload(point.payload, None)).collect()
    }

    async fn collection_info(&self, name: &str) -> Result<CollectionInfo, DomainError> {
        let info = self
            .client
            .collection_info(name)
            .await
            .map_err(|e| DomainError::storage(format!("collection_info({name}) failed: {e}")))?;
        let result = info.result.ok_or_else(|| DomainError::not_found(format!("collection {name}")))?;
        let status = match qdrant_client::qdrant::CollectionStatus::try_from(result.status).unwrap_or(qdrant_client::qdrant::CollectionStatus::Red) {
            qdrant_client::qdrant::CollectionStatus::Green => CollectionStatus::Green,
            qdrant_client::qdrant::CollectionStatus::Yellow => CollectionStatus::Yellow,
            _ => CollectionStatus::Red,
        };
        // Qdrant's collection_info nests vector size inside a protobuf oneof
        // (single vs named vectors); callers that need it already know it
        // from the embedding model, so we don't round-trip it here.
        Ok(CollectionInfo { points_count: result.points_count.unwrap_or(0), dimension: 0, status })
    }

    async fn delete_collection(&self, name: &str) -> Result<(), DomainError> {
        self.client
            .delete_collection(name)
            .await
            .map_err(|e| DomainError::storage(format!("delete_collection({name}) failed: {e}")))?;
        Ok(())
    }

    async fn delete_by_repo(&self, collection: &str, repo: &str) -> Result<(), DomainError> {
        let filter = to_qdrant_filter(&Filter::new().eq_str("repo", repo));
        self.client
            .delete_points(qdrant_client::qdrant::DeletePointsBuilder::new(collection).points(filter))
            .await
            .map_err(|e| DomainError::storage(format!("delete_by_repo({repo}) failed: {e}")))?;
        Ok(())
    }

    async fn delete_by_file(&self, collection: &str, repo: &str, file_path: &str) -> Result<u64, DomainError> {
        let filter = Filter::new().eq_str("repo", repo).eq_str("file_path", file_path);
        let existing = self.scroll(collection, &filter, 10_000).await?;
        let qfilter = to_qdrant_filter(&filter);
        self.client
            .delete_points(qdrant_client::qdrant::DeletePointsBuilder::new(collection).points(qfilter))
            .await
            .map_err(|e| DomainError::storage(format!("delete_by_file({file_path}) failed: {e}")))?;
        Ok(existing.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChunkKind, ChunkType, Language};

    #[test]
    fn chunk_payload_excludes_id_vector_and_score() {
        let chunk = Chunk::new("repo", "a.py", 1, 2, ChunkType::Code, ChunkKind::Function, "a", "def f(): pass", Language::Python)
            .with_vector(vec![0.1, 0.2])
            .with_score(0.9);
        let payload = chunk_payload(&chunk).unwrap();
        assert!(!payload.contains_key("id"));
        assert!(!payload.contains_key("vector"));
        assert!(!payload.contains_key("score"));
        assert!(payload.contains_key("file_path"));
    }

    #[test]
    fn chunk_roundtrips_through_payload_without_vector() {
        let chunk = Chunk::new("repo", "a.py", 1, 2, ChunkType::Code, ChunkKind::Function, "a", "def f(): pass", Language::Python).with_vector(vec![0.1]);
        let payload = chunk_payload(&chunk).unwrap();
        let restored = chunk_from_payload(payload, Some(0.42)).unwrap();
        assert_eq!(restored.file_path(), "a.py");
        assert_eq!(restored.score(), Some(0.42));
        assert!(restored.vector().is_none());
    }

    #[test]
    fn filter_translates_string_and_bool_predicates() {
        let filter = Filter::new().eq_str("repo", "demo").eq_bool("is_test", false);
        let qfilter = to_qdrant_filter(&filter);
        assert_eq!(qfilter.must.len(), 2);
    }
}
