use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::EmbeddingService;
use crate::domain::DomainError;

const DEFAULT_BASE_URL: &str = "https://api.voyageai.com/v1/embeddings";
const DEFAULT_MODEL: &str = "voyage-code-3";
const DEFAULT_SUB_BATCH_SIZE: usize = 128;
const DEFAULT_DIMENSION: usize = 1024;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
    index: usize,
}

/// HTTP client for Voyage AI's embeddings endpoint (§4.5). Grounded on the
/// donor's `reqwest`-based adapters: a thin client struct over
/// `reqwest::Client`, typed request/response structs, batching, and
/// in-order reassembly since the backend is not guaranteed to preserve
/// request order in its response.
pub struct VoyageEmbedder {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    dimension: usize,
    sub_batch_size: usize,
}

impl VoyageEmbedder {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            client: reqwest::Client::builder().timeout(Duration::from_secs(60)).build().unwrap_or_default(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            dimension,
            sub_batch_size: DEFAULT_SUB_BATCH_SIZE,
        }
    }

    /// Construct from `VOYAGE_API_KEY`, defaulting model and dimension to the
    /// `voyage-code-3` preset.
    pub fn from_env() -> Result<Self, DomainError> {
        let api_key = std::env::var("VOYAGE_API_KEY").map_err(|_| DomainError::ConfigMissing("VOYAGE_API_KEY".to_string()))?;
        Ok(Self::new(api_key, DEFAULT_MODEL, DEFAULT_DIMENSION))
    }

    pub fn with_sub_batch_size(mut self, size: usize) -> Self {
        self.sub_batch_size = size.max(1);
        self
    }

    async fn embed_sub_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        let request = EmbedRequest { input: texts, model: &self.model };
        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::EmbeddingFailure(format!("voyage request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::EmbeddingFailure(format!("voyage returned {status}: {body}")));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| DomainError::EmbeddingFailure(format!("voyage response parse failed: {e}")))?;

        let mut ordered: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        for datum in parsed.data {
            if datum.index < ordered.len() {
                ordered[datum.index] = Some(datum.embedding);
            }
        }
        ordered
            .into_iter()
            .enumerate()
            .map(|(i, v)| v.ok_or_else(|| DomainError::EmbeddingFailure(format!("voyage response missing embedding at index {i}"))))
            .collect()
    }
}

#[async_trait]
impl EmbeddingService for VoyageEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut result = Vec::with_capacity(texts.len());
        for sub_batch in texts.chunks(self.sub_batch_size) {
            let vectors = self.embed_sub_batch(sub_batch).await?;
            result.extend(vectors);
        }
        Ok(result)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_input_short_circuits_without_network_call() {
        let embedder = VoyageEmbedder::new("fake-key", DEFAULT_MODEL, DEFAULT_DIMENSION);
        let result = embedder.embed_batch(&[]).await.unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn dimension_reflects_construction_argument() {
        let embedder = VoyageEmbedder::new("fake-key", DEFAULT_MODEL, 256);
        assert_eq!(embedder.dimension(), 256);
    }

    #[test]
    fn sub_batch_size_is_clamped_to_at_least_one() {
        let embedder = VoyageEmbedder::new("fake-key", DEFAULT_MODEL, DEFAULT_DIMENSION).with_sub_batch_size(0);
        assert_eq!(embedder.sub_batch_size, 1);
    }
}
