use async_trait::async_trait;

use crate::domain::DomainError;

/// Batched dense-vector generation via an external embedding endpoint (§4.5).
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Embeds a batch of texts, returning vectors in input order regardless
    /// of the order the backend's response carries. Empty input returns an
    /// empty result without a network call.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError>;

    /// The model's vector dimension, known a priori from the model id.
    fn dimension(&self) -> usize;
}
