//! Embedding model trait definition.

use async_trait::async_trait;

use crate::collection::EmbeddingModel;
use crate::errors::VectorEngineError;

/// Opaque text-to-vector function.
///
/// Implementations must return exactly one vector per input, in input
/// order, each of `model().dimension` elements.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// The model this embedder runs.
    fn model(&self) -> &EmbeddingModel;

    /// Embed a batch of texts.
    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, VectorEngineError>;
}
