//! Vector engine client trait definition.
//!
//! This module defines the abstract interface for the vector engine
//! operations used by the loader and postprocessor.

use async_trait::async_trait;
use qa_indexer_shared::PointId;

use crate::collection::{CollectionConfig, OptimizerConfig};
use crate::errors::VectorEngineError;
use crate::types::{AddRequest, CollectionInfo, PayloadSchemaType, ScrollPage, SetPayloadOperation};

/// Abstract interface for vector engine operations.
///
/// Implementations can be swapped for different backends (Qdrant, in-memory)
/// so the pipeline stages can be tested without a running engine.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// All methods return `Result<T, VectorEngineError>`. No method retries;
/// callers decide whether a failure is worth another attempt.
#[async_trait]
pub trait VectorEngineClient: Send + Sync {
    /// Check if the engine is healthy and reachable.
    async fn health_check(&self) -> Result<bool, VectorEngineError>;

    /// Whether a collection with this name exists.
    async fn collection_exists(&self, collection: &str) -> Result<bool, VectorEngineError>;

    /// Delete a collection and every point in it.
    async fn delete_collection(&self, collection: &str) -> Result<(), VectorEngineError>;

    /// Create a collection. Vector layout and quantization cannot be
    /// changed afterwards.
    async fn create_collection(&self, config: &CollectionConfig) -> Result<(), VectorEngineError>;

    /// Point count and effective optimizer settings of a collection.
    async fn collection_info(&self, collection: &str) -> Result<CollectionInfo, VectorEngineError>;

    /// Change the optimizer settings of an existing collection.
    ///
    /// Raising the indexing threshold from zero starts index construction
    /// inside the engine asynchronously.
    async fn update_collection(
        &self,
        collection: &str,
        optimizers: &OptimizerConfig,
    ) -> Result<(), VectorEngineError>;

    /// Embed `request.documents` and upsert the resulting points.
    ///
    /// # Arguments
    ///
    /// * `collection` - Target collection
    /// * `request` - Parallel lists of ids, texts and payloads, plus the
    ///   embedding sub-batch size and worker count
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Once every point has been acknowledged by the engine
    /// * `Err(VectorEngineError)` - If embedding or upload fails; points from
    ///   earlier sub-batches may already be stored
    async fn add(&self, collection: &str, request: AddRequest) -> Result<(), VectorEngineError>;

    /// Fetch up to `limit` points starting at `offset` (`None` for the first page).
    async fn scroll(
        &self,
        collection: &str,
        limit: usize,
        offset: Option<PointId>,
    ) -> Result<ScrollPage, VectorEngineError>;

    /// Apply a list of set-payload operations as a single request.
    async fn batch_update_points(
        &self,
        collection: &str,
        operations: &[SetPayloadOperation],
    ) -> Result<(), VectorEngineError>;

    /// Build a secondary index on a payload field.
    async fn create_payload_index(
        &self,
        collection: &str,
        field_name: &str,
        field_schema: PayloadSchemaType,
    ) -> Result<(), VectorEngineError>;
}
