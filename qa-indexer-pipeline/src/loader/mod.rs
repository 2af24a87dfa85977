//! Bulk index loader.
//!
//! Streams archived documents into a vector collection. The collection is
//! created with indexing disabled so the engine only appends during the
//! load; `finalize` raises the threshold afterwards and the engine builds
//! its index once over the full data set.

use std::sync::Arc;

use qa_indexer_repository::{
    AddRequest, CollectionConfig, OptimizerConfig, VectorEngineClient,
};
use qa_indexer_shared::{ContentAddress, QuestionDocument};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::archive::ContentArchive;
use crate::errors::PipelineError;

/// Configuration for the bulk loader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Documents per `add` call.
    pub batch_size: usize,
    /// Texts per embedding call inside `add`.
    pub embed_batch_size: usize,
    /// Concurrent embedding workers; 0 runs sequentially.
    pub parallel: usize,
    /// Manifest position to start from. Also the id of the first point.
    pub start_offset: usize,
    /// Log progress every this many points.
    pub progress_interval: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            embed_batch_size: 8,
            parallel: 0,
            start_offset: 0,
            progress_interval: 10_000,
        }
    }
}

/// Outcome of a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub points_loaded: usize,
    /// Manifest offset to resume from if the run is repeated.
    pub next_offset: usize,
}

/// Loader that uploads archived documents into one collection.
///
/// Point ids are manifest positions, so a given manifest always yields the
/// same ids and a resumed load continues the sequence.
pub struct BulkLoader {
    client: Arc<dyn VectorEngineClient>,
    collection: String,
    config: LoaderConfig,
}

impl BulkLoader {
    /// Create a new loader with the default configuration.
    pub fn new(client: Arc<dyn VectorEngineClient>, collection: impl Into<String>) -> Self {
        Self::with_config(client, collection, LoaderConfig::default())
    }

    /// Create a new loader with custom configuration.
    pub fn with_config(
        client: Arc<dyn VectorEngineClient>,
        collection: impl Into<String>,
        config: LoaderConfig,
    ) -> Self {
        Self {
            client,
            collection: collection.into(),
            config,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Create the target collection with indexing deferred.
    ///
    /// An existing collection is deleted when `overwrite` is set; otherwise
    /// this fails before anything is changed.
    #[instrument(skip(self, config), fields(collection = %self.collection))]
    pub async fn provision(
        &self,
        config: &CollectionConfig,
        overwrite: bool,
    ) -> Result<(), PipelineError> {
        if self.client.collection_exists(&self.collection).await? {
            if !overwrite {
                return Err(PipelineError::already_exists(format!(
                    "collection {}",
                    self.collection
                )));
            }
            warn!("Deleting existing collection");
            self.client.delete_collection(&self.collection).await?;
        }

        let config = CollectionConfig {
            name: self.collection.clone(),
            optimizers: OptimizerConfig::deferred(),
            ..config.clone()
        };
        self.client.create_collection(&config).await?;

        info!(
            dimension = config.model.dimension,
            vector = %config.model.vector_name(),
            "Created collection with indexing deferred"
        );
        Ok(())
    }

    /// Upload every document named in `manifest`, starting at the configured
    /// offset. An offset equal to the manifest length loads nothing; a larger
    /// one is an error.
    #[instrument(skip(self, manifest, archive), fields(collection = %self.collection, total = manifest.len()))]
    pub async fn load(
        &self,
        manifest: &[ContentAddress],
        archive: &ContentArchive,
    ) -> Result<LoadSummary, PipelineError> {
        let start = self.config.start_offset;
        if start > manifest.len() {
            return Err(PipelineError::OffsetOutOfRange {
                offset: start,
                manifest_len: manifest.len(),
            });
        }
        let batch_size = self.config.batch_size.max(1);
        let interval = self.config.progress_interval.max(1);

        if start > 0 {
            info!(offset = start, "Resuming load");
        }

        let mut offset = start;
        let mut loaded = 0usize;

        for batch in manifest[start..].chunks(batch_size) {
            let request = self.build_request(offset, batch, archive).await?;
            let count = request.len();

            self.client.add(&self.collection, request).await?;

            let before = loaded;
            loaded += count;
            offset += count;
            debug!(count, next_offset = offset, "Uploaded batch");

            if loaded / interval > before / interval {
                info!(loaded, next_offset = offset, "Load progress");
            }
        }

        info!(points = loaded, next_offset = offset, "Load completed");
        Ok(LoadSummary {
            points_loaded: loaded,
            next_offset: offset,
        })
    }

    /// Raise the indexing threshold so the engine builds its index.
    ///
    /// Setting the same threshold again is a no-op on the engine side.
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn finalize(&self, indexing_threshold: u64) -> Result<(), PipelineError> {
        self.client
            .update_collection(
                &self.collection,
                &OptimizerConfig::with_threshold(indexing_threshold),
            )
            .await?;
        info!(indexing_threshold, "Enabled indexing");
        Ok(())
    }

    async fn build_request(
        &self,
        offset: usize,
        batch: &[ContentAddress],
        archive: &ContentArchive,
    ) -> Result<AddRequest, PipelineError> {
        let mut request = AddRequest {
            ids: Vec::with_capacity(batch.len()),
            documents: Vec::with_capacity(batch.len()),
            metadata: Vec::with_capacity(batch.len()),
            batch_size: self.config.embed_batch_size,
            parallel: self.config.parallel,
        };

        for (i, address) in batch.iter().enumerate() {
            let document = archive.get(address).await?;
            let title = document
                .index_text()
                .ok_or_else(|| {
                    PipelineError::missing_field("Title", format!("archived document {}", address))
                })?
                .to_string();

            request.ids.push((offset + i) as u64);
            request.documents.push(title);
            request.metadata.push(to_payload(&document)?);
        }

        Ok(request)
    }
}

fn to_payload(document: &QuestionDocument) -> Result<Map<String, Value>, PipelineError> {
    match serde_json::to_value(document)? {
        Value::Object(map) => Ok(map),
        other => Err(PipelineError::SerializationError(format!(
            "document {} serialized to {}",
            document.id, other
        ))),
    }
}
