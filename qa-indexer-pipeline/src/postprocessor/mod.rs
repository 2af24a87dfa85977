//! Index postprocessor.
//!
//! Walks every point of a loaded collection and merges derived counters
//! (`num_answers`, `num_comments`) into its payload, then builds a payload
//! index so filters on the counter are cheap. Values are a pure function of
//! the stored payload, so running it again rewrites identical values.

use std::sync::Arc;

use qa_indexer_repository::{PayloadSchemaType, SetPayloadOperation, VectorEngineClient};
use qa_indexer_shared::DerivedMetadata;
use tracing::{debug, info, instrument};

use crate::errors::PipelineError;

/// Payload field indexed after the pass.
pub const DEFAULT_INDEX_FIELD: &str = "num_answers";

/// Configuration for the postprocessor.
#[derive(Debug, Clone)]
pub struct PostprocessConfig {
    /// Points per scroll page and per batch update.
    pub batch_size: usize,
    pub index_field: String,
    pub index_schema: PayloadSchemaType,
    /// Log progress every this many points.
    pub progress_interval: usize,
}

impl Default for PostprocessConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            index_field: DEFAULT_INDEX_FIELD.to_string(),
            index_schema: PayloadSchemaType::Integer,
            progress_interval: 10_000,
        }
    }
}

/// Outcome of a postprocessing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostprocessSummary {
    pub points_updated: usize,
    pub pages: usize,
}

/// Adds derived metadata to every point of a collection.
pub struct Postprocessor {
    client: Arc<dyn VectorEngineClient>,
    collection: String,
    config: PostprocessConfig,
}

impl Postprocessor {
    pub fn new(client: Arc<dyn VectorEngineClient>, collection: impl Into<String>) -> Self {
        Self::with_config(client, collection, PostprocessConfig::default())
    }

    pub fn with_config(
        client: Arc<dyn VectorEngineClient>,
        collection: impl Into<String>,
        config: PostprocessConfig,
    ) -> Self {
        Self {
            client,
            collection: collection.into(),
            config,
        }
    }

    /// Run one full pass over the collection.
    ///
    /// A point whose payload lacks `answers` or `comments` aborts the pass;
    /// pages already written keep their updates.
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn run(&self) -> Result<PostprocessSummary, PipelineError> {
        let limit = self.config.batch_size.max(1);
        let interval = self.config.progress_interval.max(1);

        let mut offset = None;
        let mut updated = 0usize;
        let mut pages = 0usize;

        loop {
            let page = self.client.scroll(&self.collection, limit, offset).await?;
            if page.points.is_empty() {
                break;
            }

            let operations = page
                .points
                .iter()
                .map(|point| {
                    let metadata = DerivedMetadata::from_payload(&point.payload)?;
                    Ok(SetPayloadOperation::for_point(
                        point.id.clone(),
                        metadata.to_payload(),
                    ))
                })
                .collect::<Result<Vec<_>, PipelineError>>()?;

            self.client
                .batch_update_points(&self.collection, &operations)
                .await?;

            let before = updated;
            updated += operations.len();
            pages += 1;
            debug!(page = pages, points = operations.len(), "Updated page");

            if updated / interval > before / interval {
                info!(updated, "Postprocess progress");
            }

            match page.next_offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        self.client
            .create_payload_index(
                &self.collection,
                &self.config.index_field,
                self.config.index_schema,
            )
            .await?;

        info!(
            points = updated,
            pages,
            index_field = %self.config.index_field,
            "Postprocess completed"
        );
        Ok(PostprocessSummary {
            points_updated: updated,
            pages,
        })
    }
}
