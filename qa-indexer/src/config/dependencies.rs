//! Dependency initialization and wiring for the indexer.

use std::sync::Arc;

use qa_indexer_pipeline::PostgresSource;
use qa_indexer_repository::{
    EmbeddingModel, QdrantClient, QdrantInferenceEmbedder, VectorEngineClient,
};
use tracing::info;

use crate::config::GlobalArgs;
use crate::IndexingError;

/// Builders for the external clients each stage needs.
///
/// Stages only construct what they use: `export` never touches Qdrant and
/// `load` never touches Postgres.
pub struct Dependencies;

impl Dependencies {
    /// Connect to the relational dump.
    pub async fn source(args: &GlobalArgs) -> Result<Arc<PostgresSource>, IndexingError> {
        info!(
            host = %args.postgres_host,
            port = args.postgres_port,
            db = %args.postgres_db,
            "Connecting to Postgres"
        );
        let source = PostgresSource::connect(&args.postgres()).await?;
        Ok(Arc::new(source))
    }

    /// Build the Qdrant client and verify the server is reachable.
    ///
    /// # Returns
    ///
    /// * `Ok((client, model))` - A healthy client and the resolved model
    /// * `Err(IndexingError)` - If configuration is invalid or Qdrant is down
    pub async fn engine(
        args: &GlobalArgs,
    ) -> Result<(Arc<dyn VectorEngineClient>, EmbeddingModel), IndexingError> {
        let model = args.embedding_model()?;
        let endpoint = args.inference_endpoint();

        info!(
            qdrant_url = %args.qdrant_url,
            inference_url = %endpoint,
            model = %model.name,
            dimension = model.dimension,
            "Initializing vector engine"
        );

        let embedder = QdrantInferenceEmbedder::new(
            &endpoint,
            args.qdrant_api_key.as_deref(),
            model.clone(),
            args.request_timeout(),
        )
        .map_err(|e| IndexingError::config(format!("Failed to create embedder: {}", e)))?;

        let client = QdrantClient::new(
            &args.qdrant_url,
            args.qdrant_api_key.as_deref(),
            args.request_timeout(),
            Arc::new(embedder),
        )
        .map_err(|e| IndexingError::config(format!("Failed to create Qdrant client: {}", e)))?;

        let healthy = client
            .health_check()
            .await
            .map_err(|e| IndexingError::config(format!("Qdrant health check failed: {}", e)))?;
        if !healthy {
            return Err(IndexingError::config("Qdrant is unhealthy"));
        }
        info!("Qdrant connection verified");

        let client: Arc<dyn VectorEngineClient> = Arc::new(client);
        Ok((client, model))
    }
}
