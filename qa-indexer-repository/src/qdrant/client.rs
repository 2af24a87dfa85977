//! Qdrant REST client implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt, TryStreamExt};
use qa_indexer_shared::PointId;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument, Instrument};
use url::Url;

use crate::collection::{CollectionConfig, OptimizerConfig};
use crate::errors::VectorEngineError;
use crate::interfaces::{Embedder, VectorEngineClient};
use crate::qdrant::requests::{
    build_batch_set_payload, build_create_collection, build_payload_index, build_point,
    build_scroll, build_update_collection, build_upsert,
};
use crate::types::{AddRequest, CollectionInfo, PayloadSchemaType, ScrollPage, SetPayloadOperation};

/// Qdrant client implementation.
///
/// Embeds documents client-side through an injected `Embedder`, then upserts
/// points with `wait=true` so every call returns only after the engine has
/// applied it.
///
/// # Example
///
/// ```ignore
/// let embedder = QdrantInferenceEmbedder::new(endpoint, Some(key), model, timeout)?;
/// let client = QdrantClient::new("http://qdrant:6333", Some(key), timeout, Arc::new(embedder))?;
/// if client.collection_exists("questions").await? {
///     client.delete_collection("questions").await?;
/// }
/// ```
pub struct QdrantClient {
    http: Client,
    base_url: Url,
    embedder: Arc<dyn Embedder>,
}

/// Standard Qdrant response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct ExistsResult {
    exists: bool,
}

#[derive(Debug, Deserialize)]
struct CollectionInfoResult {
    #[serde(default)]
    points_count: Option<u64>,
    config: CollectionConfigResult,
}

#[derive(Debug, Deserialize)]
struct CollectionConfigResult {
    optimizer_config: OptimizerConfigResult,
}

#[derive(Debug, Deserialize)]
struct OptimizerConfigResult {
    #[serde(default)]
    indexing_threshold: Option<u64>,
}

impl QdrantClient {
    /// Create a new Qdrant client for the given base URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The Qdrant REST URL (e.g., "http://qdrant:6333")
    /// * `api_key` - Sent as the `api-key` header when present
    /// * `timeout` - Per-request timeout
    /// * `embedder` - Model used by `add` to turn texts into vectors
    pub fn new(
        url: &str,
        api_key: Option<&str>,
        timeout: Duration,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, VectorEngineError> {
        let base_url = Url::parse(url).map_err(|e| VectorEngineError::connection(e.to_string()))?;

        let mut headers = HeaderMap::new();
        if let Some(key) = api_key.map(str::trim).filter(|k| !k.is_empty()) {
            headers.insert(
                "api-key",
                HeaderValue::from_str(key)
                    .map_err(|e| VectorEngineError::invalid_request(format!("invalid API key: {}", e)))?,
            );
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| VectorEngineError::connection(e.to_string()))?;

        info!(url = %base_url, model = %embedder.model().name, "Created Qdrant client");

        Ok(Self {
            http,
            base_url,
            embedder,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, VectorEngineError> {
        self.base_url
            .join(path)
            .map_err(|e| VectorEngineError::invalid_request(e.to_string()))
    }

    /// Send a request and return the response if the status is a success.
    ///
    /// `on_error` builds the error variant for a non-success status.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        on_error: fn(String) -> VectorEngineError,
    ) -> Result<Response, VectorEngineError> {
        let url = self.endpoint(path)?;
        let mut request = self.http.request(method.clone(), url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                VectorEngineError::connection(e.to_string())
            } else {
                on_error(e.to_string())
            }
        })?;

        let status = response.status();
        if status.as_u16() == 404 {
            let error_body = response.text().await.unwrap_or_default();
            return Err(VectorEngineError::NotFound(format!("{} {}: {}", method, path, error_body)));
        }
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, path = %path, body = %error_body, "Qdrant request failed");
            return Err(on_error(format!(
                "{} {} failed with status {}: {}",
                method, path, status, error_body
            )));
        }

        Ok(response)
    }

    async fn result<T: DeserializeOwned>(response: Response) -> Result<T, VectorEngineError> {
        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| VectorEngineError::parse(e.to_string()))?;
        Ok(envelope.result)
    }

    /// Upsert one sub-batch of prepared points.
    async fn upsert(&self, collection: &str, points: Vec<Value>) -> Result<usize, VectorEngineError> {
        let count = points.len();
        let path = format!("collections/{}/points?wait=true", collection);
        self.send(
            Method::PUT,
            &path,
            Some(&build_upsert(points)),
            VectorEngineError::UpsertError,
        )
        .await?;

        debug!(count = count, "Upserted points");
        Ok(count)
    }
}

/// Embed `request.documents` in sub-batches of `request.batch_size` with up
/// to `workers` embedding calls in flight, returning one list of point bodies
/// per sub-batch in request order.
async fn embed_sub_batches(
    embedder: &dyn Embedder,
    vector_name: &str,
    request: &AddRequest,
    workers: usize,
) -> Result<Vec<Vec<Value>>, VectorEngineError> {
    let sub_batch = request.batch_size.max(1);
    let total = request.len();

    // Jobs are boxed up front so the stream holds no borrowing closure.
    let jobs: Vec<BoxFuture<'_, Result<Vec<Value>, VectorEngineError>>> = (0..total)
        .step_by(sub_batch)
        .map(|start| {
            let end = (start + sub_batch).min(total);
            embed_sub_batch(embedder, vector_name, request, start, end).boxed()
        })
        .collect();

    futures::stream::iter(jobs)
        .buffered(workers.max(1))
        .try_collect()
        .await
}

/// Embed `request` entries `start..end` into point bodies.
async fn embed_sub_batch(
    embedder: &dyn Embedder,
    vector_name: &str,
    request: &AddRequest,
    start: usize,
    end: usize,
) -> Result<Vec<Value>, VectorEngineError> {
    let documents = &request.documents[start..end];
    let vectors = embedder.embed_batch(documents).await?;
    if vectors.len() != documents.len() {
        return Err(VectorEngineError::embedding(format!(
            "embedder returned {} vectors for {} documents",
            vectors.len(),
            documents.len()
        )));
    }

    Ok(vectors
        .into_iter()
        .enumerate()
        .map(|(i, vector)| {
            build_point(
                request.ids[start + i],
                vector_name,
                vector,
                &documents[i],
                &request.metadata[start + i],
            )
        })
        .collect())
}

#[async_trait]
impl VectorEngineClient for QdrantClient {
    async fn health_check(&self) -> Result<bool, VectorEngineError> {
        match self
            .send(Method::GET, "healthz", None, VectorEngineError::ConnectionError)
            .await
        {
            Ok(_) => Ok(true),
            Err(VectorEngineError::ConnectionError(e)) => Err(VectorEngineError::ConnectionError(e)),
            Err(e) => {
                debug!(error = %e, "Qdrant health check failed");
                Ok(false)
            }
        }
    }

    async fn collection_exists(&self, collection: &str) -> Result<bool, VectorEngineError> {
        let path = format!("collections/{}/exists", collection);
        let response = self
            .send(Method::GET, &path, None, VectorEngineError::CollectionError)
            .await?;
        let result: ExistsResult = Self::result(response).await?;
        Ok(result.exists)
    }

    #[instrument(skip(self))]
    async fn delete_collection(&self, collection: &str) -> Result<(), VectorEngineError> {
        let path = format!("collections/{}", collection);
        self.send(Method::DELETE, &path, None, VectorEngineError::CollectionError)
            .await?;
        info!(collection = %collection, "Deleted collection");
        Ok(())
    }

    #[instrument(skip(self, config), fields(collection = %config.name))]
    async fn create_collection(&self, config: &CollectionConfig) -> Result<(), VectorEngineError> {
        let path = format!("collections/{}", config.name);
        let body = build_create_collection(config);
        self.send(Method::PUT, &path, Some(&body), VectorEngineError::CollectionError)
            .await?;

        info!(
            collection = %config.name,
            vector_size = config.model.dimension,
            indexing_threshold = config.optimizers.indexing_threshold,
            "Created collection"
        );
        Ok(())
    }

    async fn collection_info(&self, collection: &str) -> Result<CollectionInfo, VectorEngineError> {
        let path = format!("collections/{}", collection);
        let response = self
            .send(Method::GET, &path, None, VectorEngineError::CollectionError)
            .await?;
        let result: CollectionInfoResult = Self::result(response).await?;

        Ok(CollectionInfo {
            points_count: result.points_count.unwrap_or(0),
            indexing_threshold: result.config.optimizer_config.indexing_threshold,
        })
    }

    #[instrument(skip(self))]
    async fn update_collection(
        &self,
        collection: &str,
        optimizers: &OptimizerConfig,
    ) -> Result<(), VectorEngineError> {
        let path = format!("collections/{}", collection);
        let body = build_update_collection(optimizers);
        self.send(Method::PATCH, &path, Some(&body), VectorEngineError::CollectionError)
            .await?;
        Ok(())
    }

    async fn add(&self, collection: &str, request: AddRequest) -> Result<(), VectorEngineError> {
        request.validate()?;
        if request.is_empty() {
            return Ok(());
        }

        let vector_name = self.embedder.model().vector_name();

        // Groups the embedding and upload requests of one add call.
        let span = tracing::debug_span!("engine_call", op = "add", points = request.len());
        let batches = embed_sub_batches(
            self.embedder.as_ref(),
            &vector_name,
            &request,
            request.parallel,
        )
        .instrument(span.clone())
        .await?;

        let mut uploaded = Vec::with_capacity(batches.len());
        for points in batches {
            uploaded.push(self.upsert(collection, points).instrument(span.clone()).await?);
        }

        debug!(
            points = uploaded.iter().sum::<usize>(),
            sub_batches = uploaded.len(),
            "Added points"
        );
        Ok(())
    }

    async fn scroll(
        &self,
        collection: &str,
        limit: usize,
        offset: Option<PointId>,
    ) -> Result<ScrollPage, VectorEngineError> {
        let path = format!("collections/{}/points/scroll", collection);
        let body = build_scroll(limit, offset.as_ref());
        let response = self
            .send(Method::POST, &path, Some(&body), VectorEngineError::ScrollError)
            .await?;
        Self::result(response).await
    }

    async fn batch_update_points(
        &self,
        collection: &str,
        operations: &[SetPayloadOperation],
    ) -> Result<(), VectorEngineError> {
        if operations.is_empty() {
            return Ok(());
        }
        let path = format!("collections/{}/points/batch?wait=true", collection);
        let body = build_batch_set_payload(operations);
        self.send(
            Method::POST,
            &path,
            Some(&body),
            VectorEngineError::PayloadUpdateError,
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn create_payload_index(
        &self,
        collection: &str,
        field_name: &str,
        field_schema: PayloadSchemaType,
    ) -> Result<(), VectorEngineError> {
        let path = format!("collections/{}/index?wait=true", collection);
        let body = build_payload_index(field_name, field_schema);
        self.send(
            Method::PUT,
            &path,
            Some(&body),
            VectorEngineError::IndexCreationError,
        )
        .await?;
        info!(field = %field_name, "Created payload index");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::EmbeddingModel;
    use serde_json::json;

    struct FixedEmbedder {
        model: EmbeddingModel,
    }

    #[async_trait]
    impl Embedder for FixedEmbedder {
        fn model(&self) -> &EmbeddingModel {
            &self.model
        }

        async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, VectorEngineError> {
            Ok(inputs.iter().map(|_| vec![0.0; self.model.dimension]).collect())
        }
    }

    fn client(url: &str) -> Result<QdrantClient, VectorEngineError> {
        let model = EmbeddingModel::resolve("acme/tiny", Some(4)).unwrap();
        QdrantClient::new(
            url,
            Some("secret"),
            Duration::from_secs(1),
            Arc::new(FixedEmbedder { model }),
        )
    }

    #[test]
    fn test_rejects_invalid_url() {
        assert!(client("not a url").is_err());
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let client = client("http://qdrant:6333/").unwrap();
        let url = client.endpoint("collections/questions/exists").unwrap();
        assert_eq!(url.as_str(), "http://qdrant:6333/collections/questions/exists");
    }

    #[test]
    fn test_collection_info_parsing() {
        let parsed: ApiResponse<CollectionInfoResult> = serde_json::from_value(json!({
            "result": {
                "status": "green",
                "points_count": 12,
                "config": {"optimizer_config": {"indexing_threshold": 20000}}
            },
            "status": "ok",
            "time": 0.001
        }))
        .unwrap();

        assert_eq!(parsed.result.points_count, Some(12));
        assert_eq!(parsed.result.config.optimizer_config.indexing_threshold, Some(20000));
    }

    #[tokio::test]
    async fn test_add_rejects_mismatched_request() {
        let client = client("http://127.0.0.1:1").unwrap();
        let request = AddRequest {
            ids: vec![0, 1],
            documents: vec!["only one".to_string()],
            metadata: vec![],
            batch_size: 8,
            parallel: 0,
        };

        let err = client.add("questions", request).await.unwrap_err();
        assert!(matches!(err, VectorEngineError::InvalidRequest(_)));
    }

    /// Embedder that tracks how many calls run at once.
    struct CountingEmbedder {
        model: EmbeddingModel,
        in_flight: std::sync::atomic::AtomicUsize,
        peak: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        fn model(&self) -> &EmbeddingModel {
            &self.model
        }

        async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, VectorEngineError> {
            use std::sync::atomic::Ordering;
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(inputs
                .iter()
                .map(|text| vec![text.len() as f32; self.model.dimension])
                .collect())
        }
    }

    fn numbered_request(n: u64, batch_size: usize, parallel: usize) -> AddRequest {
        AddRequest {
            ids: (0..n).collect(),
            documents: (0..n).map(|i| "x".repeat(i as usize + 1)).collect(),
            metadata: (0..n)
                .map(|i| json!({"Id": i}).as_object().cloned().unwrap())
                .collect(),
            batch_size,
            parallel,
        }
    }

    #[tokio::test]
    async fn test_parallel_embedding_keeps_request_order() {
        let embedder = CountingEmbedder {
            model: EmbeddingModel::resolve("acme/tiny", Some(2)).unwrap(),
            in_flight: Default::default(),
            peak: Default::default(),
        };
        let request = numbered_request(7, 2, 3);

        let batches = embed_sub_batches(&embedder, "fast-tiny", &request, request.parallel)
            .await
            .unwrap();

        assert_eq!(batches.iter().map(Vec::len).collect::<Vec<_>>(), vec![2, 2, 2, 1]);
        let points: Vec<&Value> = batches.iter().flatten().collect();
        for (i, point) in points.iter().enumerate() {
            assert_eq!(point["id"], i as u64);
            assert_eq!(point["payload"]["Id"], i as u64);
            assert_eq!(point["vector"]["fast-tiny"][0], (i + 1) as f64);
        }
        let peak = embedder.peak.load(std::sync::atomic::Ordering::SeqCst);
        assert!(peak > 1 && peak <= 3, "peak concurrency {}", peak);
    }

    #[tokio::test]
    async fn test_sequential_embedding_runs_one_call_at_a_time() {
        let embedder = CountingEmbedder {
            model: EmbeddingModel::resolve("acme/tiny", Some(2)).unwrap(),
            in_flight: Default::default(),
            peak: Default::default(),
        };
        let request = numbered_request(5, 2, 0);

        embed_sub_batches(&embedder, "fast-tiny", &request, request.parallel)
            .await
            .unwrap();

        assert_eq!(embedder.peak.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_parallel_add_surfaces_upload_failure() {
        let client = client("http://127.0.0.1:1").unwrap();

        let err = client
            .add("questions", numbered_request(5, 2, 4))
            .await
            .unwrap_err();

        assert!(matches!(err, VectorEngineError::ConnectionError(_)));
    }

    #[tokio::test]
    async fn test_add_empty_request_is_noop() {
        let client = client("http://127.0.0.1:1").unwrap();
        assert!(client.add("questions", AddRequest::default()).await.is_ok());
    }
}
