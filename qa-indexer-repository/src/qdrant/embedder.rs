//! Qdrant inference embedding client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collection::EmbeddingModel;
use crate::errors::VectorEngineError;
use crate::interfaces::Embedder;

/// Embeddings client that talks to a Qdrant inference endpoint.
#[derive(Clone)]
pub struct QdrantInferenceEmbedder {
    client: Client,
    endpoint: String,
    model: EmbeddingModel,
}

impl QdrantInferenceEmbedder {
    /// Builds a new inference client.
    ///
    /// # Arguments
    /// * `endpoint` - Full inference endpoint, e.g. `http://qdrant:6333/inference/text`
    /// * `api_key` - Value for the `api-key` header, if the cluster requires one
    /// * `model` - Model advertised by the cluster
    pub fn new(
        endpoint: &str,
        api_key: Option<&str>,
        model: EmbeddingModel,
        timeout: Duration,
    ) -> Result<Self, VectorEngineError> {
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(VectorEngineError::invalid_request(
                "inference endpoint must be an http(s) URL",
            ));
        }

        let mut headers = HeaderMap::new();
        if let Some(key) = api_key.map(str::trim).filter(|k| !k.is_empty()) {
            headers.insert(
                "api-key",
                HeaderValue::from_str(key)
                    .map_err(|e| VectorEngineError::invalid_request(format!("invalid API key: {}", e)))?,
            );
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| VectorEngineError::connection(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model,
        })
    }
}

#[async_trait]
impl Embedder for QdrantInferenceEmbedder {
    fn model(&self) -> &EmbeddingModel {
        &self.model
    }

    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, VectorEngineError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let request = InferenceRequest {
            model: &self.model.name,
            inputs,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| VectorEngineError::connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(VectorEngineError::embedding(format!(
                "inference request failed ({}): {}",
                status, body
            )));
        }

        let payload: InferenceResponse = response
            .json()
            .await
            .map_err(|e| VectorEngineError::parse(e.to_string()))?;
        let embeddings = payload.into_embeddings(inputs.len())?;
        check_dimensions(&embeddings, self.model.dimension)?;

        debug!(count = embeddings.len(), model = %self.model.name, "Embedded batch");
        Ok(embeddings)
    }
}

fn check_dimensions(embeddings: &[Vec<f32>], expected: usize) -> Result<(), VectorEngineError> {
    match embeddings.iter().find(|e| e.len() != expected) {
        Some(bad) => Err(VectorEngineError::embedding(format!(
            "model returned a {}-dimensional vector, collection expects {}",
            bad.len(),
            expected
        ))),
        None => Ok(()),
    }
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    model: &'a str,
    #[serde(rename = "input")]
    inputs: &'a [String],
}

#[derive(Debug, Deserialize)]
struct InferenceResponse {
    #[serde(default)]
    data: Vec<InferenceData>,
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}

impl InferenceResponse {
    fn into_embeddings(self, expected_len: usize) -> Result<Vec<Vec<f32>>, VectorEngineError> {
        if !self.data.is_empty() {
            if self.data.len() != expected_len {
                return Err(VectorEngineError::embedding(format!(
                    "inference returned {} embeddings for {} inputs",
                    self.data.len(),
                    expected_len
                )));
            }
            let mut data = self.data;
            data.sort_by_key(|d| d.index.unwrap_or(0));
            return Ok(data.into_iter().map(|d| d.embedding).collect());
        }
        if !self.embeddings.is_empty() {
            if self.embeddings.len() != expected_len {
                return Err(VectorEngineError::embedding(format!(
                    "inference returned {} embeddings for {} inputs",
                    self.embeddings.len(),
                    expected_len
                )));
            }
            return Ok(self.embeddings);
        }
        Err(VectorEngineError::parse(
            "inference response missing embedding payloads",
        ))
    }
}

#[derive(Debug, Deserialize)]
struct InferenceData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_entries_are_reordered_by_index() {
        let response: InferenceResponse = serde_json::from_value(json!({
            "data": [
                {"embedding": [2.0], "index": 1},
                {"embedding": [1.0], "index": 0}
            ]
        }))
        .unwrap();

        let embeddings = response.into_embeddings(2).unwrap();
        assert_eq!(embeddings, vec![vec![1.0], vec![2.0]]);
    }

    #[test]
    fn test_plain_embeddings_shape() {
        let response: InferenceResponse =
            serde_json::from_value(json!({"embeddings": [[0.1, 0.2]]})).unwrap();
        assert_eq!(response.into_embeddings(1).unwrap().len(), 1);
    }

    #[test]
    fn test_count_mismatch_is_error() {
        let response: InferenceResponse =
            serde_json::from_value(json!({"embeddings": [[0.1]]})).unwrap();
        assert!(response.into_embeddings(2).is_err());
    }

    #[test]
    fn test_empty_response_is_error() {
        let response: InferenceResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.into_embeddings(1).is_err());
    }

    #[test]
    fn test_dimension_check() {
        assert!(check_dimensions(&[vec![0.0; 4]], 4).is_ok());
        assert!(check_dimensions(&[vec![0.0; 4], vec![0.0; 3]], 4).is_err());
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        let model = EmbeddingModel::resolve("BAAI/bge-small-en-v1.5", None).unwrap();
        let result = QdrantInferenceEmbedder::new(
            "qdrant:6333/inference",
            None,
            model,
            Duration::from_secs(1),
        );
        assert!(result.is_err());
    }
}
