//! Collection configuration for the vector engine.
//!
//! Everything in here except the optimizer settings is fixed when the
//! collection is created; changing the quantization or vector layout
//! requires rebuilding the collection.

use serde::{Deserialize, Serialize};

use crate::errors::VectorEngineError;

/// Default collection name.
pub const DEFAULT_COLLECTION_NAME: &str = "stackoverflow_question_pages";

/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "BAAI/bge-small-en-v1.5";

/// Indexing threshold applied once bulk loading has finished.
pub const DEFAULT_INDEXING_THRESHOLD: u64 = 20_000;

/// Models whose output dimensionality is known without asking the model.
const KNOWN_MODELS: &[(&str, usize)] = &[
    ("BAAI/bge-small-en-v1.5", 384),
    ("BAAI/bge-base-en-v1.5", 768),
    ("BAAI/bge-large-en-v1.5", 1024),
    ("sentence-transformers/all-MiniLM-L6-v2", 384),
    ("nomic-ai/nomic-embed-text-v1.5", 768),
    ("intfloat/multilingual-e5-large", 1024),
];

/// An embedding model together with the vector size it produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingModel {
    pub name: String,
    pub dimension: usize,
}

impl EmbeddingModel {
    /// Resolve a model by name, using `dimension` when the model is unknown.
    pub fn resolve(name: &str, dimension: Option<usize>) -> Result<Self, VectorEngineError> {
        let known = KNOWN_MODELS
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|(_, dim)| *dim);

        match dimension.or(known) {
            Some(0) => Err(VectorEngineError::invalid_request(
                "embedding dimension must be positive",
            )),
            Some(dimension) => Ok(Self {
                name: name.to_string(),
                dimension,
            }),
            None => Err(VectorEngineError::invalid_request(format!(
                "unknown embedding model '{}'; pass an explicit vector size",
                name
            ))),
        }
    }

    /// Name of the vector slot this model writes into, e.g. `fast-bge-small-en-v1.5`.
    pub fn vector_name(&self) -> String {
        let short = self.name.rsplit('/').next().unwrap_or(&self.name);
        format!("fast-{}", short.to_lowercase())
    }
}

/// Vector similarity metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Distance {
    Cosine,
    Dot,
    Euclid,
}

/// Scalar quantization settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalarQuantization {
    /// Quantized element type. Only `int8` is supported by the engine.
    #[serde(rename = "type")]
    pub kind: ScalarType,
    /// Quantile used to clip outliers before quantizing.
    pub quantile: f32,
    /// Keep quantized vectors resident in RAM even when originals live on disk.
    pub always_ram: bool,
}

/// Element type of scalar-quantized vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Int8,
}

impl Default for ScalarQuantization {
    fn default() -> Self {
        Self {
            kind: ScalarType::Int8,
            quantile: 0.99,
            always_ram: true,
        }
    }
}

/// Optimizer settings that may change after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Point count above which the engine builds its vector index.
    /// Zero defers indexing indefinitely.
    pub indexing_threshold: u64,
}

impl OptimizerConfig {
    /// Settings that keep the engine from building an index.
    pub fn deferred() -> Self {
        Self {
            indexing_threshold: 0,
        }
    }

    /// Settings that enable indexing above `threshold` points.
    pub fn with_threshold(threshold: u64) -> Self {
        Self {
            indexing_threshold: threshold,
        }
    }
}

/// Full configuration used when creating a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionConfig {
    pub name: String,
    pub model: EmbeddingModel,
    pub distance: Distance,
    /// Store original vectors on disk rather than in memory.
    pub on_disk: bool,
    pub quantization: ScalarQuantization,
    pub optimizers: OptimizerConfig,
}

impl CollectionConfig {
    /// Configuration for a bulk load: vectors on disk, int8 quantization
    /// kept in RAM, indexing deferred.
    pub fn for_bulk_load(name: impl Into<String>, model: EmbeddingModel) -> Self {
        Self {
            name: name.into(),
            model,
            distance: Distance::Cosine,
            on_disk: true,
            quantization: ScalarQuantization::default(),
            optimizers: OptimizerConfig::deferred(),
        }
    }
}
