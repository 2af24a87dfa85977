//! Error types for the indexer pipeline.

use std::path::PathBuf;

use qa_indexer_repository::VectorEngineError;
use qa_indexer_shared::{ContentAddress, MetadataError};
use thiserror::Error;

/// Errors that can occur in the indexer pipeline.
///
/// Every variant aborts the current run; nothing here is retried.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Archive or manifest integrity check failed.
    #[error("Integrity error: {0}")]
    IntegrityError(String),

    /// Two distinct primary identifiers produced the same content address.
    #[error("Hash collision at {address}: archived id {existing}, incoming id {incoming}")]
    HashCollision {
        address: ContentAddress,
        existing: i32,
        incoming: i32,
    },

    /// A target that must not be overwritten already exists.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Error from the relational source.
    #[error("Source error: {0}")]
    SourceError(String),

    /// A record the source claimed to have could not be found.
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    /// Error from the vector engine.
    #[error("Vector engine error: {0}")]
    EngineError(#[from] VectorEngineError),

    /// A document cannot be (de)serialized.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A load was asked to resume past the end of the manifest.
    #[error("Start offset {offset} is beyond the manifest length {manifest_len}")]
    OffsetOutOfRange { offset: usize, manifest_len: usize },

    /// A stored document or payload lacks a required field.
    #[error("Missing field '{field}' in {context}")]
    MissingField { field: String, context: String },

    /// Filesystem error.
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Create an integrity error.
    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::IntegrityError(msg.into())
    }

    /// Create an already-exists error.
    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::AlreadyExists(msg.into())
    }

    /// Create a relational source error.
    pub fn database(msg: impl Into<String>) -> Self {
        Self::SourceError(msg.into())
    }

    /// Create a missing-field error.
    pub fn missing_field(field: impl Into<String>, context: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
            context: context.into(),
        }
    }

    /// Wrap an IO error with the path it happened at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<tokio_postgres::Error> for PipelineError {
    fn from(err: tokio_postgres::Error) -> Self {
        Self::SourceError(err.to_string())
    }
}

impl From<MetadataError> for PipelineError {
    fn from(err: MetadataError) -> Self {
        Self::missing_field(err.field, "point payload")
    }
}
