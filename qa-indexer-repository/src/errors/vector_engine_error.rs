//! Vector engine error types.
//!
//! This module defines the error types that can occur while talking to the
//! vector engine or the embedding model behind it.

use thiserror::Error;

/// Errors that can occur during vector engine operations.
#[derive(Error, Debug)]
pub enum VectorEngineError {
    /// Failed to establish connection to the vector engine.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// A collection-level request (create, delete, update, info) failed.
    #[error("Collection error: {0}")]
    CollectionError(String),

    /// Uploading points failed.
    #[error("Upsert error: {0}")]
    UpsertError(String),

    /// Fetching a scroll page failed.
    #[error("Scroll error: {0}")]
    ScrollError(String),

    /// A batch payload update failed.
    #[error("Payload update error: {0}")]
    PayloadUpdateError(String),

    /// Failed to create a payload index.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// The embedding model call failed.
    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    /// Failed to parse a response from the vector engine.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to serialize data for the vector engine.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The request was rejected before being sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Collection not found.
    #[error("Collection not found: {0}")]
    NotFound(String),
}

impl VectorEngineError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a collection error.
    pub fn collection(msg: impl Into<String>) -> Self {
        Self::CollectionError(msg.into())
    }

    /// Create an upsert error.
    pub fn upsert(msg: impl Into<String>) -> Self {
        Self::UpsertError(msg.into())
    }

    /// Create a scroll error.
    pub fn scroll(msg: impl Into<String>) -> Self {
        Self::ScrollError(msg.into())
    }

    /// Create a payload update error.
    pub fn payload_update(msg: impl Into<String>) -> Self {
        Self::PayloadUpdateError(msg.into())
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    /// Create an embedding error.
    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::EmbeddingError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create an invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }
}

impl From<serde_json::Error> for VectorEngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
