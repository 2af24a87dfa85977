//! Qdrant implementation of the vector engine client.
//!
//! This module provides a concrete implementation of `VectorEngineClient`
//! that talks to Qdrant over its REST API, and an `Embedder` backed by a
//! Qdrant inference endpoint.

mod client;
mod embedder;
mod requests;

pub use client::QdrantClient;
pub use embedder::QdrantInferenceEmbedder;
pub use requests::DOCUMENT_PAYLOAD_KEY;
