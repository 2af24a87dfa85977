//! # Q&A Indexer Repository
//!
//! This crate provides traits and implementations for talking to the vector
//! engine. It includes the error types, the `VectorEngineClient` and
//! `Embedder` interfaces, collection configuration, a Qdrant REST
//! implementation and an in-memory implementation.

pub mod collection;
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod qdrant;
pub mod types;

pub use collection::{
    CollectionConfig, Distance, EmbeddingModel, OptimizerConfig, ScalarQuantization, ScalarType,
};
pub use errors::VectorEngineError;
pub use interfaces::{Embedder, VectorEngineClient};
pub use memory::InMemoryVectorEngine;
pub use qdrant::{QdrantClient, QdrantInferenceEmbedder};
pub use types::{
    AddRequest, CollectionInfo, PayloadSchemaType, PointRecord, ScrollPage, SetPayloadOperation,
};
