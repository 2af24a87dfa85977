//! Interface definitions for the vector engine and embedding model.
//!
//! These traits allow dependency injection and swappable backends; the
//! pipeline only ever talks to `dyn VectorEngineClient`.

mod embedder;
mod vector_engine_client;

pub use embedder::Embedder;
pub use vector_engine_client::VectorEngineClient;
