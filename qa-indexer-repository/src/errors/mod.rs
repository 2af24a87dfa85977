//! Error types for the vector engine repository.

mod vector_engine_error;

pub use vector_engine_error::VectorEngineError;
