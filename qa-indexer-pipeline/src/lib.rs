//! # Q&A Indexer Pipeline
//!
//! This crate provides the stages that move a Q&A corpus from a relational
//! dump into a vector collection.
//!
//! ## Architecture
//!
//! The pipeline runs as three independent, resumable stages:
//!
//! 1. **Export**: the extractor assembles one nested document per question
//!    and the archive stores it under the SHA-512 digest of its id
//! 2. **Load**: the loader streams archived documents into a collection
//!    created with indexing deferred, then enables indexing
//! 3. **Postprocess**: the postprocessor adds derived counters to every
//!    point and indexes one of them
//!
//! Each stage runs sequentially; the only concurrency is the embedding
//! worker pool inside the engine client.

pub mod archive;
pub mod errors;
pub mod exporter;
pub mod extractor;
pub mod loader;
pub mod postprocessor;

pub use archive::{ContentArchive, MANIFEST_FILE};
pub use errors::PipelineError;
pub use exporter::{ExportConfig, ExportSummary, Exporter};
pub use extractor::{
    HierarchicalExtractor, IdCache, PostgresConfig, PostgresSource, RecordSource,
    DEFAULT_ID_DUMP_PATH,
};
pub use loader::{BulkLoader, LoadSummary, LoaderConfig};
pub use postprocessor::{PostprocessConfig, PostprocessSummary, Postprocessor, DEFAULT_INDEX_FIELD};
