//! # Q&A Indexer
//!
//! Entry point and configuration for the Q&A corpus indexer.
//!
//! The binary exposes the three pipeline stages as subcommands (`export`,
//! `load`, `postprocess`) that run one after another and can each be
//! repeated on their own.

pub mod commands;
pub mod config;
pub mod telemetry;

pub use config::{Cli, Dependencies};

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] qa_indexer_pipeline::PipelineError),

    /// Vector engine error.
    #[error("Vector engine error: {0}")]
    EngineError(#[from] qa_indexer_repository::VectorEngineError),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
