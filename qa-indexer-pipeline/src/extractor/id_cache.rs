//! Cached question-id enumeration.
//!
//! Scanning `Posts` for every question id is the most expensive query of
//! an export. Operators can capture the list once and reuse it on resumed
//! runs. Reuse is opt-in and always logged, because a stale list silently
//! misses questions inserted after it was captured.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::errors::PipelineError;
use crate::extractor::source::RecordSource;

/// Default location of the id dump.
pub const DEFAULT_ID_DUMP_PATH: &str = "question_id_dump.json";

/// Controls whether the id list is read from or written to disk.
#[derive(Debug, Clone)]
pub struct IdCache {
    pub path: PathBuf,
    /// Read the list from `path` when it exists instead of scanning.
    pub reuse: bool,
    /// Write a freshly scanned list to `path`.
    pub save: bool,
}

impl Default for IdCache {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_ID_DUMP_PATH),
            reuse: false,
            save: false,
        }
    }
}

impl IdCache {
    /// Return the question ids, from the dump or from a full scan.
    pub async fn question_ids(&self, source: &dyn RecordSource) -> Result<Vec<i32>, PipelineError> {
        if self.reuse && self.path.exists() {
            warn!(path = %self.path.display(), "Reusing question id dump; newly inserted questions will be missed");
            return read_ids(&self.path).await;
        }

        info!("Fetching question ids");
        let ids = source.question_ids().await?;

        if self.save {
            info!(path = %self.path.display(), count = ids.len(), "Saving question id dump");
            write_ids(&self.path, &ids).await?;
        }
        Ok(ids)
    }
}

async fn read_ids(path: &Path) -> Result<Vec<i32>, PipelineError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| PipelineError::io(path, e))?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn write_ids(path: &Path, ids: &[i32]) -> Result<(), PipelineError> {
    let bytes = serde_json::to_vec(ids)?;
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| PipelineError::io(path, e))
}
