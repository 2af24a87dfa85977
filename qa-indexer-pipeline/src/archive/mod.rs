//! Content-addressed JSON archive.
//!
//! Each question document is stored at
//! `<root>/<addr[0:2]>/<addr[2:4]>/<addr>.json`, where `addr` is the
//! SHA-512 hex digest of the question id. The two-level fan-out keeps any
//! single directory small. `hashes.json` at the root lists the digests of a
//! completed export in enumeration order.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use qa_indexer_shared::{ContentAddress, QuestionDocument};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::errors::PipelineError;

/// File name of the manifest at the archive root.
pub const MANIFEST_FILE: &str = "hashes.json";

const MANIFEST_TMP_FILE: &str = "hashes.json.tmp";

/// Only the identifier of a stored document, for collision checks.
#[derive(Deserialize)]
struct StoredId {
    #[serde(rename = "Id")]
    id: i32,
}

/// Handle to an archive directory.
#[derive(Debug, Clone)]
pub struct ContentArchive {
    root: PathBuf,
}

impl ContentArchive {
    /// Create a fresh archive at `root`.
    ///
    /// Fails with `AlreadyExists` before touching anything when the root is
    /// present and `overwrite` is false. With `overwrite` the existing tree is
    /// removed.
    pub async fn create(root: impl Into<PathBuf>, overwrite: bool) -> Result<Self, PipelineError> {
        let root = root.into();

        if root.exists() {
            if !overwrite {
                return Err(PipelineError::already_exists(format!(
                    "archive directory {}",
                    root.display()
                )));
            }
            warn!(path = %root.display(), "Removing existing archive directory");
            tokio::fs::remove_dir_all(&root)
                .await
                .map_err(|e| PipelineError::io(&root, e))?;
        }

        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| PipelineError::io(&root, e))?;
        info!(path = %root.display(), "Created archive directory");

        Ok(Self { root })
    }

    /// Open an existing archive for reading.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, PipelineError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(PipelineError::io(
                &root,
                std::io::Error::new(std::io::ErrorKind::NotFound, "archive directory not found"),
            ));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of the file for a digest.
    pub fn path_for(&self, address: &ContentAddress) -> PathBuf {
        self.root.join(address.relative_path())
    }

    /// Store a document under the address of its id.
    ///
    /// Writing the same document twice is harmless. A file at the same path
    /// that holds a different id is a hash collision.
    #[instrument(skip(self, document), fields(id = document.id))]
    pub async fn put(&self, document: &QuestionDocument) -> Result<ContentAddress, PipelineError> {
        let address = ContentAddress::of(document.id);
        let path = self.path_for(&address);

        if path.exists() {
            let existing = self.read_stored_id(&path).await?;
            if existing != document.id {
                return Err(PipelineError::HashCollision {
                    address,
                    existing,
                    incoming: document.id,
                });
            }
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PipelineError::io(parent, e))?;
        }

        let bytes = serde_json::to_vec_pretty(document)?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| PipelineError::io(&path, e))?;

        debug!(address = %address, "Archived document");
        Ok(address)
    }

    /// Read a document back by digest.
    pub async fn get(&self, address: &ContentAddress) -> Result<QuestionDocument, PipelineError> {
        let path = self.path_for(address);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| PipelineError::io(&path, e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Whether a document is stored for the digest.
    pub fn contains(&self, address: &ContentAddress) -> bool {
        self.path_for(address).is_file()
    }

    /// Persist the manifest through a temporary file and a rename, so a
    /// reader never sees a half-written list.
    pub async fn write_manifest(&self, addresses: &[ContentAddress]) -> Result<(), PipelineError> {
        let tmp = self.root.join(MANIFEST_TMP_FILE);
        let target = self.root.join(MANIFEST_FILE);

        let bytes = serde_json::to_vec(addresses)?;
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| PipelineError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &target)
            .await
            .map_err(|e| PipelineError::io(&target, e))?;

        info!(count = addresses.len(), path = %target.display(), "Wrote manifest");
        Ok(())
    }

    /// Read the manifest of a completed export.
    pub async fn read_manifest(&self) -> Result<Vec<ContentAddress>, PipelineError> {
        let path = self.manifest_path();
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| PipelineError::io(&path, e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    /// Number of documents per leaf directory, keyed by `aa/bb`.
    pub async fn shard_counts(&self) -> Result<BTreeMap<String, usize>, PipelineError> {
        let mut counts = BTreeMap::new();

        for first in subdirectories(&self.root).await? {
            for second in subdirectories(&first).await? {
                let mut files = 0;
                let mut entries = tokio::fs::read_dir(&second)
                    .await
                    .map_err(|e| PipelineError::io(&second, e))?;
                while let Some(entry) = entries
                    .next_entry()
                    .await
                    .map_err(|e| PipelineError::io(&second, e))?
                {
                    if entry.path().extension().is_some_and(|ext| ext == "json") {
                        files += 1;
                    }
                }

                let key = format!("{}/{}", file_name(&first), file_name(&second));
                counts.insert(key, files);
            }
        }

        Ok(counts)
    }

    async fn read_stored_id(&self, path: &Path) -> Result<i32, PipelineError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PipelineError::io(path, e))?;
        let stored: StoredId = serde_json::from_slice(&bytes)?;
        Ok(stored.id)
    }
}

async fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let mut dirs = Vec::new();
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| PipelineError::io(dir, e))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| PipelineError::io(dir, e))?
    {
        let path = entry.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
