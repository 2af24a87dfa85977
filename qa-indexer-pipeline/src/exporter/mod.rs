//! Export stage.
//!
//! Coordinates the extractor and the archive: enumerate question ids,
//! build each document, store it, and write the manifest only when every id
//! produced a distinct digest.

use std::collections::HashSet;

use qa_indexer_shared::ContentAddress;
use tracing::{info, instrument};

use crate::archive::ContentArchive;
use crate::errors::PipelineError;
use crate::extractor::{HierarchicalExtractor, IdCache};

/// Configuration for an export run.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub id_cache: IdCache,
    /// Log progress every this many documents.
    pub progress_interval: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            id_cache: IdCache::default(),
            progress_interval: 10_000,
        }
    }
}

/// Outcome of a completed export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub documents: usize,
    pub manifest: Vec<ContentAddress>,
}

/// Runs a full export from the relational source into the archive.
pub struct Exporter {
    extractor: HierarchicalExtractor,
    archive: ContentArchive,
    config: ExportConfig,
}

impl Exporter {
    pub fn new(extractor: HierarchicalExtractor, archive: ContentArchive) -> Self {
        Self::with_config(extractor, archive, ExportConfig::default())
    }

    pub fn with_config(
        extractor: HierarchicalExtractor,
        archive: ContentArchive,
        config: ExportConfig,
    ) -> Self {
        Self {
            extractor,
            archive,
            config,
        }
    }

    /// Run the export.
    ///
    /// Any extraction or storage failure aborts the run with an integrity
    /// error naming the cause. Files written before the failure stay on disk,
    /// but no manifest is produced.
    #[instrument(skip(self), fields(archive = %self.archive.root().display()))]
    pub async fn run(&self) -> Result<ExportSummary, PipelineError> {
        let ids = self
            .config
            .id_cache
            .question_ids(self.extractor.source())
            .await?;
        info!(count = ids.len(), "Exporting questions");

        let interval = self.config.progress_interval.max(1);
        let mut manifest = Vec::with_capacity(ids.len());
        let mut distinct = HashSet::with_capacity(ids.len());

        for (done, id) in ids.iter().enumerate() {
            let address = self.export_one(*id).await.map_err(|e| {
                PipelineError::integrity(format!(
                    "archived {} of {} questions; aborting at question {}: {}",
                    done,
                    ids.len(),
                    id,
                    e
                ))
            })?;
            distinct.insert(address.clone());
            manifest.push(address);

            if (done + 1) % interval == 0 {
                info!(exported = done + 1, total = ids.len(), "Export progress");
            }
        }

        if distinct.len() != ids.len() {
            return Err(PipelineError::integrity(format!(
                "{} question ids produced {} distinct digests",
                ids.len(),
                distinct.len()
            )));
        }

        self.archive.write_manifest(&manifest).await?;
        info!(documents = manifest.len(), "Export completed");

        Ok(ExportSummary {
            documents: manifest.len(),
            manifest,
        })
    }

    async fn export_one(&self, id: i32) -> Result<ContentAddress, PipelineError> {
        let document = self.extractor.extract(id).await?;
        self.archive.put(&document).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::extractor::testing::MemorySource;

    async fn exporter(source: MemorySource, root: &std::path::Path) -> Exporter {
        let archive = ContentArchive::create(root, false).await.unwrap();
        let config = ExportConfig {
            id_cache: IdCache {
                path: root.with_extension("ids.json"),
                ..IdCache::default()
            },
            progress_interval: 2,
        };
        Exporter::with_config(HierarchicalExtractor::new(Arc::new(source)), archive, config)
    }

    #[tokio::test]
    async fn test_export_writes_documents_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("dump");
        let mut source = MemorySource::with_questions(&[0, 1, 2]);
        source.add_answer(0, 10);

        let summary = exporter(source, &root).await.run().await.unwrap();

        assert_eq!(summary.documents, 3);
        let archive = ContentArchive::open(&root).unwrap();
        let manifest = archive.read_manifest().await.unwrap();
        assert_eq!(manifest, summary.manifest);
        for (id, address) in [0, 1, 2].into_iter().zip(&manifest) {
            assert_eq!(address, &ContentAddress::of(id));
            assert_eq!(archive.get(address).await.unwrap().id, id);
        }
    }

    #[tokio::test]
    async fn test_duplicate_ids_fail_integrity_check() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("dump");
        let source = MemorySource::with_questions(&[4, 4]);

        let err = exporter(source, &root).await.run().await.unwrap_err();

        assert!(matches!(err, PipelineError::IntegrityError(_)));
        assert!(!root.join("hashes.json").exists());
    }

    #[tokio::test]
    async fn test_failed_record_aborts_without_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("dump");
        let mut source = MemorySource::with_questions(&[0, 1, 2]);
        source.add_answer(2, 20);
        source.fail_answer(20);

        let err = exporter(source, &root).await.run().await.unwrap_err();

        match err {
            PipelineError::IntegrityError(msg) => {
                assert!(msg.contains("archived 2 of 3"), "{}", msg);
                assert!(msg.contains("connection reset"), "{}", msg);
            }
            other => panic!("expected integrity error, got {:?}", other),
        }
        assert!(!root.join("hashes.json").exists());
        let archive = ContentArchive::open(&root).unwrap();
        assert!(archive.contains(&ContentAddress::of(0)));
        assert!(archive.contains(&ContentAddress::of(1)));
    }
}
