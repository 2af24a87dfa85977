//! Command-line and environment configuration.
//!
//! Every global flag falls back to an environment variable, so the binary
//! can be configured entirely through a `.env` file next to the deployment.

mod dependencies;

pub use dependencies::Dependencies;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use qa_indexer_pipeline::{
    IdCache, LoaderConfig, PostgresConfig, PostprocessConfig, DEFAULT_ID_DUMP_PATH,
    DEFAULT_INDEX_FIELD,
};
use qa_indexer_repository::collection::{
    DEFAULT_COLLECTION_NAME, DEFAULT_EMBEDDING_MODEL, DEFAULT_INDEXING_THRESHOLD,
};
use qa_indexer_repository::EmbeddingModel;

use crate::IndexingError;

#[derive(Debug, Parser)]
#[command(name = "qa-indexer")]
#[command(about = "Export a Q&A corpus to a content-addressed archive and index it into Qdrant", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract every question from Postgres into the archive
    Export(ExportArgs),
    /// Upload the archive into a fresh collection and enable indexing
    Load(LoadArgs),
    /// Add derived counters to every point and index them
    Postprocess(PostprocessArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Qdrant REST URL
    #[arg(long, env = "QDRANT_URL", default_value = "http://qdrant:6333", global = true)]
    pub qdrant_url: String,

    /// Qdrant API key
    #[arg(long, env = "QDRANT__SERVICE__API_KEY", hide_env_values = true, global = true)]
    pub qdrant_api_key: Option<String>,

    /// Embedding endpoint (default: <qdrant-url>/inference/text)
    #[arg(long, env = "QDRANT_INFERENCE_URL", global = true)]
    pub inference_url: Option<String>,

    /// Target collection
    #[arg(long, env = "QA_COLLECTION", default_value = DEFAULT_COLLECTION_NAME, global = true)]
    pub collection: String,

    /// Embedding model name
    #[arg(long, env = "QA_EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL, global = true)]
    pub embedding_model: String,

    /// Vector size, required for models not in the built-in table
    #[arg(long, env = "QA_VECTOR_SIZE", global = true)]
    pub vector_size: Option<usize>,

    /// Archive root directory
    #[arg(
        long,
        env = "QA_ARCHIVE_DIR",
        default_value = "data/stackoverflow_questions_json_dump",
        global = true
    )]
    pub archive_dir: PathBuf,

    #[arg(long, env = "POSTGRES_HOST", default_value = "postgres", global = true)]
    pub postgres_host: String,

    #[arg(long, env = "POSTGRES_PORT", default_value_t = 5432, global = true)]
    pub postgres_port: u16,

    #[arg(long, env = "POSTGRES_DB", default_value = "dump", global = true)]
    pub postgres_db: String,

    #[arg(long, env = "POSTGRES_USER", global = true)]
    pub postgres_user: Option<String>,

    #[arg(long, env = "POSTGRES_PASSWORD", hide_env_values = true, global = true)]
    pub postgres_password: Option<String>,

    /// Timeout for each engine and embedding request, in seconds
    #[arg(long, env = "QA_REQUEST_TIMEOUT_SECS", default_value_t = 20, global = true)]
    pub request_timeout_secs: u64,

    #[arg(long, env = "QA_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    /// Read question ids from the id dump instead of scanning Posts
    #[arg(long)]
    pub reuse_id_dump: bool,

    /// Write the scanned question ids to the id dump
    #[arg(long)]
    pub save_id_dump: bool,

    #[arg(long, default_value = DEFAULT_ID_DUMP_PATH)]
    pub id_dump_path: PathBuf,

    /// Remove an existing archive directory first
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, Args)]
pub struct LoadArgs {
    /// Documents per upload
    #[arg(long, default_value_t = 1000)]
    pub batch_size: usize,

    /// Texts per embedding call
    #[arg(long, default_value_t = 8)]
    pub embed_batch_size: usize,

    /// Concurrent embedding workers (0 runs sequentially)
    #[arg(long, default_value_t = 0)]
    pub parallel: usize,

    /// Manifest position to resume from; skips collection provisioning
    #[arg(long, default_value_t = 0)]
    pub start_offset: usize,

    /// Indexing threshold set once the upload completes
    #[arg(long, default_value_t = DEFAULT_INDEXING_THRESHOLD)]
    pub indexing_threshold: u64,

    /// Fail instead of deleting an existing collection
    #[arg(long)]
    pub keep_existing: bool,
}

#[derive(Debug, Clone, Args)]
pub struct PostprocessArgs {
    /// Points per scroll page
    #[arg(long, default_value_t = 100)]
    pub batch_size: usize,

    /// Payload field to index after the pass
    #[arg(long, default_value = DEFAULT_INDEX_FIELD)]
    pub index_field: String,
}

impl GlobalArgs {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn inference_endpoint(&self) -> String {
        self.inference_url.clone().unwrap_or_else(|| {
            format!("{}/inference/text", self.qdrant_url.trim_end_matches('/'))
        })
    }

    pub fn embedding_model(&self) -> Result<EmbeddingModel, IndexingError> {
        Ok(EmbeddingModel::resolve(&self.embedding_model, self.vector_size)?)
    }

    pub fn postgres(&self) -> PostgresConfig {
        PostgresConfig {
            host: self.postgres_host.clone(),
            port: self.postgres_port,
            dbname: self.postgres_db.clone(),
            user: self.postgres_user.clone(),
            password: self.postgres_password.clone(),
            ..PostgresConfig::default()
        }
    }
}

impl ExportArgs {
    pub fn id_cache(&self) -> IdCache {
        IdCache {
            path: self.id_dump_path.clone(),
            reuse: self.reuse_id_dump,
            save: self.save_id_dump,
        }
    }
}

impl LoadArgs {
    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            batch_size: self.batch_size,
            embed_batch_size: self.embed_batch_size,
            parallel: self.parallel,
            start_offset: self.start_offset,
            ..LoaderConfig::default()
        }
    }
}

impl PostprocessArgs {
    pub fn postprocess_config(&self) -> PostprocessConfig {
        PostprocessConfig {
            batch_size: self.batch_size,
            index_field: self.index_field.clone(),
            ..PostprocessConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("qa-indexer").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_load_defaults() {
        let cli = parse(&["load"]);
        let Command::Load(args) = cli.command else {
            panic!("expected load");
        };
        let config = args.loader_config();
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.embed_batch_size, 8);
        assert_eq!(config.parallel, 0);
        assert_eq!(config.start_offset, 0);
        assert_eq!(args.indexing_threshold, 20_000);
        assert!(!args.keep_existing);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&[
            "postprocess",
            "--batch-size",
            "50",
            "--qdrant-url",
            "http://localhost:6333/",
            "--collection",
            "qa_test",
        ]);
        assert_eq!(cli.global.collection, "qa_test");
        assert_eq!(
            cli.global.inference_endpoint(),
            "http://localhost:6333/inference/text"
        );
        let Command::Postprocess(args) = cli.command else {
            panic!("expected postprocess");
        };
        let config = args.postprocess_config();
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.index_field, "num_answers");
    }

    #[test]
    fn test_export_id_cache() {
        let cli = parse(&["export", "--reuse-id-dump", "--id-dump-path", "/tmp/ids.json"]);
        let Command::Export(args) = cli.command else {
            panic!("expected export");
        };
        let cache = args.id_cache();
        assert!(cache.reuse);
        assert!(!cache.save);
        assert_eq!(cache.path, PathBuf::from("/tmp/ids.json"));
        assert!(!args.overwrite);
    }

    #[test]
    fn test_unknown_model_needs_vector_size() {
        let cli = parse(&["load", "--embedding-model", "acme/custom"]);
        assert!(cli.global.embedding_model().is_err());

        let cli = parse(&["load", "--embedding-model", "acme/custom", "--vector-size", "256"]);
        assert_eq!(cli.global.embedding_model().unwrap().dimension, 256);
    }

    #[test]
    fn test_postgres_settings() {
        let cli = parse(&["export", "--postgres-host", "db", "--postgres-port", "6543"]);
        let pg = cli.global.postgres();
        assert_eq!(pg.host, "db");
        assert_eq!(pg.port, 6543);
        assert_eq!(pg.search_path, "public");
    }
}
