//! Subcommand entry points.

use qa_indexer_pipeline::{
    BulkLoader, ContentArchive, ExportConfig, Exporter, HierarchicalExtractor, Postprocessor,
};
use qa_indexer_repository::CollectionConfig;
use tracing::info;

use crate::config::{Cli, Command, Dependencies, ExportArgs, GlobalArgs, LoadArgs, PostprocessArgs};
use crate::IndexingError;

/// Run the selected subcommand to completion.
pub async fn run(cli: Cli) -> Result<(), IndexingError> {
    match &cli.command {
        Command::Export(args) => export(&cli.global, args).await,
        Command::Load(args) => load(&cli.global, args).await,
        Command::Postprocess(args) => postprocess(&cli.global, args).await,
    }
}

async fn export(global: &GlobalArgs, args: &ExportArgs) -> Result<(), IndexingError> {
    let source = Dependencies::source(global).await?;
    let archive = ContentArchive::create(&global.archive_dir, args.overwrite).await?;

    let config = ExportConfig {
        id_cache: args.id_cache(),
        ..ExportConfig::default()
    };
    let exporter = Exporter::with_config(HierarchicalExtractor::new(source), archive, config);
    let summary = exporter.run().await?;

    info!(
        documents = summary.documents,
        archive = %global.archive_dir.display(),
        "Export finished"
    );
    Ok(())
}

async fn load(global: &GlobalArgs, args: &LoadArgs) -> Result<(), IndexingError> {
    let archive = ContentArchive::open(&global.archive_dir)?;
    let manifest = archive.read_manifest().await?;
    let (engine, model) = Dependencies::engine(global).await?;

    let loader = BulkLoader::with_config(engine, &global.collection, args.loader_config());

    if args.start_offset == 0 {
        let config = CollectionConfig::for_bulk_load(&global.collection, model);
        loader.provision(&config, !args.keep_existing).await?;
    } else {
        info!(
            offset = args.start_offset,
            "Resuming into existing collection; skipping provisioning"
        );
    }

    let summary = loader.load(&manifest, &archive).await?;
    loader.finalize(args.indexing_threshold).await?;

    info!(
        points = summary.points_loaded,
        next_offset = summary.next_offset,
        collection = %global.collection,
        "Load finished"
    );
    Ok(())
}

async fn postprocess(global: &GlobalArgs, args: &PostprocessArgs) -> Result<(), IndexingError> {
    let (engine, _) = Dependencies::engine(global).await?;
    let postprocessor =
        Postprocessor::with_config(engine, &global.collection, args.postprocess_config());
    let summary = postprocessor.run().await?;

    info!(
        points = summary.points_updated,
        collection = %global.collection,
        "Postprocess finished"
    );
    Ok(())
}
