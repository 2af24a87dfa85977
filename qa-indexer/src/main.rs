use std::error::Error;
use std::process::ExitCode;

use clap::Parser;
use qa_indexer::{commands, telemetry, Cli};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = telemetry::init(cli.global.log_format) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    info!(command = ?cli.command, "Starting qa-indexer");

    let result = tokio::select! {
        result = commands::run(cli) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted; resume a load with --start-offset set to the last logged next_offset");
            return ExitCode::from(130);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Run failed");
            let mut source = e.source();
            while let Some(err) = source {
                error!("  Caused by: {}", err);
                source = err.source();
            }
            ExitCode::FAILURE
        }
    }
}
