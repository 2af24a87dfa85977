//! Logging setup.

use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;
use crate::IndexingError;

/// Targets whose request-level chatter drowns out pipeline progress.
const NOISY_TARGETS: &[&str] = &["hyper", "hyper_util", "reqwest", "h2", "rustls"];

/// Build the filter: `RUST_LOG` or `info`, with HTTP internals silenced.
pub fn env_filter(default: &str) -> Result<EnvFilter, IndexingError> {
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    for target in NOISY_TARGETS {
        let directive = format!("{}=off", target)
            .parse()
            .map_err(|e| IndexingError::config(format!("Invalid log directive: {}", e)))?;
        filter = filter.add_directive(directive);
    }
    Ok(filter)
}

/// Install the global subscriber.
pub fn init(format: LogFormat) -> Result<(), IndexingError> {
    let filter = env_filter("info")?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| IndexingError::config(format!("Failed to install logger: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_silences_http_stack() {
        let filter = env_filter("debug").unwrap().to_string();
        for target in NOISY_TARGETS {
            assert!(filter.contains(&format!("{}=off", target)), "{}", filter);
        }
    }
}
