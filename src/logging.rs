//! Structured logging setup using the tracing crate.
//!
//! Supports pretty, compact and JSON output to stderr or a file.

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{Error, Result};
use std::fs::OpenOptions;
use std::io;
use std::sync::Arc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Map a `-v` count to a filter directive, falling back to the configured level.
pub fn level_for_verbosity(verbosity: u8, configured: &str) -> String {
    match verbosity {
        0 => configured.to_string(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Build the filter: `RUST_LOG` wins, then verbosity, then the configured level.
pub fn build_filter(config: &LoggingConfig, verbosity: u8) -> EnvFilter {
    let default_filter = level_for_verbosity(verbosity, &config.level);

    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&default_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install the global subscriber.
///
/// Returns an error if a subscriber is already installed or the log file
/// cannot be opened.
pub fn init_logging(config: &LoggingConfig, verbosity: u8) -> Result<()> {
    let env_filter = build_filter(config, verbosity);

    let (writer, ansi) = match &config.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            (BoxMakeWriter::new(Arc::new(file)), false)
        }
        None => (BoxMakeWriter::new(io::stderr), true),
    };

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_ansi(ansi)
            .with_target(verbosity >= 3)
            .with_writer(writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_ansi(ansi)
            .with_target(verbosity >= 3)
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(env_filter)
        .try_init()
        .map_err(|e| Error::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_for_verbosity(0, "warn"), "warn");
        assert_eq!(level_for_verbosity(1, "warn"), "info");
        assert_eq!(level_for_verbosity(2, "warn"), "debug");
        assert_eq!(level_for_verbosity(7, "warn"), "trace");
    }

    #[test]
    fn test_configured_level_used_without_verbosity() {
        assert_eq!(level_for_verbosity(0, "azurerm_network=debug"), "azurerm_network=debug");
    }
}
