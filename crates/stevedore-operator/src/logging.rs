use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

use crate::error::OperatorError;

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Initialize `tracing` with `RUST_LOG`, defaulting to `info`
pub fn init(format: LogFormat) -> Result<(), OperatorError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| OperatorError::internal(format!("failed to initialize logging: {}", e)))
}
