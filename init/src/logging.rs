//! Logging setup.

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Environment variable selecting the log format.
pub const ENV_LOG_FORMAT: &str = "BOOTSTRAP_LOG_FORMAT";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Resolve the format: explicit flag, then BOOTSTRAP_LOG_FORMAT, then text.
    pub fn resolve(flag: Option<LogFormat>) -> Self {
        flag.or_else(|| {
            std::env::var(ENV_LOG_FORMAT)
                .ok()
                .and_then(|v| LogFormat::from_str(v.trim(), true).ok())
        })
        .unwrap_or_default()
    }
}

/// Install the global subscriber. Logs go to stderr; stdout carries reports.
pub fn init(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
