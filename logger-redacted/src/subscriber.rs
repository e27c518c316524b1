use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggerConfig};
use crate::redactor::{configure_default_redactor, RedactionConfig};
use crate::{LoggerError, Result};

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over `config.log_level`. Calling this twice
/// returns `LoggerError::InitFailed`.
pub fn init(config: &LoggerConfig) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)
            .map_err(|e| LoggerError::InvalidFilter(e.to_string()))?,
    };

    configure_default_redactor(RedactionConfig {
        enabled: config.redaction_enabled,
        hash_for_correlation: config.hash_for_correlation,
        ..Default::default()
    });

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match config.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(true).with_ansi(true))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().with_target(false).with_ansi(false).json())
            .try_init(),
    };

    result.map_err(|e| LoggerError::InitFailed(e.to_string()))
}
