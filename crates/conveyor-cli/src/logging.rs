use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

use crate::args::LogLevel;

/// Installs the global subscriber. `RUST_LOG` wins over `level` when set.
pub fn init(level: LogLevel, timestamps: bool) -> Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => {
            EnvFilter::try_new(&directives).with_context(|| {
                format!("invalid {} directives '{directives}'", EnvFilter::DEFAULT_ENV)
            })?
        }
        _ => EnvFilter::new(level.as_str()),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let installed = if timestamps {
        builder.try_init()
    } else {
        builder.without_time().try_init()
    };

    installed.map_err(|error| anyhow!("failed to install log subscriber: {error}"))
}
