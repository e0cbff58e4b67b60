//! # Logging Setup
//!
//! Installs the global `tracing` subscriber. Log lines go to stderr; stdout
//! carries the JSON-lines output channel.

use crate::config::LogSettings;
use anyhow::{anyhow, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs an `EnvFilter` plus a pretty or JSON formatter.
pub fn init(settings: &LogSettings) -> Result<()> {
    let env_filter = EnvFilter::try_new(&settings.level)
        .map_err(|e| anyhow!("invalid log filter {:?}: {e}", settings.level))?;

    if settings.json {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(true)
            .with_line_number(true);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
            .map_err(|e| anyhow!("installing subscriber: {e}"))
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(false);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| anyhow!("installing subscriber: {e}"))
    }
}
