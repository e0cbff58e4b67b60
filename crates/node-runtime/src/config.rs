//! # Runtime Configuration
//!
//! Engine configuration plus logging settings, loaded in this order:
//!
//! 1. Defaults
//! 2. JSON file named by `RD_CONFIG` (optional)
//! 3. `RD_*` environment overrides
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `RD_CONFIG` | engine configuration file |
//! | `RD_LOG_LEVEL` | log filter (falls back to `RUST_LOG`, then `info`) |
//! | `RD_JSON_LOGS` | `true` for JSON log lines |
//! | `RD_STORAGE_PATH`, `RD_ENABLE_RELAY`, `RD_DISABLED_MODULES`, `RD_INDEX_MODULES` | engine overrides |

use anyhow::{Context, Result};
use rd_04_dispatch::prelude::EngineConfig;
use std::path::PathBuf;

/// Default log filter.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// `EnvFilter` directive.
    pub level: String,
    /// Emit JSON log lines.
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            json: false,
        }
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    /// Dispatch engine configuration.
    pub engine: EngineConfig,
    /// Logging configuration.
    pub log: LogSettings,
    /// File the engine configuration came from.
    pub source: Option<PathBuf>,
}

impl RuntimeConfig {
    /// Loads from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::load(|key| std::env::var(key).ok())
    }

    /// Loads through `lookup`, which stands in for the environment.
    pub fn load<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = lookup("RD_CONFIG")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);
        let engine = match &source {
            Some(path) => EngineConfig::from_file(path)
                .with_context(|| format!("loading engine configuration from {}", path.display()))?,
            None => EngineConfig::default(),
        };
        let engine = engine.with_overrides(&lookup);
        engine.validate().context("validating engine configuration")?;

        let level = lookup("RD_LOG_LEVEL")
            .or_else(|| lookup("RUST_LOG"))
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
        let json = lookup("RD_JSON_LOGS")
            .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));

        Ok(Self {
            engine,
            log: LogSettings { level, json },
            source,
        })
    }
}
