//! # Dispatch Configuration
//!
//! Per-route flags, per-module settings and the engine-wide configuration.
//!
//! ## Environment Overrides
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `RD_STORAGE_PATH` | Storage file path |
//! | `RD_ENABLE_RELAY` | `1`/`true` registers the application-contract relay |
//! | `RD_DISABLED_MODULES` | Comma-separated modules whose outputs are dropped |
//! | `RD_INDEX_MODULES` | Comma-separated modules whose outputs are indexed |

use crate::errors::ConfigurationError;
use rd_02_query_codec::prelude::QueryFormat;
use serde::{Deserialize, Serialize};
use shared_types::{Address, OutputFormat};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Relay address the base layer uses to announce the application contract.
pub const DEFAULT_RELAY_ADDRESS: Address = Address::new([
    0xf5, 0xde, 0x34, 0xd6, 0xbb, 0xc0, 0x44, 0x6e, 0x2a, 0x45, 0x71, 0x9e, 0x71, 0x8e, 0xfe, 0xba,
    0xae, 0x17, 0x9d, 0xae,
]);

// =============================================================================
// ROUTE CONFIG
// =============================================================================

/// Per-registration flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Overrides the module part of the route key.
    pub module_name: Option<String>,
    /// Mutation payload carries no 4-byte selector header.
    pub no_header: bool,
    /// Mutation payload uses packed encoding.
    pub packed: bool,
    /// Query fields bound from URL path segments, in order.
    pub path_params: Vec<String>,
    /// Mutation payload starts with a 20-byte address that becomes the caller.
    pub proxy: bool,
    /// Only this caller may invoke the mutation.
    pub msg_sender: Option<Address>,
    /// Query results may be requested in parts.
    pub splittable_output: bool,
}

impl RouteConfig {
    /// Default flags.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the module name.
    #[must_use]
    pub fn module_name(mut self, name: impl Into<String>) -> Self {
        self.module_name = Some(name.into());
        self
    }

    /// Drops the selector header.
    #[must_use]
    pub fn no_header(mut self) -> Self {
        self.no_header = true;
        self
    }

    /// Uses packed encoding.
    #[must_use]
    pub fn packed(mut self) -> Self {
        self.packed = true;
        self
    }

    /// Declares URL path parameters.
    #[must_use]
    pub fn path_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path_params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Reads the caller from a 20-byte payload prefix.
    #[must_use]
    pub fn proxy(mut self) -> Self {
        self.proxy = true;
        self
    }

    /// Restricts the caller.
    #[must_use]
    pub fn msg_sender(mut self, sender: Address) -> Self {
        self.msg_sender = Some(sender);
        self
    }

    /// Enables part-based splitting of the query result.
    #[must_use]
    pub fn splittable_output(mut self) -> Self {
        self.splittable_output = true;
        self
    }
}

// =============================================================================
// MODULE SETTINGS
// =============================================================================

/// Per-module settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleSettings {
    /// Module name.
    pub name: String,
    /// Accepted query format.
    pub query_format: QueryFormat,
    /// Encoding of structured reports.
    pub report_format: OutputFormat,
    /// Encoding of structured notices.
    pub notice_format: OutputFormat,
    /// Prefix ABI notices with their 4-byte model selector.
    pub notice_header: bool,
    /// Record index entries for this module's inputs and outputs.
    pub index_outputs: bool,
    /// Drop every output of this module.
    pub disabled: bool,
    /// Storage location requested by this module.
    pub storage_path: Option<PathBuf>,
}

impl Default for ModuleSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            query_format: QueryFormat::Json,
            report_format: OutputFormat::Json,
            notice_format: OutputFormat::Abi,
            notice_header: false,
            index_outputs: false,
            disabled: false,
            storage_path: None,
        }
    }
}

impl ModuleSettings {
    /// Default settings for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the query format.
    #[must_use]
    pub fn query_format(mut self, format: QueryFormat) -> Self {
        self.query_format = format;
        self
    }

    /// Sets the report format.
    #[must_use]
    pub fn report_format(mut self, format: OutputFormat) -> Self {
        self.report_format = format;
        self
    }

    /// Sets the notice format.
    #[must_use]
    pub fn notice_format(mut self, format: OutputFormat) -> Self {
        self.notice_format = format;
        self
    }

    /// Prefixes ABI notices with their model selector.
    #[must_use]
    pub fn notice_header(mut self) -> Self {
        self.notice_header = true;
        self
    }

    /// Enables indexing.
    #[must_use]
    pub fn indexed(mut self) -> Self {
        self.index_outputs = true;
        self
    }

    /// Disables outputs.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

// =============================================================================
// ENGINE CONFIG
// =============================================================================

/// Engine-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Module settings; modules not listed use defaults.
    pub modules: Vec<ModuleSettings>,
    /// Register the application-contract relay route.
    pub enable_relay: bool,
    /// Caller the relay route accepts.
    pub relay_address: Address,
    /// Storage file path; volatile storage when absent.
    pub storage_path: Option<PathBuf>,
    #[serde(skip)]
    fallback: ModuleSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            modules: Vec::new(),
            enable_relay: false,
            relay_address: DEFAULT_RELAY_ADDRESS,
            storage_path: None,
            fallback: ModuleSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Adds or replaces a module's settings.
    #[must_use]
    pub fn with_module(mut self, settings: ModuleSettings) -> Self {
        self.modules.retain(|m| m.name != settings.name);
        self.modules.push(settings);
        self
    }

    /// Enables the relay route.
    #[must_use]
    pub fn with_relay(mut self) -> Self {
        self.enable_relay = true;
        self
    }

    /// Settings for `module` (defaults when not listed).
    #[must_use]
    pub fn settings_for(&self, module: &str) -> &ModuleSettings {
        self.modules
            .iter()
            .find(|m| m.name == module)
            .unwrap_or(&self.fallback)
    }

    /// Returns true if any module records index entries.
    #[must_use]
    pub fn indexing_enabled(&self) -> bool {
        self.modules.iter().any(|m| m.index_outputs)
    }

    /// Parses a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(json).map_err(|e| ConfigurationError::Invalid(e.to_string()))
    }

    /// Reads a JSON configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigurationError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::Invalid(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    /// Applies `RD_*` overrides from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `RD_*` overrides read through `lookup`.
    #[must_use]
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("RD_STORAGE_PATH").filter(|p| !p.is_empty()) {
            self.storage_path = Some(PathBuf::from(path));
        }
        if let Some(val) = lookup("RD_ENABLE_RELAY") {
            self.enable_relay = val == "1" || val.eq_ignore_ascii_case("true");
        }
        for name in split_list(lookup("RD_DISABLED_MODULES")) {
            self.module_mut(&name).disabled = true;
        }
        for name in split_list(lookup("RD_INDEX_MODULES")) {
            self.module_mut(&name).index_outputs = true;
        }
        self
    }

    fn module_mut(&mut self, name: &str) -> &mut ModuleSettings {
        if let Some(pos) = self.modules.iter().position(|m| m.name == name) {
            &mut self.modules[pos]
        } else {
            self.modules.push(ModuleSettings::new(name));
            let last = self.modules.len() - 1;
            &mut self.modules[last]
        }
    }

    /// The single storage location all modules agree on.
    pub fn effective_storage_path(&self) -> Result<Option<PathBuf>, ConfigurationError> {
        let mut chosen = self.storage_path.clone();
        for m in &self.modules {
            let Some(path) = &m.storage_path else {
                continue;
            };
            match &chosen {
                Some(existing) if existing != path => {
                    return Err(ConfigurationError::ConflictingStoragePaths(format!(
                        "{} vs {} (module {})",
                        existing.display(),
                        path.display(),
                        m.name
                    )));
                }
                Some(_) => {}
                None => chosen = Some(path.clone()),
            }
        }
        Ok(chosen)
    }

    /// Rejects duplicate module entries, unnamed modules and conflicting
    /// storage paths.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let mut seen = HashSet::new();
        for m in &self.modules {
            if m.name.is_empty() {
                return Err(ConfigurationError::Invalid("module settings without name".into()));
            }
            if !seen.insert(m.name.as_str()) {
                return Err(ConfigurationError::DuplicateModule(m.name.clone()));
            }
        }
        self.effective_storage_path().map(|_| ())
    }
}

fn split_list(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
