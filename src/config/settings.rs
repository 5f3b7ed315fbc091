//! Configuration structures for deserialisation, and the runtime settings
//! store.
//!
//! The `Config` structures map directly to the JSON configuration file
//! format. [`Settings`] is the mutable runtime view: exclusions can be
//! toggled over MCP while the server runs, and every mutation bumps a
//! revision counter that cache layers compare against.

use std::path::PathBuf;
use std::sync::Mutex;

use serde::Deserialize;
use tokio::sync::watch;

use crate::error::ConfigError;

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Workspace root to scan for manifests. Overridden by the
    /// `--workspace` CLI flag.
    #[serde(default)]
    pub workspace: Option<PathBuf>,

    /// Manifest discovery settings.
    #[serde(default)]
    pub manifests: ManifestsConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                ),
            });
        }
        Ok(())
    }
}

/// Manifest discovery configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestsConfig {
    /// Manifest locations excluded from the aggregate view, by their
    /// canonical path string.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

struct SettingsState {
    exclude: Vec<String>,
    revision: u64,
}

/// Mutable runtime settings.
///
/// Starts from the loaded [`Config`] and is mutated through MCP tools.
/// Every mutation bumps the revision so consumers can detect staleness
/// without subscribing; the watch channel exists for those who do want to
/// be told.
pub struct Settings {
    state: Mutex<SettingsState>,
    changes: watch::Sender<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(&ManifestsConfig::default())
    }
}

impl Settings {
    /// Creates the runtime store seeded from the loaded configuration.
    #[must_use]
    pub fn new(config: &ManifestsConfig) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            state: Mutex::new(SettingsState {
                exclude: config.exclude.clone(),
                revision: 0,
            }),
            changes,
        }
    }

    /// The current revision; bumped on every mutation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.state.lock().map_or(0, |state| state.revision)
    }

    /// Subscribes to revision changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// The currently excluded manifest locations.
    #[must_use]
    pub fn excluded_manifests(&self) -> Vec<String> {
        self.state
            .lock()
            .map_or_else(|_| Vec::new(), |state| state.exclude.clone())
    }

    /// Whether a manifest location is excluded.
    #[must_use]
    pub fn is_excluded(&self, location: &str) -> bool {
        self.state
            .lock()
            .map_or(false, |state| state.exclude.iter().any(|e| e == location))
    }

    /// Excludes a manifest location. Adding an already-excluded location is
    /// a no-op and does not move the revision.
    pub fn exclude_manifest(&self, location: &str) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if state.exclude.iter().any(|e| e == location) {
            return;
        }
        state.exclude.push(location.to_string());
        state.revision += 1;
        let _ = self.changes.send(state.revision);
    }

    /// Removes a manifest location from the exclusion list. Removing an
    /// unknown location is a no-op and does not move the revision.
    pub fn include_manifest(&self, location: &str) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        let before = state.exclude.len();
        state.exclude.retain(|e| e != location);
        if state.exclude.len() == before {
            return;
        }
        state.revision += 1;
        let _ = self.changes.send(state.revision);
    }
}
