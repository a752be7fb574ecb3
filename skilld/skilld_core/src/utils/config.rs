//! Repository configuration.
//!
//! Configuration is optional; every field has a default. It can be built in
//! code or read from a TOML document:
//!
//! ```toml
//! lock_name = "skills"
//! slow_lock_warn_ms = 50
//! mutation_log_level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::logging::LogLevel;
use crate::error::ConfigError;

/// Default name of the repository lock, as it appears in log lines.
pub const DEFAULT_LOCK_NAME: &str = "skill-repository";

/// Settings for a skill repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Name of the repository lock, used in lock diagnostics.
    pub lock_name: String,

    /// Warn when the lock is held longer than this many milliseconds.
    pub slow_lock_warn_ms: Option<u64>,

    /// Level at which successful mutations are logged.
    pub mutation_log_level: LogLevel,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            lock_name: DEFAULT_LOCK_NAME.to_string(),
            slow_lock_warn_ms: None,
            mutation_log_level: LogLevel::Debug,
        }
    }
}

impl RepositoryConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check that the values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lock_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "lock_name",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Set the lock name.
    pub fn with_lock_name(mut self, name: impl Into<String>) -> Self {
        self.lock_name = name.into();
        self
    }

    /// Set the slow lock threshold.
    pub fn with_slow_lock_warning(mut self, threshold: Duration) -> Self {
        self.slow_lock_warn_ms = Some(threshold.as_millis() as u64);
        self
    }

    /// Set the level used for mutation logs.
    pub fn with_mutation_log_level(mut self, level: LogLevel) -> Self {
        self.mutation_log_level = level;
        self
    }

    /// The slow lock threshold as a duration.
    pub fn slow_lock_threshold(&self) -> Option<Duration> {
        self.slow_lock_warn_ms.map(Duration::from_millis)
    }
}
