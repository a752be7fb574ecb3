//! Logging utilities.
//!
//! The crates log through the `log` facade; embedders pick the backend.
//! `LogLevel` is the serializable form used in configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Log level.
///
/// Ordered by increasing severity.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose debug information.
    Trace,

    /// Debug information.
    #[default]
    Debug,

    /// Informational messages.
    Info,

    /// Warning messages.
    Warning,

    /// Error messages.
    Error,
}

impl LogLevel {
    /// Get the name of this log level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }

    /// Check if this log level is at least as severe as the given level.
    pub fn is_at_least(&self, level: LogLevel) -> bool {
        *self >= level
    }

    /// The matching `log` crate level.
    pub fn to_log_level(self) -> log::Level {
        match self {
            Self::Trace => log::Level::Trace,
            Self::Debug => log::Level::Debug,
            Self::Info => log::Level::Info,
            Self::Warning => log::Level::Warn,
            Self::Error => log::Level::Error,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    /// Case-insensitive; accepts `warn` and `err` as aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "error" | "err" => Ok(Self::Error),
            _ => Err(format!("unknown log level {:?}", s)),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
