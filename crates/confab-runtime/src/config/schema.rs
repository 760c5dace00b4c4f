//! Configuration schema definitions.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use confab_core::RetryPolicy;
use confab_http::ApiConfig;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfabConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Client behavior settings.
    #[serde(default)]
    pub client: ClientSettings,

    /// HTTP control endpoint settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Seed contact aliases (alias → canonical address).
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

/// Client behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Session label used in logs.
    #[serde(default = "default_session")]
    pub session: String,

    /// Alias or address of the operator contact.
    #[serde(default)]
    pub admin: Option<String>,

    /// Whether to message the admin contact when the bot comes up.
    #[serde(default)]
    pub announce_start: bool,

    /// Whether mentions of the bot get a quoted acknowledgment.
    #[serde(default = "default_true")]
    pub ack_mentions: bool,

    /// Fixed acknowledgment text; unset picks a generated phrase.
    #[serde(default)]
    pub mention_ack: Option<String>,

    /// Retry behavior for quote-target lookups.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            session: default_session(),
            admin: None,
            announce_start: false,
            ack_mentions: true,
            mention_ack: None,
            retry: RetryConfig::default(),
        }
    }
}

fn default_session() -> String {
    "confab".to_string()
}

fn default_true() -> bool {
    true
}

/// Retry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between attempts in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_retry_delay_ms(),
        }
    }
}

impl RetryConfig {
    /// Converts into the core retry policy.
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.max_attempts,
            delay: Duration::from_millis(self.delay_ms),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    200
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Global log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Output destination.
    #[serde(default)]
    pub output: LogOutput,

    /// Log file path, used with `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Per-module level overrides.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// The level as a filter directive string.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
}

/// Log output destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = ConfabConfig::default();
        assert_eq!(config.client.session, "confab");
        assert!(config.client.ack_mentions);
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(!config.api.enabled);
        assert!(config.aliases.is_empty());
    }

    #[test]
    fn retry_config_converts_to_policy() {
        let retry = RetryConfig {
            max_attempts: 5,
            delay_ms: 50,
        };
        let policy = retry.to_policy();
        assert_eq!(policy.attempts, 5);
        assert_eq!(policy.delay, Duration::from_millis(50));
    }
}
