//! Configuration loader using figment.
//!
//! Sources are layered, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. The user config file (`<config dir>/confab/confab.toml`)
//! 3. `confab.toml` in the current directory (or an explicitly named file)
//! 4. Environment variables (`CONFAB_*`)
//!
//! Environment variables use `__` as the section separator:
//! `CONFAB_LOGGING__LEVEL=debug` maps to `logging.level = "debug"`.

use std::path::PathBuf;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use tracing::debug;

use super::schema::ConfabConfig;
use crate::error::{ConfigError, ConfigResult};

/// Default config file name.
const CONFIG_FILE: &str = "confab.toml";

/// Environment variable prefix.
const ENV_PREFIX: &str = "CONFAB_";

/// Layered configuration loader.
///
/// ```rust,ignore
/// use confab_runtime::config::ConfigLoader;
///
/// let config = ConfigLoader::new().with_current_dir().load()?;
/// let config = ConfigLoader::new().file("deploy/confab.toml").load()?;
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    search_current_dir: bool,
    use_env: bool,
}

impl ConfigLoader {
    /// Creates a loader with environment overrides enabled.
    pub fn new() -> Self {
        Self {
            file: None,
            search_current_dir: false,
            use_env: true,
        }
    }

    /// Loads from a specific file; the file must exist.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Also searches the current directory for `confab.toml`.
    pub fn with_current_dir(mut self) -> Self {
        self.search_current_dir = true;
        self
    }

    /// Disables `CONFAB_*` environment overrides.
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    /// Loads and extracts the configuration.
    pub fn load(self) -> ConfigResult<ConfabConfig> {
        let mut figment = Figment::from(Serialized::defaults(ConfabConfig::default()));

        if let Some(user_dir) = dirs::config_dir() {
            let user_file = user_dir.join("confab").join(CONFIG_FILE);
            if user_file.is_file() {
                debug!(path = %user_file.display(), "loading user config");
                figment = figment.merge(Toml::file(user_file));
            }
        }

        if self.search_current_dir {
            figment = figment.merge(Toml::file(CONFIG_FILE));
        }

        if let Some(file) = &self.file {
            if !file.is_file() {
                return Err(ConfigError::FileNotFound(file.clone()));
            }
            figment = figment.merge(Toml::file(file));
        }

        if self.use_env {
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        Ok(figment.extract()?)
    }
}

/// Loads configuration from the default locations.
pub fn load_config() -> ConfigResult<ConfabConfig> {
    ConfigLoader::new().with_current_dir().load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{LogFormat, LogLevel};

    fn from_toml(toml: &str) -> ConfabConfig {
        Figment::from(Serialized::defaults(ConfabConfig::default()))
            .merge(Toml::string(toml))
            .extract()
            .unwrap()
    }

    #[test]
    fn toml_overlays_defaults() {
        let config = from_toml(
            r#"
            [logging]
            level = "debug"
            format = "pretty"

            [client]
            session = "ops-bot"
            admin = "anthony"
            announce_start = true

            [client.retry]
            max_attempts = 1

            [api]
            enabled = true
            access_token = "sekrit"

            [aliases]
            anthony = "5511999999999"
            "#,
        );

        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.client.session, "ops-bot");
        assert_eq!(config.client.admin.as_deref(), Some("anthony"));
        assert!(config.client.announce_start);
        assert_eq!(config.client.retry.max_attempts, 1);
        // Unset fields keep their defaults through the overlay.
        assert_eq!(config.client.retry.delay_ms, 200);
        assert!(config.api.enabled);
        assert_eq!(config.api.access_token.as_deref(), Some("sekrit"));
        assert_eq!(
            config.aliases.get("anthony").map(String::as_str),
            Some("5511999999999")
        );
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = ConfigLoader::new()
            .without_env()
            .file("/definitely/not/here.toml")
            .load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
