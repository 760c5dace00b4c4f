//! Runtime error types.

use thiserror::Error;

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Extraction or merging failed.
    #[error("failed to load configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    /// An explicitly named config file does not exist.
    #[error("config file not found: {0}")]
    FileNotFound(std::path::PathBuf),
}

impl From<figment::Error> for ConfigError {
    fn from(error: figment::Error) -> Self {
        Self::Figment(Box::new(error))
    }
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur during runtime operations.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Configuration loading failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The driver refused to start or subscribe.
    #[error("driver error: {0}")]
    Driver(#[from] confab_core::DriverError),

    /// The control API could not be served.
    #[error("api error: {0}")]
    Api(#[from] confab_http::ApiServerError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
