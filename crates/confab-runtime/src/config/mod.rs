//! Configuration loading and schema.

mod loader;
mod schema;

pub use loader::{ConfigLoader, load_config};
pub use schema::{
    ClientSettings, ConfabConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, RetryConfig,
};
