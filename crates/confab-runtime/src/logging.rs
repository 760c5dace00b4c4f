//! Logging setup over `tracing-subscriber`.
//!
//! Initialization is configuration-driven; `RUST_LOG` always wins over the
//! configured level, and double initialization is tolerated so embedding
//! applications can install their own subscriber first.

use std::ffi::OsStr;
use std::path::Path;

use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LogFormat, LogOutput, LoggingConfig};

/// Initializes logging from configuration.
///
/// Safe to call when a subscriber is already installed.
pub fn init_from_config(config: &LoggingConfig) {
    let _ = try_init_from_config(config);
}

/// Initializes logging from configuration, surfacing the failure when a
/// subscriber is already installed.
pub fn try_init_from_config(config: &LoggingConfig) -> Result<(), TryInitError> {
    let filter = build_filter(config);

    macro_rules! init_with_writer {
        ($writer:expr) => {
            match config.format {
                LogFormat::Compact => tracing_subscriber::registry()
                    .with(fmt::layer().compact().with_writer($writer))
                    .with(filter)
                    .try_init(),
                LogFormat::Full => tracing_subscriber::registry()
                    .with(fmt::layer().with_writer($writer))
                    .with(filter)
                    .try_init(),
                LogFormat::Pretty => tracing_subscriber::registry()
                    .with(fmt::layer().pretty().with_writer($writer))
                    .with(filter)
                    .try_init(),
            }
        };
    }

    match config.output {
        LogOutput::Stdout => init_with_writer!(std::io::stdout),
        LogOutput::Stderr => init_with_writer!(std::io::stderr),
        LogOutput::File => {
            let path = config
                .file_path
                .clone()
                .unwrap_or_else(|| "confab.log".into());
            let appender = tracing_appender::rolling::never(
                path.parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .unwrap_or_else(|| Path::new(".")),
                path.file_name().unwrap_or_else(|| OsStr::new("confab.log")),
            );
            init_with_writer!(appender)
        }
    }
}

/// Builds the level filter: `RUST_LOG` first, then the configured level plus
/// per-module overrides.
fn build_filter(config: &LoggingConfig) -> EnvFilter {
    let mut filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    for (module, level) in &config.filters {
        if let Ok(directive) = format!("{module}={level}").parse() {
            filter = filter.add_directive(directive);
        }
    }

    filter
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use std::collections::HashMap;

    #[test]
    fn filter_includes_module_overrides() {
        let config = LoggingConfig {
            level: LogLevel::Warn,
            filters: HashMap::from([("confab_core".to_string(), LogLevel::Trace)]),
            ..LoggingConfig::default()
        };
        let filter = build_filter(&config);
        let rendered = filter.to_string();
        assert!(rendered.contains("confab_core=trace"));
    }
}
