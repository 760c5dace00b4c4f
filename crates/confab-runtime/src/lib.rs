//! Runtime orchestration layer for the confab bot framework.
//!
//! Provides the shell around [`confab_core`]: configuration loading
//! (`confab.toml` + `CONFAB_*` environment overrides), logging setup,
//! decorative chat phrases, and the [`Runtime`] that pumps a driver's
//! inbound subscription into dispatch and serves the HTTP control endpoint.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use confab_runtime::Runtime;
//!
//! let runtime = Runtime::new(Arc::new(my_driver));
//! runtime.register(my_trigger);
//! runtime.run().await?;
//! ```

pub mod config;
pub mod error;
pub mod flavor;
pub mod logging;
mod runtime;

pub use config::{ConfabConfig, ConfigLoader, load_config};
pub use error::{ConfigError, ConfigResult, RuntimeError, RuntimeResult};
pub use runtime::Runtime;
