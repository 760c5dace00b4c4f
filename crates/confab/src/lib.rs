//! # Confab
//!
//! A driver-agnostic chat-bot framework: named, conditionally-triggered
//! handlers over an inbound message stream, reply correlation for outbound
//! messages, contact alias resolution, and a uniform message shape across
//! heterogeneous chat-client drivers.
//!
//! This facade re-exports the three layers:
//!
//! - [`core`](confab_core): triggers, dispatch, correlation, aliases,
//!   normalization, the driver seam
//! - [`runtime`](confab_runtime): configuration, logging, orchestration
//! - [`http`](confab_http): the HTTP control endpoint and reply webhook
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use confab::prelude::*;
//!
//! let runtime = confab::Runtime::new(Arc::new(my_driver));
//! runtime.register(
//!     Trigger::new("greet", |m: Message| async move {
//!         m.reply(Outbound::text("hello there")).await?;
//!         Ok(())
//!     })?
//!     .with_condition(|m| async move { m.clean() == "hi" }),
//! );
//! runtime.run().await?;
//! ```

pub use confab_core as core;
pub use confab_http as http;
pub use confab_runtime as runtime;

pub use confab_core::{
    AliasResolver, ChatDriver, Client, ClientConfig, Dispatch, DriverIdentity, Fetch, Message,
    Outbound, RawMessage, Trigger,
};
pub use confab_http::{ApiConfig, ApiServer};
pub use confab_runtime::{ConfabConfig, Runtime};

/// Prelude for common imports.
pub mod prelude {
    pub use confab_core::prelude::*;
}
