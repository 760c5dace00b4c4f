//! HTTP control surface for the confab bot framework.
//!
//! Exposes one authenticated `POST` endpoint that executes named actions
//! against a [`confab_core::Client`] (sending messages, fetching them by
//! id, reading the bot identity), plus a [`Webhook`] client that forwards
//! correlated replies to a caller-supplied URL.
//!
//! ```rust,ignore
//! use confab_http::{ApiConfig, ApiServer};
//!
//! let server = ApiServer::new(client, ApiConfig {
//!     enabled: true,
//!     access_token: Some("sekrit".into()),
//!     ..ApiConfig::default()
//! })?;
//! let handle = server.serve().await?;
//! println!("control endpoint on {}", handle.addr());
//! ```
//!
//! The wire protocol is a single envelope:
//!
//! ```json
//! { "action": "send_msg", "to": "anthony", "text": "hi", "reply_url": "..." }
//! ```
//!
//! answered by `{ "done": true, "data": ... }` or
//! `{ "done": false, "error": "..." }`.

mod actions;
mod server;
mod webhook;

pub use server::{
    ApiAction, ApiConfig, ApiHandle, ApiRequest, ApiResponse, ApiServer, ApiServerError,
};
pub use webhook::Webhook;
