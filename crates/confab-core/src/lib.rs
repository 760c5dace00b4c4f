//! # Confab Core
//!
//! The dispatch core of the confab bot framework.
//!
//! Confab lets an operator attach named, conditionally-triggered handlers to
//! an inbound chat stream and correlates outbound messages with their
//! eventual replies, independent of which chat-client driver is plugged in.
//!
//! ## Components
//!
//! - **Driver seam**: the [`ChatDriver`] trait and the one [`RawMessage`]
//!   shape every backend maps onto.
//! - **Normalization**: [`Message`], the stable entity handlers observe,
//!   produced by the adapter with aliases resolved and quoted messages
//!   linked.
//! - **Triggers**: [`Trigger`] and [`TriggerRegistry`], named
//!   (condition, action) pairs evaluated in registration order, with a
//!   mandatory `"else"` fallback.
//! - **Reply correlation**: [`ReplyCorrelator`], continuations keyed by an
//!   outbound message's id, consumed at most once.
//! - **Aliases**: [`AliasResolver`], a bidirectional name⇄address table
//!   with chained lookup.
//! - **Containment**: [`safe_call`] turns handler failures and panics into
//!   values, never unwinding into the dispatch loop.
//!
//! ## Dispatch flow
//!
//! ```text
//! ┌────────┐  RawMessage  ┌───────────┐  Message  ┌────────────────┐
//! │ Driver │─────────────▶│  Adapter  │──────────▶│ DispatchEngine │
//! └────────┘              └───────────┘           └───────┬────────┘
//!      ▲                                    reply branch? │ trigger branch?
//!      │                                  ┌───────────────┴───┐
//!      │   send / reply            ┌──────▼─────────┐  ┌──────▼────────┐
//!      └───────────────────────────│ ReplyCorrelator│  │TriggerRegistry│
//!                                  └────────────────┘  └───────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use confab_core::{Client, Outbound, Trigger};
//!
//! let client = Client::new(driver);
//! client.aliases().insert("anthony", "5511999999999");
//! client.register(
//!     Trigger::new("greet", |m: confab_core::Message| async move {
//!         m.send(Outbound::text(format!("hi {}", m.from))).await?;
//!         Ok(())
//!     })?
//!     .with_condition(|m| async move { m.body == "cool" }),
//! );
//! client.start().await?;
//! ```

pub mod adapter;
pub mod alias;
pub mod client;
pub mod correlator;
pub mod driver;
pub mod engine;
pub mod fetch;
pub mod message;
pub mod safecall;
pub mod trigger;

pub use adapter::SendError;
pub use alias::{AliasResolver, Direction};
pub use client::{Client, ClientConfig};
pub use correlator::{BindError, Continuation, ReplyCorrelator};
pub use driver::{ChatDriver, DriverError, DriverIdentity, DriverResult, RawMessage};
pub use engine::{Dispatch, Skip};
pub use fetch::Fetch;
pub use message::{Message, Outbound};
pub use safecall::{CallError, RetryPolicy, guard_panic, retry_lookup, safe_call};
pub use trigger::{
    FALLBACK_NAME, IntoConditionResult, IntoTriggerResult, RegistryError, Trigger, TriggerRegistry,
};

/// Prelude for common imports.
pub mod prelude {
    pub use super::{
        ChatDriver, Client, ClientConfig, Dispatch, DriverIdentity, Fetch, Message, Outbound,
        RawMessage, Trigger,
    };
}
