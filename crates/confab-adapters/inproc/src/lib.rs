//! In-process driver for the confab bot framework.
//!
//! [`InprocDriver`] implements [`confab_core::ChatDriver`] over in-memory
//! channels: outbound sends are recorded and observable, and inbound
//! messages are injected through an [`InprocHandle`]. It stands in for a
//! real protocol adapter in tests, demos and embedding scenarios where the
//! "network" is the hosting process itself.
//!
//! # Example
//!
//! ```rust,ignore
//! use confab_adapter_inproc::InprocDriver;
//! use confab_core::{Client, DriverIdentity, RawMessage};
//!
//! let driver = InprocDriver::new(DriverIdentity::new("confab", "bot@inproc"));
//! let handle = driver.handle();
//! let client = Client::new(std::sync::Arc::new(driver));
//! client.start().await?;
//!
//! client.dispatch(RawMessage::text("m1", "operator", "hello")).await;
//! assert!(handle.deliveries().is_empty());
//! ```

mod driver;

pub use driver::{Delivery, InprocDriver, InprocHandle};
