//! Message normalization and outbound mapping.
//!
//! The adapter is the single choke point between the driver's native
//! message shape and the core: inbound, it produces the normalized
//! [`Message`] (aliases resolved, author fixed up, quoted message linked);
//! outbound, it maps a send intent onto the driver's text or quote-reply
//! primitive.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::alias::{AliasResolver, Direction};
use crate::client::WeakClient;
use crate::driver::{ChatDriver, DriverError, RawMessage};
use crate::fetch::Fetch;
use crate::message::{Message, Outbound};
use crate::safecall::{RetryPolicy, guard_panic, retry_lookup};

/// Errors from the outbound send path.
#[derive(Debug, Error)]
pub enum SendError {
    /// The client has not been started.
    #[error("client is not started")]
    NotStarted,

    /// No target could be resolved from the send intent.
    #[error("send target missing")]
    MissingTarget,

    /// The owning client no longer exists.
    #[error("client has been dropped")]
    ClientGone,

    /// The driver call panicked; the payload is the panic message.
    #[error("driver send panicked: {0}")]
    Panicked(String),

    /// The driver rejected the send.
    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// Default log label for sends that do not carry one.
const DEFAULT_SEND_LOG: &str = "send";

pub(crate) struct MessageAdapter {
    pub(crate) driver: Arc<dyn ChatDriver>,
    pub(crate) aliases: AliasResolver,
    retry: RetryPolicy,
}

impl MessageAdapter {
    pub(crate) fn new(
        driver: Arc<dyn ChatDriver>,
        aliases: AliasResolver,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            driver,
            aliases,
            retry,
        }
    }

    /// Converts a driver-native message into the normalized entity.
    ///
    /// Sender fields resolve through the inverse alias table so handlers
    /// see names, never raw network addresses for known contacts. Outside a
    /// group the author is the sender; embedded quoted messages normalize
    /// recursively.
    pub(crate) fn normalize(&self, raw: &RawMessage, client: WeakClient) -> Message {
        let from = self.aliases.resolve(&raw.from, Direction::Inverse);
        let author = match (&raw.author, raw.group) {
            (Some(author), true) => self.aliases.resolve(author, Direction::Inverse),
            _ => from.clone(),
        };
        let quoted = raw
            .quoted
            .as_deref()
            .map(|q| Box::new(self.normalize(q, client.clone())));
        Message {
            id: raw.id.clone(),
            from,
            author,
            body: raw.body.clone().unwrap_or_default(),
            group: raw.group,
            quoted,
            raw: raw.clone(),
            client,
        }
    }

    /// Resolves a send intent and delivers it through the driver.
    ///
    /// The target resolves through the forward alias table. When a quote id
    /// is present but its target cannot be located, the message goes out
    /// unquoted rather than failing. Driver failures are logged and
    /// propagated; only handler-body failures are contained elsewhere.
    pub(crate) async fn send(
        &self,
        outbound: Outbound,
        client: WeakClient,
    ) -> Result<Message, SendError> {
        let to = Fetch::resolve_opt(outbound.to)
            .await
            .ok_or(SendError::MissingTarget)?;
        let text = Fetch::resolve_opt(outbound.text).await.unwrap_or_default();
        let log = Fetch::resolve_opt(outbound.log)
            .await
            .unwrap_or_else(|| DEFAULT_SEND_LOG.to_string());
        let quote = Fetch::resolve_opt(outbound.quote).await;

        let target = self.aliases.resolve(&to, Direction::Forward);
        let quote = match quote {
            Some(id) => self.verify_quote(&id).await,
            None => None,
        };

        let delivery = match &quote {
            Some(quote_id) => {
                guard_panic(self.driver.send_reply(&target, &text, quote_id)).await
            }
            None => guard_panic(self.driver.send_text(&target, &text)).await,
        };

        let raw = match delivery {
            Ok(Ok(raw)) => raw,
            Ok(Err(driver_error)) => {
                error!(log = %log, to = %to, error = %driver_error, "send failed");
                return Err(SendError::Driver(driver_error));
            }
            Err(panic) => {
                error!(log = %log, to = %to, panic = %panic, "send panicked");
                return Err(SendError::Panicked(panic));
            }
        };

        info!(log = %log, to = %to, "sent");
        Ok(self.normalize(&raw, client))
    }

    /// Confirms the quote target exists, with bounded retry.
    ///
    /// Returns the quote id to pass through, or `None` to degrade to an
    /// unquoted send.
    async fn verify_quote(&self, quote_id: &str) -> Option<String> {
        match retry_lookup(self.retry, || self.driver.message_by_id(quote_id)).await {
            Ok(Some(_)) => Some(quote_id.to_string()),
            Ok(None) => {
                debug!(quote = %quote_id, "quote target not found, sending unquoted");
                None
            }
            Err(lookup_error) => {
                debug!(quote = %quote_id, error = %lookup_error, "quote lookup failed, sending unquoted");
                None
            }
        }
    }
}
