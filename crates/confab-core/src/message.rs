//! The normalized message entity.
//!
//! A [`Message`] is the one stable shape handlers observe, no matter which
//! driver produced the raw payload. Sender fields arrive alias-resolved, the
//! quoted message (if any) is already normalized, and outbound helpers route
//! back through the owning client via a non-owning handle.

use serde::Serialize;

use crate::adapter::SendError;
use crate::client::WeakClient;
use crate::correlator::BindError;
use crate::driver::RawMessage;
use crate::fetch::Fetch;
use crate::trigger::IntoTriggerResult;

/// A normalized inbound or sent message.
///
/// Holds a [`WeakClient`] back-handle for `send`/`reply`/`on_reply`; the
/// message never extends the client's lifetime, and outbound calls on a
/// message that outlived its client fail with [`SendError::ClientGone`].
#[derive(Clone, Serialize)]
pub struct Message {
    /// Driver-assigned message id.
    pub id: String,
    /// Sender, alias-resolved (chat address for group messages).
    pub from: String,
    /// Actual author, alias-resolved; equals `from` outside groups.
    pub author: String,
    /// Text body.
    pub body: String,
    /// Whether the message arrived in a group chat.
    pub group: bool,
    /// The normalized message this one quotes, when present.
    pub quoted: Option<Box<Message>>,
    /// The driver-native payload this message was normalized from.
    pub raw: RawMessage,
    #[serde(skip)]
    pub(crate) client: WeakClient,
}

impl Message {
    /// Sends a message back to this message's sender.
    ///
    /// The outbound target is always this message's `from`; any target set
    /// on `outbound` is replaced.
    pub async fn send(&self, mut outbound: Outbound) -> Result<Message, SendError> {
        let client = self.client.upgrade().ok_or(SendError::ClientGone)?;
        outbound.to = Some(Fetch::ready(self.from.clone()));
        client.send(outbound).await
    }

    /// Sends a message back to the sender, quoting this message.
    pub async fn reply(&self, outbound: Outbound) -> Result<Message, SendError> {
        self.send(outbound.quote(self.id.clone())).await
    }

    /// Registers a continuation invoked when an inbound message quotes this
    /// one.
    ///
    /// Intended for *sent* messages: bind the continuation on the value
    /// returned by `send`/`reply`, and the next incoming reply that quotes
    /// it routes to the continuation instead of trigger evaluation.
    pub fn on_reply<F, Fut, R>(&self, continuation: F) -> Result<(), BindError>
    where
        F: FnOnce(Message) -> Fut + Send + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoTriggerResult + 'static,
    {
        let client = self.client.upgrade().ok_or(BindError::ClientGone)?;
        client.correlator().bind_fn(&self.id, continuation)
    }

    /// Returns the body lowercased, with the bot's own mention removed and
    /// whitespace collapsed.
    pub fn clean(&self) -> String {
        let mut text = self.body.to_lowercase();
        if let Some(client) = self.client.upgrade()
            && let Some(identity) = client.identity()
        {
            text = text.replace(&identity.mention_tag().to_lowercase(), "");
        }
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Message")
            .field("id", &self.id)
            .field("from", &self.from)
            .field("author", &self.author)
            .field("body", &self.body)
            .field("group", &self.group)
            .field("quoted", &self.quoted.as_ref().map(|q| q.id.as_str()))
            .finish()
    }
}

/// One outbound send intent.
///
/// Every field is a [`Fetch`], so callers can hand over literals, futures,
/// or closures and let the send path resolve them.
#[derive(Debug, Default)]
pub struct Outbound {
    pub(crate) to: Option<Fetch>,
    pub(crate) text: Option<Fetch>,
    pub(crate) log: Option<Fetch>,
    pub(crate) quote: Option<Fetch>,
}

impl Outbound {
    /// An empty send intent (empty body, no target).
    pub fn new() -> Self {
        Self::default()
    }

    /// A send intent carrying the given body text.
    pub fn text(value: impl Into<Fetch>) -> Self {
        Self {
            text: Some(value.into()),
            ..Self::default()
        }
    }

    /// Sets the target (alias or canonical address).
    pub fn to(mut self, value: impl Into<Fetch>) -> Self {
        self.to = Some(value.into());
        self
    }

    /// Sets the label used when logging the send.
    pub fn log(mut self, value: impl Into<Fetch>) -> Self {
        self.log = Some(value.into());
        self
    }

    /// Sets the id of the message to quote.
    pub fn quote(mut self, value: impl Into<Fetch>) -> Self {
        self.quote = Some(value.into());
        self
    }
}
