//! The pluggable chat-client driver seam.
//!
//! A driver owns the session with the actual chat network: login, transport,
//! real delivery. The core only sees this trait plus [`RawMessage`], the one
//! concrete shape every driver must map its native message type onto. The
//! same dispatch pipeline therefore behaves identically no matter which
//! backend is wired in.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// Who the bot is on the chat network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverIdentity {
    /// Short user identity, the part mentioned as `@user` in message bodies.
    pub user: String,
    /// Canonical network address of the bot itself.
    pub address: String,
    /// Optional human-readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl DriverIdentity {
    /// Creates an identity from its user part and canonical address.
    pub fn new(user: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            address: address.into(),
            display_name: None,
        }
    }

    /// Sets the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// The mention marker for this identity (`@user`).
    pub fn mention_tag(&self) -> String {
        format!("@{}", self.user)
    }
}

/// A driver-native message, reduced to the fields the core needs.
///
/// `body` stays optional so the dispatch guard can reject payloads that
/// carry no text at all (media-only events, receipts) before normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    /// Driver-assigned message id.
    pub id: String,
    /// Sender address (chat address for group messages).
    pub from: String,
    /// Sub-identity of the actual sender inside a group chat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Text body, absent for non-text payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Whether the message arrived in a group chat.
    #[serde(default)]
    pub group: bool,
    /// The message this one quotes, when the driver reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quoted: Option<Box<RawMessage>>,
}

impl RawMessage {
    /// Creates a direct text message.
    pub fn text(id: impl Into<String>, from: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            author: None,
            body: Some(body.into()),
            group: false,
            quoted: None,
        }
    }

    /// Marks this message as sent in a group by the given author.
    pub fn in_group(mut self, author: impl Into<String>) -> Self {
        self.group = true;
        self.author = Some(author.into());
        self
    }

    /// Attaches the message this one quotes.
    pub fn quoting(mut self, quoted: RawMessage) -> Self {
        self.quoted = Some(Box::new(quoted));
        self
    }
}

/// Errors reported by driver primitives.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The driver has no live session.
    #[error("driver is not connected")]
    NotConnected,

    /// The driver did not confirm the call in time.
    #[error("driver call timed out")]
    Timeout,

    /// The network accepted the call but the message was not sent.
    #[error("message not sent: {0}")]
    NotSent(String),

    /// Transport-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Any other driver-specific failure.
    #[error("{0}")]
    Other(String),
}

/// Result type for driver calls.
pub type DriverResult<T> = Result<T, DriverError>;

/// The capability set a chat-client backend must provide.
///
/// Implementations map these calls onto their protocol; the core never
/// touches driver-native types beyond [`RawMessage`].
#[async_trait]
pub trait ChatDriver: Send + Sync + 'static {
    /// Short driver name used in logs.
    fn name(&self) -> &'static str;

    /// Resolves the bot's own identity on the network.
    async fn host_identity(&self) -> DriverResult<DriverIdentity>;

    /// The platform's broadcast sender address, when it has one.
    ///
    /// Messages from this address are dropped by the dispatch guard.
    fn broadcast_address(&self) -> Option<&str> {
        None
    }

    /// Subscribes to inbound messages.
    ///
    /// The driver delivers messages one at a time through the returned
    /// channel; the receiver side decides how much concurrency to apply.
    async fn subscribe(&self) -> DriverResult<mpsc::Receiver<RawMessage>>;

    /// Sends a plain text message, returning the sent message as the driver
    /// recorded it.
    async fn send_text(&self, to: &str, body: &str) -> DriverResult<RawMessage>;

    /// Sends a text message quoting `quote_id`.
    async fn send_reply(&self, to: &str, body: &str, quote_id: &str) -> DriverResult<RawMessage>;

    /// Looks a message up by id; `Ok(None)` when the driver does not know it.
    async fn message_by_id(&self, id: &str) -> DriverResult<Option<RawMessage>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mention_tag_prefixes_user() {
        let identity = DriverIdentity::new("confab", "5511888888888@c.net");
        assert_eq!(identity.mention_tag(), "@confab");
    }

    #[test]
    fn raw_message_builders_compose() {
        let quoted = RawMessage::text("m1", "5511999999999@c.net", "first");
        let raw = RawMessage::text("m2", "group@g.net", "second")
            .in_group("5511999999999@c.net")
            .quoting(quoted);

        assert!(raw.group);
        assert_eq!(raw.author.as_deref(), Some("5511999999999@c.net"));
        assert_eq!(raw.quoted.as_ref().unwrap().id, "m1");
    }

    #[test]
    fn raw_message_survives_the_wire() {
        let raw = RawMessage::text("m2", "group@g.net", "second")
            .in_group("5511999999999@c.net")
            .quoting(RawMessage::text("m1", "5511999999999@c.net", "first"));

        let value = serde_json::to_value(&raw).unwrap();
        assert_eq!(value["quoted"]["id"], "m1");
        // Absent optionals stay off the wire entirely.
        assert!(value["quoted"].get("quoted").is_none());

        let back: RawMessage = serde_json::from_value(value).unwrap();
        assert_eq!(back.id, raw.id);
        assert_eq!(back.quoted.unwrap().body.as_deref(), Some("first"));
    }
}
