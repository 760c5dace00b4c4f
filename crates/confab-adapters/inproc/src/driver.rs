//! The channel-backed driver implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, trace};
use uuid::Uuid;

use confab_core::{ChatDriver, DriverIdentity, DriverResult, RawMessage};

/// Capacity of the inbound subscription channel.
const INBOUND_BUFFER: usize = 64;

/// One recorded outbound delivery.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Resolved target address.
    pub to: String,
    /// The message as the driver recorded it.
    pub message: RawMessage,
    /// Quote id passed through, when the send was a quote-reply.
    pub quote: Option<String>,
}

#[derive(Default)]
struct InprocState {
    /// Every message the driver knows: recorded sends plus injected inbound.
    store: Mutex<HashMap<String, RawMessage>>,
    deliveries: Mutex<Vec<Delivery>>,
    inbound: Mutex<Option<mpsc::Sender<RawMessage>>>,
}

/// A [`ChatDriver`] that never leaves the process.
pub struct InprocDriver {
    identity: DriverIdentity,
    broadcast: Option<String>,
    state: Arc<InprocState>,
}

impl InprocDriver {
    /// Creates a driver with the given identity.
    pub fn new(identity: DriverIdentity) -> Self {
        Self {
            identity,
            broadcast: None,
            state: Arc::new(InprocState::default()),
        }
    }

    /// Sets the address treated as the platform broadcast sender.
    pub fn with_broadcast_address(mut self, address: impl Into<String>) -> Self {
        self.broadcast = Some(address.into());
        self
    }

    /// Returns a handle for injecting inbound messages and observing
    /// deliveries.
    pub fn handle(&self) -> InprocHandle {
        InprocHandle {
            state: Arc::clone(&self.state),
        }
    }

    fn record(&self, to: &str, body: &str, quote: Option<&str>) -> RawMessage {
        let id = Uuid::new_v4().to_string();
        let message = RawMessage::text(&id, self.identity.address.clone(), body);
        self.state.store.lock().insert(id, message.clone());
        self.state.deliveries.lock().push(Delivery {
            to: to.to_string(),
            message: message.clone(),
            quote: quote.map(str::to_string),
        });
        trace!(to = %to, quote = ?quote, "recorded delivery");
        message
    }
}

#[async_trait]
impl ChatDriver for InprocDriver {
    fn name(&self) -> &'static str {
        "inproc"
    }

    async fn host_identity(&self) -> DriverResult<DriverIdentity> {
        Ok(self.identity.clone())
    }

    fn broadcast_address(&self) -> Option<&str> {
        self.broadcast.as_deref()
    }

    async fn subscribe(&self) -> DriverResult<mpsc::Receiver<RawMessage>> {
        let (tx, rx) = mpsc::channel(INBOUND_BUFFER);
        // A new subscription replaces the previous one; the old receiver
        // runs dry once its sender is dropped.
        *self.state.inbound.lock() = Some(tx);
        Ok(rx)
    }

    async fn send_text(&self, to: &str, body: &str) -> DriverResult<RawMessage> {
        Ok(self.record(to, body, None))
    }

    async fn send_reply(&self, to: &str, body: &str, quote_id: &str) -> DriverResult<RawMessage> {
        Ok(self.record(to, body, Some(quote_id)))
    }

    async fn message_by_id(&self, id: &str) -> DriverResult<Option<RawMessage>> {
        Ok(self.state.store.lock().get(id).cloned())
    }
}

/// Test-side handle over an [`InprocDriver`].
#[derive(Clone)]
pub struct InprocHandle {
    state: Arc<InprocState>,
}

impl InprocHandle {
    /// Injects one inbound message, as the network would deliver it.
    ///
    /// The message is also added to the driver's store so quote lookups can
    /// find it. Returns `false` when nothing is subscribed.
    pub async fn receive(&self, message: RawMessage) -> bool {
        self.state
            .store
            .lock()
            .insert(message.id.clone(), message.clone());
        let sender = self.state.inbound.lock().clone();
        match sender {
            Some(tx) => tx.send(message).await.is_ok(),
            None => {
                debug!("inbound message dropped, no subscriber");
                false
            }
        }
    }

    /// All recorded outbound deliveries, oldest first.
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.state.deliveries.lock().clone()
    }

    /// The most recent outbound delivery.
    pub fn last_delivery(&self) -> Option<Delivery> {
        self.state.deliveries.lock().last().cloned()
    }

    /// Looks a known message up by id.
    pub fn message(&self, id: &str) -> Option<RawMessage> {
        self.state.store.lock().get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confab_core::{Client, Dispatch, Outbound, Trigger};

    fn identity() -> DriverIdentity {
        DriverIdentity::new("confab", "bot@inproc")
    }

    #[tokio::test]
    async fn injected_messages_reach_the_subscriber() {
        let driver = InprocDriver::new(identity());
        let handle = driver.handle();

        let mut rx = driver.subscribe().await.unwrap();
        assert!(handle.receive(RawMessage::text("m1", "operator", "ping")).await);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, "m1");
        assert_eq!(handle.message("m1").unwrap().body.as_deref(), Some("ping"));
    }

    #[tokio::test]
    async fn injection_without_subscriber_reports_drop() {
        let driver = InprocDriver::new(identity());
        let handle = driver.handle();
        assert!(!handle.receive(RawMessage::text("m1", "operator", "ping")).await);
    }

    #[tokio::test]
    async fn sends_are_recorded_and_resolvable() {
        let driver = InprocDriver::new(identity());
        let handle = driver.handle();

        let sent = driver.send_text("operator", "hello").await.unwrap();
        let reply = driver
            .send_reply("operator", "and hello again", &sent.id)
            .await
            .unwrap();

        let deliveries = handle.deliveries();
        assert_eq!(deliveries.len(), 2);
        assert_eq!(deliveries[0].quote, None);
        assert_eq!(deliveries[1].quote.as_deref(), Some(sent.id.as_str()));
        assert_eq!(
            driver.message_by_id(&reply.id).await.unwrap().unwrap().body,
            reply.body
        );
    }

    #[tokio::test]
    async fn client_round_trip_over_inproc() {
        let driver = InprocDriver::new(identity());
        let handle = driver.handle();
        let client = Client::new(Arc::new(driver));
        client.aliases().insert("operator", "op@inproc");
        client.start().await.unwrap();

        client.register(
            Trigger::new("echo", |m: confab_core::Message| async move {
                m.send(Outbound::text(m.body.clone()).log("echo")).await?;
                Ok(())
            })
            .unwrap()
            .with_condition(|m| async move { !m.body.is_empty() }),
        );

        let outcome = client
            .dispatch(RawMessage::text("m1", "op@inproc", "say it back"))
            .await;
        assert_eq!(
            outcome,
            Dispatch::Triggered {
                name: "echo".to_string()
            }
        );

        let delivery = handle.last_delivery().unwrap();
        assert_eq!(delivery.to, "op@inproc");
        assert_eq!(delivery.message.body.as_deref(), Some("say it back"));
    }
}
