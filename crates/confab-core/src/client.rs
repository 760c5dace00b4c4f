//! The per-bot client aggregate.
//!
//! A [`Client`] binds one driver to one trigger registry, one reply
//! correlator and one alias resolver. Clients are cheap cloneable handles
//! over shared state; independent clients share nothing and may run
//! concurrently.

use std::sync::Arc;
use std::sync::Weak;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tracing::info;

use crate::adapter::{MessageAdapter, SendError};
use crate::alias::AliasResolver;
use crate::correlator::ReplyCorrelator;
use crate::driver::{ChatDriver, DriverIdentity, DriverResult, RawMessage};
use crate::message::{Message, Outbound};
use crate::safecall::RetryPolicy;
use crate::trigger::{Trigger, TriggerRegistry};

/// Client tuning knobs.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Session label used in logs.
    pub session: String,
    /// Text quoted back when a message mentions the bot; `None` disables
    /// the acknowledgment.
    pub mention_ack: Option<String>,
    /// Retry policy for quote-target lookups on the send path.
    pub send_retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            session: "confab".to_string(),
            mention_ack: None,
            send_retry: RetryPolicy::default(),
        }
    }
}

pub(crate) struct ClientInner {
    pub(crate) adapter: MessageAdapter,
    pub(crate) correlator: ReplyCorrelator,
    pub(crate) registry: RwLock<TriggerRegistry>,
    pub(crate) identity: RwLock<Option<DriverIdentity>>,
    pub(crate) started: AtomicBool,
    pub(crate) config: ClientConfig,
}

/// A handle to one bot instance.
#[derive(Clone)]
pub struct Client {
    pub(crate) inner: Arc<ClientInner>,
}

impl Client {
    /// Creates a client over the given driver with default configuration.
    pub fn new(driver: Arc<dyn ChatDriver>) -> Self {
        Self::with_config(driver, ClientConfig::default())
    }

    /// Creates a client over the given driver.
    pub fn with_config(driver: Arc<dyn ChatDriver>, config: ClientConfig) -> Self {
        let adapter = MessageAdapter::new(driver, AliasResolver::new(), config.send_retry);
        Self {
            inner: Arc::new(ClientInner {
                adapter,
                correlator: ReplyCorrelator::new(),
                registry: RwLock::new(TriggerRegistry::new()),
                identity: RwLock::new(None),
                started: AtomicBool::new(false),
                config,
            }),
        }
    }

    /// The contact alias table.
    pub fn aliases(&self) -> &AliasResolver {
        &self.inner.adapter.aliases
    }

    /// The pending reply bindings.
    pub fn correlator(&self) -> &ReplyCorrelator {
        &self.inner.correlator
    }

    /// The underlying driver.
    pub fn driver(&self) -> &Arc<dyn ChatDriver> {
        &self.inner.adapter.driver
    }

    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Registers a trigger (replacing any same-named one).
    pub fn register(&self, trigger: Trigger) {
        self.inner.registry.write().add(trigger);
    }

    /// Names of registered non-fallback triggers in evaluation order.
    pub fn trigger_names(&self) -> Vec<String> {
        self.inner
            .registry
            .read()
            .names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Whether `start` has completed.
    pub fn is_started(&self) -> bool {
        self.inner.started.load(Ordering::SeqCst)
    }

    /// The bot's cached network identity, available after `start`.
    pub fn identity(&self) -> Option<DriverIdentity> {
        self.inner.identity.read().clone()
    }

    /// Starts the client: resolves and caches the driver identity, then
    /// enables dispatch.
    pub async fn start(&self) -> DriverResult<()> {
        let identity = self.inner.adapter.driver.host_identity().await?;
        info!(
            session = %self.inner.config.session,
            user = %identity.user,
            "client started"
        );
        *self.inner.identity.write() = Some(identity);
        self.inner.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Disables dispatch; inbound messages are skipped until restarted.
    pub fn stop(&self) {
        self.inner.started.store(false, Ordering::SeqCst);
    }

    /// Sends a message through the driver.
    ///
    /// The target resolves through the forward alias table; failures are
    /// logged and propagated to the caller.
    pub async fn send(&self, outbound: Outbound) -> Result<Message, SendError> {
        if !self.is_started() {
            return Err(SendError::NotStarted);
        }
        self.inner.adapter.send(outbound, self.weak()).await
    }

    /// Looks a message up by id, normalized.
    pub async fn message_by_id(&self, id: &str) -> DriverResult<Option<Message>> {
        let raw = self.inner.adapter.driver.message_by_id(id).await?;
        Ok(raw.map(|raw| self.inner.adapter.normalize(&raw, self.weak())))
    }

    /// Normalizes a raw message without dispatching it.
    pub fn normalize(&self, raw: &RawMessage) -> Message {
        self.inner.adapter.normalize(raw, self.weak())
    }

    pub(crate) fn weak(&self) -> WeakClient {
        WeakClient(Arc::downgrade(&self.inner))
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("session", &self.inner.config.session)
            .field("driver", &self.inner.adapter.driver.name())
            .field("started", &self.is_started())
            .finish()
    }
}

/// Non-owning back-handle from a [`Message`] to its client.
///
/// Messages borrow the client's identity to route outbound calls; they
/// never extend its lifetime.
#[derive(Clone, Default)]
pub struct WeakClient(pub(crate) Weak<ClientInner>);

impl WeakClient {
    pub(crate) fn upgrade(&self) -> Option<Client> {
        self.0.upgrade().map(|inner| Client { inner })
    }
}

impl std::fmt::Debug for WeakClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WeakClient")
    }
}
