//! Runtime orchestration.
//!
//! The [`Runtime`] wires a driver into a configured [`Client`], pumps the
//! driver's subscription into per-message dispatch tasks, serves the HTTP
//! control endpoint when enabled, and shuts everything down on ctrl-c or
//! cancellation.

use std::sync::Arc;

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use confab_core::{ChatDriver, Client, ClientConfig, Outbound, Trigger};
use confab_http::ApiServer;

use crate::config::{ConfabConfig, load_config};
use crate::error::RuntimeResult;
use crate::{flavor, logging};

/// The confab runtime.
///
/// ```rust,ignore
/// use confab_runtime::Runtime;
///
/// let runtime = Runtime::new(driver);            // auto-loads confab.toml
/// runtime.register(my_trigger);
/// runtime.run().await?;
/// ```
pub struct Runtime {
    config: ConfabConfig,
    client: Client,
    cancel: CancellationToken,
}

impl Runtime {
    /// Creates a runtime with automatic configuration loading.
    ///
    /// Falls back to defaults when no config file is found.
    pub fn new(driver: Arc<dyn ChatDriver>) -> Self {
        let config = load_config().unwrap_or_else(|load_error| {
            eprintln!("Warning: failed to load config ({load_error}), using defaults");
            ConfabConfig::default()
        });
        Self::from_config(config, driver)
    }

    /// Creates a runtime from a loaded configuration.
    ///
    /// Initializes logging and seeds the client's alias table.
    pub fn from_config(config: ConfabConfig, driver: Arc<dyn ChatDriver>) -> Self {
        logging::init_from_config(&config.logging);

        let mention_ack = if config.client.ack_mentions {
            Some(
                config
                    .client
                    .mention_ack
                    .clone()
                    .unwrap_or_else(flavor::got_mention),
            )
        } else {
            None
        };
        let client_config = ClientConfig {
            session: config.client.session.clone(),
            mention_ack,
            send_retry: config.client.retry.to_policy(),
        };

        let client = Client::with_config(driver, client_config);
        for (alias, address) in &config.aliases {
            client.aliases().insert(alias, address);
        }

        Self {
            config,
            client,
            cancel: CancellationToken::new(),
        }
    }

    /// The managed client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The loaded configuration.
    pub fn config(&self) -> &ConfabConfig {
        &self.config
    }

    /// A token that stops [`run`](Self::run) when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Registers a trigger on the managed client.
    pub fn register(&self, trigger: Trigger) {
        self.client.register(trigger);
    }

    /// Starts the client and pumps inbound messages until shutdown.
    ///
    /// Each inbound message dispatches in its own task, so one stalled
    /// handler does not hold up the stream; trigger evaluation stays
    /// sequential within each message.
    pub async fn run(&self) -> RuntimeResult<()> {
        self.client.start().await?;
        self.announce_start().await;

        let api_handle = if self.config.api.enabled {
            let server = ApiServer::new(self.client.clone(), self.config.api.clone())?;
            Some(server.serve().await?)
        } else {
            None
        };

        let mut inbound = self.client.driver().subscribe().await?;
        info!(session = %self.config.client.session, "runtime running");

        let ctrl_c = signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                received = inbound.recv() => match received {
                    Some(raw) => {
                        let client = self.client.clone();
                        tokio::spawn(async move {
                            client.dispatch(raw).await;
                        });
                    }
                    None => {
                        info!("driver subscription closed");
                        break;
                    }
                },
                _ = self.cancel.cancelled() => {
                    info!("shutdown requested");
                    break;
                }
                _ = &mut ctrl_c => {
                    info!("ctrl-c received, shutting down");
                    break;
                }
            }
        }

        if let Some(handle) = api_handle {
            handle.shutdown();
        }
        self.client.stop();
        Ok(())
    }

    /// Messages the admin contact that the bot is up, when configured.
    async fn announce_start(&self) {
        if !self.config.client.announce_start {
            return;
        }
        let Some(admin) = self.config.client.admin.clone() else {
            return;
        };
        let text = format!("{} started!", self.config.client.session);
        if let Err(send_error) = self
            .client
            .send(Outbound::text(text).to(admin).log("bot_start"))
            .await
        {
            warn!(error = %send_error, "startup announcement failed");
        }
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("session", &self.config.client.session)
            .field("api_enabled", &self.config.api.enabled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientSettings;

    use std::time::Duration;

    use confab_adapter_inproc::InprocDriver;
    use confab_core::{DriverIdentity, Message, RawMessage};

    fn quiet_config() -> ConfabConfig {
        ConfabConfig {
            client: ClientSettings {
                ack_mentions: false,
                ..ClientSettings::default()
            },
            ..ConfabConfig::default()
        }
    }

    #[tokio::test]
    async fn runtime_pumps_messages_into_dispatch() {
        let driver = InprocDriver::new(DriverIdentity::new("confab", "bot@inproc"));
        let handle = driver.handle();

        let runtime = Arc::new(Runtime::from_config(quiet_config(), Arc::new(driver)));
        runtime.register(
            Trigger::new("echo", |m: Message| async move {
                m.send(Outbound::text(m.body.clone())).await?;
                Ok(())
            })
            .unwrap()
            .with_condition(|m| async move { m.body == "ping" }),
        );

        let cancel = runtime.cancellation_token();
        let running = Arc::clone(&runtime);
        let join = tokio::spawn(async move { running.run().await });

        // Wait for the pump to subscribe, then inject an inbound message.
        let raw = RawMessage::text("m1", "operator", "ping");
        for _ in 0..100 {
            if handle.receive(raw.clone()).await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        // The echo trigger answers through the driver.
        let mut delivered = None;
        for _ in 0..100 {
            if let Some(delivery) = handle.last_delivery() {
                delivered = Some(delivery);
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let delivered = delivered.expect("no delivery observed");
        assert_eq!(delivered.to, "operator");
        assert_eq!(delivered.message.body.as_deref(), Some("ping"));

        cancel.cancel();
        join.await.unwrap().unwrap();
        assert!(!runtime.client().is_started());
    }

    #[tokio::test]
    async fn startup_announcement_reaches_the_admin() {
        let driver = InprocDriver::new(DriverIdentity::new("confab", "bot@inproc"));
        let handle = driver.handle();

        let mut config = quiet_config();
        config.client.admin = Some("anthony".to_string());
        config.client.announce_start = true;
        config.aliases.insert("anthony".to_string(), "op@inproc".to_string());

        let runtime = Arc::new(Runtime::from_config(config, Arc::new(driver)));
        let cancel = runtime.cancellation_token();
        let running = Arc::clone(&runtime);
        let join = tokio::spawn(async move { running.run().await });

        let mut delivered = None;
        for _ in 0..100 {
            if let Some(delivery) = handle.last_delivery() {
                delivered = Some(delivery);
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let delivered = delivered.expect("no announcement observed");
        assert_eq!(delivered.to, "op@inproc");
        assert_eq!(delivered.message.body.as_deref(), Some("confab started!"));

        cancel.cancel();
        join.await.unwrap().unwrap();
    }
}
