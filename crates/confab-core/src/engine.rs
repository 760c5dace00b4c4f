//! The per-message dispatch state machine.
//!
//! One inbound raw message flows through: guard → normalization → mention
//! acknowledgment → reply correlation → trigger evaluation → fallback.
//! At most one trigger action runs per message, handler failures are
//! contained and logged, and the outcome is reported as a [`Dispatch`]
//! value so callers never have to inspect logs to know what happened.

use tracing::{Instrument, debug, debug_span, error, info, warn};

use crate::client::Client;
use crate::driver::RawMessage;
use crate::message::{Message, Outbound};
use crate::trigger::FALLBACK_NAME;

/// Why a message was not dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    /// The client has not been started.
    NotStarted,
    /// The raw payload carries no body.
    NoBody,
    /// The sender is the platform broadcast address.
    Broadcast,
    /// A group message that does not mention the bot.
    GroupNotAddressed,
}

/// The outcome of dispatching one raw message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// The guard rejected the message.
    Skipped(Skip),
    /// The message quoted a bound outbound message; the continuation ran.
    Correlated {
        /// Id of the quoted (outbound) message.
        quoted: String,
    },
    /// The message quoted something nothing was bound to; dispatch ends.
    Unclaimed {
        /// Id of the quoted message.
        quoted: String,
    },
    /// A trigger's condition matched and its action ran.
    Triggered {
        /// Name of the trigger that ran.
        name: String,
    },
    /// No trigger matched; the fallback action ran.
    Fallback,
}

impl Client {
    /// Dispatches one inbound raw message.
    ///
    /// This is the entry point the driver's event subscription feeds.
    /// Handler failures never escape: they are logged with the trigger name
    /// and the message sender, and the returned outcome still names the
    /// path taken.
    pub async fn dispatch(&self, raw: RawMessage) -> Dispatch {
        let span = debug_span!("dispatch", message_id = %raw.id);
        self.dispatch_inner(raw).instrument(span).await
    }

    async fn dispatch_inner(&self, raw: RawMessage) -> Dispatch {
        if !self.is_started() {
            return Dispatch::Skipped(Skip::NotStarted);
        }
        if raw.body.is_none() {
            return Dispatch::Skipped(Skip::NoBody);
        }
        if let Some(broadcast) = self.driver().broadcast_address()
            && raw.from == broadcast
        {
            return Dispatch::Skipped(Skip::Broadcast);
        }

        let message = self.normalize(&raw);
        let mentioned = self
            .identity()
            .is_some_and(|identity| message.body.contains(&identity.mention_tag()));

        if mentioned {
            self.acknowledge_mention(&message).await;
        }

        if let Some(quoted) = message.quoted.as_deref() {
            let quoted_id = quoted.id.clone();
            return match self.correlator().resolve(&message).await {
                Some(Ok(())) => Dispatch::Correlated { quoted: quoted_id },
                Some(Err(continuation_error)) => {
                    error!(
                        quoted = %quoted_id,
                        from = %message.from,
                        error = %continuation_error,
                        "reply continuation failed"
                    );
                    Dispatch::Correlated { quoted: quoted_id }
                }
                None => {
                    debug!(quoted = %quoted_id, "reply quotes no bound message");
                    Dispatch::Unclaimed { quoted: quoted_id }
                }
            };
        }

        if message.group && !mentioned {
            return Dispatch::Skipped(Skip::GroupNotAddressed);
        }

        self.evaluate_triggers(message).await
    }

    /// Quotes the configured acknowledgment back at a message that mentions
    /// the bot. Cosmetic; failures are logged and ignored.
    async fn acknowledge_mention(&self, message: &Message) {
        let Some(ack) = self.config().mention_ack.clone() else {
            return;
        };
        if let Err(ack_error) = message.reply(Outbound::text(ack).log("got_mention")).await {
            warn!(from = %message.from, error = %ack_error, "mention acknowledgment failed");
        }
    }

    /// Runs the first matching trigger, or the fallback.
    async fn evaluate_triggers(&self, message: Message) -> Dispatch {
        let (triggers, fallback) = self.inner.registry.read().snapshot();

        for trigger in triggers {
            match trigger.check(&message).await {
                Ok(true) => {
                    info!(trigger = %trigger.name(), from = %message.from, "dispatching trigger");
                    if let Err(action_error) = trigger.run(message.clone()).await {
                        error!(
                            trigger = %trigger.name(),
                            from = %message.from,
                            error = %action_error,
                            "trigger action failed"
                        );
                    }
                    return Dispatch::Triggered {
                        name: trigger.name().to_string(),
                    };
                }
                Ok(false) => {}
                Err(condition_error) => {
                    warn!(
                        trigger = %trigger.name(),
                        from = %message.from,
                        error = %condition_error,
                        "trigger condition failed, treated as no match"
                    );
                }
            }
        }

        info!(trigger = FALLBACK_NAME, from = %message.from, "dispatching fallback trigger");
        if let Err(action_error) = fallback.run(message.clone()).await {
            error!(
                trigger = FALLBACK_NAME,
                from = %message.from,
                error = %action_error,
                "fallback action failed"
            );
        }
        Dispatch::Fallback
    }
}
