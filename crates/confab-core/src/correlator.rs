//! Reply correlation.
//!
//! When a handler sends a message and wants to hear about the answer, it
//! binds a continuation against the *outbound* message's id. The next
//! inbound message that quotes that id is routed to the continuation
//! instead of trigger evaluation. Each binding fires at most once.

use std::collections::HashMap;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use thiserror::Error;

use crate::message::Message;
use crate::safecall::{CallError, safe_call};
use crate::trigger::IntoTriggerResult;

/// A one-shot reply handler.
pub type Continuation = Box<dyn FnOnce(Message) -> BoxFuture<'static, anyhow::Result<()>> + Send>;

/// Errors from registering a reply binding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindError {
    /// The outbound message id was empty.
    #[error("reply binding id must not be empty")]
    EmptyId,

    /// The owning client no longer exists.
    #[error("client has been dropped")]
    ClientGone,
}

/// Map from outbound message ids to pending continuations.
///
/// Bindings are removed under the lock and invoked outside it, so a lookup
/// can never observe a half-consumed entry and a slow continuation never
/// blocks other dispatch tasks from binding or resolving.
#[derive(Default)]
pub struct ReplyCorrelator {
    bindings: Mutex<HashMap<String, Continuation>>,
}

impl ReplyCorrelator {
    /// Creates an empty correlator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a continuation for the outbound message `message_id`.
    ///
    /// Re-binding the same id replaces the previous continuation.
    pub fn bind(&self, message_id: &str, continuation: Continuation) -> Result<(), BindError> {
        if message_id.is_empty() {
            return Err(BindError::EmptyId);
        }
        self.bindings
            .lock()
            .insert(message_id.to_string(), continuation);
        Ok(())
    }

    /// Registers a plain async closure as the continuation.
    pub fn bind_fn<F, Fut, R>(&self, message_id: &str, continuation: F) -> Result<(), BindError>
    where
        F: FnOnce(Message) -> Fut + Send + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoTriggerResult + 'static,
    {
        self.bind(
            message_id,
            Box::new(move |message| {
                Box::pin(async move { continuation(message).await.into_trigger_result() })
            }),
        )
    }

    /// Routes an inbound message to the continuation bound to the message it
    /// quotes.
    ///
    /// Returns `None` when the message quotes nothing or no binding matches;
    /// otherwise the binding is consumed and its contained outcome returned.
    pub async fn resolve(&self, incoming: &Message) -> Option<Result<(), CallError>> {
        let quoted = incoming.quoted.as_deref()?;
        let continuation = self.bindings.lock().remove(&quoted.id)?;
        Some(safe_call(continuation(incoming.clone())).await)
    }

    /// Returns whether a binding exists for `message_id`.
    pub fn contains(&self, message_id: &str) -> bool {
        self.bindings.lock().contains_key(message_id)
    }

    /// Number of pending bindings.
    pub fn len(&self) -> usize {
        self.bindings.lock().len()
    }

    /// Returns true when no bindings are pending.
    pub fn is_empty(&self) -> bool {
        self.bindings.lock().is_empty()
    }

    /// Drops all pending bindings.
    pub fn clear(&self) {
        self.bindings.lock().clear();
    }
}

impl std::fmt::Debug for ReplyCorrelator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyCorrelator")
            .field("pending", &self.len())
            .finish()
    }
}
