//! Named triggers and the ordered registry.
//!
//! A trigger pairs a name with an optional async condition and an async
//! action. The registry keeps triggers in registration order and always
//! holds exactly one fallback, named `"else"`, which runs when nothing else
//! matches.

use std::sync::Arc;

use futures::future::BoxFuture;
use thiserror::Error;
use tracing::warn;

use crate::message::Message;
use crate::safecall::{CallError, safe_call};

/// The reserved name of the fallback trigger.
pub const FALLBACK_NAME: &str = "else";

/// Converts handler return values into the uniform action result.
///
/// Lets actions and continuations be written as plain `async` blocks
/// returning `()` or as fallible ones returning `anyhow::Result<()>`.
pub trait IntoTriggerResult: Send {
    /// Converts `self` into the uniform result.
    fn into_trigger_result(self) -> anyhow::Result<()>;
}

impl IntoTriggerResult for () {
    fn into_trigger_result(self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl IntoTriggerResult for anyhow::Result<()> {
    fn into_trigger_result(self) -> anyhow::Result<()> {
        self
    }
}

/// Converts condition return values into the uniform check result.
pub trait IntoConditionResult: Send {
    /// Converts `self` into the uniform result.
    fn into_condition_result(self) -> anyhow::Result<bool>;
}

impl IntoConditionResult for bool {
    fn into_condition_result(self) -> anyhow::Result<bool> {
        Ok(self)
    }
}

impl IntoConditionResult for anyhow::Result<bool> {
    fn into_condition_result(self) -> anyhow::Result<bool> {
        self
    }
}

type Condition = Arc<dyn Fn(Message) -> BoxFuture<'static, anyhow::Result<bool>> + Send + Sync>;
type Action = Arc<dyn Fn(Message) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// A named (condition, action) pair evaluated against inbound messages.
///
/// Triggers are immutable once built; re-registering under the same name
/// replaces the whole entry.
#[derive(Clone)]
pub struct Trigger {
    name: String,
    condition: Option<Condition>,
    action: Action,
}

/// Errors from building or registering a trigger.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The trigger name was empty.
    #[error("trigger name must not be empty")]
    EmptyName,
}

impl Trigger {
    /// Creates a trigger with the given action and no condition.
    ///
    /// A conditionless trigger never matches on its own; it only runs as
    /// the fallback when registered under [`FALLBACK_NAME`].
    pub fn new<A, Fut, R>(name: impl Into<String>, action: A) -> Result<Self, RegistryError>
    where
        A: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoTriggerResult + 'static,
    {
        let name = name.into();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        Ok(Self {
            name,
            condition: None,
            action: Arc::new(move |message| {
                let fut = action(message);
                Box::pin(async move { fut.await.into_trigger_result() })
            }),
        })
    }

    /// Attaches the matching condition.
    pub fn with_condition<C, Fut, R>(mut self, condition: C) -> Self
    where
        C: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoConditionResult + 'static,
    {
        self.condition = Some(Arc::new(move |message| {
            let fut = condition(message);
            Box::pin(async move { fut.await.into_condition_result() })
        }));
        self
    }

    /// The trigger's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a condition is attached.
    pub fn has_condition(&self) -> bool {
        self.condition.is_some()
    }

    pub(crate) fn without_condition(mut self) -> Self {
        self.condition = None;
        self
    }

    /// Evaluates the condition against a message, failures contained.
    ///
    /// A conditionless trigger reports no match.
    pub(crate) async fn check(&self, message: &Message) -> Result<bool, CallError> {
        match &self.condition {
            Some(condition) => safe_call(condition(message.clone())).await,
            None => Ok(false),
        }
    }

    /// Runs the action, failures contained.
    pub(crate) async fn run(&self, message: Message) -> Result<(), CallError> {
        safe_call((self.action)(message)).await
    }
}

impl std::fmt::Debug for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trigger")
            .field("name", &self.name)
            .field("has_condition", &self.has_condition())
            .finish()
    }
}

/// Ordered collection of triggers with a mandatory fallback.
pub struct TriggerRegistry {
    triggers: Vec<Arc<Trigger>>,
    fallback: Arc<Trigger>,
}

impl Default for TriggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TriggerRegistry {
    /// Creates a registry holding only the no-op fallback.
    pub fn new() -> Self {
        let fallback = Trigger::new(FALLBACK_NAME, |_message| async {})
            .expect("fallback name is non-empty");
        Self {
            triggers: Vec::new(),
            fallback: Arc::new(fallback),
        }
    }

    /// Registers a trigger.
    ///
    /// Registering an existing name replaces that entry in place, keeping
    /// its position in the evaluation order. Registering under
    /// [`FALLBACK_NAME`] replaces the fallback; a condition supplied on the
    /// fallback is dropped.
    pub fn add(&mut self, trigger: Trigger) {
        if trigger.name() == FALLBACK_NAME {
            if trigger.has_condition() {
                warn!("condition supplied on the \"else\" trigger is ignored");
            }
            self.fallback = Arc::new(trigger.without_condition());
            return;
        }
        match self.triggers.iter().position(|t| t.name() == trigger.name()) {
            Some(index) => self.triggers[index] = Arc::new(trigger),
            None => self.triggers.push(Arc::new(trigger)),
        }
    }

    /// Looks a trigger up by name; [`FALLBACK_NAME`] returns the fallback.
    pub fn get(&self, name: &str) -> Option<&Arc<Trigger>> {
        if name == FALLBACK_NAME {
            return Some(&self.fallback);
        }
        self.triggers.iter().find(|t| t.name() == name)
    }

    /// Number of non-fallback triggers.
    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    /// Returns true when only the fallback is registered.
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Names of non-fallback triggers in evaluation order.
    pub fn names(&self) -> Vec<&str> {
        self.triggers.iter().map(|t| t.name()).collect()
    }

    /// Snapshot of the evaluation order plus the fallback.
    ///
    /// Dispatch iterates the snapshot, so a concurrent re-registration
    /// never tears an in-flight evaluation.
    pub(crate) fn snapshot(&self) -> (Vec<Arc<Trigger>>, Arc<Trigger>) {
        (self.triggers.clone(), Arc::clone(&self.fallback))
    }
}

impl std::fmt::Debug for TriggerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerRegistry")
            .field("triggers", &self.names())
            .finish()
    }
}
