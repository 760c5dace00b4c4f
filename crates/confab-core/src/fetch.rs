//! Lazy string sources for outbound message fields.
//!
//! Trigger actions often want to compute message text on demand (for example
//! by calling out to another service) without the send path caring how the
//! value is produced. [`Fetch`] models the accepted shapes as one sum type:
//! a literal string, a deferred (future) string, or a zero-argument closure
//! producing either.

use futures::future::BoxFuture;

/// A string source resolved at send time.
pub enum Fetch {
    /// A literal value.
    Ready(String),
    /// A deferred value; `None` when the source could not produce a string.
    Deferred(BoxFuture<'static, Option<String>>),
    /// A closure producing a literal or deferred value.
    Lazy(Box<dyn FnOnce() -> Fetch + Send>),
}

impl Fetch {
    /// A literal string source.
    pub fn ready(value: impl Into<String>) -> Self {
        Fetch::Ready(value.into())
    }

    /// A deferred string source.
    pub fn deferred<F>(fut: F) -> Self
    where
        F: Future<Output = Option<String>> + Send + 'static,
    {
        Fetch::Deferred(Box::pin(fut))
    }

    /// A lazily-evaluated string source.
    pub fn lazy<F>(f: F) -> Self
    where
        F: FnOnce() -> Fetch + Send + 'static,
    {
        Fetch::Lazy(Box::new(f))
    }

    /// Resolves this source to a plain string.
    ///
    /// A closure may yield a literal or a deferred value; a closure yielding
    /// another closure resolves to `None`, as does a deferred source that
    /// produces nothing.
    pub async fn resolve(self) -> Option<String> {
        match self {
            Fetch::Ready(value) => Some(value),
            Fetch::Deferred(fut) => fut.await,
            Fetch::Lazy(f) => match f() {
                Fetch::Ready(value) => Some(value),
                Fetch::Deferred(fut) => fut.await,
                Fetch::Lazy(_) => None,
            },
        }
    }

    /// Resolves an optional source, treating absence as `None`.
    pub(crate) async fn resolve_opt(value: Option<Fetch>) -> Option<String> {
        match value {
            Some(fetch) => fetch.resolve().await,
            None => None,
        }
    }
}

impl From<&str> for Fetch {
    fn from(value: &str) -> Self {
        Fetch::Ready(value.to_string())
    }
}

impl From<String> for Fetch {
    fn from(value: String) -> Self {
        Fetch::Ready(value)
    }
}

impl From<&String> for Fetch {
    fn from(value: &String) -> Self {
        Fetch::Ready(value.clone())
    }
}

impl std::fmt::Debug for Fetch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Fetch::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Fetch::Deferred(_) => f.write_str("Deferred(..)"),
            Fetch::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn literal_resolves_to_itself() {
        assert_eq!(Fetch::from("hello").resolve().await.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn deferred_resolves_by_awaiting() {
        let fetch = Fetch::deferred(async { Some("later".to_string()) });
        assert_eq!(fetch.resolve().await.as_deref(), Some("later"));
    }

    #[tokio::test]
    async fn lazy_closure_resolves_literal_and_deferred() {
        let literal = Fetch::lazy(|| Fetch::ready("now"));
        assert_eq!(literal.resolve().await.as_deref(), Some("now"));

        let deferred = Fetch::lazy(|| Fetch::deferred(async { Some("soon".to_string()) }));
        assert_eq!(deferred.resolve().await.as_deref(), Some("soon"));
    }

    #[tokio::test]
    async fn nested_lazy_resolves_to_none() {
        let fetch = Fetch::lazy(|| Fetch::lazy(|| Fetch::ready("never")));
        assert_eq!(fetch.resolve().await, None);
    }

    #[tokio::test]
    async fn absent_source_is_none() {
        assert_eq!(Fetch::resolve_opt(None).await, None);
    }
}
