//! # Values: what a render supplies for each prop
//!
//! A [`PropValue`] is either a literal JSON value or a resolver. Resolvers are
//! stored as uninvoked `FnOnce` thunks. The engine calls them only for props
//! it decided to include and drops the rest untouched.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use serde_json::Value;

use crate::error::BoxError;

/// Type alias for async boxed futures produced by resolvers.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outcome of one resolver call.
pub type ResolverResult = Result<Value, BoxError>;

type SyncResolver = Box<dyn FnOnce() -> ResolverResult + Send>;
type AsyncResolver = Box<dyn FnOnce() -> BoxFuture<'static, ResolverResult> + Send>;

pub enum PropValue {
    Literal(Value),
    Sync(SyncResolver),
    Async(AsyncResolver),
}

impl PropValue {
    pub fn literal(value: impl Into<Value>) -> Self {
        PropValue::Literal(value.into())
    }

    /// Serializes `value` eagerly.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(PropValue::Literal)
    }

    /// A synchronous resolver, run only if the prop is included.
    pub fn lazy<F, T, E>(f: F) -> Self
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Serialize + 'static,
        E: Into<BoxError> + 'static,
    {
        PropValue::Sync(Box::new(move || {
            let value = f().map_err(Into::<BoxError>::into)?;
            Ok(serde_json::to_value(value)?)
        }))
    }

    /// An asynchronous resolver; `f` is neither called nor polled unless the
    /// prop is included.
    pub fn resolve<F, Fut, T, E>(f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Serialize + 'static,
        E: Into<BoxError> + 'static,
    {
        PropValue::Async(Box::new(move || {
            Box::pin(async move {
                let value = f().await.map_err(Into::<BoxError>::into)?;
                Ok(serde_json::to_value(value)?)
            })
        }))
    }

    pub fn is_resolver(&self) -> bool {
        !matches!(self, PropValue::Literal(_))
    }

    /// Evaluates the value, invoking the resolver if there is one.
    pub async fn evaluate(self) -> ResolverResult {
        match self {
            PropValue::Literal(value) => Ok(value),
            PropValue::Sync(f) => f(),
            PropValue::Async(f) => f().await,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            PropValue::Sync(_) => f.write_str("Sync(<resolver>)"),
            PropValue::Async(_) => f.write_str("Async(<resolver>)"),
        }
    }
}

impl From<Value> for PropValue {
    fn from(value: Value) -> Self {
        PropValue::Literal(value)
    }
}

/// Everything one route handler supplies for a single render.
#[derive(Debug, Default)]
pub struct RenderRequest {
    pub(crate) values: HashMap<String, PropValue>,
    pub(crate) has_more: HashMap<String, bool>,
    pub(crate) current_pages: HashMap<String, u32>,
    pub(crate) url: Option<String>,
    pub(crate) encrypt_history: Option<bool>,
    pub(crate) clear_history: Option<bool>,
}

impl RenderRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prop(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<PropValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Whether the scroll prop `name` has another page after the current one.
    pub fn has_more(mut self, name: impl Into<String>, more: bool) -> Self {
        self.has_more.insert(name.into(), more);
        self
    }

    /// Current page number for scroll props paginated by `page_name`.
    ///
    /// The caller reads it from the request's query string.
    pub fn current_page(mut self, page_name: impl Into<String>, page: u32) -> Self {
        self.current_pages.insert(page_name.into(), page);
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn url_override(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn encrypt_history(mut self, encrypt: bool) -> Self {
        self.encrypt_history = Some(encrypt);
        self
    }

    pub fn clear_history(mut self, clear: bool) -> Self {
        self.clear_history = Some(clear);
        self
    }

    pub fn history_overrides(&self) -> (Option<bool>, Option<bool>) {
        (self.encrypt_history, self.clear_history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_lazy_runs_only_on_evaluate() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let value = PropValue::lazy(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, BoxError>(vec![1, 2, 3])
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let resolved = value.evaluate().await.unwrap();
        assert_eq!(resolved, json!([1, 2, 3]));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_async_resolver_error_is_boxed() {
        let value = PropValue::resolve(|| async { Err::<u32, _>("backend down") });
        let err = value.evaluate().await.unwrap_err();
        assert_eq!(err.to_string(), "backend down");
    }

    #[test]
    fn test_dropping_resolver_does_not_call_it() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let value = PropValue::resolve(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, BoxError>("expensive") }
        });
        assert!(value.is_resolver());
        drop(value);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
