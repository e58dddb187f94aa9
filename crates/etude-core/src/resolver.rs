//! Resolvers and the context they are invoked with.
//!
//! A [`Resolver`] is a named, invocable unit of application logic. It is
//! called with a [`RequestContext`] carrying the request body and the
//! caller-supplied identity, and resolves to a JSON value.
//!
//! ```rust,ignore
//! use etude_core::prelude::*;
//!
//! let ping = Resolver::new("ping", |_ctx: RequestContext| async {
//!     Ok::<_, ResolverError>("pong")
//! });
//! ```

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ResolverError;

/// Per-request input handed to a resolver.
///
/// Owned by the dispatch call for its duration and moved into the resolver;
/// the core never stores it.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    body: Value,
    caller_identity: Option<String>,
}

impl RequestContext {
    pub fn new(body: Value, caller_identity: Option<String>) -> Self {
        Self {
            body,
            caller_identity,
        }
    }

    /// The raw request payload.
    #[inline]
    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn into_body(self) -> Value {
        self.body
    }

    /// The unverified identity label from the `Authorization` header.
    #[inline]
    pub fn caller_identity(&self) -> Option<&str> {
        self.caller_identity.as_deref()
    }

    /// Deserialize the body into a resolver-defined shape.
    ///
    /// A mismatch is a resolver failure, not a validation response: it
    /// surfaces to the caller as a generic server error.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ResolverError> {
        T::deserialize(&self.body).map_err(ResolverError::Payload)
    }
}

/// Trait for resolver callables.
#[async_trait]
pub trait ResolverFn: Send + Sync + 'static {
    async fn call(&self, ctx: RequestContext) -> Result<Value, ResolverError>;
}

/// Adapts an async function returning any serializable value.
struct FnResolver<F, Fut, T, E> {
    f: F,
    _phantom: PhantomData<fn() -> (Fut, T, E)>,
}

#[async_trait]
impl<F, Fut, T, E> ResolverFn for FnResolver<F, Fut, T, E>
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Serialize + Send + 'static,
    E: Into<ResolverError> + Send + 'static,
{
    async fn call(&self, ctx: RequestContext) -> Result<Value, ResolverError> {
        let output = (self.f)(ctx).await.map_err(Into::into)?;
        serde_json::to_value(output).map_err(ResolverError::Payload)
    }
}

/// A named resolver, as stored in the registry.
///
/// Cloning is cheap: the callable is shared.
#[derive(Clone)]
pub struct Resolver {
    pub(crate) name: String,
    pub(crate) callable: Arc<dyn ResolverFn>,
    pub(crate) requirement: Option<String>,
}

impl Resolver {
    /// Create an unrestricted resolver from an async function.
    pub fn new<F, Fut, T, E>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Serialize + Send + 'static,
        E: Into<ResolverError> + Send + 'static,
    {
        Self::from_callable(
            name,
            Arc::new(FnResolver {
                f,
                _phantom: PhantomData,
            }),
        )
    }

    /// Create an unrestricted resolver from an existing callable.
    pub fn from_callable(name: impl Into<String>, callable: Arc<dyn ResolverFn>) -> Self {
        Self {
            name: name.into(),
            callable,
            requirement: None,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The identity label this resolver is gated on, if any.
    #[inline]
    pub fn requirement(&self) -> Option<&str> {
        self.requirement.as_deref()
    }

    /// Whether both resolvers share the same underlying callable.
    pub fn same_callable(&self, other: &Resolver) -> bool {
        Arc::ptr_eq(&self.callable, &other.callable)
    }

    /// Invoke the resolver, passing through its gate if it has one.
    pub async fn invoke(&self, ctx: RequestContext) -> Result<Value, ResolverError> {
        self.callable.call(ctx).await
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("name", &self.name)
            .field("requirement", &self.requirement)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct ByName {
        name: String,
    }

    #[test]
    fn test_context_accessors() {
        let ctx = RequestContext::new(json!({"name": "Anatoly"}), Some("admin".into()));
        assert_eq!(ctx.caller_identity(), Some("admin"));
        assert_eq!(ctx.body()["name"], "Anatoly");

        let parsed: ByName = ctx.parse().unwrap();
        assert_eq!(parsed.name, "Anatoly");
    }

    #[test]
    fn test_parse_mismatch_is_payload_error() {
        let ctx = RequestContext::new(json!({"name": 7}), None);
        let err = ctx.parse::<ByName>().unwrap_err();
        assert!(matches!(err, ResolverError::Payload(_)));
    }

    #[tokio::test]
    async fn test_invoke_serializes_output() {
        let resolver = Resolver::new("echo", |ctx: RequestContext| async move {
            Ok::<_, ResolverError>(ctx.into_body())
        });

        let out = resolver
            .invoke(RequestContext::new(json!([1, 2, 3]), None))
            .await
            .unwrap();
        assert_eq!(out, json!([1, 2, 3]));
        assert_eq!(resolver.name(), "echo");
        assert!(resolver.requirement().is_none());
    }

    #[tokio::test]
    async fn test_invoke_propagates_failure() {
        let resolver = Resolver::new("boom", |_ctx: RequestContext| async {
            Err::<(), _>(ResolverError::internal("boom"))
        });

        let err = resolver.invoke(RequestContext::default()).await.unwrap_err();
        assert!(matches!(err, ResolverError::Internal(_)));
    }

    #[test]
    fn test_clone_shares_callable() {
        let a = Resolver::new("a", |_ctx: RequestContext| async { Ok::<_, ResolverError>(1) });
        let b = Resolver::new("a", |_ctx: RequestContext| async { Ok::<_, ResolverError>(1) });
        assert!(a.same_callable(&a.clone()));
        assert!(!a.same_callable(&b));
    }
}
