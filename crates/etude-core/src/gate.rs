//! Per-resolver identity gate.
//!
//! A gate is attached to one resolver at registration time, either by hand:
//!
//! ```rust,ignore
//! let purge = require_identity("admin").wrap(Resolver::new("purge", purge));
//! ```
//!
//! or declaratively inside a `#[resolvers]` group:
//!
//! ```rust,ignore
//! #[resolvers]
//! impl UsersResolvers {
//!     #[require_identity("admin")]
//!     pub async fn get_users_by_name(&self, ctx: RequestContext) -> Result<Vec<User>, ResolverError> {
//!         // ...
//!     }
//! }
//! ```
//!
//! Comparison is exact: no case folding, no trimming, no wildcard, one
//! label per gate. A resolver without a gate is unrestricted.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ResolverError;
use crate::resolver::{RequestContext, Resolver, ResolverFn};

/// A wrapping transform requiring one exact identity label.
#[derive(Debug, Clone)]
pub struct IdentityGate {
    label: Arc<str>,
}

/// Build a gate that only admits callers presenting `label`.
pub fn require_identity(label: impl Into<String>) -> IdentityGate {
    IdentityGate {
        label: Arc::from(label.into()),
    }
}

/// Gate `resolver` on `label`. Shorthand for `require_identity(label).wrap(resolver)`.
pub fn wrap(resolver: Resolver, label: impl Into<String>) -> Resolver {
    require_identity(label).wrap(resolver)
}

impl IdentityGate {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Check a caller identity against the required label.
    #[inline]
    pub fn permits(&self, caller_identity: Option<&str>) -> bool {
        caller_identity == Some(&*self.label)
    }

    /// Wrap a resolver so its logic only runs for the required identity.
    pub fn wrap(&self, resolver: Resolver) -> Resolver {
        Resolver {
            name: resolver.name,
            callable: Arc::new(Gated {
                gate: self.clone(),
                inner: resolver.callable,
            }),
            requirement: Some(self.label.to_string()),
        }
    }
}

struct Gated {
    gate: IdentityGate,
    inner: Arc<dyn ResolverFn>,
}

#[async_trait]
impl ResolverFn for Gated {
    async fn call(&self, ctx: RequestContext) -> Result<Value, ResolverError> {
        if !self.gate.permits(ctx.caller_identity()) {
            return Err(ResolverError::Unauthenticated);
        }
        self.inner.call(ctx).await
    }
}
