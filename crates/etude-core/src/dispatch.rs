//! The single RPC endpoint.
//!
//! `POST {prefix}/{name}` looks `name` up in the registry and invokes it
//! with the JSON body and the raw `Authorization` header:
//!
//! | Outcome | Status | Body |
//! |---|---|---|
//! | resolver returned | 200 | JSON value |
//! | gate rejected caller | 401 | `Unauthenticated` |
//! | body is not JSON | 400 | `Bad request` |
//! | anything else | 500 | `Server error` |
//!
//! Unknown names are a 500 by default; `UNKNOWN_RESOLVER_NOT_FOUND=true`
//! turns them into 404 `Not found`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Map, Value};

use crate::app::AppState;
use crate::error::ResolverError;
use crate::registry::HandlerRegistry;
use crate::resolver::RequestContext;

/// Strip the leading path separator; the rest is the literal resolver name.
#[inline]
pub fn resolver_name(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

/// Looks up and invokes resolvers against a frozen registry.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self {
            registry,
            timeout: None,
        }
    }

    /// Bound every invocation. `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve `path` to a resolver and invoke it.
    pub async fn dispatch(
        &self,
        path: &str,
        body: Value,
        authorization: Option<String>,
    ) -> Result<Value, ResolverError> {
        let name = resolver_name(path);
        let resolver = self.registry.lookup(name)?;
        let ctx = RequestContext::new(body, authorization);

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, resolver.invoke(ctx))
                .await
                .map_err(|_| ResolverError::Timeout(name.to_string()))?,
            None => resolver.invoke(ctx).await,
        }
    }
}

/// Routes for the resolver endpoint mounted under `prefix`.
pub fn routes(prefix: &str) -> Router<AppState> {
    let path = format!("{}/{{*resolver}}", prefix.trim_end_matches('/'));
    Router::new().route(&path, post(resolve))
}

/// An empty body is an empty object; anything else must be JSON.
fn parse_body(body: &[u8]) -> Result<Value, ResolverError> {
    if body.is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(body).map_err(|e| ResolverError::BadRequest(e.to_string()))
}

fn caller_identity(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

async fn resolve(
    State(state): State<AppState>,
    Path(resolver): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let payload = match parse_body(&body) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::debug!(resolver = %resolver, error = %err, "rejected request body");
            return err.into_response();
        }
    };

    match state
        .dispatcher
        .dispatch(&resolver, payload, caller_identity(&headers))
        .await
    {
        Ok(value) => Json(value).into_response(),
        Err(ResolverError::Unauthenticated) => {
            tracing::warn!(resolver = %resolver, "caller identity rejected");
            ResolverError::Unauthenticated.into_response()
        }
        Err(ResolverError::UnknownResolver(name)) if state.config.unknown_resolver_not_found => {
            tracing::debug!(resolver = %name, "unknown resolver");
            (StatusCode::NOT_FOUND, "Not found").into_response()
        }
        Err(err) => {
            tracing::error!(resolver = %resolver, code = err.error_code(), error = %err, "resolver failed");
            err.into_response()
        }
    }
}
