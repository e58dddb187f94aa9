//! Typed client for calling resolvers over HTTP.
//!
//! ```rust,ignore
//! let client = ResolverClient::new("http://127.0.0.1:3000/api").with_identity("admin");
//! let users: Vec<User> = client.call("getUsersByName", &json!({"name": "Anatoly"})).await?;
//! ```

use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Failure of a resolver call. Any non-2xx status is a failure.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("resolver call failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Status code of a non-2xx response, if that is what failed.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolverClient {
    inner: reqwest::Client,
    base_url: String,
    identity: Option<String>,
}

impl ResolverClient {
    /// `base_url` is the mount point, e.g. `http://host:3000/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        ResolverClient {
            inner: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            identity: None,
        }
    }

    /// Send `identity` as the `Authorization` header on every call.
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn endpoint(&self, resolver: &str) -> String {
        format!("{}/{}", self.base_url, resolver)
    }

    /// POST `args` as JSON to `resolver` and decode the JSON result.
    pub async fn call<A, R>(&self, resolver: &str, args: &A) -> Result<R, ClientError>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut request = self.inner.post(self.endpoint(resolver)).json(args);
        if let Some(identity) = &self.identity {
            request = request.header(AUTHORIZATION, identity);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let client = ResolverClient::new("http://localhost:3000/api/");
        assert_eq!(client.base_url(), "http://localhost:3000/api");
        assert_eq!(
            client.endpoint("getUsersByName"),
            "http://localhost:3000/api/getUsersByName"
        );
    }

    #[test]
    fn test_identity_is_optional() {
        let client = ResolverClient::new("http://localhost/api");
        assert!(client.identity().is_none());
        assert_eq!(client.with_identity("admin").identity(), Some("admin"));
    }
}
