use reqwest::header::HeaderMap;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::client::ResolverClient;
use crate::config::Config;
use crate::registry::HandlerRegistry;

/// A test application for integration testing.
///
/// Serves the resolver endpoint for a hand-built registry on an ephemeral
/// port, skipping discovery.
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_ping() {
///     let mut registry = HandlerRegistry::new();
///     registry.register(Resolver::new("ping", |_ctx: RequestContext| async {
///         Ok::<_, ResolverError>("pong")
///     })).unwrap();
///
///     let app = TestApp::new(registry).await;
///     let res = app.client.post(&app.url("/api/ping"), "{}").await;
///     assert_eq!(res.status, 200);
/// }
/// ```
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: TestClient,
    pub config: Config,
}

impl TestApp {
    /// Serve `registry` with the default test config.
    pub async fn new(registry: HandlerRegistry) -> Self {
        Self::with_config(Self::test_config(), registry).await
    }

    /// Config used by [`TestApp::new`]: test environment, OS-assigned port.
    pub fn test_config() -> Config {
        Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            environment: "test".to_string(),
            ..Config::default()
        }
    }

    /// Serve `registry` with a custom config.
    pub async fn with_config(config: Config, registry: HandlerRegistry) -> Self {
        let app = crate::App::with_registry(config, registry);

        let router = app.router();
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().expect("Failed to get local addr");

        // Spawn the server in the background
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("test server stopped: {}", e);
            }
        });

        TestApp {
            addr,
            client: TestClient::new(),
            config: app.config,
        }
    }

    /// Get the full URL for a path on the test server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// URL of a resolver under the configured prefix.
    pub fn resolver_url(&self, name: &str) -> String {
        self.url(&format!("{}/{}", self.config.api_prefix.trim_end_matches('/'), name))
    }

    /// A typed client pointed at this server's mount prefix.
    pub fn resolver_client(&self) -> ResolverClient {
        ResolverClient::new(self.url(&self.config.api_prefix))
    }
}

/// A simple HTTP test client with helper methods.
#[derive(Clone, Default)]
pub struct TestClient {
    inner: reqwest::Client,
}

impl TestClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send a GET request.
    pub async fn get(&self, url: &str) -> TestResponse {
        let res = self
            .inner
            .get(url)
            .send()
            .await
            .expect("GET request failed");
        TestResponse::from_response(res).await
    }

    /// Send a POST request with a JSON body and no identity.
    pub async fn post(&self, url: &str, body: &str) -> TestResponse {
        let res = self
            .inner
            .post(url)
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("POST request failed");
        TestResponse::from_response(res).await
    }

    /// Send a POST request with a JSON body, presenting `identity` verbatim.
    pub async fn post_as(&self, url: &str, identity: &str, body: &str) -> TestResponse {
        let res = self
            .inner
            .post(url)
            .header("Content-Type", "application/json")
            .header("Authorization", identity)
            .body(body.to_string())
            .send()
            .await
            .expect("POST request failed");
        TestResponse::from_response(res).await
    }
}

/// A simplified HTTP response for test assertions.
#[derive(Debug)]
pub struct TestResponse {
    pub status: u16,
    pub body: String,
    pub headers: HeaderMap,
}

impl TestResponse {
    async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let body = res.text().await.unwrap_or_default();
        TestResponse {
            status,
            body,
            headers,
        }
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("Failed to parse response as JSON")
    }

    /// The `Content-Type` header, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }
}
