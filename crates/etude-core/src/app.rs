use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::discovery::Discovery;
use crate::dispatch::{self, Dispatcher};
use crate::registry::HandlerRegistry;

/// Shared state available to the resolver endpoint.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub config: Arc<Config>,
}

/// The main Etude application.
///
/// Owns the configuration and the registry. The registry is complete before
/// an `App` exists, and is read-only from then on.
pub struct App {
    pub config: Config,
    registry: Arc<HandlerRegistry>,
}

impl App {
    /// Load config from the environment and discover the linked resolver units.
    pub async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::from_env()?;
        Self::with_config(config).await
    }

    /// Discover resolvers under `config.resolvers_dir` from the linked units.
    ///
    /// Discovery failures (duplicate names, unlinked units, a missing root)
    /// are returned as errors; nothing is served.
    pub async fn with_config(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        let registry = Discovery::linked(&config.resolvers_dir).discover().await?;

        // `--list-resolvers` prints the registry and exits
        Self::handle_cli_args(&registry);

        Ok(Self::with_registry(config, registry))
    }

    /// Build an application around an already populated registry.
    pub fn with_registry(config: Config, registry: HandlerRegistry) -> Self {
        App {
            config,
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    fn handle_cli_args(registry: &HandlerRegistry) {
        if !std::env::args().any(|arg| arg == "--list-resolvers") {
            return;
        }

        print!("{}", list_resolvers(registry));
        std::process::exit(0);
    }

    /// Build the Axum router serving the resolver endpoint.
    pub fn router(&self) -> Router {
        let config = Arc::new(self.config.clone());
        let dispatcher =
            Dispatcher::new(self.registry.clone()).with_timeout(self.config.resolver_timeout());

        let state = AppState {
            dispatcher,
            config: config.clone(),
        };

        let mut router = dispatch::routes(&self.config.api_prefix)
            .with_state(state)
            .layer(CorsLayer::permissive());

        // Only add tracing/request-id middleware in development mode.
        // Layers wrap outward: the id is set before propagation sees the response.
        if self.config.is_dev() {
            use tower_http::trace::DefaultMakeSpan;
            use tower_http::trace::DefaultOnRequest;
            use tower_http::trace::DefaultOnResponse;
            use tower_http::LatencyUnit;

            let x_request_id = axum::http::HeaderName::from_static("x-request-id");
            router = router
                .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
                .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
                        .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                        .on_response(
                            DefaultOnResponse::new()
                                .level(tracing::Level::INFO)
                                .latency_unit(LatencyUnit::Millis),
                        ),
                );
        }

        router
    }

    /// Run the application server until Ctrl-C.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = self.config.server_addr();
        let router = self.router();

        println!("\n🎼 Etude server is running!");
        println!("   → Endpoint:  POST http://{}{}/<resolver>", addr, self.config.api_prefix);
        println!("   → Resolvers: {}", self.registry.len());
        println!();

        tracing::info!(
            "Etude server running on http://{} ({} resolvers)",
            addr,
            self.registry.len()
        );

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

/// One line per resolver, sorted by name, with its identity requirement.
pub fn list_resolvers(registry: &HandlerRegistry) -> String {
    let mut out = String::new();
    for name in registry.names() {
        let gate = registry
            .lookup(name)
            .ok()
            .and_then(|r| r.requirement())
            .map(|label| format!("requires `{}`", label))
            .unwrap_or_else(|| "open".to_string());
        out.push_str(&format!("{:<32} {}\n", name, gate));
    }
    out
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down Etude server...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolverError;
    use crate::gate::require_identity;
    use crate::resolver::{RequestContext, Resolver};

    fn resolver(name: &str) -> Resolver {
        Resolver::new(name, |_ctx: RequestContext| async { Ok::<_, ResolverError>(()) })
    }

    #[test]
    fn test_list_resolvers_shows_requirements() {
        let mut registry = HandlerRegistry::new();
        registry.register(resolver("ping")).unwrap();
        registry
            .register(require_identity("admin").wrap(resolver("getUsersByName")))
            .unwrap();

        let listing = list_resolvers(&registry);
        let lines: Vec<&str> = listing.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("getUsersByName "));
        assert!(lines[0].ends_with("requires `admin`"));
        assert!(lines[1].starts_with("ping "));
        assert!(lines[1].ends_with("open"));
    }

    #[test]
    fn test_list_resolvers_empty_registry() {
        assert_eq!(list_resolvers(&HandlerRegistry::new()), "");
    }
}
