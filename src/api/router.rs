//! API router configuration.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    api_info, delete_package, delete_value, get_package, get_value, health, list_containers,
    put_value, sweep_containers, AppState,
};

/// Create the API router with a default in-memory state.
pub fn create_router() -> Router {
    create_router_with_state(AppState::new())
}

/// Create the API router with custom state.
pub fn create_router_with_state(state: AppState) -> Router {
    // Session data routes
    let session_routes = Router::new()
        .route("/{namespace}", get(get_package).delete(delete_package))
        .route(
            "/{namespace}/{key}",
            get(get_value).put(put_value).delete(delete_value),
        );

    // Admin routes
    let container_routes = Router::new()
        .route("/", get(list_containers))
        .route("/sweep", post(sweep_containers));

    // API v1 routes
    let api_v1 = Router::new()
        .route("/", get(api_info))
        .nest("/sessions", session_routes)
        .nest("/containers", container_routes);

    // Build main router
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_v1)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Stop accepting connections on Ctrl-C and drain in-flight requests.
    pub graceful_shutdown: bool,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            graceful_shutdown: true,
        }
    }

    pub fn without_graceful_shutdown(mut self) -> Self {
        self.graceful_shutdown = false;
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("127.0.0.1", 3000)
    }
}

/// Start the API server with custom state.
///
/// Returns once the server stops; with graceful shutdown enabled that is
/// after Ctrl-C.
pub async fn serve_with_state(config: ServerConfig, state: AppState) -> std::io::Result<()> {
    let addr = config.bind_address();
    let router = create_router_with_state(state);

    tracing::info!("Starting session-keeper API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    if config.graceful_shutdown {
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    } else {
        axum::serve(listener, router).await
    }
}

/// Start the API server with a default in-memory state.
pub async fn serve(config: ServerConfig) -> std::io::Result<()> {
    serve_with_state(config, AppState::new()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
