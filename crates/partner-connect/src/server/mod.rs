//! HTTP server for the partner application.
//!
//! Exposes the OAuth flow endpoints (`/login`, `/callback`, `/logout`), the
//! session probe, and the authenticated downstream API call. All request
//! state lives in [`AppState`]; the session store is behind a trait so the
//! backend can change without touching handler logic.

pub mod handlers;
pub mod session;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::client::ProviderClient;
use crate::config::Config;
use session::{MemorySessionStore, SessionStore};

/// Shared state for HTTP handlers.
pub struct AppState {
    /// Application configuration.
    pub config: Config,

    /// Client for the provider's token endpoint and the resource API.
    pub provider: ProviderClient,

    /// Session store, keyed by the id carried in the session cookie.
    pub sessions: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").field("config", &self.config).finish()
    }
}

/// Create the application router with an in-memory session store.
///
/// # Errors
///
/// Returns error if HTTP client initialization fails.
pub fn create_router(config: Config) -> anyhow::Result<Router> {
    let provider = ProviderClient::new(&config)?;

    let sessions = Arc::new(MemorySessionStore::new(config.session_ttl));
    Arc::clone(&sessions).start_cleanup_task();

    let state = Arc::new(AppState { config, provider, sessions });

    Ok(Router::new()
        .route("/", get(handlers::landing))
        .route("/health", get(handlers::health_check))
        .route("/login", get(handlers::login))
        .route("/callback", get(handlers::callback))
        .route("/api/auth-status", get(handlers::auth_status))
        .route("/api/test-connection", get(handlers::test_connection))
        .route("/logout", get(handlers::logout))
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Run the HTTP server until ctrl-c.
///
/// # Errors
///
/// Returns error on bind or server failure.
pub async fn serve(config: Config, port: u16) -> anyhow::Result<()> {
    let router = create_router(config)?;
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!("HTTP server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("HTTP server shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.expect("Failed to install CTRL+C handler");
    tracing::info!("Received shutdown signal");
}
