//! Web layer module
//!
//! HTTP host for the placeholder service. Handlers stay thin and delegate to
//! [`PlaceholderService`]; a renderer that failed to initialize is reported
//! per request instead of taking the process down.
//!
//! # Routes
//!
//! - `GET /placeholder-{width}x{height}.svg`: rendered placeholder
//! - `GET /health`: service status and cache counters

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::WebConfig;
use crate::services::PlaceholderService;

pub mod handlers;

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    placeholder: Option<PlaceholderService>,
    startup_error: Option<Arc<str>>,
}

impl AppState {
    pub fn ready(service: PlaceholderService) -> Self {
        Self {
            placeholder: Some(service),
            startup_error: None,
        }
    }

    /// State for a host whose renderer could not be built
    pub fn unavailable(reason: impl Into<Arc<str>>) -> Self {
        Self {
            placeholder: None,
            startup_error: Some(reason.into()),
        }
    }

    pub fn placeholder(&self) -> Option<&PlaceholderService> {
        self.placeholder.as_ref()
    }

    pub fn startup_error(&self) -> Option<&str> {
        self.startup_error.as_deref()
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/{file}", get(handlers::placeholder::serve_placeholder))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(config: &WebConfig, state: AppState) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.host, config.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;
        Ok(Self {
            app: router(state),
            addr,
        })
    }

    /// Start the web server and run until SIGINT/SIGTERM
    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr)
            .await
            .with_context(|| format!("failed to bind to {}", self.addr))?;
        info!("Web server listening on http://{}", self.addr);

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("Web server stopped");
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT (Ctrl+C), shutting down gracefully"),
        _ = terminate => info!("Received SIGTERM, shutting down gracefully"),
    }
}
