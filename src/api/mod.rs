//! HTTP API server for the vocal gateway

pub mod routes;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::session::SessionManager;
use crate::turn::Orchestrator;
use crate::Result;

/// Uploaded audio cap (voice clips, not albums)
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Shared state for API handlers
pub struct ApiState {
    /// Turn orchestrator over the configured providers
    pub orchestrator: Orchestrator,
    /// Live session manager
    pub sessions: Arc<SessionManager>,
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    /// Create an API server
    #[must_use]
    pub fn new(orchestrator: Orchestrator, sessions: Arc<SessionManager>, port: u16) -> Self {
        Self {
            state: Arc::new(ApiState {
                orchestrator,
                sessions,
            }),
            port,
        }
    }

    /// Build the router with all routes
    fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        routes::router(self.state.clone())
            .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if the server fails to bind or run.
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}
