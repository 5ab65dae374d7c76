//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the WebSocket route mounted at the configured path
//! - Wire up middleware (tracing)
//! - Bind server to listener with peer addresses available to the request context
//! - Stop accepting on shutdown, then give open connections a grace period

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::BridgeConfig;
use crate::net::ConnectionTracker;
use crate::transport::WebSocketServer;

/// HTTP server hosting one WebSocket bridge.
pub struct HttpServer {
    router: Router,
    config: BridgeConfig,
    tracker: ConnectionTracker,
}

impl HttpServer {
    /// Create a new HTTP server serving `transport` at `listener.path`.
    pub fn new<Req, Resp>(config: BridgeConfig, transport: WebSocketServer<Req, Resp>) -> Self
    where
        Req: Send + 'static,
        Resp: Send + 'static,
    {
        let tracker = transport.tracker().clone();
        let router = Self::build_router(&config, transport);
        Self {
            router,
            config,
            tracker,
        }
    }

    fn build_router<Req, Resp>(
        config: &BridgeConfig,
        transport: WebSocketServer<Req, Resp>,
    ) -> Router
    where
        Req: Send + 'static,
        Resp: Send + 'static,
    {
        transport
            .router(&config.listener.path)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until `shutdown` fires, then wait for connections to drain.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            path = %self.config.listener.path,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        let grace = Duration::from_secs(self.config.listener.shutdown_grace_secs);
        let active = self.tracker.active_count();
        if active > 0 {
            tracing::info!(active, grace = ?grace, "Waiting for connections to drain");
            if !self.tracker.wait_for_drain(grace).await {
                tracing::warn!(
                    remaining = self.tracker.active_count(),
                    "Grace period elapsed with connections still open"
                );
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
