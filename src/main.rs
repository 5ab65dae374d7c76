//! WebSocket bridge demo server.
//!
//! Serves a JSON echo endpoint: every inbound JSON document is decoded,
//! handed to the application through the inbound queue, and written back
//! through the outbound queue.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────────┐
//!                 │                      SOCKET BRIDGE                        │
//!                 │                                                           │
//!   Client  ──────┼─▶ http server ─▶ transport::server ─▶ pump::inbound ─────┼─▶ application
//!   (WebSocket)   │   (axum, trace)   (upgrade, hooks,     (decode)          │   (endpoint)
//!           ◀─────┼──────────────────  queues, endpoint) ◀ pump::outbound ◀──┼── application
//!                 │                                         (encode)          │
//!                 │  ┌─────────────────────────────────────────────────────┐  │
//!                 │  │ config │ lifecycle (shutdown) │ observability │ net │  │
//!                 │  └─────────────────────────────────────────────────────┘  │
//!                 └──────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use serde_json::Value;
use tokio::net::TcpListener;

use socket_bridge::config::{load_config, BridgeConfig};
use socket_bridge::lifecycle::{wait_for_signal, Shutdown};
use socket_bridge::observability::{logging, metrics};
use socket_bridge::transport::{
    AppQueues, BoxError, JsonCodec, LogErrorSink, RequestContext, WebSocketServer,
};
use socket_bridge::HttpServer;

#[derive(Parser)]
#[command(name = "socket-bridge")]
#[command(about = "WebSocket bridge serving a JSON echo endpoint", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => BridgeConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability)?;

    tracing::info!("socket-bridge v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        path = %config.listener.path,
        queue_capacity = ?config.transport.queue_capacity,
        watchdog = config.transport.watchdog.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let transport = WebSocketServer::builder(echo, JsonCodec, JsonCodec, LogErrorSink)
        .close_handler(|ctx: &RequestContext, code: u16, reason: &str| -> Result<(), BoxError> {
            tracing::info!(
                connection_id = %ctx.connection_id(),
                code,
                reason,
                "Client closed connection"
            );
            Ok(())
        })
        .config(config.transport.clone())
        .build();

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, transport);
    let serving = server.run(listener, shutdown.subscribe());

    tokio::pin!(serving);
    tokio::select! {
        result = &mut serving => result?,
        _ = wait_for_signal(&shutdown) => serving.await?,
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Echo every request back until the client stops sending.
fn echo(ctx: &RequestContext, queues: AppQueues<Value, Value>) -> Result<(), BoxError> {
    let connection_id = ctx.connection_id();
    let AppQueues {
        mut requests,
        responses,
    } = queues;

    tokio::spawn(async move {
        while let Some(request) = requests.recv().await {
            if responses.send(request).await.is_err() {
                break;
            }
        }
        tracing::debug!(connection_id = %connection_id, "Echo finished");
    });
    Ok(())
}
