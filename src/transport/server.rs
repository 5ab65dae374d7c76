//! Connection lifecycle manager.
//!
//! # Responsibilities
//! - Upgrade the HTTP request, reporting failures to the error sink
//! - Fold context hooks, then apply socket hooks, once per connection
//! - Allocate the connection's queues and open the endpoint
//! - Start the inbound and outbound pumps and return without waiting on them
//!
//! # Design Decisions
//! - Codec, hooks, close handler and sink are bound at build time and shared
//!   read-only by every connection
//! - Per-connection state (socket halves, queues, context) lives only in the
//!   two pump tasks, never on the server value

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ws::Message, ws::WebSocketUpgrade, FromRequestParts, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use futures_util::{Sink, Stream, StreamExt};
use tokio::task::JoinHandle;

use crate::config::schema::TransportConfig;
use crate::net::{ConnectionGuard, ConnectionTracker};
use crate::observability::metrics;
use crate::pump::{InboundExit, InboundPump, OutboundExit, OutboundPump};
use crate::transport::close::CloseHandler;
use crate::transport::codec::{Decoder, Encoder};
use crate::transport::context::RequestContext;
use crate::transport::endpoint::Endpoint;
use crate::transport::error::{BoxError, ErrorSink, TransportError};
use crate::transport::hooks::{ContextHook, HookChain, SocketHook};
use crate::transport::queue::queue_pair;
use crate::transport::socket::SocketSettings;

/// Handles to the two pump tasks of one connection.
pub struct Session {
    pub inbound: JoinHandle<Result<InboundExit, TransportError>>,
    pub outbound: JoinHandle<Result<OutboundExit, TransportError>>,
}

struct Shared<Req, Resp> {
    endpoint: Box<dyn Endpoint<Req, Resp>>,
    decoder: Arc<dyn Decoder<Req>>,
    encoder: Arc<dyn Encoder<Resp>>,
    context_hooks: HookChain<dyn ContextHook>,
    socket_hooks: HookChain<dyn SocketHook>,
    close_handler: Option<Arc<dyn CloseHandler>>,
    error_sink: Arc<dyn ErrorSink>,
    config: TransportConfig,
    tracker: ConnectionTracker,
}

/// Bridges upgraded WebSocket connections to per-connection application queues.
pub struct WebSocketServer<Req, Resp> {
    shared: Arc<Shared<Req, Resp>>,
}

impl<Req, Resp> Clone for WebSocketServer<Req, Resp> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Builder for [`WebSocketServer`]. Everything is fixed once `build` returns.
pub struct ServerBuilder<Req, Resp> {
    shared: Shared<Req, Resp>,
}

impl<Req, Resp> ServerBuilder<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    /// Append a context hook. Hooks run in the order they were added.
    pub fn before<H: ContextHook>(mut self, hook: H) -> Self {
        self.shared.context_hooks.push(Arc::new(hook));
        self
    }

    /// Append a socket hook. Hooks run in the order they were added.
    pub fn socket_config<H: SocketHook>(mut self, hook: H) -> Self {
        self.shared.socket_hooks.push(Arc::new(hook));
        self
    }

    /// Install a handler for peer-initiated close frames.
    pub fn close_handler<H: CloseHandler>(mut self, handler: H) -> Self {
        self.shared.close_handler = Some(Arc::new(handler));
        self
    }

    /// Replace the transport configuration (queue policy, watchdog, limits).
    pub fn config(mut self, config: TransportConfig) -> Self {
        self.shared.config = config;
        self
    }

    pub fn build(self) -> WebSocketServer<Req, Resp> {
        tracing::debug!(
            context_hooks = self.shared.context_hooks.len(),
            socket_hooks = self.shared.socket_hooks.len(),
            close_handler = self.shared.close_handler.is_some(),
            queue_capacity = ?self.shared.config.queue_capacity,
            "WebSocket server configured"
        );
        WebSocketServer {
            shared: Arc::new(self.shared),
        }
    }
}

impl<Req, Resp> WebSocketServer<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    /// Start building a server from its required collaborators.
    pub fn builder<P, D, E, S>(
        endpoint: P,
        decoder: D,
        encoder: E,
        error_sink: S,
    ) -> ServerBuilder<Req, Resp>
    where
        P: Endpoint<Req, Resp>,
        D: Decoder<Req>,
        E: Encoder<Resp>,
        S: ErrorSink,
    {
        ServerBuilder {
            shared: Shared {
                endpoint: Box::new(endpoint),
                decoder: Arc::new(decoder),
                encoder: Arc::new(encoder),
                context_hooks: HookChain::new(),
                socket_hooks: HookChain::new(),
                close_handler: None,
                error_sink: Arc::new(error_sink),
                config: TransportConfig::default(),
                tracker: ConnectionTracker::new(),
            },
        }
    }

    /// Live connection bookkeeping shared with the HTTP server.
    pub fn tracker(&self) -> &ConnectionTracker {
        &self.shared.tracker
    }

    pub fn active_connections(&self) -> u64 {
        self.shared.tracker.active_count()
    }

    /// Mount [`serve`](Self::serve) on `path`.
    pub fn router(self, path: &str) -> Router {
        Router::new()
            .route(path, any(upgrade_handler::<Req, Resp>))
            .with_state(self)
    }

    /// Upgrade `request` and start serving it.
    ///
    /// Returns as soon as the upgrade response is ready; the pumps start once
    /// the HTTP connection has switched protocols.
    pub async fn serve(&self, request: Request<Body>) -> Response {
        let (mut parts, _body) = request.into_parts();
        let initial = RequestContext::from_request(&parts);

        let upgrade = match WebSocketUpgrade::from_request_parts(&mut parts, &()).await {
            Ok(upgrade) => upgrade,
            Err(rejection) => {
                metrics::record_upgrade_failure();
                self.report(&initial, &TransportError::Upgrade(rejection.to_string()));
                return rejection.into_response();
            }
        };

        let ctx = self.shared.context_hooks.derive(initial, &parts);

        let mut settings = SocketSettings::from_config(&self.shared.config);
        self.shared.socket_hooks.apply(&ctx, &mut settings);

        tracing::debug!(
            connection_id = %ctx.connection_id(),
            request_id = %ctx.request_id(),
            remote_addr = ?ctx.remote_addr(),
            path = %ctx.path(),
            "Upgrading connection"
        );

        let server = self.clone();
        let failed = (Arc::clone(&self.shared.error_sink), ctx.clone());
        settings
            .apply(upgrade)
            .on_failed_upgrade(move |error: axum::Error| {
                let (sink, ctx) = failed;
                metrics::record_upgrade_failure();
                sink.handle(&ctx, &TransportError::Upgrade(error.to_string()));
            })
            .on_upgrade(move |socket| async move {
                let (write_half, read_half) = socket.split();
                // Setup failures were already reported to the error sink.
                let _ = server.start_session(read_half, write_half, ctx, &settings);
            })
    }

    /// Open the endpoint and spawn both pumps over an already-upgraded connection.
    ///
    /// `read_half` and `write_half` are the two independent halves of the
    /// connection; nothing else may read from or write to them afterwards.
    pub fn start_session<S, SE, K, KE>(
        &self,
        read_half: S,
        write_half: K,
        ctx: RequestContext,
        settings: &SocketSettings,
    ) -> Result<Session, TransportError>
    where
        S: Stream<Item = Result<Message, SE>> + Send + 'static,
        SE: Into<BoxError> + Send + 'static,
        K: Sink<Message, Error = KE> + Send + 'static,
        KE: Into<BoxError> + Send + 'static,
    {
        let shared = &self.shared;
        let (transport, app) = queue_pair(shared.config.queue_capacity);

        if let Err(source) = shared.endpoint.open(&ctx, app) {
            metrics::record_endpoint_failure();
            let error = TransportError::Endpoint(source);
            self.report(&ctx, &error);
            return Err(error);
        }
        let guard = Arc::new(shared.tracker.track(ctx.connection_id()));

        let inbound = InboundPump::new(
            ctx.clone(),
            transport.inbound,
            Arc::clone(&shared.decoder),
            shared.close_handler.clone(),
            settings.read_timeout,
        );
        let outbound = OutboundPump::new(
            ctx.clone(),
            transport.outbound,
            Arc::clone(&shared.encoder),
            settings.outbound_frame,
        );

        let inbound = {
            let server = self.clone();
            let ctx = ctx.clone();
            let guard = Arc::clone(&guard);
            tokio::spawn(async move {
                let exit = inbound.run(read_half).await;
                server.finish("inbound", &ctx, exit.as_ref().map(InboundExit::reason), guard);
                exit
            })
        };
        let outbound = {
            let server = self.clone();
            tokio::spawn(async move {
                let exit = outbound.run(write_half).await;
                server.finish("outbound", &ctx, exit.as_ref().map(OutboundExit::reason), guard);
                exit
            })
        };

        Ok(Session { inbound, outbound })
    }

    /// Log a pump exit, record it, and report errors the policy asks for.
    fn finish(
        &self,
        pump: &'static str,
        ctx: &RequestContext,
        exit: Result<&'static str, &TransportError>,
        _guard: Arc<ConnectionGuard>,
    ) {
        match exit {
            Ok(reason) => {
                metrics::record_pump_exit(pump, reason);
                tracing::debug!(
                    connection_id = %ctx.connection_id(),
                    pump,
                    reason,
                    "Pump stopped"
                );
            }
            Err(error) => {
                metrics::record_pump_exit(pump, error.kind());
                tracing::debug!(
                    connection_id = %ctx.connection_id(),
                    pump,
                    error = %error,
                    "Pump stopped on error"
                );
                let config = &self.shared.config;
                let wanted = (error.is_codec() && config.report_codec_errors)
                    || (error.is_io() && config.report_io_errors)
                    || matches!(error, TransportError::CloseHandler(_));
                if wanted {
                    self.report(ctx, error);
                }
            }
        }
    }

    fn report(&self, ctx: &RequestContext, error: &TransportError) {
        self.shared.error_sink.handle(ctx, error);
    }
}

async fn upgrade_handler<Req, Resp>(
    State(server): State<WebSocketServer<Req, Resp>>,
    request: Request<Body>,
) -> Response
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    server.serve(request).await
}
