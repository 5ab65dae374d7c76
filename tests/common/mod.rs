//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::StreamExt;
use socket_bridge::config::BridgeConfig;
use socket_bridge::lifecycle::Shutdown;
use socket_bridge::transport::{ErrorSink, RequestContext, TransportError, WebSocketServer};
use socket_bridge::HttpServer;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A bridge listening on an ephemeral local port.
pub struct Bridge {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl Bridge {
    pub fn url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

/// Serve `transport` at `/ws` on 127.0.0.1 with an OS-assigned port.
pub async fn start_bridge<Req, Resp>(transport: WebSocketServer<Req, Resp>) -> Bridge
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();

    let server = HttpServer::new(BridgeConfig::default(), transport);
    let signal = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, signal).await.unwrap();
    });

    Bridge { addr, shutdown }
}

pub async fn connect(bridge: &Bridge) -> Client {
    let (client, _) = connect_async(bridge.url()).await.unwrap();
    client
}

/// Connect with an `x-request-id` header set.
pub async fn connect_with_request_id(bridge: &Bridge, request_id: &str) -> Client {
    let mut request = bridge.url().into_client_request().unwrap();
    request
        .headers_mut()
        .insert("x-request-id", request_id.parse().unwrap());
    let (client, _) = connect_async(request).await.unwrap();
    client
}

/// Next frame from the server, failing the test after two seconds.
pub async fn next_frame(client: &mut Client) -> Option<Message> {
    tokio::time::timeout(Duration::from_secs(2), client.next())
        .await
        .expect("timed out waiting for a frame")
        .map(|frame| frame.unwrap())
}

/// An error sink that records the kind of every reported error.
pub fn recording_sink() -> (impl ErrorSink, Arc<Mutex<Vec<&'static str>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let sink = move |_: &RequestContext, error: &TransportError| {
        log.lock().unwrap().push(error.kind());
    };
    (sink, seen)
}

/// Poll `condition` until it holds, failing the test after two seconds.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within two seconds"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
