//! Request-scoped context threaded through the hook chain.

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{request::Parts, Extensions};
use uuid::Uuid;

use crate::net::ConnectionId;

/// Header carrying a caller-supplied request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Immutable metadata for one connection.
///
/// Built from the upgrade request head, then refined by context hooks. Each
/// hook consumes a context and returns the next one; nothing mutates a context
/// once the pumps hold it.
#[derive(Debug, Clone)]
pub struct RequestContext {
    connection_id: ConnectionId,
    request_id: String,
    remote_addr: Option<SocketAddr>,
    path: String,
    extensions: Extensions,
}

impl RequestContext {
    /// Create a context that is not tied to an HTTP request.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            connection_id: ConnectionId::new(),
            request_id: request_id.into(),
            remote_addr: None,
            path: "/".to_string(),
            extensions: Extensions::new(),
        }
    }

    /// Build the initial context for an upgrade request.
    ///
    /// Reuses `x-request-id` when the client sent one, otherwise generates a UUID v4.
    pub fn from_request(parts: &Parts) -> Self {
        let request_id = parts
            .headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let remote_addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Self {
            connection_id: ConnectionId::new(),
            request_id,
            remote_addr,
            path: parts.uri.path().to_string(),
            extensions: Extensions::new(),
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Return a context carrying `value`, replacing any previous value of the same type.
    pub fn with<T>(mut self, value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.extensions.insert(value);
        self
    }

    /// Look up a value attached by a context hook.
    pub fn get<T>(&self) -> Option<&T>
    where
        T: Send + Sync + 'static,
    {
        self.extensions.get::<T>()
    }
}
