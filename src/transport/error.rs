//! Transport error taxonomy and the injected error sink.

use std::time::Duration;

use thiserror::Error;

use crate::transport::codec::CodecError;
use crate::transport::context::RequestContext;

/// Boxed error for collaborator failures (endpoint, close handler, I/O).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while serving one connection.
///
/// Every variant is terminal for the affected pump or setup step, never for
/// the serving process. Nothing here is retried.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP request could not be upgraded to a WebSocket.
    #[error("upgrade failed: {0}")]
    Upgrade(String),

    /// The endpoint refused to open queues for the connection.
    #[error("endpoint failed: {0}")]
    Endpoint(#[source] BoxError),

    /// An inbound frame could not be decoded.
    #[error("decode failed: {0}")]
    Decode(#[source] CodecError),

    /// An outbound value could not be encoded.
    #[error("encode failed: {0}")]
    Encode(#[source] CodecError),

    /// Reading a frame from the connection failed.
    #[error("connection read failed: {0}")]
    Read(#[source] BoxError),

    /// Writing a frame to the connection failed.
    #[error("connection write failed: {0}")]
    Write(#[source] BoxError),

    /// The watchdog read deadline elapsed.
    #[error("no frame received within {0:?}")]
    ReadTimeout(Duration),

    /// A custom close handler returned an error.
    #[error("close handler failed: {0}")]
    CloseHandler(#[source] BoxError),
}

impl TransportError {
    /// Short, static label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::Upgrade(_) => "upgrade",
            TransportError::Endpoint(_) => "endpoint",
            TransportError::Decode(_) => "decode",
            TransportError::Encode(_) => "encode",
            TransportError::Read(_) => "read",
            TransportError::Write(_) => "write",
            TransportError::ReadTimeout(_) => "read_timeout",
            TransportError::CloseHandler(_) => "close_handler",
        }
    }

    pub fn is_codec(&self) -> bool {
        matches!(self, TransportError::Decode(_) | TransportError::Encode(_))
    }

    pub fn is_io(&self) -> bool {
        matches!(
            self,
            TransportError::Read(_) | TransportError::Write(_) | TransportError::ReadTimeout(_)
        )
    }
}

/// Destination for transport errors. Required at construction; there is no
/// silent default.
pub trait ErrorSink: Send + Sync + 'static {
    fn handle(&self, ctx: &RequestContext, error: &TransportError);
}

impl<F> ErrorSink for F
where
    F: Fn(&RequestContext, &TransportError) + Send + Sync + 'static,
{
    fn handle(&self, ctx: &RequestContext, error: &TransportError) {
        self(ctx, error)
    }
}

/// Error sink that writes every error to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogErrorSink;

impl ErrorSink for LogErrorSink {
    fn handle(&self, ctx: &RequestContext, error: &TransportError) {
        tracing::error!(
            connection_id = %ctx.connection_id(),
            request_id = %ctx.request_id(),
            kind = error.kind(),
            error = %error,
            "WebSocket transport error"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_error_display() {
        let err = TransportError::ReadTimeout(Duration::from_secs(10));
        assert_eq!(err.to_string(), "no frame received within 10s");

        let err = TransportError::Decode(CodecError::InvalidUtf8);
        assert_eq!(err.to_string(), "decode failed: frame is not valid UTF-8");
    }

    #[test]
    fn classification() {
        assert!(TransportError::Encode(CodecError::InvalidUtf8).is_codec());
        assert!(TransportError::Read("reset".into()).is_io());
        assert!(!TransportError::Upgrade("no".into()).is_io());
        assert_eq!(TransportError::Write("eof".into()).kind(), "write");
    }

    #[test]
    fn closure_sink_receives_errors() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let sink = move |ctx: &RequestContext, err: &TransportError| {
            log.lock().unwrap().push((ctx.request_id().to_string(), err.kind()));
        };

        sink.handle(&RequestContext::new("r9"), &TransportError::Upgrade("bad".into()));
        assert_eq!(*seen.lock().unwrap(), vec![("r9".to_string(), "upgrade")]);
    }
}
