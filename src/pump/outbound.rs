//! Outbound pump: outbound queue → encoder → connection write half.
//!
//! # States
//! ```text
//! WAIT ──value──▶ ENCODE ──ok──▶ SEND ──▶ WAIT
//!   │                │             │
//!   │ queue closed   │ encode err  │ write err
//!   ▼                ▼             ▼
//! close frame      exit          exit
//!   │
//!   ├─ written ──────▶ exit (closed)
//!   └─ write failed ─▶ exit (peer closed first)
//! ```
//!
//! # Design Decisions
//! - The only writer on the connection; frames go out in enqueue order
//! - Closing the queue is the sole trigger for a close frame from this side
//! - Nothing is written after the close frame
//! - A close frame that cannot be written means the peer already closed; that
//!   is an orderly exit, unlike a failed data frame

use std::pin::pin;
use std::sync::Arc;

use axum::extract::ws::{close_code, CloseFrame, Message, Utf8Bytes};
use futures_util::{Sink, SinkExt};

use crate::observability::metrics;
use crate::transport::codec::{Encoder, FrameKind};
use crate::transport::context::RequestContext;
use crate::transport::error::{BoxError, TransportError};
use crate::transport::queue::OutboundReceiver;

/// Orderly reasons for the outbound pump to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundExit {
    /// The application closed the queue and the close frame was written.
    Closed,
    /// The application closed the queue after the connection was already closed.
    PeerClosed,
}

impl OutboundExit {
    pub fn reason(&self) -> &'static str {
        match self {
            OutboundExit::Closed => "closed",
            OutboundExit::PeerClosed => "peer_closed",
        }
    }
}

/// Moves responses from the outbound queue onto the connection.
pub struct OutboundPump<Resp> {
    ctx: RequestContext,
    queue: OutboundReceiver<Resp>,
    encoder: Arc<dyn Encoder<Resp>>,
    frame_kind: FrameKind,
}

impl<Resp: Send + 'static> OutboundPump<Resp> {
    pub fn new(
        ctx: RequestContext,
        queue: OutboundReceiver<Resp>,
        encoder: Arc<dyn Encoder<Resp>>,
        frame_kind: FrameKind,
    ) -> Self {
        Self {
            ctx,
            queue,
            encoder,
            frame_kind,
        }
    }

    /// Run until the queue closes, the encoder fails or a write fails.
    pub async fn run<K, E>(mut self, sink: K) -> Result<OutboundExit, TransportError>
    where
        K: Sink<Message, Error = E>,
        E: Into<BoxError>,
    {
        let mut sink = pin!(sink);

        while let Some(response) = self.queue.recv().await {
            let payload = self
                .encoder
                .encode(&self.ctx, response)
                .map_err(TransportError::Encode)?;
            let frame = self
                .frame_kind
                .to_message(payload)
                .map_err(TransportError::Encode)?;

            sink.send(frame)
                .await
                .map_err(|e| TransportError::Write(e.into()))?;
            metrics::record_frame_sent();
        }

        tracing::debug!(
            connection_id = %self.ctx.connection_id(),
            "Outbound queue closed, sending close frame"
        );
        let close = Message::Close(Some(CloseFrame {
            code: close_code::NORMAL,
            reason: Utf8Bytes::from_static(""),
        }));
        match sink.send(close).await {
            Ok(()) => Ok(OutboundExit::Closed),
            Err(e) => {
                let error: BoxError = e.into();
                tracing::debug!(
                    connection_id = %self.ctx.connection_id(),
                    error = %error,
                    "Close frame not written, connection already closed"
                );
                Ok(OutboundExit::PeerClosed)
            }
        }
    }
}
