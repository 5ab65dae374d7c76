//! Inbound pump: connection read half → decoder → inbound queue.
//!
//! # States
//! ```text
//! LISTEN ──frame──▶ DECODE ──ok──▶ DELIVER ──▶ LISTEN
//!    │                 │               │
//!    │ read error /    │ decode error  │ queue closed
//!    │ watchdog        ▼               ▼
//!    └──────────────▶ exit ◀───────────┘
//! ```
//!
//! # Design Decisions
//! - Frames are delivered in arrival order; nothing is buffered beyond the queue
//! - Ping/pong are answered by the connection and skipped here
//! - A peer close frame runs the close handler and closes the queue; the read
//!   half is then drained to its end so the connection can flush its close reply
//! - Exiting drops the queue sender, so the application sees end-of-stream

use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use futures_util::{Stream, StreamExt};

use crate::observability::metrics;
use crate::transport::close::{CloseHandler, CloseNotice};
use crate::transport::codec::Decoder;
use crate::transport::context::RequestContext;
use crate::transport::error::{BoxError, TransportError};
use crate::transport::queue::InboundSender;

/// Orderly reasons for the inbound pump to stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundExit {
    /// The peer sent a close frame.
    PeerClosed(CloseNotice),
    /// The read half ended without a close frame.
    StreamEnded,
    /// The application closed or dropped its receiver.
    QueueClosed,
}

impl InboundExit {
    pub fn reason(&self) -> &'static str {
        match self {
            InboundExit::PeerClosed(_) => "peer_closed",
            InboundExit::StreamEnded => "stream_ended",
            InboundExit::QueueClosed => "queue_closed",
        }
    }
}

/// Moves frames from the connection into the inbound queue.
pub struct InboundPump<Req> {
    ctx: RequestContext,
    queue: InboundSender<Req>,
    decoder: Arc<dyn Decoder<Req>>,
    close_handler: Option<Arc<dyn CloseHandler>>,
    read_timeout: Option<Duration>,
}

impl<Req: Send + 'static> InboundPump<Req> {
    pub fn new(
        ctx: RequestContext,
        queue: InboundSender<Req>,
        decoder: Arc<dyn Decoder<Req>>,
        close_handler: Option<Arc<dyn CloseHandler>>,
        read_timeout: Option<Duration>,
    ) -> Self {
        Self {
            ctx,
            queue,
            decoder,
            close_handler,
            read_timeout,
        }
    }

    /// Run until the connection, the decoder or the queue stops it.
    pub async fn run<S, E>(self, stream: S) -> Result<InboundExit, TransportError>
    where
        S: Stream<Item = Result<Message, E>>,
        E: Into<BoxError>,
    {
        let mut stream = pin!(stream);

        loop {
            let frame = match self.listen(&mut stream).await? {
                Some(frame) => frame,
                None => return Ok(InboundExit::StreamEnded),
            };

            let decoded = match frame {
                Message::Binary(payload) => self.decoder.decode(&self.ctx, &payload),
                Message::Text(text) => self.decoder.decode(&self.ctx, text.as_str().as_bytes()),
                Message::Ping(_) | Message::Pong(_) => continue,
                Message::Close(frame) => {
                    let notice = CloseNotice::from_frame(frame.as_ref());
                    let exit = self.peer_closed(notice);
                    let Self {
                        ctx,
                        queue,
                        read_timeout,
                        ..
                    } = self;
                    drop(queue);
                    drain_read_half(&ctx, &mut stream, read_timeout).await;
                    return exit;
                }
            };
            let request = decoded.map_err(TransportError::Decode)?;

            if self.queue.send(request).await.is_err() {
                return Ok(InboundExit::QueueClosed);
            }
            metrics::record_frame_received();
        }
    }

    /// LISTEN: wait for the next frame, bounded by the watchdog if enabled.
    async fn listen<S, E>(&self, stream: &mut S) -> Result<Option<Message>, TransportError>
    where
        S: Stream<Item = Result<Message, E>> + Unpin,
        E: Into<BoxError>,
    {
        let next = match self.read_timeout {
            Some(limit) => tokio::time::timeout(limit, stream.next())
                .await
                .map_err(|_| TransportError::ReadTimeout(limit))?,
            None => stream.next().await,
        };
        next.transpose().map_err(|e| TransportError::Read(e.into()))
    }

    fn peer_closed(&self, notice: CloseNotice) -> Result<InboundExit, TransportError> {
        tracing::debug!(
            connection_id = %self.ctx.connection_id(),
            code = notice.code,
            reason = %notice.reason,
            "Peer sent close frame"
        );
        if let Some(handler) = &self.close_handler {
            handler
                .on_close(&self.ctx, notice.code, &notice.reason)
                .map_err(TransportError::CloseHandler)?;
        }
        Ok(InboundExit::PeerClosed(notice))
    }
}

/// Poll the read half after a peer close until it ends.
///
/// The close reply is only flushed while the connection is being polled, so
/// stopping at the close frame would leave the peer's handshake hanging.
async fn drain_read_half<S, E>(
    ctx: &RequestContext,
    stream: &mut S,
    read_timeout: Option<Duration>,
) where
    S: Stream<Item = Result<Message, E>> + Unpin,
{
    let mut skipped = 0usize;
    loop {
        let next = match read_timeout {
            Some(limit) => match tokio::time::timeout(limit, stream.next()).await {
                Ok(next) => next,
                Err(_) => break,
            },
            None => stream.next().await,
        };
        match next {
            Some(Ok(_)) => skipped += 1,
            Some(Err(_)) | None => break,
        }
    }
    tracing::trace!(
        connection_id = %ctx.connection_id(),
        skipped,
        "Read half drained after peer close"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pump::testing::{binary, channel_stream, frames, text};
    use crate::transport::codec::{CodecError, Utf8Codec};
    use crate::transport::queue::{queue_pair, AppQueues, QueueCapacity};
    use axum::extract::ws::{CloseFrame, Utf8Bytes};
    use std::sync::Mutex;

    fn pump(
        capacity: QueueCapacity,
        close_handler: Option<Arc<dyn CloseHandler>>,
        read_timeout: Option<Duration>,
    ) -> (InboundPump<String>, AppQueues<String, ()>) {
        let (transport, app) = queue_pair(capacity);
        let pump = InboundPump::new(
            RequestContext::new("inbound-test"),
            transport.inbound,
            Arc::new(Utf8Codec),
            close_handler,
            read_timeout,
        );
        (pump, app)
    }

    async fn drain(app: &mut AppQueues<String, ()>) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(value) = app.requests.recv().await {
            out.push(value);
        }
        out
    }

    #[tokio::test]
    async fn delivers_every_frame_in_order() {
        let (pump, mut app) = pump(QueueCapacity::Unbounded, None, None);
        let input: Vec<_> = (0..50).map(|i| text(&format!("msg-{i}"))).collect();

        let exit = pump.run(frames(input)).await.unwrap();
        assert_eq!(exit, InboundExit::StreamEnded);

        let expected: Vec<_> = (0..50).map(|i| format!("msg-{i}")).collect();
        assert_eq!(drain(&mut app).await, expected);
    }

    #[tokio::test]
    async fn binary_and_text_frames_both_decode() {
        let (pump, mut app) = pump(QueueCapacity::default(), None, None);
        let input = vec![binary(b"one"), Ok(Message::Ping(Default::default())), text("two")];

        pump.run(frames(input)).await.unwrap();
        assert_eq!(drain(&mut app).await, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn malformed_frame_halts_pump() {
        let (pump, mut app) = pump(QueueCapacity::default(), None, None);
        let input = vec![text("first"), binary(&[0xff, 0x00]), text("never")];

        let err = pump.run(frames(input)).await.unwrap_err();
        assert!(matches!(err, TransportError::Decode(CodecError::InvalidUtf8)));
        assert_eq!(drain(&mut app).await, vec!["first"]);
    }

    #[tokio::test]
    async fn read_error_terminates() {
        let (pump, mut app) = pump(QueueCapacity::default(), None, None);
        let input = vec![
            text("ok"),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
            text("after"),
        ];

        let err = pump.run(frames(input)).await.unwrap_err();
        assert!(matches!(err, TransportError::Read(_)));
        assert_eq!(drain(&mut app).await, vec!["ok"]);
    }

    #[tokio::test]
    async fn peer_close_runs_handler_and_closes_queue() {
        let seen = Arc::new(Mutex::new(None));
        let record = Arc::clone(&seen);
        let handler: Arc<dyn CloseHandler> =
            Arc::new(move |_: &RequestContext, code: u16, reason: &str| -> Result<(), BoxError> {
                *record.lock().unwrap() = Some((code, reason.to_string()));
                Ok(())
            });
        let (pump, mut app) = pump(QueueCapacity::default(), Some(handler), None);
        let close = Message::Close(Some(CloseFrame {
            code: 4000,
            reason: Utf8Bytes::from_static("done"),
        }));

        let exit = pump
            .run(frames(vec![text("last"), Ok(close), text("ignored")]))
            .await
            .unwrap();

        assert_eq!(
            exit,
            InboundExit::PeerClosed(CloseNotice {
                code: 4000,
                reason: "done".into()
            })
        );
        assert_eq!(*seen.lock().unwrap(), Some((4000, "done".to_string())));
        assert_eq!(drain(&mut app).await, vec!["last"]);
    }

    #[tokio::test]
    async fn peer_close_drains_read_half_to_its_end() {
        let (pump, mut app) = pump(QueueCapacity::default(), None, None);
        let (peer, read_half) = channel_stream();
        let running = tokio::spawn(pump.run(read_half));

        peer.send(text("before")).unwrap();
        peer.send(Ok(Message::Close(None))).unwrap();
        peer.send(text("after close")).unwrap();

        // The application sees end-of-stream while the connection is still open.
        assert_eq!(drain(&mut app).await, vec!["before"]);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!running.is_finished());

        drop(peer);
        let exit = running.await.unwrap().unwrap();
        assert!(matches!(exit, InboundExit::PeerClosed(CloseNotice { code: 1005, .. })));
    }

    #[tokio::test]
    async fn drain_after_peer_close_respects_watchdog() {
        let limit = Duration::from_millis(50);
        let (pump, _app) = pump(QueueCapacity::default(), None, Some(limit));
        let (peer, read_half) = channel_stream();
        let running = tokio::spawn(pump.run(read_half));

        peer.send(Ok(Message::Close(None))).unwrap();
        let exit = tokio::time::timeout(Duration::from_secs(2), running)
            .await
            .expect("drain ignored the read timeout")
            .unwrap();
        assert!(matches!(exit, Ok(InboundExit::PeerClosed(_))));
    }

    #[tokio::test]
    async fn failing_close_handler_is_surfaced() {
        let handler: Arc<dyn CloseHandler> =
            Arc::new(|_: &RequestContext, _: u16, _: &str| -> Result<(), BoxError> {
                Err("cleanup failed".into())
            });
        let (pump, mut app) = pump(QueueCapacity::default(), Some(handler), None);

        let err = pump
            .run(frames(vec![Ok(Message::Close(None))]))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::CloseHandler(_)));
        assert!(app.requests.recv().await.is_none());
    }

    #[tokio::test]
    async fn closed_receiver_stops_pump() {
        let (pump, mut app) = pump(QueueCapacity::default(), None, None);
        app.requests.close();

        let exit = pump.run(frames(vec![text("dropped")])).await.unwrap();
        assert_eq!(exit, InboundExit::QueueClosed);
    }

    #[tokio::test]
    async fn watchdog_deadline_is_a_read_error() {
        let limit = Duration::from_millis(50);
        let (pump, _app) = pump(QueueCapacity::default(), None, Some(limit));
        let idle = futures_util::stream::pending::<Result<Message, std::io::Error>>();

        let err = pump.run(idle).await.unwrap_err();
        assert!(matches!(err, TransportError::ReadTimeout(d) if d == limit));
    }
}
