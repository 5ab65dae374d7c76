//! Per-connection message queues.
//!
//! # Responsibilities
//! - Allocate a fresh inbound/outbound queue pair for every connection
//! - Apply the capacity policy chosen at construction (bounded or unbounded)
//! - Split each pair into the transport ends (pumps) and application ends (endpoint)
//!
//! # Design Decisions
//! - Inbound: single producer (inbound pump), single consumer (application)
//! - Outbound: cloneable producer (application), single consumer (outbound pump)
//! - A bounded inbound queue is the backpressure point: a full queue stalls the
//!   inbound pump until the application drains it
//! - Dropping the last producer closes a queue

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Capacity policy applied to both queues of every connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueCapacity {
    /// At most `n` undelivered messages; senders wait when full.
    Bounded(usize),
    /// No limit; senders never wait.
    Unbounded,
}

impl Default for QueueCapacity {
    fn default() -> Self {
        QueueCapacity::Bounded(64)
    }
}

/// Returned when sending into a queue whose consumer is gone.
pub struct QueueClosed<T>(pub T);

impl<T> fmt::Debug for QueueClosed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("QueueClosed(..)")
    }
}

impl<T> fmt::Display for QueueClosed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("queue closed")
    }
}

impl<T> std::error::Error for QueueClosed<T> {}

enum Tx<T> {
    Bounded(mpsc::Sender<T>),
    Unbounded(mpsc::UnboundedSender<T>),
}

impl<T> Clone for Tx<T> {
    fn clone(&self) -> Self {
        match self {
            Tx::Bounded(tx) => Tx::Bounded(tx.clone()),
            Tx::Unbounded(tx) => Tx::Unbounded(tx.clone()),
        }
    }
}

impl<T> Tx<T> {
    async fn send(&self, value: T) -> Result<(), QueueClosed<T>> {
        match self {
            Tx::Bounded(tx) => tx.send(value).await.map_err(|e| QueueClosed(e.0)),
            Tx::Unbounded(tx) => tx.send(value).map_err(|e| QueueClosed(e.0)),
        }
    }

    fn is_closed(&self) -> bool {
        match self {
            Tx::Bounded(tx) => tx.is_closed(),
            Tx::Unbounded(tx) => tx.is_closed(),
        }
    }
}

enum Rx<T> {
    Bounded(mpsc::Receiver<T>),
    Unbounded(mpsc::UnboundedReceiver<T>),
}

impl<T> Rx<T> {
    async fn recv(&mut self) -> Option<T> {
        match self {
            Rx::Bounded(rx) => rx.recv().await,
            Rx::Unbounded(rx) => rx.recv().await,
        }
    }

    fn close(&mut self) {
        match self {
            Rx::Bounded(rx) => rx.close(),
            Rx::Unbounded(rx) => rx.close(),
        }
    }
}

fn channel<T>(capacity: QueueCapacity) -> (Tx<T>, Rx<T>) {
    match capacity {
        QueueCapacity::Bounded(n) => {
            // tokio panics on a zero-capacity channel; validation rejects 0 before we get here.
            let (tx, rx) = mpsc::channel(n.max(1));
            (Tx::Bounded(tx), Rx::Bounded(rx))
        }
        QueueCapacity::Unbounded => {
            let (tx, rx) = mpsc::unbounded_channel();
            (Tx::Unbounded(tx), Rx::Unbounded(rx))
        }
    }
}

/// Producer end of the inbound queue, held by the inbound pump.
pub struct InboundSender<T>(Tx<T>);

impl<T> InboundSender<T> {
    /// Deliver a decoded request. Waits while a bounded queue is full.
    pub async fn send(&self, value: T) -> Result<(), QueueClosed<T>> {
        self.0.send(value).await
    }

    /// True once the application dropped or closed its receiver.
    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}

/// Consumer end of the inbound queue, held by the application.
pub struct InboundReceiver<T>(Rx<T>);

impl<T> InboundReceiver<T> {
    /// Next decoded request; `None` once the connection stopped reading.
    pub async fn recv(&mut self) -> Option<T> {
        self.0.recv().await
    }

    /// Stop accepting requests; the inbound pump exits on its next delivery.
    pub fn close(&mut self) {
        self.0.close()
    }
}

/// Producer end of the outbound queue, held by the application.
///
/// Clone it to enqueue from several tasks. The connection is closed
/// gracefully once every clone has been dropped.
pub struct OutboundSender<T>(Tx<T>);

impl<T> Clone for OutboundSender<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> OutboundSender<T> {
    /// Enqueue a response for the outbound pump.
    pub async fn send(&self, value: T) -> Result<(), QueueClosed<T>> {
        self.0.send(value).await
    }

    /// True once the outbound pump has exited.
    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}

/// Consumer end of the outbound queue, held by the outbound pump.
pub struct OutboundReceiver<T>(Rx<T>);

impl<T> OutboundReceiver<T> {
    /// Next response; `None` once the application closed the queue.
    pub async fn recv(&mut self) -> Option<T> {
        self.0.recv().await
    }
}

/// Queue ends driven by the pumps.
pub struct TransportQueues<Req, Resp> {
    pub inbound: InboundSender<Req>,
    pub outbound: OutboundReceiver<Resp>,
}

/// Queue ends handed to the endpoint for one connection.
pub struct AppQueues<Req, Resp> {
    /// Decoded requests from the peer, in arrival order.
    pub requests: InboundReceiver<Req>,
    /// Responses to write to the peer, in enqueue order.
    pub responses: OutboundSender<Resp>,
}

/// Allocate a fresh queue pair for one connection.
pub fn queue_pair<Req, Resp>(
    capacity: QueueCapacity,
) -> (TransportQueues<Req, Resp>, AppQueues<Req, Resp>) {
    let (in_tx, in_rx) = channel(capacity);
    let (out_tx, out_rx) = channel(capacity);
    (
        TransportQueues {
            inbound: InboundSender(in_tx),
            outbound: OutboundReceiver(out_rx),
        },
        AppQueues {
            requests: InboundReceiver(in_rx),
            responses: OutboundSender(out_tx),
        },
    )
}
