//! WebSocket transport adapter.
//!
//! # Data Flow
//! ```text
//! HTTP request
//!     → server.rs (upgrade; rejection → error sink)
//!     → context.rs + hooks.rs (context hooks fold, then socket hooks)
//!     → socket.rs (limits applied to the upgrade)
//!     → queue.rs (fresh queue pair per connection)
//!     → endpoint.rs (application takes its queue ends)
//!     → pump::inbound / pump::outbound (one task each)
//!
//! Failures anywhere above → error.rs (ErrorSink, per reporting policy)
//! Peer close frame        → close.rs (CloseHandler)
//! ```
//!
//! # Design Decisions
//! - The application never touches the connection; it only sees typed queues
//! - Codecs, hooks, close handler and error sink are plain traits with
//!   closure impls, fixed at build time
//! - The error sink is a required argument to the builder

pub mod close;
pub mod codec;
pub mod context;
pub mod endpoint;
pub mod error;
pub mod hooks;
pub mod queue;
pub mod server;
pub mod socket;

pub use close::{CloseHandler, CloseNotice};
pub use codec::{CodecError, Decoder, Encoder, FrameKind, JsonCodec, Utf8Codec};
pub use context::{RequestContext, X_REQUEST_ID};
pub use endpoint::Endpoint;
pub use error::{BoxError, ErrorSink, LogErrorSink, TransportError};
pub use hooks::{ContextHook, HookChain, SocketHook};
pub use queue::{
    queue_pair, AppQueues, InboundReceiver, InboundSender, OutboundReceiver, OutboundSender,
    QueueCapacity, QueueClosed, TransportQueues,
};
pub use server::{ServerBuilder, Session, WebSocketServer};
pub use socket::SocketSettings;
