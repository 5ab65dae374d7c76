//! WebSocket bridge library.
//!
//! Connects upgraded WebSocket connections to application logic through a
//! pair of typed queues per connection, with pluggable codecs, hooks and
//! error reporting.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod pump;
pub mod transport;

pub use config::schema::BridgeConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use transport::{ServerBuilder, WebSocketServer};
