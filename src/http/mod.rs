//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, connect info, trace layer)
//!     → transport::WebSocketServer::serve (upgrade at the configured path)
//!     → 101 Switching Protocols, pumps start
//! ```

pub mod server;

pub use server::HttpServer;
