//! Network-level connection bookkeeping.
//!
//! # Data Flow
//! ```text
//! WebSocket upgrade accepted
//!     → connection.rs (ConnectionId assigned to the request context)
//!     → ConnectionTracker::track (guard shared by both pumps)
//!     → last pump exits → guard dropped → live count decremented
//! ```

pub mod connection;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
