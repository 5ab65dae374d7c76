//! Per-connection message pumps.
//!
//! # Data Flow
//! ```text
//! peer ──frames──▶ read half ──▶ inbound.rs (decode) ──▶ inbound queue ──▶ application
//! peer ◀──frames── write half ◀── outbound.rs (encode) ◀── outbound queue ◀── application
//! ```
//!
//! # Design Decisions
//! - Exactly one inbound and one outbound pump per connection, each a separate task
//! - Each pump owns only its half of the connection, its queue end and its codec
//! - No state is shared between the two pumps; neither stops the other directly
//! - The outbound close frame makes the peer close, which ends the inbound pump

pub mod inbound;
pub mod outbound;

pub use inbound::{InboundExit, InboundPump};
pub use outbound::{OutboundExit, OutboundPump};
