//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Lifecycle manager and pumps produce:
//!     → logging.rs (structured log events, connection/request IDs as fields)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Connection ID and request ID flow through every log line of a connection
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
