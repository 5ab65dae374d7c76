//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the bridge.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::transport::codec::FrameKind;
use crate::transport::queue::QueueCapacity;

/// Root configuration for the WebSocket bridge.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// Listener configuration (bind address, upgrade path, drain grace).
    pub listener: ListenerConfig,

    /// Per-connection transport behaviour.
    pub transport: TransportConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Path the WebSocket upgrade is served on.
    pub path: String,

    /// Seconds to wait for open connections after shutdown is signalled.
    pub shutdown_grace_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            path: "/ws".to_string(),
            shutdown_grace_secs: 5,
        }
    }
}

/// Transport configuration shared by every connection.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TransportConfig {
    /// Capacity policy for both queues of a connection.
    pub queue_capacity: QueueCapacity,

    /// Frame type used for encoded responses.
    pub outbound_frame: FrameKind,

    /// Send decode/encode failures to the error sink.
    pub report_codec_errors: bool,

    /// Send read/write/watchdog failures to the error sink.
    pub report_io_errors: bool,

    /// Inbound read deadline.
    pub watchdog: WatchdogConfig,

    /// Protocol limits applied at upgrade time.
    pub socket: SocketConfig,
}

/// Inbound read deadline.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchdogConfig {
    pub enabled: bool,

    /// Longest wait for the next inbound frame.
    pub read_timeout_secs: u64,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            read_timeout_secs: 10,
        }
    }
}

/// WebSocket protocol limits. Unset values keep the library defaults.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SocketConfig {
    pub max_message_size: Option<usize>,
    pub max_frame_size: Option<usize>,
    pub write_buffer_size: Option<usize>,
    pub max_write_buffer_size: Option<usize>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
