//! Per-connection socket settings.
//!
//! Seeded from [`TransportConfig`], then handed mutably to each socket hook in
//! registration order, then applied to the connection.

use std::time::Duration;

use axum::extract::ws::WebSocketUpgrade;

use crate::config::schema::TransportConfig;
use crate::transport::codec::FrameKind;

/// Settings a socket hook may adjust for one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketSettings {
    /// Largest message accepted from the peer, in bytes.
    pub max_message_size: Option<usize>,
    /// Largest single frame accepted from the peer, in bytes.
    pub max_frame_size: Option<usize>,
    /// Bytes buffered before a write is flushed.
    pub write_buffer_size: Option<usize>,
    /// Upper bound for the write buffer, in bytes.
    pub max_write_buffer_size: Option<usize>,
    /// Watchdog: maximum wait for the next inbound frame. `None` disables it.
    pub read_timeout: Option<Duration>,
    /// Frame type for encoded responses.
    pub outbound_frame: FrameKind,
}

impl SocketSettings {
    pub fn from_config(config: &TransportConfig) -> Self {
        Self {
            max_message_size: config.socket.max_message_size,
            max_frame_size: config.socket.max_frame_size,
            write_buffer_size: config.socket.write_buffer_size,
            max_write_buffer_size: config.socket.max_write_buffer_size,
            read_timeout: config
                .watchdog
                .enabled
                .then(|| Duration::from_secs(config.watchdog.read_timeout_secs)),
            outbound_frame: config.outbound_frame,
        }
    }

    /// Apply the protocol limits to a pending upgrade.
    pub(crate) fn apply(&self, mut upgrade: WebSocketUpgrade) -> WebSocketUpgrade {
        if let Some(size) = self.max_message_size {
            upgrade = upgrade.max_message_size(size);
        }
        if let Some(size) = self.max_frame_size {
            upgrade = upgrade.max_frame_size(size);
        }
        if let Some(size) = self.write_buffer_size {
            upgrade = upgrade.write_buffer_size(size);
        }
        if let Some(size) = self.max_write_buffer_size {
            upgrade = upgrade.max_write_buffer_size(size);
        }
        upgrade
    }
}

impl Default for SocketSettings {
    fn default() -> Self {
        Self::from_config(&TransportConfig::default())
    }
}
