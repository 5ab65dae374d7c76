//! Peer close handling.
//!
//! When the peer sends a close frame the inbound pump invokes the configured
//! [`CloseHandler`] with the frame's code and reason, then drops its end of the
//! inbound queue. The queue is therefore closed whether or not a custom handler
//! is installed, and a custom handler only adds cleanup on top.

use axum::extract::ws::{close_code, CloseFrame};

use crate::transport::context::RequestContext;
use crate::transport::error::BoxError;

/// Callback for a peer-initiated close.
pub trait CloseHandler: Send + Sync + 'static {
    fn on_close(&self, ctx: &RequestContext, code: u16, reason: &str) -> Result<(), BoxError>;
}

impl<F> CloseHandler for F
where
    F: Fn(&RequestContext, u16, &str) -> Result<(), BoxError> + Send + Sync + 'static,
{
    fn on_close(&self, ctx: &RequestContext, code: u16, reason: &str) -> Result<(), BoxError> {
        self(ctx, code, reason)
    }
}

/// Code and reason of a received close frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseNotice {
    pub code: u16,
    pub reason: String,
}

impl CloseNotice {
    /// A close frame without a payload maps to 1005 (no status received).
    pub fn from_frame(frame: Option<&CloseFrame>) -> Self {
        match frame {
            Some(frame) => Self {
                code: frame.code,
                reason: frame.reason.as_str().to_string(),
            },
            None => Self {
                code: close_code::STATUS,
                reason: String::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::ws::Utf8Bytes;

    #[test]
    fn notice_from_frame() {
        let frame = CloseFrame {
            code: close_code::AWAY,
            reason: Utf8Bytes::from_static("bye"),
        };
        let notice = CloseNotice::from_frame(Some(&frame));
        assert_eq!(notice.code, 1001);
        assert_eq!(notice.reason, "bye");

        assert_eq!(CloseNotice::from_frame(None).code, 1005);
    }
}
