//! Frame payload codecs.
//!
//! A [`Decoder`] turns the raw bytes of one inbound frame into an application
//! request; an [`Encoder`] turns one application response into the bytes of
//! one outbound frame. Both are pure with respect to the connection.

use axum::body::Bytes;
use axum::extract::ws::{Message, Utf8Bytes};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::transport::context::RequestContext;

/// Errors produced by codecs.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame is not valid UTF-8")]
    InvalidUtf8,

    #[error("{0}")]
    Other(String),
}

/// Decodes one inbound frame payload.
pub trait Decoder<T>: Send + Sync + 'static {
    fn decode(&self, ctx: &RequestContext, frame: &[u8]) -> Result<T, CodecError>;
}

/// Encodes one outbound value into a frame payload.
pub trait Encoder<T>: Send + Sync + 'static {
    fn encode(&self, ctx: &RequestContext, item: T) -> Result<Vec<u8>, CodecError>;
}

impl<T, F> Decoder<T> for F
where
    F: Fn(&RequestContext, &[u8]) -> Result<T, CodecError> + Send + Sync + 'static,
{
    fn decode(&self, ctx: &RequestContext, frame: &[u8]) -> Result<T, CodecError> {
        self(ctx, frame)
    }
}

impl<T, F> Encoder<T> for F
where
    F: Fn(&RequestContext, T) -> Result<Vec<u8>, CodecError> + Send + Sync + 'static,
{
    fn encode(&self, ctx: &RequestContext, item: T) -> Result<Vec<u8>, CodecError> {
        self(ctx, item)
    }
}

/// JSON codec for any serde type.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<T: DeserializeOwned> Decoder<T> for JsonCodec {
    fn decode(&self, _ctx: &RequestContext, frame: &[u8]) -> Result<T, CodecError> {
        Ok(serde_json::from_slice(frame)?)
    }
}

impl<T: Serialize> Encoder<T> for JsonCodec {
    fn encode(&self, _ctx: &RequestContext, item: T) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(&item)?)
    }
}

/// Plain UTF-8 text codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Codec;

impl Decoder<String> for Utf8Codec {
    fn decode(&self, _ctx: &RequestContext, frame: &[u8]) -> Result<String, CodecError> {
        std::str::from_utf8(frame)
            .map(str::to_string)
            .map_err(|_| CodecError::InvalidUtf8)
    }
}

impl Encoder<String> for Utf8Codec {
    fn encode(&self, _ctx: &RequestContext, item: String) -> Result<Vec<u8>, CodecError> {
        Ok(item.into_bytes())
    }
}

/// Frame type the outbound pump writes encoded payloads as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    #[default]
    Binary,
    Text,
}

impl FrameKind {
    /// Wrap an encoded payload in a data frame of this kind.
    pub fn to_message(self, payload: Vec<u8>) -> Result<Message, CodecError> {
        match self {
            FrameKind::Binary => Ok(Message::Binary(Bytes::from(payload))),
            FrameKind::Text => String::from_utf8(payload)
                .map(|text| Message::Text(Utf8Bytes::from(text)))
                .map_err(|_| CodecError::InvalidUtf8),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn ctx() -> RequestContext {
        RequestContext::new("codec-test")
    }

    #[test]
    fn json_decode_and_reject_malformed() {
        let value: Value = JsonCodec.decode(&ctx(), br#"{"op":"ping"}"#).unwrap();
        assert_eq!(value, json!({"op": "ping"}));

        let err = Decoder::<Value>::decode(&JsonCodec, &ctx(), b"{not json").unwrap_err();
        assert!(matches!(err, CodecError::Json(_)));
    }

    #[test]
    fn json_encode() {
        let bytes = JsonCodec.encode(&ctx(), json!(["pong", 1])).unwrap();
        assert_eq!(bytes, br#"["pong",1]"#);
    }

    #[test]
    fn utf8_rejects_invalid_bytes() {
        assert_eq!(Utf8Codec.decode(&ctx(), b"ping").unwrap(), "ping");
        assert!(matches!(
            Utf8Codec.decode(&ctx(), &[0xff, 0xfe]),
            Err(CodecError::InvalidUtf8)
        ));
    }

    #[test]
    fn closures_are_codecs() {
        let upper = |_: &RequestContext, frame: &[u8]| -> Result<String, CodecError> {
            Ok(String::from_utf8_lossy(frame).to_uppercase())
        };
        assert_eq!(upper.decode(&ctx(), b"abc").unwrap(), "ABC");

        let length = |_: &RequestContext, item: String| -> Result<Vec<u8>, CodecError> {
            Ok(item.len().to_string().into_bytes())
        };
        assert_eq!(length.encode(&ctx(), "four".to_string()).unwrap(), b"4");
    }

    #[test]
    fn frame_kind_wraps_payload() {
        let msg = FrameKind::Binary.to_message(vec![1, 2, 3]).unwrap();
        assert!(matches!(msg, Message::Binary(ref b) if b[..] == [1u8, 2, 3][..]));

        let msg = FrameKind::Text.to_message(b"pong".to_vec()).unwrap();
        assert!(matches!(msg, Message::Text(ref t) if t.as_str() == "pong"));

        assert!(matches!(
            FrameKind::Text.to_message(vec![0xc3]),
            Err(CodecError::InvalidUtf8)
        ));
    }
}
