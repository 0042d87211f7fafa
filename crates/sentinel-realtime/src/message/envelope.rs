//! The `{type, payload}` envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outbound wire message.
///
/// `payload` is omitted from the encoded form when `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message type tag.
    #[serde(rename = "type")]
    pub kind: String,
    /// Optional payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Envelope {
    /// Create an envelope.
    pub fn new(kind: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }
}

/// The type tag found on an inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameTag {
    /// A non-empty string tag.
    Named(String),
    /// A tag that is present but not a string, rendered as JSON.
    Invalid(String),
    /// No usable tag: absent, `null`, empty, or the frame is not an object.
    Missing,
}

/// An inbound frame after JSON decoding.
///
/// Decoding is deliberately loose: only malformed JSON is a decode failure.
/// A frame without a usable `type` still decodes and is classified by the
/// router.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundFrame {
    /// Type tag.
    pub tag: FrameTag,
    /// Payload, `None` when absent or `null`.
    pub payload: Option<Value>,
}

impl From<Value> for InboundFrame {
    fn from(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self {
                tag: FrameTag::Missing,
                payload: None,
            };
        };

        let tag = match map.remove("type") {
            Some(Value::String(s)) if !s.is_empty() => FrameTag::Named(s),
            None | Some(Value::Null) | Some(Value::String(_)) => FrameTag::Missing,
            Some(other) => FrameTag::Invalid(other.to_string()),
        };
        let payload = map.remove("payload").filter(|p| !p.is_null());

        Self { tag, payload }
    }
}
