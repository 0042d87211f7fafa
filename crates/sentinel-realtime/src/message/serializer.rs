//! JSON encoding and decoding of wire frames.

use serde::Serialize;
use serde_json::Value;

use crate::error::ClientError;

use super::envelope::{Envelope, InboundFrame};

/// Decode an inbound text frame.
pub fn decode_frame(text: &str) -> Result<InboundFrame, ClientError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ClientError::Decode(e.to_string()))?;
    Ok(InboundFrame::from(value))
}

/// Encode an outbound envelope.
pub fn encode_envelope(envelope: &Envelope) -> Result<String, ClientError> {
    serde_json::to_string(envelope).map_err(|e| ClientError::Encode(e.to_string()))
}

/// Convert any serializable payload into a JSON value.
pub fn to_payload<T: Serialize + ?Sized>(payload: &T) -> Result<Value, ClientError> {
    serde_json::to_value(payload).map_err(|e| ClientError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;

    #[test]
    fn test_decode_rejects_non_json() {
        assert!(matches!(
            decode_frame("not-json"),
            Err(ClientError::Decode(_))
        ));
    }

    #[test]
    fn test_encode_with_payload() {
        let encoded = encode_envelope(&Envelope::new("ping", Some(json!({"n": 1})))).unwrap();
        assert_eq!(encoded, r#"{"type":"ping","payload":{"n":1}}"#);
    }

    #[test]
    fn test_to_payload_rejects_non_string_keys() {
        let mut map = HashMap::new();
        map.insert((1, 2), "x");
        assert!(matches!(to_payload(&map), Err(ClientError::Encode(_))));
    }
}
