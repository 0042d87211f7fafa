//! Inbound frame classification and dispatch.

use serde_json::{Map, Value};
use tracing::{error, trace, warn};

use crate::error::ClientError;
use crate::handler::HandlerSet;

use super::envelope::FrameTag;
use super::serializer::decode_frame;
use super::types::MessageKind;
use super::validator::validate_frame;

/// What the router did with a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// Delivered to the handler for this kind.
    Dispatched(MessageKind),
    /// A heartbeat acknowledgment; accepted and ignored.
    Heartbeat,
    /// The frame had no usable `type`; dropped.
    MissingType,
    /// The `type` has no route; dropped.
    Unknown(String),
    /// The frame failed validation or decoding; `on_error` was invoked.
    Rejected(ClientError),
}

/// Decodes inbound frames and dispatches them to a [`HandlerSet`].
#[derive(Debug, Clone)]
pub struct MessageRouter {
    max_frame_bytes: usize,
}

impl MessageRouter {
    /// Create a router that rejects frames above `max_frame_bytes`.
    pub fn new(max_frame_bytes: usize) -> Self {
        Self { max_frame_bytes }
    }

    /// Route one raw text frame.
    ///
    /// Never fails: decode problems are reported to `on_error`, unroutable
    /// frames are logged and dropped.
    pub fn route(&self, raw: &str, handlers: &HandlerSet) -> RouteOutcome {
        let frame = match validate_frame(raw, self.max_frame_bytes).and_then(|_| decode_frame(raw))
        {
            Ok(frame) => frame,
            Err(err) => {
                error!(error = %err, "Error parsing WebSocket message");
                handlers.error(&err);
                return RouteOutcome::Rejected(err);
            }
        };

        let tag = match frame.tag {
            FrameTag::Named(tag) => tag,
            FrameTag::Invalid(tag) => {
                warn!(message_type = %tag, "Unknown message type");
                return RouteOutcome::Unknown(tag);
            }
            FrameTag::Missing => {
                warn!(bytes = raw.len(), "Received message without type");
                return RouteOutcome::MissingType;
            }
        };

        let Some(kind) = MessageKind::from_tag(&tag) else {
            warn!(message_type = %tag, "Unknown message type");
            return RouteOutcome::Unknown(tag);
        };

        let payload = frame.payload;
        match kind {
            MessageKind::TestResults => {
                handlers.test_results(payload.unwrap_or_else(|| Value::Array(Vec::new())));
            }
            MessageKind::MetricsUpdate => {
                handlers.metrics_update(payload.unwrap_or_else(|| Value::Object(Map::new())));
            }
            MessageKind::Notification => {
                handlers.notification(payload.unwrap_or_else(|| Value::Object(Map::new())));
            }
            MessageKind::Pong => {
                trace!("Heartbeat acknowledgment received");
                return RouteOutcome::Heartbeat;
            }
        }

        RouteOutcome::Dispatched(kind)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::json;
    use tracing_test::traced_test;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Seen {
        TestResults(Value),
        Metrics(Value),
        Notification(Value),
        Error(ClientError),
    }

    fn recording_handlers() -> (HandlerSet, Arc<Mutex<Vec<Seen>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (a, b, c, d) = (seen.clone(), seen.clone(), seen.clone(), seen.clone());
        let handlers = HandlerSet::new()
            .on_test_results(move |p| a.lock().unwrap().push(Seen::TestResults(p)))
            .on_metrics_update(move |p| b.lock().unwrap().push(Seen::Metrics(p)))
            .on_notification(move |p| c.lock().unwrap().push(Seen::Notification(p)))
            .on_error(move |e| d.lock().unwrap().push(Seen::Error(e.clone())));
        (handlers, seen)
    }

    fn router() -> MessageRouter {
        MessageRouter::new(65_536)
    }

    #[test]
    fn test_results_payload_is_passed_unmodified() {
        let (handlers, seen) = recording_handlers();
        let raw = r#"{"type":"test_results","payload":[{"name":"T1","status":"passed","duration":"10ms"}]}"#;

        let outcome = router().route(raw, &handlers);

        assert_eq!(outcome, RouteOutcome::Dispatched(MessageKind::TestResults));
        assert_eq!(
            *seen.lock().unwrap(),
            vec![Seen::TestResults(json!([
                {"name": "T1", "status": "passed", "duration": "10ms"}
            ]))]
        );
    }

    #[test]
    fn test_metrics_and_notification_routes() {
        let (handlers, seen) = recording_handlers();
        let r = router();

        r.route(r#"{"type":"metrics-update","payload":{"passed":3}}"#, &handlers);
        r.route(r#"{"type":"notification","payload":{"message":"hi"}}"#, &handlers);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                Seen::Metrics(json!({"passed": 3})),
                Seen::Notification(json!({"message": "hi"})),
            ]
        );
    }

    #[test]
    fn test_absent_payload_defaults_per_handler() {
        let (handlers, seen) = recording_handlers();
        let r = router();

        r.route(r#"{"type":"test_results"}"#, &handlers);
        r.route(r#"{"type":"metrics-update"}"#, &handlers);
        r.route(r#"{"type":"notification","payload":null}"#, &handlers);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                Seen::TestResults(json!([])),
                Seen::Metrics(json!({})),
                Seen::Notification(json!({})),
            ]
        );
    }

    #[test]
    #[traced_test]
    fn test_unrouted_type_warns_once() {
        let (handlers, seen) = recording_handlers();

        let outcome = router().route(r#"{"type":"unknown_x","payload":1}"#, &handlers);

        assert_eq!(outcome, RouteOutcome::Unknown("unknown_x".to_string()));
        assert!(seen.lock().unwrap().is_empty());
        logs_assert(|lines: &[&str]| {
            let warnings = lines
                .iter()
                .filter(|line| line.contains("WARN") && line.contains("unknown_x"))
                .count();
            match warnings {
                1 => Ok(()),
                n => Err(format!("expected one warning, found {n}")),
            }
        });
    }

    #[test]
    #[traced_test]
    fn test_non_json_frame_reports_error_once() {
        let (handlers, seen) = recording_handlers();

        let outcome = router().route("not-json", &handlers);

        assert!(matches!(outcome, RouteOutcome::Rejected(ClientError::Decode(_))));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(matches!(seen[0], Seen::Error(ClientError::Decode(_))));
        assert!(logs_contain("Error parsing WebSocket message"));
    }

    #[test]
    #[traced_test]
    fn test_missing_type_is_dropped_without_error() {
        let (handlers, seen) = recording_handlers();

        assert_eq!(
            router().route(r#"{"payload":{"a":1}}"#, &handlers),
            RouteOutcome::MissingType
        );
        assert_eq!(router().route("null", &handlers), RouteOutcome::MissingType);
        assert!(seen.lock().unwrap().is_empty());
        assert!(logs_contain("Received message without type"));
    }

    #[test]
    fn test_pong_is_ignored() {
        let (handlers, seen) = recording_handlers();

        assert_eq!(
            router().route(r#"{"type":"pong"}"#, &handlers),
            RouteOutcome::Heartbeat
        );
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_oversized_frame_is_rejected() {
        let (handlers, seen) = recording_handlers();
        let raw = format!(r#"{{"type":"notification","payload":"{}"}}"#, "x".repeat(64));

        let outcome = MessageRouter::new(32).route(&raw, &handlers);

        assert!(matches!(
            outcome,
            RouteOutcome::Rejected(ClientError::FrameTooLarge { limit: 32, .. })
        ));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
