//! One-shot send command.

use std::time::Duration;

use chrono::Utc;
use clap::Args;
use serde::Serialize;
use serde_json::{Value, json};

use crate::output::{self, OutputFormat};
use sentinel_core::error::AppError;
use sentinel_realtime::handler::CLOSE_NORMAL;
use sentinel_realtime::{ClientConfig, ConnectionState, HandlerSet, WebSocketClient};

/// Arguments for the send command
#[derive(Debug, Args)]
pub struct SendArgs {
    /// Message type
    #[arg(short = 't', long = "type")]
    pub kind: String,

    /// JSON payload; `test` messages default to `{"timestamp": ...}`
    #[arg(short, long)]
    pub payload: Option<String>,

    /// Seconds to wait for the connection to open
    #[arg(long, default_value = "10")]
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize)]
struct SendReport<'a> {
    url: &'a str,
    message_type: &'a str,
    payload: Option<&'a Value>,
    sent: bool,
}

/// Execute the send command
pub async fn execute(
    args: &SendArgs,
    config: ClientConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let payload = resolve_payload(&args.kind, args.payload.as_deref())?;

    let handlers = HandlerSet::new().on_error(|err| output::print_error(&err.to_string()));
    let client = WebSocketClient::new(config, handlers);

    let state = wait_for_open(&client, Duration::from_secs(args.timeout_secs)).await;
    if state != ConnectionState::Connected {
        client.close(CLOSE_NORMAL, "").await;
        return Err(AppError::not_connected(format!(
            "Could not connect to {} (state: {})",
            client.url(),
            state
        )));
    }

    let sent = client.send(&args.kind, payload.clone()).await;
    client.close(CLOSE_NORMAL, "").await;

    if !sent {
        return Err(AppError::transport(format!(
            "Failed to send '{}' message",
            args.kind
        )));
    }

    match format {
        OutputFormat::Table => output::print_success(&format!(
            "Sent '{}' message to {}",
            args.kind,
            client.url()
        )),
        OutputFormat::Json => output::print_item(
            &SendReport {
                url: client.url(),
                message_type: &args.kind,
                payload: payload.as_ref(),
                sent,
            },
            format,
        ),
    }
    Ok(())
}

/// Parse the payload flag, defaulting `test` messages to a timestamp.
fn resolve_payload(kind: &str, raw: Option<&str>) -> Result<Option<Value>, AppError> {
    match raw {
        Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
        None if kind == "test" => Ok(Some(json!({ "timestamp": Utc::now().to_rfc3339() }))),
        None => Ok(None),
    }
}

/// Wait until the client connects or gives up, bounded by `timeout`.
async fn wait_for_open(client: &WebSocketClient, timeout: Duration) -> ConnectionState {
    let mut states = client.subscribe_state();
    let settled = tokio::time::timeout(timeout, async {
        loop {
            let state = *states.borrow_and_update();
            if matches!(
                state,
                ConnectionState::Connected | ConnectionState::Disconnected | ConnectionState::Closed
            ) {
                return state;
            }
            if states.changed().await.is_err() {
                return client.state();
            }
        }
    })
    .await;

    settled.unwrap_or_else(|_| client.state())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_payload_is_parsed() {
        let payload = resolve_payload("ping", Some(r#"{"n":1}"#)).unwrap();
        assert_eq!(payload, Some(json!({"n": 1})));
    }

    #[test]
    fn test_test_message_gets_timestamp() {
        let payload = resolve_payload("test", None).unwrap().unwrap();
        assert!(payload.get("timestamp").and_then(Value::as_str).is_some());
        assert_eq!(resolve_payload("ping", None).unwrap(), None);
    }

    #[test]
    fn test_invalid_payload_is_rejected() {
        assert!(resolve_payload("ping", Some("{oops")).is_err());
    }
}
