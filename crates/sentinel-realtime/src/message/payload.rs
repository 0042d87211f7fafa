//! Read-only views over untyped payloads, for rendering.
//!
//! Handlers always receive the payload unmodified; these helpers only
//! interpret it. Two result shapes are seen in practice: dashboard rows
//! (`name`, `status`, `duration`) and runner results (`Package`, `Test`,
//! `Passed`, `Elapsed` in seconds).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of a test result batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResultRow {
    /// Test name.
    pub name: String,
    /// Package or suite, if reported.
    pub package: Option<String>,
    /// `passed`, `failed`, `skipped`, ...
    pub status: String,
    /// Human-readable duration, if reported.
    pub duration: Option<String>,
    /// Failure message, if any.
    pub error: Option<String>,
}

impl TestResultRow {
    /// Interpret a single result object. Returns `None` for non-objects.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        let name = field_str(obj, &["name", "test", "Test"]).unwrap_or_else(|| "-".to_string());
        let package = field_str(obj, &["package", "Package"]);
        let status = field_str(obj, &["status", "Status"])
            .or_else(|| {
                field(obj, &["passed", "Passed"])
                    .and_then(Value::as_bool)
                    .map(|passed| if passed { "passed" } else { "failed" }.to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());
        let duration = field_str(obj, &["duration", "Duration"]).or_else(|| {
            field(obj, &["elapsed", "Elapsed"])
                .and_then(Value::as_f64)
                .map(|secs| format!("{:.0}ms", secs * 1000.0))
        });
        let error = field_str(obj, &["error", "Error"]).filter(|e| !e.is_empty());

        Some(Self {
            name,
            package,
            status,
            duration,
            error,
        })
    }

    /// Interpret a `test_results` payload: an array of results, or a single result.
    pub fn rows(payload: &Value) -> Vec<Self> {
        match payload {
            Value::Array(items) => items.iter().filter_map(Self::from_value).collect(),
            other => Self::from_value(other).into_iter().collect(),
        }
    }

    /// Whether the row reports a failure.
    pub fn is_failure(&self) -> bool {
        matches!(self.status.as_str(), "failed" | "fail" | "error")
    }
}

/// A notification as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationView {
    /// `info`, `success`, `warning`, `error`, ...
    pub level: String,
    /// Optional title.
    pub title: Option<String>,
    /// Body text.
    pub message: String,
}

impl NotificationView {
    /// Interpret a `notification` payload. Plain strings become info messages.
    pub fn from_value(payload: &Value) -> Self {
        match payload {
            Value::String(s) => Self {
                level: "info".to_string(),
                title: None,
                message: s.clone(),
            },
            Value::Object(obj) => Self {
                level: field_str(obj, &["type", "level", "severity"])
                    .unwrap_or_else(|| "info".to_string()),
                title: field_str(obj, &["title"]),
                message: field_str(obj, &["message", "body", "text"]).unwrap_or_default(),
            },
            other => Self {
                level: "info".to_string(),
                title: None,
                message: other.to_string(),
            },
        }
    }
}

fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k))
}

fn field_str(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    field(obj, keys).and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}
