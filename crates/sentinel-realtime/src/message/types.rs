//! Message type tags understood by the router.

use std::fmt;

/// Tag of test result batches.
pub const TEST_RESULTS: &str = "test_results";
/// Tag of metrics snapshots. Note the hyphen.
pub const METRICS_UPDATE: &str = "metrics-update";
/// Tag of user-facing notifications.
pub const NOTIFICATION: &str = "notification";
/// Tag of heartbeat acknowledgments.
pub const PONG: &str = "pong";

/// Inbound message kinds with a dedicated route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// `test_results`
    TestResults,
    /// `metrics-update`
    MetricsUpdate,
    /// `notification`
    Notification,
    /// `pong`
    Pong,
}

impl MessageKind {
    /// Match a wire tag exactly.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            TEST_RESULTS => Some(Self::TestResults),
            METRICS_UPDATE => Some(Self::MetricsUpdate),
            NOTIFICATION => Some(Self::Notification),
            PONG => Some(Self::Pong),
            _ => None,
        }
    }

    /// The wire tag.
    pub fn tag(self) -> &'static str {
        match self {
            Self::TestResults => TEST_RESULTS,
            Self::MetricsUpdate => METRICS_UPDATE,
            Self::Notification => NOTIFICATION,
            Self::Pong => PONG,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
