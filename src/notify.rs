// ABOUTME: Operator-facing notifications emitted by supervisors and plan operations
// ABOUTME: Sinks forward them to tracing or to a channel read by the front end

use std::fmt;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Timeout(String),
    Error(String),
}

impl Notification {
    pub fn message(&self) -> &str {
        match self {
            Notification::Success(msg) | Notification::Timeout(msg) | Notification::Error(msg) => {
                msg
            }
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Notification::Success(msg) => write!(f, "[success] {}", msg),
            Notification::Timeout(msg) => write!(f, "[timeout] {}", msg),
            Notification::Error(msg) => write!(f, "[error] {}", msg),
        }
    }
}

pub trait AlertSink: Send + Sync {
    fn alert(&self, notification: Notification);
}

/// Writes every notification to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn alert(&self, notification: Notification) {
        match &notification {
            Notification::Success(msg) => info!(message = %msg, "Operation succeeded"),
            Notification::Timeout(msg) => warn!(message = %msg, "Operation timed out"),
            Notification::Error(msg) => error!(message = %msg, "Operation failed"),
        }
    }
}

/// Forwards notifications to a receiver; drops them once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelAlertSink {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelAlertSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl AlertSink for ChannelAlertSink {
    fn alert(&self, notification: Notification) {
        let _ = self.tx.send(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_sink_delivers_in_order() {
        let (sink, mut rx) = ChannelAlertSink::new();
        sink.alert(Notification::Error("Failed to update plan".to_string()));
        sink.alert(Notification::Success("done".to_string()));

        assert_eq!(
            rx.try_recv().ok(),
            Some(Notification::Error("Failed to update plan".to_string()))
        );
        assert_eq!(rx.try_recv().ok().map(|n| n.to_string()), Some("[success] done".to_string()));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_tracing_sink_accepts_every_kind() {
        let sink: &dyn AlertSink = &TracingAlertSink;
        for notification in [
            Notification::Success("Successfully removed plan \"p1\"!".to_string()),
            Notification::Timeout("Timed out during plan close".to_string()),
            Notification::Error("Plan delete request failed".to_string()),
        ] {
            assert!(!notification.message().is_empty());
            sink.alert(notification);
        }
    }

    #[test]
    fn test_channel_sink_survives_closed_receiver() {
        let (sink, rx) = ChannelAlertSink::new();
        drop(rx);
        sink.alert(Notification::Timeout("Plan status timed out".to_string()));
    }
}
