use std::fmt;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Number of events buffered per subscriber before the oldest are dropped
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Observable things that happen while supervising a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisionEvent {
    /// The target was found absent; a launch follows
    NotRunning { identifier: String },
    /// The platform accepted the launch request
    Launched { identifier: String },
    /// The launch attempt failed; the next tick re-evaluates
    LaunchFailed {
        identifier: String,
        kind: &'static str,
        message: String,
    },
    /// Running applications could not be listed; treated as not running
    QueryUnavailable { identifier: String, reason: String },
    /// A tick ended abnormally (the platform panicked); the loop keeps going
    TickFailed { identifier: String, reason: String },
    /// Supervision ended through the handle
    Stopped { identifier: String },
}

impl SupervisionEvent {
    pub fn identifier(&self) -> &str {
        match self {
            SupervisionEvent::NotRunning { identifier }
            | SupervisionEvent::Launched { identifier }
            | SupervisionEvent::LaunchFailed { identifier, .. }
            | SupervisionEvent::QueryUnavailable { identifier, .. }
            | SupervisionEvent::TickFailed { identifier, .. }
            | SupervisionEvent::Stopped { identifier } => identifier,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            SupervisionEvent::LaunchFailed { .. }
                | SupervisionEvent::QueryUnavailable { .. }
                | SupervisionEvent::TickFailed { .. }
        )
    }
}

impl fmt::Display for SupervisionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisionEvent::NotRunning { identifier } => {
                write!(f, "{identifier} is not running, starting it")
            }
            SupervisionEvent::Launched { identifier } => write!(f, "{identifier} launched"),
            SupervisionEvent::LaunchFailed {
                identifier,
                kind,
                message,
            } => write!(f, "launch of {identifier} failed ({kind}): {message}"),
            SupervisionEvent::QueryUnavailable { identifier, reason } => write!(
                f,
                "cannot list running applications while checking {identifier}: {reason}"
            ),
            SupervisionEvent::TickFailed { identifier, reason } => {
                write!(f, "tick for {identifier} failed: {reason}")
            }
            SupervisionEvent::Stopped { identifier } => {
                write!(f, "supervision of {identifier} stopped")
            }
        }
    }
}

/// Logs every event and fans it out to subscribers
#[derive(Debug, Clone)]
pub(crate) struct EventPublisher {
    sender: broadcast::Sender<SupervisionEvent>,
}

impl EventPublisher {
    pub(crate) fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<SupervisionEvent> {
        self.sender.subscribe()
    }

    pub(crate) fn publish(&self, event: SupervisionEvent) {
        match &event {
            SupervisionEvent::LaunchFailed { identifier, kind, .. } => {
                error!(identifier = %identifier, kind = %kind, "{event}")
            }
            SupervisionEvent::TickFailed { identifier, .. } => {
                error!(identifier = %identifier, "{event}")
            }
            SupervisionEvent::QueryUnavailable { identifier, .. } => {
                warn!(identifier = %identifier, "{event}")
            }
            other => info!(identifier = %other.identifier(), "{event}"),
        }

        // No subscribers is fine: the log line above is the primary output
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_display() {
        let event = SupervisionEvent::NotRunning {
            identifier: "com.example.App".to_string(),
        };
        assert_eq!(event.to_string(), "com.example.App is not running, starting it");

        let event = SupervisionEvent::Launched {
            identifier: "com.example.App".to_string(),
        };
        assert_eq!(event.to_string(), "com.example.App launched");
    }

    #[test]
    fn test_event_categorization() {
        let failed = SupervisionEvent::LaunchFailed {
            identifier: "a".to_string(),
            kind: "not_found",
            message: "Application not found: a".to_string(),
        };
        assert!(failed.is_error());
        assert_eq!(failed.identifier(), "a");

        let panicked = SupervisionEvent::TickFailed {
            identifier: "a".to_string(),
            reason: "panicked: boom".to_string(),
        };
        assert!(panicked.is_error());
        assert_eq!(panicked.to_string(), "tick for a failed: panicked: boom");

        assert!(!SupervisionEvent::Stopped { identifier: "a".to_string() }.is_error());
    }

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let publisher = EventPublisher::new();
        let mut events = publisher.subscribe();

        publisher.publish(SupervisionEvent::Launched {
            identifier: "a".to_string(),
        });

        assert_eq!(
            events.recv().await.unwrap(),
            SupervisionEvent::Launched {
                identifier: "a".to_string()
            }
        );
    }

    #[test]
    fn test_publish_without_subscribers() {
        let publisher = EventPublisher::new();
        publisher.publish(SupervisionEvent::Stopped {
            identifier: "a".to_string(),
        });
    }
}
