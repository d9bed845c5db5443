//! Live status publishing (single writer, many readers)

use attention::{FrameScore, StatusLabel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::aggregator::AggregateSnapshot;

/// Latest known per-frame result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveStatus {
    pub is_attentive: bool,
    /// Displayed score (0-100)
    pub attention_percentage: u8,
    pub status: StatusLabel,
    pub running: bool,
    pub last_update: Option<DateTime<Utc>>,
    /// Why the last run ended on its own, if it did
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<String>,
}

impl Default for LiveStatus {
    fn default() -> Self {
        Self {
            is_attentive: false,
            attention_percentage: 0,
            status: StatusLabel::Unknown,
            running: false,
            last_update: None,
            fault: None,
        }
    }
}

impl LiveStatus {
    pub fn starting(at: DateTime<Utc>) -> Self {
        Self {
            status: StatusLabel::Starting,
            running: true,
            last_update: Some(at),
            ..Default::default()
        }
    }

    pub fn from_score(score: &FrameScore, at: DateTime<Utc>) -> Self {
        Self {
            is_attentive: score.is_attentive,
            attention_percentage: score.score,
            status: score.label(),
            running: true,
            last_update: Some(at),
            fault: None,
        }
    }

    pub fn stopped(at: DateTime<Utc>, fault: Option<String>) -> Self {
        Self {
            status: StatusLabel::Stopped,
            last_update: Some(at),
            fault,
            ..Default::default()
        }
    }
}

/// Status and aggregate, always published together
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub status: LiveStatus,
    pub aggregate: AggregateSnapshot,
}

/// Holder of the latest snapshot.
///
/// Every publish replaces the whole record; readers clone it out and never
/// observe a partially written value.
#[derive(Debug)]
pub struct SessionStatusPublisher {
    tx: watch::Sender<StatusSnapshot>,
}

impl SessionStatusPublisher {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(StatusSnapshot::default());
        Self { tx }
    }

    /// Overwrite the current snapshot
    pub fn publish(&self, snapshot: StatusSnapshot) {
        self.tx.send_replace(snapshot);
    }

    /// Latest snapshot, or the neutral initial one
    pub fn read(&self) -> StatusSnapshot {
        self.tx.borrow().clone()
    }

    /// Receive change notifications
    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.tx.subscribe()
    }
}

impl Default for SessionStatusPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn snapshot(n: usize) -> StatusSnapshot {
        StatusSnapshot {
            status: LiveStatus {
                attention_percentage: (n % 101) as u8,
                running: true,
                status: StatusLabel::PayingAttention,
                ..Default::default()
            },
            aggregate: AggregateSnapshot {
                focused_secs: n as f64,
                total_secs: n as f64,
                sample_count: n,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_initial_value_is_neutral() {
        let publisher = SessionStatusPublisher::new();
        let read = publisher.read();
        assert_eq!(read.status.status, StatusLabel::Unknown);
        assert!(!read.status.running);
        assert_eq!(read.aggregate.sample_count, 0);
    }

    #[test]
    fn test_latest_value_wins() {
        let publisher = SessionStatusPublisher::new();
        publisher.publish(snapshot(1));
        publisher.publish(snapshot(2));
        assert_eq!(publisher.read(), snapshot(2));
    }

    #[test]
    fn test_concurrent_readers_never_see_torn_values() {
        let publisher = Arc::new(SessionStatusPublisher::new());

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let publisher = Arc::clone(&publisher);
                thread::spawn(move || {
                    for _ in 0..2_000 {
                        let read = publisher.read();
                        let n = read.aggregate.sample_count;
                        assert_eq!(read.aggregate.focused_secs, n as f64);
                        assert_eq!(read.status.attention_percentage, (n % 101) as u8);
                    }
                })
            })
            .collect();

        for n in 1..2_000 {
            publisher.publish(snapshot(n));
        }
        for reader in readers {
            reader.join().unwrap();
        }
    }

    #[tokio::test]
    async fn test_subscribers_notified() {
        let publisher = SessionStatusPublisher::new();
        let mut rx = publisher.subscribe();
        publisher.publish(snapshot(7));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().aggregate.sample_count, 7);
    }

    #[test]
    fn test_status_constructors() {
        let now = Utc::now();
        let starting = LiveStatus::starting(now);
        assert!(starting.running);
        assert_eq!(starting.status, StatusLabel::Starting);

        let stopped = LiveStatus::stopped(now, Some("Camera lost".into()));
        assert!(!stopped.running);
        assert_eq!(stopped.attention_percentage, 0);
        assert_eq!(stopped.status, StatusLabel::Stopped);
        assert_eq!(stopped.fault.as_deref(), Some("Camera lost"));
    }
}
