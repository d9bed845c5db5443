//! Session summaries, records, and human-readable reports

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregator::AggregateSnapshot;
use crate::publisher::LiveStatus;

/// Session totals in the shape hosts hand to persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub focused_seconds: u64,
    pub distracted_seconds: u64,
    #[serde(rename = "avg_attention")]
    pub average_attention: f64,
    #[serde(rename = "samples_count")]
    pub sample_count: usize,
}

impl From<&AggregateSnapshot> for SessionSummary {
    fn from(aggregate: &AggregateSnapshot) -> Self {
        Self {
            focused_seconds: aggregate.focused_secs as u64,
            distracted_seconds: aggregate.distracted_secs as u64,
            average_attention: aggregate.average_score,
            sample_count: aggregate.sample_count,
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum EndReason {
    Stopped,
    DeviceLost(String),
    Aborted(String),
}

/// Completed run, handed to a `SummarySink` at stop time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub end_reason: EndReason,
    pub summary: SessionSummary,
}

/// Receives finished session records (e.g. a persistence layer)
pub trait SummarySink: Send + Sync {
    fn deliver(&self, record: &SessionRecord);
}

/// "Xm Ys" with both parts truncated
pub fn format_duration(secs: f64) -> String {
    let whole = secs.max(0.0) as u64;
    format!("{}m {}s", whole / 60, whole % 60)
}

/// One-line periodic progress report
pub struct ProgressReport<'a> {
    pub status: &'a LiveStatus,
    pub aggregate: &'a AggregateSnapshot,
}

impl fmt::Display for ProgressReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Current Attention: {}% | Status: {} | Time Focused: {} | Time Distracted: {}",
            self.status.attention_percentage,
            self.status.status,
            format_duration(self.aggregate.focused_secs),
            format_duration(self.aggregate.distracted_secs),
        )
    }
}

/// End-of-session report
pub struct SessionReport<'a> {
    pub aggregate: &'a AggregateSnapshot,
}

impl fmt::Display for SessionReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = self.aggregate;
        if a.total_secs <= 0.0 {
            return write!(f, "No data collected.");
        }
        writeln!(f, "Average Attention Percentage: {:.1}%", a.average_score)?;
        writeln!(f, "Total Detection Time: {}", format_duration(a.total_secs))?;
        writeln!(
            f,
            "Time Focused: {} ({:.1}%)",
            format_duration(a.focused_secs),
            a.focused_percentage()
        )?;
        write!(
            f,
            "Time Distracted: {} ({:.1}%)",
            format_duration(a.distracted_secs),
            a.distracted_percentage()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attention::StatusLabel;

    fn aggregate(focused: f64, distracted: f64) -> AggregateSnapshot {
        AggregateSnapshot {
            focused_secs: focused,
            distracted_secs: distracted,
            total_secs: focused + distracted,
            average_score: 72.4,
            sample_count: 40,
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "0m 0s");
        assert_eq!(format_duration(59.9), "0m 59s");
        assert_eq!(format_duration(125.4), "2m 5s");
        assert_eq!(format_duration(-3.0), "0m 0s");
    }

    #[test]
    fn test_summary_truncates_seconds() {
        let summary = SessionSummary::from(&aggregate(65.9, 4.2));
        assert_eq!(summary.focused_seconds, 65);
        assert_eq!(summary.distracted_seconds, 4);
        assert_eq!(summary.average_attention, 72.4);
        assert_eq!(summary.sample_count, 40);
    }

    #[test]
    fn test_summary_field_names() {
        let json = serde_json::to_value(SessionSummary::from(&aggregate(10.0, 5.0))).unwrap();
        assert_eq!(json["focused_seconds"], 10);
        assert_eq!(json["distracted_seconds"], 5);
        assert_eq!(json["avg_attention"], 72.4);
        assert_eq!(json["samples_count"], 40);
    }

    #[test]
    fn test_progress_report() {
        let status = LiveStatus {
            attention_percentage: 85,
            status: StatusLabel::PayingAttention,
            running: true,
            ..Default::default()
        };
        let line = ProgressReport {
            status: &status,
            aggregate: &aggregate(65.0, 3.0),
        }
        .to_string();
        assert_eq!(
            line,
            "Current Attention: 85% | Status: Paying Attention | Time Focused: 1m 5s | Time Distracted: 0m 3s"
        );
    }

    #[test]
    fn test_session_report() {
        let report = SessionReport {
            aggregate: &aggregate(75.0, 25.0),
        }
        .to_string();
        assert!(report.contains("Average Attention Percentage: 72.4%"));
        assert!(report.contains("Total Detection Time: 1m 40s"));
        assert!(report.contains("Time Focused: 1m 15s (75.0%)"));
        assert!(report.contains("Time Distracted: 0m 25s (25.0%)"));

        let empty = SessionReport {
            aggregate: &AggregateSnapshot::default(),
        };
        assert_eq!(empty.to_string(), "No data collected.");
    }

    #[test]
    fn test_end_reason_serialization() {
        let json = serde_json::to_value(EndReason::DeviceLost("unplugged".into())).unwrap();
        assert_eq!(json["kind"], "device_lost");
        assert_eq!(json["reason"], "unplugged");
    }
}
