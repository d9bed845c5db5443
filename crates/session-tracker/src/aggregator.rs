//! Attention aggregation: per-frame samples to focused/distracted durations

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One scored frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttentionSample {
    /// Monotonic capture time
    pub at: Instant,
    pub is_attentive: bool,
    /// Displayed score (0-100)
    pub score: u8,
}

/// Aggregation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    /// A sample arrived with a timestamp before the previous one
    #[error("Sample timestamp is {behind:?} before the previous sample")]
    InvalidOrdering { behind: Duration },
}

/// Running totals for one detection run.
///
/// `total_secs` is always derived from the two parts, never tracked on its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionAccumulator {
    focused_secs: f64,
    distracted_secs: f64,
    score_history: Vec<u8>,
    score_sum: u64,
    last_sample_at: Option<Instant>,
}

impl SessionAccumulator {
    pub fn focused_secs(&self) -> f64 {
        self.focused_secs
    }

    pub fn distracted_secs(&self) -> f64 {
        self.distracted_secs
    }

    pub fn total_secs(&self) -> f64 {
        self.focused_secs + self.distracted_secs
    }

    /// Scores in arrival order
    pub fn score_history(&self) -> &[u8] {
        &self.score_history
    }

    pub fn last_sample_at(&self) -> Option<Instant> {
        self.last_sample_at
    }
}

/// Immutable view of an accumulator
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateSnapshot {
    pub focused_secs: f64,
    pub distracted_secs: f64,
    pub total_secs: f64,
    /// Mean of all recorded scores, 0 when nothing was recorded
    pub average_score: f64,
    pub sample_count: usize,
}

impl AggregateSnapshot {
    /// Focused share of total time, in percent
    pub fn focused_percentage(&self) -> f64 {
        if self.total_secs > 0.0 {
            self.focused_secs / self.total_secs * 100.0
        } else {
            0.0
        }
    }

    /// Distracted share of total time, in percent
    pub fn distracted_percentage(&self) -> f64 {
        if self.total_secs > 0.0 {
            self.distracted_secs / self.total_secs * 100.0
        } else {
            0.0
        }
    }
}

/// Converts a stream of samples into durations and an average score.
///
/// Each sample's interval since the previous sample is credited to focused
/// or distracted time according to that sample's decision. The first sample
/// only sets the baseline time.
#[derive(Debug, Clone, Default)]
pub struct AttentionAggregator {
    acc: SessionAccumulator,
}

impl AttentionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all state. Called once when a detection run starts.
    pub fn reset(&mut self) {
        self.acc = SessionAccumulator::default();
    }

    /// Record one sample.
    ///
    /// An out-of-order timestamp is rejected and leaves the state untouched.
    pub fn record(&mut self, sample: &AttentionSample) -> Result<(), AggregateError> {
        if let Some(last) = self.acc.last_sample_at {
            let delta = sample
                .at
                .checked_duration_since(last)
                .ok_or_else(|| AggregateError::InvalidOrdering {
                    behind: last.duration_since(sample.at),
                })?
                .as_secs_f64();

            if sample.is_attentive {
                self.acc.focused_secs += delta;
            } else {
                self.acc.distracted_secs += delta;
            }
        }

        self.acc.score_history.push(sample.score);
        self.acc.score_sum += sample.score as u64;
        self.acc.last_sample_at = Some(sample.at);
        Ok(())
    }

    pub fn accumulator(&self) -> &SessionAccumulator {
        &self.acc
    }

    pub fn summarize(&self) -> AggregateSnapshot {
        let sample_count = self.acc.score_history.len();
        let average_score = if sample_count == 0 {
            0.0
        } else {
            self.acc.score_sum as f64 / sample_count as f64
        };

        AggregateSnapshot {
            focused_secs: self.acc.focused_secs,
            distracted_secs: self.acc.distracted_secs,
            total_secs: self.acc.total_secs(),
            average_score,
            sample_count,
        }
    }
}
