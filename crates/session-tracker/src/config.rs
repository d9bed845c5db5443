//! Detection loop configuration

use std::time::Duration;

use attention::{DetectorConfig, ScoringConfig};
use camera_capture::CameraConfig;
use serde::{Deserialize, Serialize};

use crate::MonitorError;

/// Slowest accepted cadence: one evaluation every 100 s
pub const MIN_EVALUATIONS_PER_SECOND: f64 = 0.01;

/// Longest accepted wait between read retries
pub const MAX_RETRY_INTERVAL_MS: u64 = 60_000;

/// Longest accepted progress report period
pub const MAX_REPORT_INTERVAL_SECS: u64 = 3_600;

/// Monitor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Capture device settings
    pub camera: CameraConfig,

    /// Target frame evaluations per second (default: 10)
    pub evaluations_per_second: f64,

    /// Wait before retrying when no frame is ready (milliseconds)
    pub retry_interval_ms: u64,

    /// Consecutive "no frame" reads before the device is declared lost
    pub max_consecutive_failures: u32,

    /// Period of progress reports while running (seconds)
    pub report_interval_secs: u64,

    /// Score thresholds
    pub scoring: ScoringConfig,

    /// Built-in detector parameters
    pub detectors: DetectorConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            evaluations_per_second: 10.0,
            retry_interval_ms: 100,
            max_consecutive_failures: 50,
            report_interval_secs: 2,
            scoring: ScoringConfig::default(),
            detectors: DetectorConfig::default(),
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), MonitorError> {
        if !(self.evaluations_per_second.is_finite()
            && self.evaluations_per_second >= MIN_EVALUATIONS_PER_SECOND)
        {
            return Err(MonitorError::Config(format!(
                "evaluations_per_second must be finite and at least {}, got {}",
                MIN_EVALUATIONS_PER_SECOND, self.evaluations_per_second
            )));
        }
        if self.retry_interval_ms > MAX_RETRY_INTERVAL_MS {
            return Err(MonitorError::Config(format!(
                "retry_interval_ms must be at most {}, got {}",
                MAX_RETRY_INTERVAL_MS, self.retry_interval_ms
            )));
        }
        if self.report_interval_secs > MAX_REPORT_INTERVAL_SECS {
            return Err(MonitorError::Config(format!(
                "report_interval_secs must be at most {}, got {}",
                MAX_REPORT_INTERVAL_SECS, self.report_interval_secs
            )));
        }
        if self.max_consecutive_failures == 0 {
            return Err(MonitorError::Config("max_consecutive_failures must be at least 1".into()));
        }
        if self.scoring.center_near > self.scoring.center_far {
            return Err(MonitorError::Config("center_near must not exceed center_far".into()));
        }
        Ok(())
    }

    /// Time between evaluations
    pub fn evaluation_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.evaluations_per_second)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.evaluation_interval(), Duration::from_millis(100));
        assert_eq!(config.retry_interval(), Duration::from_millis(100));
        assert_eq!(config.scoring.attentive_threshold, 60);
    }

    #[test]
    fn test_invalid_rates_rejected() {
        for rate in [0.0, -1.0, 1e-20, 0.009, f64::NAN, f64::INFINITY] {
            let config = MonitorConfig {
                evaluations_per_second: rate,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(MonitorError::Config(_))));
        }

        let config = MonitorConfig {
            max_consecutive_failures: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_interval_bounds() {
        let slowest = MonitorConfig {
            evaluations_per_second: MIN_EVALUATIONS_PER_SECOND,
            retry_interval_ms: MAX_RETRY_INTERVAL_MS,
            report_interval_secs: MAX_REPORT_INTERVAL_SECS,
            ..Default::default()
        };
        assert!(slowest.validate().is_ok());
        assert!((slowest.evaluation_interval().as_secs_f64() - 100.0).abs() < 1e-6);

        let config = MonitorConfig {
            retry_interval_ms: u64::MAX,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(MonitorError::Config(_))));

        let config = MonitorConfig {
            report_interval_secs: u64::MAX,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(MonitorError::Config(_))));
    }
}
