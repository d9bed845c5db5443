//! Attention monitor: detection loop lifecycle and status access

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use attention::FrameScorer;
use camera_capture::{CameraProvider, FrameSource, VideoFrame};
use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::aggregator::{AttentionAggregator, AttentionSample};
use crate::clock::{Clock, SystemClock};
use crate::config::MonitorConfig;
use crate::publisher::{LiveStatus, SessionStatusPublisher, StatusSnapshot};
use crate::report::{EndReason, SessionRecord, SessionReport, SessionSummary, SummarySink};
use crate::MonitorError;

/// Longest uninterrupted sleep inside the loop, bounding stop latency
const STOP_POLL: Duration = Duration::from_millis(20);

/// Owns one detection run at a time and exposes its status.
///
/// Each monitor is an independent instance; hosts construct one and share
/// it (e.g. behind an `Arc`) with their request handlers.
pub struct AttentionMonitor {
    config: MonitorConfig,
    camera: Arc<dyn CameraProvider>,
    scorer: Arc<FrameScorer>,
    clock: Arc<dyn Clock>,
    publisher: Arc<SessionStatusPublisher>,
    sink: Option<Arc<dyn SummarySink>>,
    active: Mutex<Option<ActiveRun>>,
}

struct ActiveRun {
    session_id: Uuid,
    started_at: DateTime<Utc>,
    /// Set by `stop()`, or by the loop itself when the camera is lost
    stop: Arc<AtomicBool>,
    task: JoinHandle<RunOutcome>,
}

struct RunOutcome {
    aggregator: AttentionAggregator,
    end: EndReason,
}

impl AttentionMonitor {
    /// Create a new monitor
    pub fn new(config: MonitorConfig, camera: Arc<dyn CameraProvider>, scorer: FrameScorer) -> Self {
        Self {
            config,
            camera,
            scorer: Arc::new(scorer),
            clock: Arc::new(SystemClock),
            publisher: Arc::new(SessionStatusPublisher::new()),
            sink: None,
            active: Mutex::new(None),
        }
    }

    /// Use a different time source for sample timestamps
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Hand finished session records to `sink`
    pub fn with_sink(mut self, sink: Arc<dyn SummarySink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Shared handle for readers that want change notifications
    pub fn publisher(&self) -> Arc<SessionStatusPublisher> {
        Arc::clone(&self.publisher)
    }

    /// Start detection.
    ///
    /// Returns the id of the active session; calling it while a run is
    /// active returns that run's id without side effects.
    pub async fn start(&self) -> Result<Uuid, MonitorError> {
        let mut active = self.active.lock().await;

        if let Some(run) = active.as_ref() {
            if !run.task.is_finished() && !run.stop.load(Ordering::Acquire) {
                debug!("Detection already running ({})", run.session_id);
                return Ok(run.session_id);
            }
        }
        // A run that ended on its own is reaped before a new one begins
        if let Some(finished) = active.take() {
            self.finish(finished).await;
        }

        self.config.validate()?;

        let source = self.camera.open(&self.config.camera).map_err(|e| {
            warn!("Could not open camera {}: {}", self.config.camera.index, e);
            MonitorError::DeviceUnavailable(e.to_string())
        })?;

        let session_id = Uuid::new_v4();
        let started_at = self.clock.wall();
        self.publisher.publish(StatusSnapshot {
            status: LiveStatus::starting(started_at),
            aggregate: Default::default(),
        });

        let stop = Arc::new(AtomicBool::new(false));
        let detection = DetectionLoop {
            source,
            scorer: Arc::clone(&self.scorer),
            clock: Arc::clone(&self.clock),
            publisher: Arc::clone(&self.publisher),
            stop: Arc::clone(&stop),
            interval: self.config.evaluation_interval(),
            retry_interval: self.config.retry_interval(),
            max_failures: self.config.max_consecutive_failures,
        };
        let task = tokio::task::spawn_blocking(move || detection.run());

        info!(
            "Attention detection started (session {}, {:.1} evaluations/s)",
            session_id, self.config.evaluations_per_second
        );

        *active = Some(ActiveRun {
            session_id,
            started_at,
            stop,
            task,
        });
        Ok(session_id)
    }

    /// Stop detection.
    ///
    /// Signals the loop, waits for it to release the camera, and publishes
    /// the stopped status. Returns the finished session, or `None` when
    /// nothing was running.
    pub async fn stop(&self) -> Option<SessionRecord> {
        let mut active = self.active.lock().await;
        let run = active.take()?;
        run.stop.store(true, Ordering::Release);
        Some(self.finish(run).await)
    }

    async fn finish(&self, run: ActiveRun) -> SessionRecord {
        let ActiveRun {
            session_id,
            started_at,
            task,
            ..
        } = run;

        let (aggregate, end) = match task.await {
            Ok(outcome) => (outcome.aggregator.summarize(), outcome.end),
            Err(e) => {
                error!("Detection loop aborted: {}", e);
                (self.publisher.read().aggregate, EndReason::Aborted(e.to_string()))
            }
        };

        let fault = match &end {
            EndReason::Stopped => None,
            EndReason::DeviceLost(reason) => Some(MonitorError::DeviceLost(reason.clone()).to_string()),
            EndReason::Aborted(reason) => Some(reason.clone()),
        };

        let ended_at = self.clock.wall();
        self.publisher.publish(StatusSnapshot {
            status: LiveStatus::stopped(ended_at, fault),
            aggregate,
        });

        info!(
            "Attention detection stopped (session {})\n{}",
            session_id,
            SessionReport { aggregate: &aggregate }
        );

        let record = SessionRecord {
            session_id,
            started_at,
            ended_at,
            end_reason: end,
            summary: SessionSummary::from(&aggregate),
        };
        if let Some(sink) = &self.sink {
            sink.deliver(&record);
        }
        record
    }

    /// Latest live status
    pub fn live_status(&self) -> LiveStatus {
        self.publisher.read().status
    }

    /// Totals for the current run, or the last finished one
    pub fn session_summary(&self) -> SessionSummary {
        SessionSummary::from(&self.publisher.read().aggregate)
    }

    /// Status and aggregate from the same publish
    pub fn snapshot(&self) -> StatusSnapshot {
        self.publisher.read()
    }

    pub fn is_running(&self) -> bool {
        self.publisher.read().status.running
    }
}

impl Drop for AttentionMonitor {
    /// A dropped monitor signals its loop, which releases the camera on its
    /// next check. No record is delivered for that run.
    fn drop(&mut self) {
        if let Some(run) = self.active.get_mut().take() {
            run.stop.store(true, Ordering::Release);
            if !run.task.is_finished() {
                warn!("Monitor dropped with session {} active; stopping detection", run.session_id);
            }
        }
    }
}

/// State owned by the background task for one run
struct DetectionLoop {
    source: Box<dyn FrameSource>,
    scorer: Arc<FrameScorer>,
    clock: Arc<dyn Clock>,
    publisher: Arc<SessionStatusPublisher>,
    stop: Arc<AtomicBool>,
    interval: Duration,
    retry_interval: Duration,
    max_failures: u32,
}

impl DetectionLoop {
    fn run(mut self) -> RunOutcome {
        let mut aggregator = AttentionAggregator::new();
        aggregator.reset();
        let mut failures = 0u32;

        let end = loop {
            if self.stopping() {
                break EndReason::Stopped;
            }
            let cycle_start = Instant::now();

            match self.source.read_frame() {
                Ok(frame) => {
                    failures = 0;
                    self.evaluate(&frame, &mut aggregator);
                }
                Err(e) if e.is_transient() => {
                    failures += 1;
                    counter!("attention_read_retries_total").increment(1);
                    if failures >= self.max_failures {
                        break EndReason::DeviceLost(format!("{} consecutive reads without a frame", failures));
                    }
                    debug!("No frame ready (attempt {})", failures);
                    self.pause(self.retry_interval);
                    continue;
                }
                Err(e) => break EndReason::DeviceLost(e.to_string()),
            }

            if let Some(remaining) = self.interval.checked_sub(cycle_start.elapsed()) {
                self.pause(remaining);
            }
        };

        self.source.release();

        if let EndReason::DeviceLost(reason) = &end {
            self.stop.store(true, Ordering::Release);
            let err = MonitorError::DeviceLost(reason.clone());
            error!("{}", err);
            self.publisher.publish(StatusSnapshot {
                status: LiveStatus::stopped(self.clock.wall(), Some(err.to_string())),
                aggregate: aggregator.summarize(),
            });
        }

        info!(
            "Detection loop finished after {} samples",
            aggregator.accumulator().score_history().len()
        );
        RunOutcome { aggregator, end }
    }

    /// Score one frame and publish the result. Failed frames are skipped.
    fn evaluate(&self, frame: &VideoFrame, aggregator: &mut AttentionAggregator) {
        let result = match self.scorer.score(frame) {
            Ok(result) => result,
            Err(e) => {
                counter!("attention_detection_failures_total").increment(1);
                warn!("Skipping frame {}: {}", frame.sequence, MonitorError::from(e));
                return;
            }
        };

        let sample = AttentionSample {
            at: self.clock.now(),
            is_attentive: result.is_attentive,
            score: result.score,
        };
        if let Err(e) = aggregator.record(&sample) {
            error!("Dropping sample for frame {}: {}", frame.sequence, MonitorError::from(e));
            return;
        }

        counter!("attention_frames_scored_total").increment(1);
        gauge!("attention_score").set(result.score as f64);

        self.publisher.publish(StatusSnapshot {
            status: LiveStatus::from_score(&result, self.clock.wall()),
            aggregate: aggregator.summarize(),
        });
    }

    fn stopping(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Sleep for `duration`, waking early when a stop is requested
    fn pause(&self, duration: Duration) {
        let deadline = Instant::now() + duration;
        while !self.stopping() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep((deadline - now).min(STOP_POLL));
        }
    }
}
