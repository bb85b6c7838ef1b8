//! Live-view support: latest-wins frame hand-off and a periodic analyzer
//!
//! A camera callback posts frames into a [`FrameMailbox`] as fast as they
//! arrive; the [`LiveAnalyzer`] worker wakes on a fixed interval, takes
//! whatever frame is newest and analyzes it. Frames posted in between are
//! overwritten, never queued, so feedback always describes a recent frame.

use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

use crate::analyzer::QualityAnalyzer;
use crate::config::AnalyzerConfig;
use crate::constants::live::ANALYSIS_INTERVAL;
use crate::error::Result;
use crate::report::QualityReport;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // a panicking writer cannot leave an Option half-written
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Single-slot buffer where a new value replaces any unread one
#[derive(Debug)]
pub struct FrameMailbox<T> {
    slot: Mutex<Option<T>>,
}

impl<T> Default for FrameMailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FrameMailbox<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Store `value`; returns true if an unread value was dropped
    pub fn post(&self, value: T) -> bool {
        lock(&self.slot).replace(value).is_some()
    }

    /// Remove and return the current value
    pub fn take(&self) -> Option<T> {
        lock(&self.slot).take()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.slot).is_none()
    }
}

impl<T: Clone> FrameMailbox<T> {
    /// Copy the current value, leaving it in place
    pub fn peek(&self) -> Option<T> {
        lock(&self.slot).clone()
    }
}

/// Outcome of one live analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveOutcome {
    Report(QualityReport),
    Error(String),
}

/// Latest published live result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveFeedback {
    /// Increments with every analysis the worker completes
    pub sequence: u64,
    pub outcome: LiveOutcome,
}

impl LiveFeedback {
    pub fn report(&self) -> Option<&QualityReport> {
        match &self.outcome {
            LiveOutcome::Report(report) => Some(report),
            LiveOutcome::Error(_) => None,
        }
    }

    /// Overlay text: the first `count` feedback messages, or the error
    pub fn overlay_text(&self, count: usize) -> Vec<String> {
        match &self.outcome {
            LiveOutcome::Report(report) => report
                .overlay_lines(count)
                .into_iter()
                .map(|(_, message)| message.to_string())
                .collect(),
            LiveOutcome::Error(_) => vec!["Analysis error".to_string()],
        }
    }
}

struct Shared {
    pending: FrameMailbox<Arc<RgbImage>>,
    last_frame: FrameMailbox<Arc<RgbImage>>,
    feedback: FrameMailbox<LiveFeedback>,
    stopped: Mutex<bool>,
    wake: Condvar,
}

/// Background worker that analyzes the newest frame on a fixed cadence
pub struct LiveAnalyzer {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl LiveAnalyzer {
    /// Start with the default interval
    pub fn start(config: AnalyzerConfig) -> Result<Self> {
        Self::with_interval(config, ANALYSIS_INTERVAL)
    }

    /// Start a worker that analyzes at most one frame per `interval`
    pub fn with_interval(config: AnalyzerConfig, interval: Duration) -> Result<Self> {
        let analyzer = QualityAnalyzer::new(config)?;
        let shared = Arc::new(Shared {
            pending: FrameMailbox::new(),
            last_frame: FrameMailbox::new(),
            feedback: FrameMailbox::new(),
            stopped: Mutex::new(false),
            wake: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::spawn(move || run_loop(&worker_shared, &analyzer, interval));

        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    /// Hand over the newest camera frame; returns true if an unanalyzed frame was dropped
    pub fn submit_frame(&self, frame: RgbImage) -> bool {
        let frame = Arc::new(frame);
        self.shared.last_frame.post(Arc::clone(&frame));
        self.shared.pending.post(frame)
    }

    /// Most recent analysis result, if any analysis has completed
    pub fn latest_feedback(&self) -> Option<LiveFeedback> {
        self.shared.feedback.peek()
    }

    /// Copy of the last submitted frame, for "capture this shot"
    pub fn capture_frame(&self) -> Option<RgbImage> {
        self.shared.last_frame.peek().map(|frame| (*frame).clone())
    }

    /// Stop the worker and wait for it to exit
    pub fn stop(&mut self) {
        *lock(&self.shared.stopped) = true;
        self.shared.wake.notify_all();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("live analysis worker panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }
}

impl Drop for LiveAnalyzer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(shared: &Shared, analyzer: &QualityAnalyzer, interval: Duration) {
    let mut sequence = 0u64;
    loop {
        let stopped = lock(&shared.stopped);
        let (stopped, _) = shared
            .wake
            .wait_timeout_while(stopped, interval, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
        if *stopped {
            break;
        }
        drop(stopped);

        let Some(frame) = shared.pending.take() else {
            continue;
        };

        sequence += 1;
        let outcome = match analyzer.analyze(&frame) {
            Ok(report) => LiveOutcome::Report(report),
            Err(e) => {
                warn!(error = %e, sequence, "live analysis failed");
                LiveOutcome::Error(e.to_string())
            }
        };
        debug!(sequence, "live feedback published");
        shared.feedback.post(LiveFeedback { sequence, outcome });
    }
    debug!(analyses = sequence, "live analysis worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::time::Instant;

    fn wait_for<F>(analyzer: &LiveAnalyzer, done: F) -> Option<LiveFeedback>
    where
        F: Fn(&LiveFeedback) -> bool,
    {
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            if let Some(feedback) = analyzer.latest_feedback() {
                if done(&feedback) {
                    return Some(feedback);
                }
            }
            thread::sleep(Duration::from_millis(5));
        }
        None
    }

    #[test]
    fn test_mailbox_latest_wins() {
        let mailbox = FrameMailbox::new();
        assert!(!mailbox.post(1));
        assert!(mailbox.post(2));
        assert!(mailbox.post(3));
        assert_eq!(mailbox.peek(), Some(3));
        assert_eq!(mailbox.take(), Some(3));
        assert!(mailbox.is_empty());
        assert_eq!(mailbox.take(), None);
    }

    #[test]
    fn test_live_loop_publishes_reports() {
        let mut live =
            LiveAnalyzer::with_interval(AnalyzerConfig::real_time(), Duration::from_millis(10))
                .unwrap();
        assert!(live.latest_feedback().is_none());

        live.submit_frame(RgbImage::from_pixel(64, 64, Rgb([128, 128, 128])));
        let feedback = wait_for(&live, |f| f.report().is_some()).expect("no live report");
        assert_eq!(feedback.sequence, 1);
        assert_eq!(feedback.overlay_text(3).len(), 3);

        live.stop();
        assert!(!live.is_running());
    }

    #[test]
    fn test_live_loop_survives_bad_frame() {
        let live =
            LiveAnalyzer::with_interval(AnalyzerConfig::default(), Duration::from_millis(10))
                .unwrap();

        live.submit_frame(RgbImage::new(0, 0));
        let failed = wait_for(&live, |f| matches!(f.outcome, LiveOutcome::Error(_)))
            .expect("no error feedback");
        assert_eq!(failed.overlay_text(3), vec!["Analysis error".to_string()]);

        live.submit_frame(RgbImage::from_pixel(32, 32, Rgb([90, 90, 90])));
        let recovered = wait_for(&live, |f| f.report().is_some()).expect("loop died");
        assert!(recovered.sequence > failed.sequence);
    }

    #[test]
    fn test_capture_keeps_last_frame() {
        let live = LiveAnalyzer::with_interval(AnalyzerConfig::default(), Duration::from_secs(60))
            .unwrap();
        assert!(live.capture_frame().is_none());

        live.submit_frame(RgbImage::from_pixel(4, 4, Rgb([1, 2, 3])));
        let dropped = live.submit_frame(RgbImage::from_pixel(4, 4, Rgb([9, 9, 9])));
        assert!(dropped);

        let captured = live.capture_frame().unwrap();
        assert_eq!(captured.get_pixel(0, 0), &Rgb([9, 9, 9]));
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut live =
            LiveAnalyzer::with_interval(AnalyzerConfig::default(), Duration::from_secs(60))
                .unwrap();
        live.stop();
        live.stop();
        assert!(!live.is_running());
    }
}
