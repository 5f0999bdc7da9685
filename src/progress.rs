//! Progress reporting and cancellation support.
//!
//! Long-running operations (compression, trimming, concatenation) report how
//! much media time they have processed through a [`ProgressCallback`] and
//! poll a [`CancellationToken`] between packets.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use vidkit::{JobOptions, ProgressCallback, ProgressInfo, Trimmer, TrimRange};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("[{:?}] {pct:.1}% complete", info.operation);
//!         }
//!     }
//! }
//!
//! let options = JobOptions::new().with_progress(Arc::new(PrintProgress));
//! Trimmer::new("input.mp4", "clip.mp4", TrimRange::leading(std::time::Duration::from_secs(30))?)
//!     .run_with_options(&options)?;
//! # Ok::<(), vidkit::VidkitError>(())
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// The kind of operation currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Re-encoding a single file at a new bitrate.
    Compression,
    /// Copying a time range without re-encoding.
    Trimming,
    /// Joining several inputs into one output.
    Concatenation,
}

/// A snapshot of operation progress, measured in media time.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub operation: OperationType,
    /// Media time written to the output so far.
    pub processed: Duration,
    /// Total media time expected, if known.
    pub total: Option<Duration>,
    /// Completion percentage (0.0 to 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time since the operation started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on throughput so far.
    pub estimated_remaining: Option<Duration>,
}

/// Receives progress updates during long-running operations.
///
/// Callbacks observe but cannot stop an operation; use
/// [`CancellationToken`] for that.
pub trait ProgressCallback: Send + Sync {
    /// Called periodically while work is in progress, and once at the end.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clones share state: cancelling one cancels all of them.
///
/// ```
/// use vidkit::CancellationToken;
///
/// let token = CancellationToken::new();
/// let clone = token.clone();
/// token.cancel();
/// assert!(clone.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks media-time progress and throttles callback invocations.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: Option<Duration>,
    processed: Duration,
    interval: Duration,
    start_time: Instant,
    last_report: Option<Instant>,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: Option<Duration>,
        interval: Duration,
    ) -> Self {
        Self {
            callback,
            operation,
            total: total.filter(|total| !total.is_zero()),
            processed: Duration::ZERO,
            interval,
            start_time: Instant::now(),
            last_report: None,
        }
    }

    /// Record that output has reached `position` and report if the
    /// reporting interval has passed. Positions never move backwards.
    pub(crate) fn advance_to(&mut self, position: Duration) {
        if position > self.processed {
            self.processed = position;
        }

        let due = self
            .last_report
            .is_none_or(|last| last.elapsed() >= self.interval);
        if due {
            self.report();
        }
    }

    /// Unconditionally emit a final report.
    pub(crate) fn finish(&mut self) {
        if let Some(total) = self.total {
            self.processed = self.processed.max(total);
        }
        self.report();
    }

    fn report(&mut self) {
        let elapsed = self.start_time.elapsed();
        self.last_report = Some(Instant::now());

        let fraction = self
            .total
            .map(|total| (self.processed.as_secs_f64() / total.as_secs_f64()).min(1.0));

        let estimated_remaining = fraction.filter(|&f| f > 0.0).map(|f| {
            let projected = elapsed.as_secs_f64() / f;
            Duration::from_secs_f64((projected - elapsed.as_secs_f64()).max(0.0))
        });

        let info = ProgressInfo {
            operation: self.operation,
            processed: self.processed,
            total: self.total,
            percentage: fraction.map(|f| (f * 100.0) as f32),
            elapsed,
            estimated_remaining,
        };

        self.callback.on_progress(&info);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<ProgressInfo>>,
    }

    impl ProgressCallback for Recorder {
        fn on_progress(&self, info: &ProgressInfo) {
            self.seen.lock().unwrap().push(info.clone());
        }
    }

    #[test]
    fn throttles_and_finishes_at_total() {
        let recorder = Arc::new(Recorder::default());
        let mut tracker = ProgressTracker::new(
            recorder.clone(),
            OperationType::Trimming,
            Some(Duration::from_secs(10)),
            Duration::from_secs(3600),
        );

        tracker.advance_to(Duration::from_secs(1));
        tracker.advance_to(Duration::from_secs(2));
        tracker.advance_to(Duration::from_secs(1));
        tracker.finish();

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen.len(), 2, "first update plus the final one");
        assert_eq!(seen[0].processed, Duration::from_secs(1));
        assert_eq!(seen[1].processed, Duration::from_secs(10));
        assert_eq!(seen[1].percentage, Some(100.0));
        assert_eq!(seen[1].operation, OperationType::Trimming);
    }

    #[test]
    fn unknown_total_has_no_percentage() {
        let recorder = Arc::new(Recorder::default());
        let mut tracker = ProgressTracker::new(
            recorder.clone(),
            OperationType::Compression,
            Some(Duration::ZERO),
            Duration::ZERO,
        );
        tracker.advance_to(Duration::from_secs(5));

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen[0].total, None);
        assert_eq!(seen[0].percentage, None);
        assert_eq!(seen[0].estimated_remaining, None);
    }

    #[test]
    fn token_clones_share_state() {
        let token = CancellationToken::default();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
