//! Operation configuration.
//!
//! [`JobOptions`] threads progress callbacks and cancellation tokens
//! through the long-running operations without widening every signature.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use vidkit::{CancellationToken, JobOptions, ProgressCallback, ProgressInfo};
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{:?}: {:?} done", info.operation, info.processed);
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let options = JobOptions::new()
//!     .with_progress(Arc::new(LogProgress))
//!     .with_cancellation(token.clone());
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Duration;

use crate::error::VidkitError;
use crate::progress::{
    CancellationToken, NoOpProgress, OperationType, ProgressCallback, ProgressTracker,
};

const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(250);

/// Settings shared by the compressor, trimmer, and concatenator.
#[derive(Clone)]
pub struct JobOptions {
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) progress_interval: Duration,
}

impl Debug for JobOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("JobOptions")
            .field("has_cancellation", &self.cancellation.is_some())
            .field("progress_interval", &self.progress_interval)
            .finish_non_exhaustive()
    }
}

impl Default for JobOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl JobOptions {
    /// Options with no progress reporting and no cancellation.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Report progress to `callback`.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Stop the operation when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Minimum wall-clock time between progress callbacks.
    #[must_use]
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Whether the attached token (if any) has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// Return [`VidkitError::Cancelled`] if cancellation was requested.
    pub(crate) fn check_cancelled(&self) -> Result<(), VidkitError> {
        if self.is_cancelled() {
            log::info!("Operation cancelled");
            Err(VidkitError::Cancelled)
        } else {
            Ok(())
        }
    }

    pub(crate) fn tracker(
        &self,
        operation: OperationType,
        total: Option<Duration>,
    ) -> ProgressTracker {
        ProgressTracker::new(
            Arc::clone(&self.progress),
            operation,
            total,
            self.progress_interval,
        )
    }
}
