//! Scan result pipeline.
//!
//! Every decode attempt a live stream produces passes through
//! [`ScanResultPipeline::on_decode_attempt`], which decides whether it is a
//! new value worth emitting. Misses and duplicate reads of the same code are
//! the overwhelming majority of attempts, so both are handled without
//! allocation beyond the trim check.
//!
//! The pipeline does not own the scanner state; the caller passes the
//! current state in and performs the transitions for an accepted value.

use std::time::Duration;

use camscan_core::ScannerState;
use camscan_hardware::DecodeAttempt;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

/// What the pipeline decided about one decode attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// No code in the frame, or only whitespace.
    Miss,

    /// The decoder failed on this frame. Logged, never a session failure.
    Failed,

    /// A code arrived while the scanner was not accepting values.
    Discarded,

    /// The same code as the last accepted value, inside its cooldown.
    Duplicate,

    /// A new value. The pipeline has already recorded it as the last
    /// accepted value.
    Accepted(String),
}

impl Verdict {
    /// Get the accepted value, if any.
    pub fn accepted(&self) -> Option<&str> {
        match self {
            Self::Accepted(value) => Some(value),
            _ => None,
        }
    }
}

/// The most recently emitted value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastAcceptedValue {
    /// Trimmed value.
    pub value: String,

    /// When the suppression window ends. `None` while the session that
    /// accepted the value is still running.
    pub expires_at: Option<Instant>,
}

impl LastAcceptedValue {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Counters kept by the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    /// Every attempt seen.
    pub attempts: u64,

    /// Frames with no code.
    pub misses: u64,

    /// Decoder failures.
    pub failures: u64,

    /// Reads suppressed by the cooldown.
    pub duplicates: u64,

    /// Reads ignored because the scanner was not accepting values.
    pub discarded: u64,

    /// Values emitted.
    pub accepted: u64,
}

/// Deduplicates and debounces decoded values.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use camscan_core::ScannerState;
/// use camscan_hardware::DecodeAttempt;
/// use camscan_scanner::{ScanResultPipeline, Verdict};
///
/// let mut pipeline = ScanResultPipeline::new(Duration::from_secs(2));
///
/// let verdict = pipeline.on_decode_attempt(DecodeAttempt::decoded("  SN12345 "), ScannerState::Scanning);
/// assert_eq!(verdict, Verdict::Accepted("SN12345".to_string()));
///
/// // Processing ignores everything
/// let verdict = pipeline.on_decode_attempt(DecodeAttempt::decoded("SN999"), ScannerState::Processing);
/// assert_eq!(verdict, Verdict::Discarded);
/// ```
#[derive(Debug)]
pub struct ScanResultPipeline {
    cooldown: Duration,
    last: Option<LastAcceptedValue>,
    stats: PipelineStats,
}

impl ScanResultPipeline {
    /// Create a pipeline with the given duplicate suppression window.
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last: None,
            stats: PipelineStats::default(),
        }
    }

    /// Get the cooldown window.
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Classify one decode attempt against the current scanner state.
    pub fn on_decode_attempt(&mut self, attempt: DecodeAttempt, state: ScannerState) -> Verdict {
        self.on_decode_attempt_at(attempt, state, Instant::now())
    }

    /// Classify one decode attempt at an explicit instant.
    pub fn on_decode_attempt_at(
        &mut self,
        attempt: DecodeAttempt,
        state: ScannerState,
        now: Instant,
    ) -> Verdict {
        self.stats.attempts += 1;
        self.expire(now);

        let text = match attempt {
            DecodeAttempt::Miss => {
                self.stats.misses += 1;
                return Verdict::Miss;
            }
            DecodeAttempt::Failed(message) => {
                self.stats.failures += 1;
                warn!(error = %message, "Decoder failed on frame");
                return Verdict::Failed;
            }
            DecodeAttempt::Decoded(text) => text,
        };

        let value = text.trim();
        if value.is_empty() {
            self.stats.misses += 1;
            return Verdict::Miss;
        }

        if !state.accepts_scans() {
            self.stats.discarded += 1;
            trace!(state = %state, "Decoded value discarded");
            return Verdict::Discarded;
        }

        if self.last.as_ref().is_some_and(|last| last.value == value) {
            self.stats.duplicates += 1;
            trace!(value, "Duplicate read suppressed");
            return Verdict::Duplicate;
        }

        let value = value.to_string();
        self.last = Some(LastAcceptedValue {
            value: value.clone(),
            expires_at: None,
        });
        self.stats.accepted += 1;
        debug!(value = %value, "Decoded value accepted");
        Verdict::Accepted(value)
    }

    /// Start the cooldown of the last accepted value.
    ///
    /// Called when the session that accepted it tears down. A window that is
    /// already running is left alone.
    pub fn arm_cooldown(&mut self, now: Instant) {
        if let Some(last) = self.last.as_mut()
            && last.expires_at.is_none()
        {
            last.expires_at = Some(now + self.cooldown);
        }
    }

    /// Get the last accepted value, clearing it first if it has expired.
    pub fn last_accepted(&mut self) -> Option<&LastAcceptedValue> {
        self.last_accepted_at(Instant::now())
    }

    /// Get the last accepted value as of `now`.
    pub fn last_accepted_at(&mut self, now: Instant) -> Option<&LastAcceptedValue> {
        self.expire(now);
        self.last.as_ref()
    }

    /// Forget the last accepted value.
    pub fn clear(&mut self) {
        self.last = None;
    }

    /// Get the counters.
    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Reset the counters.
    pub fn reset_stats(&mut self) {
        self.stats = PipelineStats::default();
    }

    fn expire(&mut self, now: Instant) {
        if self.last.as_ref().is_some_and(|last| last.is_expired(now)) {
            trace!("Last accepted value expired");
            self.last = None;
        }
    }
}
