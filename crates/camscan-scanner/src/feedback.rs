//! User feedback.
//!
//! The scanner reports what happens to the user through a
//! [`NotificationSink`]: a short tone when a value is accepted, and
//! notifications for camera activity, accepted values and failures.
//!
//! Sinks are called synchronously from the scanner and outside its internal
//! lock. Implementations must return quickly; anything slow belongs on a
//! channel or a spawned task.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use camscan_hardware::ErrorReason;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

/// A feedback tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tone {
    /// Pitch in hertz.
    pub frequency_hz: u32,

    /// How long the tone plays.
    pub duration: Duration,
}

impl Tone {
    /// Create a new tone.
    pub fn new(frequency_hz: u32, duration: Duration) -> Self {
        Self {
            frequency_hz,
            duration,
        }
    }

    /// Duration in whole milliseconds, saturating at `u64::MAX`.
    pub fn duration_ms(&self) -> u64 {
        u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Something the user should be told about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// The camera started (`true`) or stopped (`false`) capturing.
    CameraActive { active: bool },

    /// A value was delivered to the consumer.
    ScanAccepted { value: String, at: DateTime<Utc> },

    /// A session failed.
    Error { reason: ErrorReason, message: String },
}

/// Receives feedback from a scanner.
pub trait NotificationSink: Send + Sync {
    /// Play a tone. Best effort; failures are the sink's business.
    fn play_tone(&self, tone: Tone);

    /// Deliver a notification.
    fn notify(&self, notification: Notification);
}

/// Sink that writes feedback to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn play_tone(&self, tone: Tone) {
        info!(
            frequency_hz = tone.frequency_hz,
            duration_ms = tone.duration_ms(),
            "Beep"
        );
    }

    fn notify(&self, notification: Notification) {
        match notification {
            Notification::CameraActive { active } => info!(active, "Camera activity changed"),
            Notification::ScanAccepted { value, at } => {
                info!(value = %value, at = %at, "Scan accepted")
            }
            Notification::Error { reason, message } => {
                error!(reason = %reason, message = %message, "Scan failed")
            }
        }
    }
}

#[derive(Debug, Default)]
struct Recorded {
    tones: Vec<Tone>,
    notifications: Vec<Notification>,
}

/// Sink that records everything it receives.
///
/// Clones share the same record, so a test can keep one clone and hand the
/// other to the scanner.
///
/// # Examples
///
/// ```
/// use camscan_scanner::{Notification, NotificationSink, RecordingNotifier};
///
/// let recorder = RecordingNotifier::new();
/// recorder.clone().notify(Notification::CameraActive { active: true });
///
/// assert_eq!(recorder.camera_activity(), vec![true]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingNotifier {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_recorded<T>(&self, f: impl FnOnce(&mut Recorded) -> T) -> T {
        let mut recorded = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut recorded)
    }

    /// Every tone played so far.
    pub fn tones(&self) -> Vec<Tone> {
        self.with_recorded(|r| r.tones.clone())
    }

    /// Every notification delivered so far.
    pub fn notifications(&self) -> Vec<Notification> {
        self.with_recorded(|r| r.notifications.clone())
    }

    /// Values of every `ScanAccepted` notification.
    pub fn accepted_values(&self) -> Vec<String> {
        self.with_recorded(|r| {
            r.notifications
                .iter()
                .filter_map(|n| match n {
                    Notification::ScanAccepted { value, .. } => Some(value.clone()),
                    _ => None,
                })
                .collect()
        })
    }

    /// Reasons of every `Error` notification.
    pub fn errors(&self) -> Vec<ErrorReason> {
        self.with_recorded(|r| {
            r.notifications
                .iter()
                .filter_map(|n| match n {
                    Notification::Error { reason, .. } => Some(*reason),
                    _ => None,
                })
                .collect()
        })
    }

    /// Values of every `CameraActive` notification.
    pub fn camera_activity(&self) -> Vec<bool> {
        self.with_recorded(|r| {
            r.notifications
                .iter()
                .filter_map(|n| match n {
                    Notification::CameraActive { active } => Some(*active),
                    _ => None,
                })
                .collect()
        })
    }

    /// Forget everything recorded.
    pub fn clear(&self) {
        self.with_recorded(|r| {
            r.tones.clear();
            r.notifications.clear();
        });
    }
}

impl NotificationSink for RecordingNotifier {
    fn play_tone(&self, tone: Tone) {
        self.with_recorded(|r| r.tones.push(tone));
    }

    fn notify(&self, notification: Notification) {
        self.with_recorded(|r| r.notifications.push(notification));
    }
}
