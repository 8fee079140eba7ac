//! Scanner configuration.
//!
//! [`ScannerConfig`] carries the timing and policy settings of one scanner
//! instance. Durations are stored in milliseconds so the JSON form stays
//! readable:
//!
//! ```json
//! {
//!   "confirmation_delay_ms": 1500,
//!   "cooldown_ms": 2000,
//!   "fallback_to_any_device": true
//! }
//! ```
//!
//! Missing keys take their defaults from [`constants`](crate::constants).

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CONFIRMATION_DELAY_MS, DEFAULT_COOLDOWN_MS, DEFAULT_DECODE_CHANNEL_CAPACITY,
    DEFAULT_TONE_DURATION_MS, DEFAULT_TONE_FREQUENCY_HZ, MAX_DELAY_MS,
    MIN_DECODE_CHANNEL_CAPACITY,
};
use crate::{Error, Result};

/// Configuration for a scanner instance.
///
/// # Examples
///
/// ```
/// use camscan_core::ScannerConfig;
/// use std::time::Duration;
///
/// let config = ScannerConfig::default()
///     .with_confirmation_delay(Duration::from_secs(1))
///     .with_preferred_device("usb-0001");
///
/// assert_eq!(config.confirmation_delay(), Duration::from_secs(1));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Time spent in `Success` before the session tears down.
    pub confirmation_delay_ms: u64,

    /// Time after teardown during which the last value stays suppressed.
    pub cooldown_ms: u64,

    /// Retry once without a device constraint when the requested device
    /// cannot be opened.
    pub fallback_to_any_device: bool,

    /// Device to request instead of the heuristic default.
    pub preferred_device_id: Option<String>,

    /// Capacity of the decode attempt channel.
    pub decode_channel_capacity: usize,

    /// Success tone frequency.
    pub tone_frequency_hz: u32,

    /// Success tone duration.
    pub tone_duration_ms: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            confirmation_delay_ms: DEFAULT_CONFIRMATION_DELAY_MS,
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            fallback_to_any_device: true,
            preferred_device_id: None,
            decode_channel_capacity: DEFAULT_DECODE_CHANNEL_CAPACITY,
            tone_frequency_hz: DEFAULT_TONE_FREQUENCY_HZ,
            tone_duration_ms: DEFAULT_TONE_DURATION_MS,
        }
    }
}

impl ScannerConfig {
    /// Parse and validate a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value fails
    /// [`validate`](Self::validate).
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// contains invalid values.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&contents)
    }

    /// Check that every value is within its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        if self.confirmation_delay_ms > MAX_DELAY_MS {
            return Err(invalid(
                "confirmation_delay_ms",
                format!("must be at most {MAX_DELAY_MS}"),
            ));
        }
        if self.cooldown_ms > MAX_DELAY_MS {
            return Err(invalid(
                "cooldown_ms",
                format!("must be at most {MAX_DELAY_MS}"),
            ));
        }
        if self.decode_channel_capacity < MIN_DECODE_CHANNEL_CAPACITY {
            return Err(invalid(
                "decode_channel_capacity",
                format!("must be at least {MIN_DECODE_CHANNEL_CAPACITY}"),
            ));
        }
        if let Some(id) = &self.preferred_device_id
            && id.trim().is_empty()
        {
            return Err(invalid("preferred_device_id", "must not be blank"));
        }
        Ok(())
    }

    /// Confirmation delay as a [`Duration`].
    pub fn confirmation_delay(&self) -> Duration {
        Duration::from_millis(self.confirmation_delay_ms)
    }

    /// Cooldown as a [`Duration`].
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Tone duration as a [`Duration`].
    pub fn tone_duration(&self) -> Duration {
        Duration::from_millis(self.tone_duration_ms)
    }

    /// Set the confirmation delay.
    pub fn with_confirmation_delay(mut self, delay: Duration) -> Self {
        self.confirmation_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set the cooldown.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown_ms = cooldown.as_millis() as u64;
        self
    }

    /// Enable or disable the unconstrained retry.
    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback_to_any_device = enabled;
        self
    }

    /// Request a specific device by default.
    pub fn with_preferred_device(mut self, device_id: impl Into<String>) -> Self {
        self.preferred_device_id = Some(device_id.into());
        self
    }
}

fn invalid(key: &str, reason: impl Into<String>) -> Error {
    Error::InvalidConfig {
        key: key.to_string(),
        reason: reason.into(),
    }
}
