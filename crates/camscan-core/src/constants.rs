//! Core constants for the camscan scanning component.
//!
//! This module centralizes the default timings, channel sizes and label
//! vocabulary used across the workspace. [`ScannerConfig`](crate::ScannerConfig)
//! takes its defaults from here, so changing a value here changes the
//! out-of-the-box behavior of every scanner.
//!
//! # Usage
//!
//! ```
//! use camscan_core::constants::*;
//! use std::time::Duration;
//!
//! let confirmation = Duration::from_millis(DEFAULT_CONFIRMATION_DELAY_MS);
//! let cooldown = Duration::from_millis(DEFAULT_COOLDOWN_MS);
//! assert!(confirmation < cooldown);
//! ```

// ============================================================================
// Session Timing
// ============================================================================

/// Delay between an accepted scan and automatic session teardown.
///
/// The scanner stays in the `Success` state for this long so the user can
/// see the confirmation before the camera closes.
pub const DEFAULT_CONFIRMATION_DELAY_MS: u64 = 1500;

/// Time after teardown during which the last accepted value is still
/// suppressed.
///
/// A rapid restart while the same code is still in frame must not fire
/// again immediately.
pub const DEFAULT_COOLDOWN_MS: u64 = 2000;

/// Upper bound accepted by configuration validation for either delay.
pub const MAX_DELAY_MS: u64 = 60_000;

// ============================================================================
// Decode Loop
// ============================================================================

/// Capacity of the channel carrying decode attempts from the platform
/// decode loop to the scan result pipeline.
///
/// At 30 fps this buffers a little over two seconds of frames.
pub const DEFAULT_DECODE_CHANNEL_CAPACITY: usize = 64;

/// Smallest decode channel capacity accepted by configuration validation.
pub const MIN_DECODE_CHANNEL_CAPACITY: usize = 1;

// ============================================================================
// Feedback
// ============================================================================

/// Frequency of the success tone in hertz.
pub const DEFAULT_TONE_FREQUENCY_HZ: u32 = 1000;

/// Duration of the success tone in milliseconds.
pub const DEFAULT_TONE_DURATION_MS: u64 = 200;

// ============================================================================
// Device Labels
// ============================================================================

/// Label fragments that identify an environment-facing camera.
///
/// Matched case-insensitively as substrings.
pub const BACK_CAMERA_KEYWORDS: &[&str] = &["back", "rear", "environment", "facing back"];

/// Label fragments that identify a user-facing camera.
///
/// Matched case-insensitively as substrings.
pub const FRONT_CAMERA_KEYWORDS: &[&str] = &["front", "user", "facing user"];

// ============================================================================
// State History
// ============================================================================

/// Maximum number of state transitions kept in a scanner's history.
///
/// A full scan is five transitions, so this covers the last twenty sessions.
pub const MAX_HISTORY_SIZE: usize = 100;
