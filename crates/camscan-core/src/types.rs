//! Scanner state definitions.
//!
//! [`ScannerState`] is the single authoritative state of a scanner
//! component. The transition table lives here so every crate agrees on which
//! flows are legal.
//!
//! # Valid Transitions
//!
//! - Idle → Requesting → Scanning → Processing → Success → Idle
//! - Requesting / Scanning / Processing → Error → Idle
//! - Requesting / Scanning / Processing → Idle (stopped by the caller)

use std::fmt;

use serde::{Deserialize, Serialize};

/// Every state a scanner can be in.
///
/// # Examples
///
/// ```
/// use camscan_core::ScannerState;
///
/// assert!(ScannerState::Idle.can_transition_to(&ScannerState::Requesting));
/// assert!(!ScannerState::Idle.can_transition_to(&ScannerState::Success));
/// assert!(ScannerState::Scanning.is_camera_active());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScannerState {
    /// No active stream, no pending decode.
    #[default]
    Idle,

    /// Permission and stream acquisition in flight.
    Requesting,

    /// Live stream bound, decode loop active, no value accepted yet.
    Scanning,

    /// A value was accepted and is being delivered. New values are ignored.
    Processing,

    /// Visual confirmation before automatic teardown.
    Success,

    /// The session failed. Resources are released on the way back to `Idle`.
    Error,
}

impl fmt::Display for ScannerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            ScannerState::Idle => "Idle",
            ScannerState::Requesting => "Requesting",
            ScannerState::Scanning => "Scanning",
            ScannerState::Processing => "Processing",
            ScannerState::Success => "Success",
            ScannerState::Error => "Error",
        };
        write!(f, "{}", state_str)
    }
}

impl ScannerState {
    /// Check if transition to target state is valid from this state.
    ///
    /// Forced resets to `Idle` bypass this table; see the scanner's state
    /// machine `reset()`.
    pub fn can_transition_to(&self, target: &ScannerState) -> bool {
        matches!(
            (self, target),
            (ScannerState::Idle, ScannerState::Requesting)
                | (
                    ScannerState::Requesting,
                    ScannerState::Scanning | ScannerState::Error | ScannerState::Idle
                )
                | (
                    ScannerState::Scanning,
                    ScannerState::Processing | ScannerState::Error | ScannerState::Idle
                )
                | (
                    ScannerState::Processing,
                    ScannerState::Success | ScannerState::Error | ScannerState::Idle
                )
                | (ScannerState::Success, ScannerState::Idle)
                | (ScannerState::Error, ScannerState::Idle)
        )
    }

    /// Whether a session exists in any form (everything but `Idle`).
    pub fn is_active(&self) -> bool {
        !matches!(self, ScannerState::Idle)
    }

    /// Whether the caller-visible "camera active" indicator should be on.
    pub fn is_camera_active(&self) -> bool {
        matches!(
            self,
            ScannerState::Scanning | ScannerState::Processing | ScannerState::Success
        )
    }

    /// Whether new decode results may be accepted in this state.
    pub fn accepts_scans(&self) -> bool {
        matches!(self, ScannerState::Scanning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ScannerState::Idle, ScannerState::Requesting)]
    #[case(ScannerState::Requesting, ScannerState::Scanning)]
    #[case(ScannerState::Requesting, ScannerState::Error)]
    #[case(ScannerState::Requesting, ScannerState::Idle)]
    #[case(ScannerState::Scanning, ScannerState::Processing)]
    #[case(ScannerState::Scanning, ScannerState::Idle)]
    #[case(ScannerState::Processing, ScannerState::Success)]
    #[case(ScannerState::Success, ScannerState::Idle)]
    #[case(ScannerState::Error, ScannerState::Idle)]
    fn test_valid_transitions(#[case] from: ScannerState, #[case] to: ScannerState) {
        assert!(from.can_transition_to(&to), "{from} -> {to} should be valid");
    }

    #[rstest]
    #[case(ScannerState::Idle, ScannerState::Scanning)]
    #[case(ScannerState::Idle, ScannerState::Success)]
    #[case(ScannerState::Idle, ScannerState::Idle)]
    #[case(ScannerState::Scanning, ScannerState::Success)]
    #[case(ScannerState::Success, ScannerState::Scanning)]
    #[case(ScannerState::Success, ScannerState::Error)]
    #[case(ScannerState::Error, ScannerState::Scanning)]
    fn test_invalid_transitions(#[case] from: ScannerState, #[case] to: ScannerState) {
        assert!(!from.can_transition_to(&to), "{from} -> {to} should be invalid");
    }

    #[test]
    fn test_default_is_idle() {
        assert_eq!(ScannerState::default(), ScannerState::Idle);
        assert!(!ScannerState::Idle.is_active());
    }

    #[test]
    fn test_camera_active_states() {
        assert!(!ScannerState::Requesting.is_camera_active());
        assert!(ScannerState::Scanning.is_camera_active());
        assert!(ScannerState::Processing.is_camera_active());
        assert!(ScannerState::Success.is_camera_active());
        assert!(!ScannerState::Error.is_camera_active());
    }

    #[test]
    fn test_only_scanning_accepts() {
        assert!(ScannerState::Scanning.accepts_scans());
        assert!(!ScannerState::Processing.accepts_scans());
        assert!(!ScannerState::Success.accepts_scans());
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&ScannerState::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
        let back: ScannerState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ScannerState::Processing);
    }
}
