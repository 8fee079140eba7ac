//! Error types for the scanner component.

use camscan_hardware::{CaptureError, ErrorReason};

/// Result type alias for scanner operations.
pub type Result<T> = std::result::Result<T, ScanError>;

/// Errors surfaced by [`Scanner`](crate::Scanner) operations.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Stream acquisition or decoder setup failed.
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// State or configuration error.
    #[error(transparent)]
    Core(#[from] camscan_core::Error),
}

impl ScanError {
    /// Get the capture error discriminant, if this is a capture error.
    pub fn reason(&self) -> Option<ErrorReason> {
        self.as_capture().map(CaptureError::reason)
    }

    /// Get the capture error, if this is one.
    pub fn as_capture(&self) -> Option<&CaptureError> {
        match self {
            Self::Capture(e) => Some(e),
            Self::Core(_) => None,
        }
    }

    /// Human-readable message for a user-visible notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::Capture(e) => e.user_message(),
            Self::Core(e) => e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_conversion() {
        let err: ScanError = CaptureError::device_busy("cam-1").into();
        assert_eq!(err.reason(), Some(ErrorReason::DeviceBusy));
        assert_eq!(err.to_string(), "Camera device busy: cam-1");
    }

    #[test]
    fn test_core_conversion() {
        let err: ScanError = camscan_core::Error::Config("bad".to_string()).into();
        assert!(err.reason().is_none());
        assert!(err.as_capture().is_none());
        assert!(!err.user_message().is_empty());
    }
}
