//! Error types for camera capture operations.
//!
//! [`CaptureError`] is the taxonomy surfaced to callers when a stream cannot
//! be acquired or a decode loop cannot be set up. Every variant maps to an
//! [`ErrorReason`] discriminant and carries a human-readable fallback message
//! through [`CaptureError::user_message`].
//!
//! Per-frame decode misses never produce a `CaptureError`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result type alias for capture operations.
pub type Result<T> = std::result::Result<T, CaptureError>;

/// Errors that can occur while acquiring or decoding a camera stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    /// The platform exposes no camera capability at all.
    #[error("Camera capture is not supported on this platform")]
    Unsupported,

    /// The user or platform policy refused camera access.
    #[error("Camera permission denied: {message}")]
    PermissionDenied { message: String },

    /// No matching camera at acquisition time.
    #[error("Camera device not found: {device}")]
    DeviceNotFound { device: String },

    /// The camera is claimed by another process or tab.
    #[error("Camera device busy: {device}")]
    DeviceBusy { device: String },

    /// Capture requires a secure transport and none is present.
    #[error("Camera capture requires a secure context")]
    InsecureContext,

    /// Any other platform failure, with the platform message preserved.
    #[error("Camera error: {message}")]
    Unknown { message: String },
}

/// Discriminant of a [`CaptureError`], suitable for matching in UI code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorReason {
    Unsupported,
    PermissionDenied,
    DeviceNotFound,
    DeviceBusy,
    InsecureContext,
    Unknown,
}

impl fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported => write!(f, "unsupported"),
            Self::PermissionDenied => write!(f, "permission_denied"),
            Self::DeviceNotFound => write!(f, "device_not_found"),
            Self::DeviceBusy => write!(f, "device_busy"),
            Self::InsecureContext => write!(f, "insecure_context"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl CaptureError {
    /// Create a new permission denied error.
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Create a new device not found error.
    pub fn device_not_found(device: impl Into<String>) -> Self {
        Self::DeviceNotFound {
            device: device.into(),
        }
    }

    /// Create a new device busy error.
    pub fn device_busy(device: impl Into<String>) -> Self {
        Self::DeviceBusy {
            device: device.into(),
        }
    }

    /// Create a new unknown platform error.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }

    /// Map a platform error name to the capture taxonomy.
    ///
    /// Names follow the media capture error vocabulary used by camera
    /// platforms (`NotAllowedError`, `NotFoundError`, ...). Unrecognized
    /// names become [`CaptureError::Unknown`] with the message preserved.
    ///
    /// # Examples
    ///
    /// ```
    /// use camscan_hardware::error::{CaptureError, ErrorReason};
    ///
    /// let err = CaptureError::from_platform("NotReadableError", "Could not start video source");
    /// assert_eq!(err.reason(), ErrorReason::DeviceBusy);
    ///
    /// let err = CaptureError::from_platform("WeirdError", "something odd");
    /// assert_eq!(err, CaptureError::unknown("WeirdError: something odd"));
    /// ```
    pub fn from_platform(name: &str, message: &str) -> Self {
        match name {
            "NotAllowedError" | "PermissionDeniedError" => Self::permission_denied(message),
            "NotFoundError" | "DevicesNotFoundError" | "OverconstrainedError" => {
                Self::device_not_found(message)
            }
            "NotReadableError" | "TrackStartError" | "AbortError" => Self::device_busy(message),
            "SecurityError" => Self::InsecureContext,
            "TypeError" if message.to_ascii_lowercase().contains("secure") => {
                Self::InsecureContext
            }
            "NotSupportedError" => Self::Unsupported,
            _ if message.is_empty() => Self::unknown(name),
            _ => Self::unknown(format!("{name}: {message}")),
        }
    }

    /// Get the discriminant of this error.
    pub fn reason(&self) -> ErrorReason {
        match self {
            Self::Unsupported => ErrorReason::Unsupported,
            Self::PermissionDenied { .. } => ErrorReason::PermissionDenied,
            Self::DeviceNotFound { .. } => ErrorReason::DeviceNotFound,
            Self::DeviceBusy { .. } => ErrorReason::DeviceBusy,
            Self::InsecureContext => ErrorReason::InsecureContext,
            Self::Unknown { .. } => ErrorReason::Unknown,
        }
    }

    /// Human-readable message for a user-visible notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unsupported => "This device does not support camera scanning.".to_string(),
            Self::PermissionDenied { .. } => {
                "Camera access was denied. Allow camera access in your settings and try again."
                    .to_string()
            }
            Self::DeviceNotFound { .. } => "No camera was found on this device.".to_string(),
            Self::DeviceBusy { .. } => {
                "The camera is in use by another application. Close it and try again.".to_string()
            }
            Self::InsecureContext => {
                "Camera access requires a secure (HTTPS) connection.".to_string()
            }
            Self::Unknown { message } => format!("Could not start the camera: {message}"),
        }
    }

    /// Whether an acquisition that failed with this error is worth retrying
    /// once with no device constraint.
    pub fn allows_unconstrained_retry(&self) -> bool {
        matches!(
            self,
            Self::DeviceNotFound { .. } | Self::DeviceBusy { .. } | Self::Unknown { .. }
        )
    }

    /// Whether the user can fix this error without changing the deployment.
    pub fn is_user_recoverable(&self) -> bool {
        !matches!(self, Self::Unsupported | Self::InsecureContext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("NotAllowedError", ErrorReason::PermissionDenied)]
    #[case("PermissionDeniedError", ErrorReason::PermissionDenied)]
    #[case("NotFoundError", ErrorReason::DeviceNotFound)]
    #[case("OverconstrainedError", ErrorReason::DeviceNotFound)]
    #[case("NotReadableError", ErrorReason::DeviceBusy)]
    #[case("TrackStartError", ErrorReason::DeviceBusy)]
    #[case("SecurityError", ErrorReason::InsecureContext)]
    #[case("NotSupportedError", ErrorReason::Unsupported)]
    #[case("InternalError", ErrorReason::Unknown)]
    fn test_from_platform(#[case] name: &str, #[case] expected: ErrorReason) {
        assert_eq!(CaptureError::from_platform(name, "detail").reason(), expected);
    }

    #[test]
    fn test_insecure_type_error() {
        let err = CaptureError::from_platform("TypeError", "only available in secure contexts");
        assert_eq!(err, CaptureError::InsecureContext);

        let err = CaptureError::from_platform("TypeError", "undefined is not a function");
        assert_eq!(err.reason(), ErrorReason::Unknown);
    }

    #[test]
    fn test_unknown_preserves_message() {
        let err = CaptureError::from_platform("InternalError", "driver crashed");
        assert_eq!(err.to_string(), "Camera error: InternalError: driver crashed");
        assert!(err.user_message().contains("driver crashed"));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            CaptureError::device_not_found("cam-1").to_string(),
            "Camera device not found: cam-1"
        );
        assert_eq!(
            CaptureError::device_busy("cam-1").to_string(),
            "Camera device busy: cam-1"
        );
        assert_eq!(
            CaptureError::Unsupported.to_string(),
            "Camera capture is not supported on this platform"
        );
    }

    #[test]
    fn test_retry_policy() {
        assert!(CaptureError::device_not_found("x").allows_unconstrained_retry());
        assert!(CaptureError::device_busy("x").allows_unconstrained_retry());
        assert!(CaptureError::unknown("x").allows_unconstrained_retry());
        assert!(!CaptureError::permission_denied("x").allows_unconstrained_retry());
        assert!(!CaptureError::InsecureContext.allows_unconstrained_retry());
        assert!(!CaptureError::Unsupported.allows_unconstrained_retry());
    }

    #[test]
    fn test_user_recoverable() {
        assert!(CaptureError::permission_denied("x").is_user_recoverable());
        assert!(!CaptureError::InsecureContext.is_user_recoverable());
        assert!(!CaptureError::Unsupported.is_user_recoverable());
    }

    #[test]
    fn test_user_messages_not_empty() {
        let errors = vec![
            CaptureError::Unsupported,
            CaptureError::permission_denied("x"),
            CaptureError::device_not_found("x"),
            CaptureError::device_busy("x"),
            CaptureError::InsecureContext,
            CaptureError::unknown("x"),
        ];

        for error in errors {
            assert!(!error.user_message().is_empty());
            let _ = format!("{:?}", error.reason());
        }
    }

    #[test]
    fn test_reason_serialization() {
        let json = serde_json::to_string(&ErrorReason::PermissionDenied).unwrap();
        assert_eq!(json, "\"permission_denied\"");
        assert_eq!(ErrorReason::DeviceBusy.to_string(), "device_busy");
    }
}
