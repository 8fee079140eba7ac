//! Common types shared across camera platform implementations.
//!
//! This module defines the raw device records a platform reports, the
//! read-only [`DeviceDescriptor`] the scanner works with, the device
//! constraint passed to stream acquisition, and the capability probe result.

use std::fmt;

use camscan_core::constants::{BACK_CAMERA_KEYWORDS, FRONT_CAMERA_KEYWORDS};
use serde::{Deserialize, Serialize};

use crate::error::CaptureError;

/// Kind of media device reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaDeviceKind {
    /// Camera.
    VideoInput,

    /// Microphone.
    AudioInput,

    /// Speaker or headset.
    AudioOutput,
}

/// Raw media device record as reported by a platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDeviceInfo {
    /// Opaque platform identifier.
    pub device_id: String,

    /// Device kind.
    pub kind: MediaDeviceKind,

    /// Human-readable label. Empty until the first permission grant on
    /// many platforms.
    pub label: String,
}

impl MediaDeviceInfo {
    /// Create a camera device record.
    pub fn video_input(device_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            kind: MediaDeviceKind::VideoInput,
            label: label.into(),
        }
    }

    /// Create a microphone device record.
    pub fn audio_input(device_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            kind: MediaDeviceKind::AudioInput,
            label: label.into(),
        }
    }

    /// Check if this record describes a camera.
    pub fn is_video_input(&self) -> bool {
        self.kind == MediaDeviceKind::VideoInput
    }
}

/// Which way a camera points, as far as its label tells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraFacing {
    /// Environment-facing camera.
    Back,

    /// User-facing (selfie) camera.
    Front,

    /// Label is empty or gives no hint.
    Unknown,
}

impl CameraFacing {
    /// Classify a device label.
    ///
    /// Back-facing keywords win over front-facing ones. Matching is a
    /// case-insensitive substring search and is inherently best-effort.
    ///
    /// # Examples
    ///
    /// ```
    /// use camscan_hardware::types::CameraFacing;
    ///
    /// assert_eq!(CameraFacing::from_label("Back Camera"), CameraFacing::Back);
    /// assert_eq!(CameraFacing::from_label("camera2 1, facing front"), CameraFacing::Front);
    /// assert_eq!(CameraFacing::from_label("HD Webcam C920"), CameraFacing::Unknown);
    /// ```
    pub fn from_label(label: &str) -> Self {
        let label = label.to_lowercase();
        if BACK_CAMERA_KEYWORDS.iter().any(|k| label.contains(k)) {
            Self::Back
        } else if FRONT_CAMERA_KEYWORDS.iter().any(|k| label.contains(k)) {
            Self::Front
        } else {
            Self::Unknown
        }
    }
}

/// A selectable camera.
///
/// Descriptors are reference data: the scanner never mutates one, it
/// replaces the whole list on re-enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Opaque platform identifier.
    pub device_id: String,

    /// Human-readable label, possibly empty.
    pub label: String,
}

impl DeviceDescriptor {
    /// Create a new descriptor.
    pub fn new(device_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            label: label.into(),
        }
    }

    /// Classify the device by its label.
    pub fn facing(&self) -> CameraFacing {
        CameraFacing::from_label(&self.label)
    }

    /// Check if the platform has revealed a label for this device.
    pub fn has_label(&self) -> bool {
        !self.label.trim().is_empty()
    }
}

impl From<&MediaDeviceInfo> for DeviceDescriptor {
    fn from(info: &MediaDeviceInfo) -> Self {
        Self::new(info.device_id.clone(), info.label.clone())
    }
}

/// Which device a stream acquisition should bind to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceConstraint {
    /// Exactly this device.
    Exact(String),

    /// Whatever the platform chooses.
    Any,
}

impl DeviceConstraint {
    /// Build a constraint from an optional device identifier.
    pub fn from_device(device_id: Option<&str>) -> Self {
        match device_id {
            Some(id) => Self::Exact(id.to_string()),
            None => Self::Any,
        }
    }

    /// Get the requested device identifier, if constrained.
    pub fn device_id(&self) -> Option<&str> {
        match self {
            Self::Exact(id) => Some(id),
            Self::Any => None,
        }
    }

    /// Check if this constraint names a device.
    pub fn is_exact(&self) -> bool {
        matches!(self, Self::Exact(_))
    }
}

impl fmt::Display for DeviceConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(id) => write!(f, "{}", id),
            Self::Any => write!(f, "any"),
        }
    }
}

/// Result of the synchronous capability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// A camera API is available.
    Supported,

    /// No camera API at all.
    Unsupported,

    /// A camera API exists but needs a secure transport.
    InsecureContext,
}

impl Capability {
    /// Check if scanning can be offered.
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Supported)
    }

    /// Convert an unsupported capability into the matching error.
    pub fn to_error(&self) -> Option<CaptureError> {
        match self {
            Self::Supported => None,
            Self::Unsupported => Some(CaptureError::Unsupported),
            Self::InsecureContext => Some(CaptureError::InsecureContext),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Back Camera", CameraFacing::Back)]
    #[case("REAR camera", CameraFacing::Back)]
    #[case("camera2 0, facing back", CameraFacing::Back)]
    #[case("Environment", CameraFacing::Back)]
    #[case("Front Camera", CameraFacing::Front)]
    #[case("camera2 1, facing user", CameraFacing::Front)]
    #[case("FaceTime HD Camera", CameraFacing::Unknown)]
    #[case("", CameraFacing::Unknown)]
    fn test_facing_from_label(#[case] label: &str, #[case] expected: CameraFacing) {
        assert_eq!(CameraFacing::from_label(label), expected);
    }

    #[test]
    fn test_back_keyword_wins() {
        assert_eq!(
            CameraFacing::from_label("front-mounted rear sensor"),
            CameraFacing::Back
        );
    }

    #[test]
    fn test_descriptor_from_info() {
        let info = MediaDeviceInfo::video_input("cam-1", "Back Camera");
        let descriptor = DeviceDescriptor::from(&info);

        assert_eq!(descriptor.device_id, "cam-1");
        assert_eq!(descriptor.facing(), CameraFacing::Back);
        assert!(descriptor.has_label());
        assert!(!DeviceDescriptor::new("cam-2", "  ").has_label());
    }

    #[test]
    fn test_device_constraint() {
        let exact = DeviceConstraint::from_device(Some("cam-1"));
        assert_eq!(exact.device_id(), Some("cam-1"));
        assert!(exact.is_exact());
        assert_eq!(exact.to_string(), "cam-1");

        let any = DeviceConstraint::from_device(None);
        assert_eq!(any, DeviceConstraint::Any);
        assert_eq!(any.to_string(), "any");
    }

    #[test]
    fn test_capability_errors() {
        assert!(Capability::Supported.to_error().is_none());
        assert_eq!(
            Capability::Unsupported.to_error(),
            Some(CaptureError::Unsupported)
        );
        assert_eq!(
            Capability::InsecureContext.to_error(),
            Some(CaptureError::InsecureContext)
        );
    }

    #[test]
    fn test_media_device_kind_serialization() {
        let info = MediaDeviceInfo::audio_input("mic-1", "Microphone");
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("\"audio_input\""));
        assert!(!info.is_video_input());
    }
}
